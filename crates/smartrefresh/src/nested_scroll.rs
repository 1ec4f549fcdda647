//! Nested scroll plumbing between a gesture source, a parent connection and
//! the inner list.
//!
//! Deltas use gesture coordinates: positive `y` is the finger moving down,
//! which scrolls the list towards its top.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use log::trace;
use smartrefresh_animation::{ExponentialDecaySpec, FloatDecayAnimationSpec};
use smartrefresh_core::RuntimeHandle;
use smartrefresh_ui_layout::{Offset, Velocity};

use crate::scroll::ScrollState;

/// Below this speed, in px/s, a release does not fling the list.
pub const MIN_FLING_VELOCITY: f32 = 1.0;

/// Leftover delta, in px, that counts as hitting the end of the list.
const BOUNDARY_EPSILON: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NestedScrollSource {
    /// The finger is down.
    Drag,
    /// Produced by a fling after release.
    Fling,
}

pub type FlingFuture<'a> = Pin<Box<dyn Future<Output = Velocity> + 'a>>;

/// A parent that takes part in a child's scrolling.
///
/// Every method returns what the parent consumed.
pub trait NestedScrollConnection {
    fn on_pre_scroll(&self, _available: Offset, _source: NestedScrollSource) -> Offset {
        Offset::ZERO
    }

    fn on_post_scroll(&self, _consumed: Offset, _available: Offset, _source: NestedScrollSource) -> Offset {
        Offset::ZERO
    }

    fn on_pre_fling(&self, _available: Velocity) -> FlingFuture<'_> {
        Box::pin(async { Velocity::ZERO })
    }

    fn on_post_fling(&self, _consumed: Velocity, _available: Velocity) -> FlingFuture<'_> {
        Box::pin(async { Velocity::ZERO })
    }
}

/// Routes scroll and fling events through a parent connection around a
/// [`ScrollState`].
///
/// Scroll: pre-scroll, then the list, then post-scroll with the leftover.
/// Fling: pre-fling, then a decaying list fling whose frames go through the
/// scroll chain with [`NestedScrollSource::Fling`], then post-fling.
pub struct NestedScrollDispatcher {
    connection: Rc<dyn NestedScrollConnection>,
    child: ScrollState,
    runtime: RuntimeHandle,
    decay: ExponentialDecaySpec,
}

impl NestedScrollDispatcher {
    pub fn new(connection: Rc<dyn NestedScrollConnection>, child: ScrollState, runtime: RuntimeHandle) -> Self {
        Self {
            connection,
            child,
            runtime,
            decay: ExponentialDecaySpec::default(),
        }
    }

    pub fn with_decay(mut self, decay: ExponentialDecaySpec) -> Self {
        self.decay = decay;
        self
    }

    pub fn child(&self) -> &ScrollState {
        &self.child
    }

    /// Delivers one scroll delta. Returns the total consumed by the parent and
    /// the list.
    pub fn dispatch_scroll(&self, delta: Offset, source: NestedScrollSource) -> Offset {
        let pre = self.connection.on_pre_scroll(delta, source);
        let available = delta - pre;
        // The list scrolls opposite to the finger.
        let child = Offset::vertical(-self.child.dispatch_raw_delta(-available.y));
        let left = available - child;
        let post = self.connection.on_post_scroll(child, left, source);
        trace!("scroll {delta:?} ({source:?}): pre {pre:?}, list {child:?}, post {post:?}");
        pre + child + post
    }

    /// Delivers a release with `velocity`. Resolves once the parent's
    /// post-fling has finished, with the total velocity consumed.
    pub async fn dispatch_fling(&self, velocity: Velocity) -> Velocity {
        let pre = self.connection.on_pre_fling(velocity).await;
        let available = velocity - pre;
        let child = self.fling_child(available).await;
        let left = available - child;
        let post = self.connection.on_post_fling(child, left).await;
        pre + child + post
    }

    /// Decays `available` through the scroll chain until it comes to rest or
    /// nothing takes the delta any more. Returns the velocity used up.
    async fn fling_child(&self, available: Velocity) -> Velocity {
        let initial_velocity = available.y;
        if initial_velocity.abs() < MIN_FLING_VELOCITY {
            return Velocity::ZERO;
        }
        let clock = self.runtime.frame_clock();
        let duration = self.decay.duration_nanos(initial_velocity);
        let start = clock.next_frame().await;
        let mut last_value = 0.0f32;
        loop {
            let now = clock.next_frame().await;
            let play_time = now.saturating_sub(start);
            let value = self.decay.value_from_nanos(play_time, 0.0, initial_velocity);
            let delta = value - last_value;
            last_value = value;

            let consumed = if delta.abs() > 0.001 {
                self.dispatch_scroll(Offset::vertical(delta), NestedScrollSource::Fling).y
            } else {
                0.0
            };
            if (delta - consumed).abs() > BOUNDARY_EPSILON {
                let remaining = self.decay.velocity_from_nanos(play_time, initial_velocity);
                return Velocity::vertical(initial_velocity - remaining);
            }
            if play_time >= duration {
                return available;
            }
        }
    }
}
