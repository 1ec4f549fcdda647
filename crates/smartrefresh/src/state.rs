//! Indicator offset and per-edge flags.
//!
//! Every write to the offset goes through one [`MutatorMutex`]: drag snaps
//! take it at [`MutatePriority::UserInput`] and interrupt settle animations,
//! which run at [`MutatePriority::Default`].

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use log::{debug, trace};
use smartrefresh_animation::{Animatable, AnimationType};
use smartrefresh_core::{
    MutatePriority, MutableState, MutatorMutex, RuntimeHandle, State, Subscription,
};

use crate::flag::SmartSwipeStateFlag;
use crate::indicator::IndicatorEdge;

/// Shared state of one refresh container.
///
/// Positive offsets reveal the header, negative offsets reveal the footer.
#[derive(Clone)]
pub struct SmartSwipeRefreshState {
    inner: Rc<StateInner>,
}

struct StateInner {
    runtime: RuntimeHandle,
    mutex: MutatorMutex,
    offset: Animatable<f32>,
    refresh_flag: MutableState<SmartSwipeStateFlag>,
    load_more_flag: MutableState<SmartSwipeStateFlag>,
    animation_finished: MutableState<bool>,
    header_height: Cell<f32>,
    footer_height: Cell<f32>,
    settle_animation: Cell<AnimationType>,
    // Claimed deltas spawned but not yet applied.
    pending_delta: Cell<f32>,
    pending_applies: Cell<usize>,
    pending_waiters: RefCell<Vec<Waker>>,
}

impl StateInner {
    fn update_flags(&self, offset: f32) {
        let header = self.header_height.get();
        let footer = self.footer_height.get();
        if offset > 0.0 {
            let flag = if header > 0.0 && offset >= header {
                SmartSwipeStateFlag::TipsRelease
            } else {
                SmartSwipeStateFlag::TipsDown
            };
            track_drag(&self.refresh_flag, flag);
            drop_tips(&self.load_more_flag);
        } else if offset < 0.0 {
            let flag = if footer > 0.0 && offset <= -footer {
                SmartSwipeStateFlag::TipsRelease
            } else {
                SmartSwipeStateFlag::TipsDown
            };
            track_drag(&self.load_more_flag, flag);
            drop_tips(&self.refresh_flag);
        } else {
            drop_tips(&self.refresh_flag);
            drop_tips(&self.load_more_flag);
        }
    }

    fn settled_at_zero(&self) {
        if self.animation_finished.set(true) {
            debug!("indicator settled at rest");
        }
        for flag in [&self.refresh_flag, &self.load_more_flag] {
            if flag.get() != SmartSwipeStateFlag::Refreshing {
                flag.set(SmartSwipeStateFlag::Idle);
            }
        }
    }
}

fn track_drag(flag: &MutableState<SmartSwipeStateFlag>, next: SmartSwipeStateFlag) {
    if !flag.get().is_busy() {
        flag.set(next);
    }
}

fn drop_tips(flag: &MutableState<SmartSwipeStateFlag>) {
    if flag.get().is_tips() {
        flag.set(SmartSwipeStateFlag::Idle);
    }
}

/// Returns the pending claim when the apply task ends, however it ends.
struct PendingDelta {
    inner: Rc<StateInner>,
    delta: f32,
}

impl Drop for PendingDelta {
    fn drop(&mut self) {
        let inner = &self.inner;
        let remaining = inner.pending_applies.get().saturating_sub(1);
        inner.pending_applies.set(remaining);
        if remaining > 0 {
            inner.pending_delta.set(inner.pending_delta.get() - self.delta);
            return;
        }
        inner.pending_delta.set(0.0);
        let waiters = std::mem::take(&mut *inner.pending_waiters.borrow_mut());
        for waker in waiters {
            waker.wake();
        }
    }
}

/// Resolves once no claimed delta is waiting to be applied.
struct PendingApplied {
    inner: Rc<StateInner>,
}

impl Future for PendingApplied {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.inner.pending_applies.get() == 0 {
            return Poll::Ready(());
        }
        let mut waiters = self.inner.pending_waiters.borrow_mut();
        if !waiters.iter().any(|waker| waker.will_wake(cx.waker())) {
            waiters.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl SmartSwipeRefreshState {
    pub fn new(runtime: RuntimeHandle) -> Self {
        let offset = Animatable::new(0.0, runtime.clone());
        Self {
            inner: Rc::new(StateInner {
                runtime,
                mutex: MutatorMutex::new(),
                offset,
                refresh_flag: MutableState::new(SmartSwipeStateFlag::Idle),
                load_more_flag: MutableState::new(SmartSwipeStateFlag::Idle),
                animation_finished: MutableState::new(true),
                header_height: Cell::new(0.0),
                footer_height: Cell::new(0.0),
                settle_animation: Cell::new(AnimationType::default()),
                pending_delta: Cell::new(0.0),
                pending_applies: Cell::new(0),
                pending_waiters: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn runtime(&self) -> RuntimeHandle {
        self.inner.runtime.clone()
    }

    pub fn indicator_offset(&self) -> f32 {
        self.inner.offset.value()
    }

    /// Offset once every claim already handed to the runtime has been applied.
    pub fn projected_offset(&self) -> f32 {
        self.indicator_offset() + self.inner.pending_delta.get()
    }

    /// Claimed deltas handed to the runtime and not yet applied.
    pub fn pending_applies(&self) -> usize {
        self.inner.pending_applies.get()
    }

    /// Waits until every claimed delta has been applied or dropped.
    pub async fn pending_applied(&self) {
        PendingApplied {
            inner: Rc::clone(&self.inner),
        }
        .await
    }

    pub fn refresh_flag(&self) -> SmartSwipeStateFlag {
        self.inner.refresh_flag.get()
    }

    pub fn load_more_flag(&self) -> SmartSwipeStateFlag {
        self.inner.load_more_flag.get()
    }

    /// Read-only view of one edge's flag.
    pub fn flag_state(&self, edge: IndicatorEdge) -> State<SmartSwipeStateFlag> {
        match edge {
            IndicatorEdge::Header => self.inner.refresh_flag.as_state(),
            IndicatorEdge::Footer => self.inner.load_more_flag.as_state(),
        }
    }

    /// Called by whoever runs the refresh, typically with `Success` or `Error`.
    pub fn set_refresh_flag(&self, flag: SmartSwipeStateFlag) {
        if self.inner.refresh_flag.set(flag) {
            debug!("refresh flag -> {flag:?}");
        }
    }

    pub fn set_load_more_flag(&self, flag: SmartSwipeStateFlag) {
        if self.inner.load_more_flag.set(flag) {
            debug!("load more flag -> {flag:?}");
        }
    }

    pub fn animation_finished(&self) -> bool {
        self.inner.animation_finished.get()
    }

    pub(crate) fn set_animation_finished(&self, finished: bool) {
        self.inner.animation_finished.set(finished);
    }

    /// A load is running or the indicator has not returned to rest since the
    /// last trigger.
    pub fn is_loading(&self) -> bool {
        self.refresh_flag() == SmartSwipeStateFlag::Refreshing
            || self.load_more_flag() == SmartSwipeStateFlag::Refreshing
            || !self.animation_finished()
    }

    pub fn header_is_show(&self) -> bool {
        self.indicator_offset() > 0.0
    }

    pub fn footer_is_show(&self) -> bool {
        self.indicator_offset() < 0.0
    }

    pub fn header_height(&self) -> f32 {
        self.inner.header_height.get()
    }

    pub fn footer_height(&self) -> f32 {
        self.inner.footer_height.get()
    }

    /// Measured indicator extents; zero disables an edge.
    pub fn set_indicator_heights(&self, header: f32, footer: f32) {
        self.inner.header_height.set(header.max(0.0));
        self.inner.footer_height.set(footer.max(0.0));
    }

    pub fn set_settle_animation(&self, animation: AnimationType) {
        self.inner.settle_animation.set(animation);
    }

    pub fn is_animating(&self) -> bool {
        self.inner.offset.is_running()
    }

    pub fn subscribe_offset(&self, observer: impl Fn(&f32) + 'static) -> Subscription {
        self.inner.offset.state().subscribe(observer)
    }

    pub fn subscribe_refresh_flag(&self, observer: impl Fn(&SmartSwipeStateFlag) + 'static) -> Subscription {
        self.inner.refresh_flag.subscribe(observer)
    }

    pub fn subscribe_load_more_flag(
        &self,
        observer: impl Fn(&SmartSwipeStateFlag) + 'static,
    ) -> Subscription {
        self.inner.load_more_flag.subscribe(observer)
    }

    pub fn subscribe_animation_finished(&self, observer: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.animation_finished.subscribe(observer)
    }

    /// Moves the offset to `value` at once and recomputes the drag flags.
    ///
    /// Interrupts a running settle animation.
    pub async fn snap_offset_to(&self, value: f32) {
        let inner = Rc::clone(&self.inner);
        let result = self
            .inner
            .mutex
            .mutate(MutatePriority::UserInput, || async move {
                inner.offset.snap_to(value);
                inner.update_flags(value);
            })
            .await;
        if let Err(err) = result {
            debug!("snap to {value} dropped: {err}");
        }
    }

    /// Animates the offset to `value` with the settle animation.
    ///
    /// Waits for pending claims to be applied before taking the mutex.
    /// Landing on zero marks the animation finished and returns every edge
    /// that is not refreshing to `Idle`.
    pub async fn animate_offset_to(&self, value: f32) {
        self.pending_applied().await;
        let inner = Rc::clone(&self.inner);
        let result = self
            .inner
            .mutex
            .mutate(MutatePriority::Default, || async move {
                let animation = inner.settle_animation.get();
                inner
                    .offset
                    .animate_to(value, animation, |current| {
                        if *current == 0.0 {
                            inner.settled_at_zero();
                        }
                    })
                    .await
            })
            .await;
        match result {
            Ok(outcome) => trace!("offset animation ended {:?} at {}", outcome.end_reason, outcome.end_value),
            Err(err) => debug!("offset animation to {value} interrupted: {err}"),
        }
    }

    /// Reveals the header and starts a refresh without a gesture.
    pub async fn init_refresh(&self) {
        self.set_animation_finished(false);
        self.set_refresh_flag(SmartSwipeStateFlag::Refreshing);
        self.snap_offset_to(self.header_height()).await;
    }

    /// Reads the offset under the mutex, adds `delta` and snaps to the result
    /// clamped into `[lower, upper]`.
    pub async fn apply_offset_delta(&self, delta: f32, lower: f32, upper: f32) {
        let inner = Rc::clone(&self.inner);
        let result = self
            .inner
            .mutex
            .mutate(MutatePriority::UserInput, || async move {
                let target = (inner.offset.value() + delta).clamp(lower, upper);
                inner.offset.snap_to(target);
                inner.update_flags(target);
                target
            })
            .await;
        match result {
            Ok(target) => trace!("offset += {delta} -> {target}"),
            Err(err) => debug!("offset delta {delta} dropped: {err}"),
        }
    }

    /// Spawns [`apply_offset_delta`](Self::apply_offset_delta) on the UI
    /// runtime without waiting for it.
    ///
    /// Until the task runs, the delta is visible through
    /// [`projected_offset`](Self::projected_offset).
    pub fn dispatch_offset_delta(&self, delta: f32, lower: f32, upper: f32) {
        let pending = &self.inner.pending_delta;
        pending.set(pending.get() + delta);
        let applies = &self.inner.pending_applies;
        applies.set(applies.get() + 1);
        let guard = PendingDelta {
            inner: Rc::clone(&self.inner),
            delta,
        };
        let state = self.clone();
        let spawned = self.inner.runtime.spawn_ui(async move {
            let _guard = guard;
            state.apply_offset_delta(delta, lower, upper).await;
        });
        if spawned.is_none() {
            debug!("runtime gone, offset delta {delta} discarded");
        }
    }
}

impl std::fmt::Debug for SmartSwipeRefreshState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartSwipeRefreshState")
            .field("offset", &self.indicator_offset())
            .field("refresh_flag", &self.refresh_flag())
            .field("load_more_flag", &self.load_more_flag())
            .field("animation_finished", &self.animation_finished())
            .field("header_height", &self.header_height())
            .field("footer_height", &self.footer_height())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
