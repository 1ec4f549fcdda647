//! Default header and footer indicators.
//!
//! An indicator turns its edge's flag into an [`IndicatorModel`] that a
//! renderer can draw: which icon, how far it is rotated, what to say and
//! when the list was last updated.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Local};
use smartrefresh_animation::{Animatable, AnimationSpec, AnimationType, Easing};
use smartrefresh_core::{KeyedEffect, RuntimeHandle, State, Subscription};
use smartrefresh_ui_layout::{Constraints, Density, Dp, Measurable, Size};

use crate::flag::SmartSwipeStateFlag;
use crate::state::SmartSwipeRefreshState;

pub const INDICATOR_HEIGHT: Dp = Dp(80.0);

const SPINNER_PERIOD_MILLIS: u64 = 500;
const ARROW_FLIP_MILLIS: u64 = 500;
const NANOS_PER_MILLI: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndicatorEdge {
    Header,
    Footer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndicatorIcon {
    ArrowDown,
    ArrowUp,
    Refresh,
    Done,
    Warning,
}

/// What an indicator shows for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct IndicatorModel {
    pub icon: IndicatorIcon,
    pub rotation_degrees: f32,
    pub label: &'static str,
    pub timestamp: Option<String>,
}

struct IndicatorInner {
    edge: IndicatorEdge,
    flag: State<SmartSwipeStateFlag>,
    runtime: RuntimeHandle,
    arrow: Animatable<f32>,
    arrow_effect: RefCell<KeyedEffect<bool>>,
    last_updated: RefCell<DateTime<Local>>,
}

/// Indicator for one edge of a [`SmartSwipeRefresh`](crate::SmartSwipeRefresh).
///
/// Measures at a fixed 80 dp across the available width.
pub struct RefreshIndicator {
    inner: Rc<IndicatorInner>,
    density: Density,
    show_timestamp: bool,
    _subscription: Subscription,
}

impl RefreshIndicator {
    pub fn header(state: &SmartSwipeRefreshState, density: Density) -> Self {
        Self::new(IndicatorEdge::Header, state, density)
    }

    pub fn footer(state: &SmartSwipeRefreshState, density: Density) -> Self {
        Self::new(IndicatorEdge::Footer, state, density)
    }

    pub fn new(edge: IndicatorEdge, state: &SmartSwipeRefreshState, density: Density) -> Self {
        let runtime = state.runtime();
        let flag = state.flag_state(edge);
        let inner = Rc::new(IndicatorInner {
            edge,
            flag: flag.clone(),
            arrow: Animatable::new(0.0, runtime.clone()),
            arrow_effect: RefCell::new(KeyedEffect::new(runtime.clone())),
            runtime,
            last_updated: RefCell::new(Local::now()),
        });
        let weak = Rc::downgrade(&inner);
        let subscription = flag.subscribe(move |flag| {
            if let Some(inner) = weak.upgrade() {
                inner.on_flag(*flag);
            }
        });
        Self {
            inner,
            density,
            show_timestamp: true,
            _subscription: subscription,
        }
    }

    pub fn with_timestamp(mut self, show: bool) -> Self {
        self.show_timestamp = show;
        self
    }

    pub fn edge(&self) -> IndicatorEdge {
        self.inner.edge
    }

    pub fn last_updated(&self) -> DateTime<Local> {
        *self.inner.last_updated.borrow()
    }

    /// The spinner turns or the arrow is flipping.
    pub fn is_animating(&self) -> bool {
        self.inner.flag.get() == SmartSwipeStateFlag::Refreshing || self.inner.arrow.is_running()
    }

    pub fn model(&self) -> IndicatorModel {
        let inner = &*self.inner;
        let flag = inner.flag.get();
        let rotation_degrees = if flag == SmartSwipeStateFlag::Refreshing {
            spinner_degrees(inner.runtime.frame_time_nanos())
        } else {
            inner.arrow.value()
        };
        IndicatorModel {
            icon: icon_for(inner.edge, flag),
            rotation_degrees,
            label: label_for(inner.edge, flag),
            timestamp: self
                .show_timestamp
                .then(|| format!("Last updated: {}", inner.last_updated.borrow().format("%m-%d %H:%M"))),
        }
    }
}

impl IndicatorInner {
    fn on_flag(&self, flag: SmartSwipeStateFlag) {
        if flag.is_finished() {
            *self.last_updated.borrow_mut() = Local::now();
        }
        let release = flag == SmartSwipeStateFlag::TipsRelease;
        let arrow = self.arrow.clone();
        self.arrow_effect.borrow_mut().launch(release, async move {
            let target = if release { 180.0 } else { 0.0 };
            let spec = AnimationSpec::tween(ARROW_FLIP_MILLIS, Easing::FastOutSlowIn);
            arrow.animate_to(target, AnimationType::Tween(spec), |_| {}).await;
        });
    }
}

impl Measurable for RefreshIndicator {
    fn measure(&self, constraints: Constraints) -> Size {
        let width = if constraints.max_width.is_finite() {
            constraints.max_width
        } else {
            constraints.min_width
        };
        let (width, height) = constraints.constrain(width, INDICATOR_HEIGHT.to_px(self.density));
        Size::new(width, height)
    }
}

impl std::fmt::Debug for RefreshIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshIndicator")
            .field("edge", &self.inner.edge)
            .field("flag", &self.inner.flag.get())
            .field("arrow", &self.inner.arrow.value())
            .finish()
    }
}

fn spinner_degrees(frame_time_nanos: u64) -> f32 {
    let period = SPINNER_PERIOD_MILLIS * NANOS_PER_MILLI;
    (frame_time_nanos % period) as f32 / period as f32 * 360.0
}

fn icon_for(edge: IndicatorEdge, flag: SmartSwipeStateFlag) -> IndicatorIcon {
    match flag {
        SmartSwipeStateFlag::Refreshing => IndicatorIcon::Refresh,
        SmartSwipeStateFlag::Success => IndicatorIcon::Done,
        SmartSwipeStateFlag::Error => IndicatorIcon::Warning,
        SmartSwipeStateFlag::Idle | SmartSwipeStateFlag::TipsDown | SmartSwipeStateFlag::TipsRelease => {
            match edge {
                IndicatorEdge::Header => IndicatorIcon::ArrowDown,
                IndicatorEdge::Footer => IndicatorIcon::ArrowUp,
            }
        }
    }
}

fn label_for(edge: IndicatorEdge, flag: SmartSwipeStateFlag) -> &'static str {
    match (edge, flag) {
        (IndicatorEdge::Header, SmartSwipeStateFlag::Idle | SmartSwipeStateFlag::TipsDown) => {
            "Pull down to refresh"
        }
        (IndicatorEdge::Header, SmartSwipeStateFlag::TipsRelease) => "Release to refresh",
        (IndicatorEdge::Header, SmartSwipeStateFlag::Refreshing) => "Refreshing...",
        (IndicatorEdge::Header, SmartSwipeStateFlag::Success) => "Refresh succeeded",
        (IndicatorEdge::Header, SmartSwipeStateFlag::Error) => "Refresh failed",
        (IndicatorEdge::Footer, SmartSwipeStateFlag::Idle | SmartSwipeStateFlag::TipsDown) => {
            "Pull up to load more"
        }
        (IndicatorEdge::Footer, SmartSwipeStateFlag::TipsRelease) => "Release to load more",
        (IndicatorEdge::Footer, SmartSwipeStateFlag::Refreshing) => "Loading...",
        (IndicatorEdge::Footer, SmartSwipeStateFlag::Success) => "Load succeeded",
        (IndicatorEdge::Footer, SmartSwipeStateFlag::Error) => "Load failed",
    }
}

#[cfg(test)]
#[path = "tests/indicator_tests.rs"]
mod tests;
