use log::warn;
use smartrefresh_animation::{AnimationSpec, AnimationType, Easing};

use crate::strategy::{IndicatorStrategies, ThresholdStrategy};

const DEFAULT_STICKINESS: f32 = 0.5;

/// Behaviour of a [`SmartSwipeRefresh`](crate::SmartSwipeRefresh).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmartSwipeRefreshConfig {
    /// Fraction of the finger's travel the indicator follows, in `(0, 1]`.
    pub stickiness: f32,
    pub strategies: IndicatorStrategies,
    pub refresh_enabled: bool,
    pub load_more_enabled: bool,
    /// Start a refresh the first time the container is laid out.
    pub refresh_on_first_entry: bool,
    /// Animation used whenever the offset settles to a resting position.
    pub settle_animation: AnimationType,
    /// How long `Success` or `Error` stays on screen before the indicator hides.
    pub result_display_millis: u64,
}

impl Default for SmartSwipeRefreshConfig {
    fn default() -> Self {
        Self {
            stickiness: DEFAULT_STICKINESS,
            strategies: IndicatorStrategies::default(),
            refresh_enabled: true,
            load_more_enabled: true,
            refresh_on_first_entry: false,
            settle_animation: AnimationType::Tween(AnimationSpec::tween(300, Easing::FastOutSlowIn)),
            result_display_millis: 1000,
        }
    }
}

impl SmartSwipeRefreshConfig {
    pub fn with_stickiness(mut self, stickiness: f32) -> Self {
        self.stickiness = stickiness;
        self
    }

    pub fn with_strategies(mut self, strategies: IndicatorStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_drag_strategies(mut self, header: ThresholdStrategy, footer: ThresholdStrategy) -> Self {
        self.strategies.drag_header = header;
        self.strategies.drag_footer = footer;
        self
    }

    pub fn with_fling_strategies(mut self, header: ThresholdStrategy, footer: ThresholdStrategy) -> Self {
        self.strategies.fling_header = header;
        self.strategies.fling_footer = footer;
        self
    }

    pub fn with_refresh_enabled(mut self, enabled: bool) -> Self {
        self.refresh_enabled = enabled;
        self
    }

    pub fn with_load_more_enabled(mut self, enabled: bool) -> Self {
        self.load_more_enabled = enabled;
        self
    }

    pub fn with_refresh_on_first_entry(mut self, enabled: bool) -> Self {
        self.refresh_on_first_entry = enabled;
        self
    }

    pub fn with_settle_animation(mut self, animation: AnimationType) -> Self {
        self.settle_animation = animation;
        self
    }

    pub fn with_result_display_millis(mut self, millis: u64) -> Self {
        self.result_display_millis = millis;
        self
    }

    /// Replaces values the arbitrator cannot work with.
    ///
    /// Stickiness outside `(0, 1]` is clamped, or reset to 0.5 when it is not
    /// a positive number. `Fixed` heights that are negative or not finite
    /// become `None`.
    pub fn sanitized(mut self) -> Self {
        if !self.stickiness.is_finite() || self.stickiness <= 0.0 {
            warn!(
                "stickiness {} is not a positive number, using {}",
                self.stickiness, DEFAULT_STICKINESS
            );
            self.stickiness = DEFAULT_STICKINESS;
        } else if self.stickiness > 1.0 {
            warn!("stickiness {} is above 1, clamping", self.stickiness);
            self.stickiness = 1.0;
        }
        let strategies = &mut self.strategies;
        for (name, strategy) in [
            ("drag header", &mut strategies.drag_header),
            ("drag footer", &mut strategies.drag_footer),
            ("fling header", &mut strategies.fling_header),
            ("fling footer", &mut strategies.fling_footer),
        ] {
            if let ThresholdStrategy::Fixed(height) = *strategy {
                if !height.is_finite() || height < 0.0 {
                    warn!("{name} threshold {height} is invalid, disabling the edge");
                    *strategy = ThresholdStrategy::None;
                }
            }
        }
        self
    }
}
