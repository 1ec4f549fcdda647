//! Splits scroll and fling events between the indicator and the inner list.
//!
//! Offsets are claimed in damped units (`available × stickiness`) and
//! reported back undamped (`claim / stickiness`), so the gesture source sees
//! the finger travel it handed over.

use std::cell::Cell;

use log::{debug, trace};
use smartrefresh_ui_layout::{Offset, Velocity};

use crate::config::SmartSwipeRefreshConfig;
use crate::flag::SmartSwipeStateFlag;
use crate::nested_scroll::{FlingFuture, NestedScrollConnection, NestedScrollSource};
use crate::state::SmartSwipeRefreshState;
use crate::strategy::ThresholdStrategy;

/// Claims below this many pixels are dropped, unless they land on zero.
pub const CLAIM_EPSILON: f32 = 0.5;

/// Nested scroll parent for one refresh container.
///
/// Built for a fixed pair of measured indicator heights; a zero height
/// disables that edge.
pub struct SmartSwipeRefreshConnection {
    state: SmartSwipeRefreshState,
    config: SmartSwipeRefreshConfig,
    header_height: f32,
    footer_height: f32,
    // The last release started with the indicator already out.
    release_is_edge: Cell<bool>,
}

impl SmartSwipeRefreshConnection {
    pub fn new(
        state: SmartSwipeRefreshState,
        config: SmartSwipeRefreshConfig,
        header_height: f32,
        footer_height: f32,
    ) -> Self {
        Self {
            state,
            config: config.sanitized(),
            header_height,
            footer_height,
            release_is_edge: Cell::new(false),
        }
    }

    pub fn header_height(&self) -> f32 {
        self.header_height
    }

    pub fn footer_height(&self) -> f32 {
        self.footer_height
    }

    pub fn release_is_edge(&self) -> bool {
        self.release_is_edge.get()
    }

    fn header_enabled(&self) -> bool {
        self.config.refresh_enabled && self.header_height > 0.0
    }

    fn footer_enabled(&self) -> bool {
        self.config.load_more_enabled && self.footer_height > 0.0
    }

    fn strategies_for(&self, source: NestedScrollSource) -> (ThresholdStrategy, ThresholdStrategy) {
        let strategies = self.config.strategies;
        match source {
            NestedScrollSource::Drag => (strategies.drag_header, strategies.drag_footer),
            NestedScrollSource::Fling => (strategies.fling_header, strategies.fling_footer),
        }
    }

    /// Hands `claim` to the state and returns the undamped amount consumed.
    fn apply(&self, claim: f32, lands_on_zero: bool, lower: f32, upper: f32) -> Offset {
        if claim == 0.0 || (claim.abs() < CLAIM_EPSILON && !lands_on_zero) {
            return Offset::ZERO;
        }
        trace!("indicator claims {claim} in [{lower}, {upper}]");
        self.state.dispatch_offset_delta(claim, lower, upper);
        Offset::vertical(claim / self.config.stickiness)
    }
}

impl NestedScrollConnection for SmartSwipeRefreshConnection {
    fn on_pre_scroll(&self, available: Offset, _source: NestedScrollSource) -> Offset {
        if self.state.is_loading() {
            return Offset::vertical(available.y);
        }
        let offset = self.state.projected_offset();
        let stickiness = self.config.stickiness;
        if offset > 0.0 && available.y < 0.0 {
            // Pushing the header back in.
            let claim = (available.y * stickiness).max(-offset);
            self.apply(claim, claim == -offset, 0.0, f32::INFINITY)
        } else if offset < 0.0 && available.y > 0.0 {
            let claim = (available.y * stickiness).min(-offset);
            self.apply(claim, claim == -offset, f32::NEG_INFINITY, 0.0)
        } else {
            Offset::ZERO
        }
    }

    fn on_post_scroll(&self, _consumed: Offset, available: Offset, source: NestedScrollSource) -> Offset {
        if self.state.is_loading() || available.y == 0.0 {
            return Offset::ZERO;
        }
        if source == NestedScrollSource::Fling && self.release_is_edge.get() {
            return Offset::ZERO;
        }
        let offset = self.state.projected_offset();
        let stickiness = self.config.stickiness;
        let (header_strategy, footer_strategy) = self.strategies_for(source);
        if available.y > 0.0 && offset >= 0.0 && self.header_enabled() {
            let bound = header_strategy.bound();
            let room = bound - offset;
            if room <= 0.0 {
                return Offset::ZERO;
            }
            let claim = (available.y * stickiness).min(room);
            self.apply(claim, false, 0.0, bound)
        } else if available.y < 0.0 && offset <= 0.0 && self.footer_enabled() {
            let bound = footer_strategy.bound();
            let room = bound + offset;
            if room <= 0.0 {
                return Offset::ZERO;
            }
            let claim = (available.y * stickiness).max(-room);
            self.apply(claim, false, -bound, 0.0)
        } else {
            Offset::ZERO
        }
    }

    fn on_pre_fling(&self, available: Velocity) -> FlingFuture<'_> {
        Box::pin(async move {
            let state = &self.state;
            if state.is_loading() {
                return available;
            }
            let offset = state.projected_offset();
            self.release_is_edge.set(offset != 0.0);
            if self.header_enabled()
                && offset >= self.header_height
                && state.refresh_flag() != SmartSwipeStateFlag::Refreshing
            {
                debug!("release at {offset} commits a refresh");
                state.set_animation_finished(false);
                state.set_refresh_flag(SmartSwipeStateFlag::Refreshing);
                state.animate_offset_to(self.header_height).await;
                return available;
            }
            if self.footer_enabled()
                && offset <= -self.footer_height
                && state.load_more_flag() != SmartSwipeStateFlag::Refreshing
            {
                debug!("release at {offset} commits a load");
                state.set_animation_finished(false);
                state.set_load_more_flag(SmartSwipeStateFlag::Refreshing);
                state.animate_offset_to(-self.footer_height).await;
                return available;
            }
            Velocity::ZERO
        })
    }

    fn on_post_fling(&self, _consumed: Velocity, _available: Velocity) -> FlingFuture<'_> {
        Box::pin(async move {
            let state = &self.state;
            self.release_is_edge.set(false);
            if state.is_loading() {
                return Velocity::ZERO;
            }
            // Not loading, so neither edge is refreshing.
            let offset = state.projected_offset();
            if offset != 0.0 {
                if offset > 0.0 {
                    state.set_refresh_flag(SmartSwipeStateFlag::Idle);
                } else {
                    state.set_load_more_flag(SmartSwipeStateFlag::Idle);
                }
                debug!("release at {offset} springs back");
                state.animate_offset_to(0.0).await;
            }
            Velocity::ZERO
        })
    }
}

impl std::fmt::Debug for SmartSwipeRefreshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartSwipeRefreshConnection")
            .field("header_height", &self.header_height)
            .field("footer_height", &self.footer_height)
            .field("stickiness", &self.config.stickiness)
            .field("release_is_edge", &self.release_is_edge.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
