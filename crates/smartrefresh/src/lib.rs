//! Pull-to-refresh and load-more for a vertically scrolling list.
//!
//! [`SmartSwipeRefresh`] sits between a gesture source and an inner
//! scrollable. Its [`SmartSwipeRefreshConnection`] splits every scroll delta
//! between the indicator offset held in [`SmartSwipeRefreshState`] and the
//! list, and decides on release whether to commit to a refresh or load.

mod config;
mod connection;
mod flag;
mod indicator;
mod nested_scroll;
mod scroll;
mod shell;
mod state;
mod strategy;

pub use config::SmartSwipeRefreshConfig;
pub use connection::{SmartSwipeRefreshConnection, CLAIM_EPSILON};
pub use flag::SmartSwipeStateFlag;
pub use indicator::{IndicatorEdge, IndicatorIcon, IndicatorModel, RefreshIndicator, INDICATOR_HEIGHT};
pub use nested_scroll::{
    FlingFuture, NestedScrollConnection, NestedScrollDispatcher, NestedScrollSource,
    MIN_FLING_VELOCITY,
};
pub use scroll::ScrollState;
pub use shell::{
    ContentShift, RefreshCallback, SmartSwipeLayout, SmartSwipeRefresh, SmartSwipeRefreshBuilder,
};
pub use state::SmartSwipeRefreshState;
pub use strategy::{IndicatorStrategies, ThresholdStrategy};

pub use smartrefresh_ui_layout::{Constraints, Density, Dp, Measurable, Offset, Size, Velocity};
