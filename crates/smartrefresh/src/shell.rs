//! The refresh container: measures its indicators, places them around the
//! content and runs the refresh lifecycle.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};

use log::debug;
use smartrefresh_core::{KeyedEffect, Subscription, TaskHandle};
use smartrefresh_ui_layout::{Constraints, Density, Measurable, Offset, Size, Velocity};

use crate::config::SmartSwipeRefreshConfig;
use crate::connection::SmartSwipeRefreshConnection;
use crate::flag::SmartSwipeStateFlag;
use crate::indicator::{IndicatorEdge, RefreshIndicator};
use crate::nested_scroll::{FlingFuture, NestedScrollConnection, NestedScrollSource};
use crate::scroll::ScrollState;
use crate::state::SmartSwipeRefreshState;

/// Started when an edge enters `Refreshing`. The returned future runs on the
/// UI runtime; it is expected to set the edge's flag to `Success` or `Error`.
pub type RefreshCallback = Rc<dyn Fn() -> Pin<Box<dyn Future<Output = ()>>>>;

/// How the content follows the indicator offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContentShift {
    /// The list keeps its own scroll position and is padded instead.
    Padding { top: f32, bottom: f32 },
    Translate(f32),
}

/// Result of [`SmartSwipeRefresh::measure`]. Positions are relative to the
/// container's top edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmartSwipeLayout {
    pub size: Size,
    pub content: ContentShift,
    pub header_y: f32,
    pub header_height: f32,
    pub footer_y: f32,
    pub footer_height: f32,
}

struct ShellInner {
    state: SmartSwipeRefreshState,
    config: SmartSwipeRefreshConfig,
    header: Rc<dyn Measurable>,
    footer: Rc<dyn Measurable>,
    content: Rc<dyn Measurable>,
    scroll_state: Option<ScrollState>,
    connection: RefCell<Rc<SmartSwipeRefreshConnection>>,
    refresh_effect: RefCell<KeyedEffect<SmartSwipeStateFlag>>,
    load_more_effect: RefCell<KeyedEffect<SmartSwipeStateFlag>>,
    on_refresh: Option<RefreshCallback>,
    on_load_more: Option<RefreshCallback>,
    first_entry_pending: Cell<bool>,
    first_entry_task: RefCell<Option<TaskHandle>>,
}

impl ShellInner {
    fn on_flag(&self, edge: IndicatorEdge, flag: SmartSwipeStateFlag) {
        let (effect, callback) = match edge {
            IndicatorEdge::Header => (&self.refresh_effect, &self.on_refresh),
            IndicatorEdge::Footer => (&self.load_more_effect, &self.on_load_more),
        };
        let mut effect = effect.borrow_mut();
        match flag {
            SmartSwipeStateFlag::Refreshing => {
                let callback = callback.clone();
                effect.launch(flag, async move {
                    debug!("{edge:?} refreshing");
                    if let Some(callback) = callback {
                        callback().await;
                    }
                });
            }
            SmartSwipeStateFlag::Success | SmartSwipeStateFlag::Error => {
                let state = self.state.clone();
                let clock = state.runtime().frame_clock();
                let display_millis = self.config.result_display_millis;
                effect.launch(flag, async move {
                    clock.delay(display_millis).await;
                    state.animate_offset_to(0.0).await;
                });
            }
            _ => effect.settle(flag),
        }
    }

    fn current_connection(&self) -> Rc<SmartSwipeRefreshConnection> {
        Rc::clone(&self.connection.borrow())
    }
}

/// Pull-to-refresh and load-more around one scrollable content.
///
/// Hosts call [`measure`](Self::measure) on every layout pass and feed
/// gestures through [`nested_scroll_connection`](Self::nested_scroll_connection).
/// Dropping the container cancels its pending effects.
pub struct SmartSwipeRefresh {
    inner: Rc<ShellInner>,
    _subscriptions: [Subscription; 2],
}

impl SmartSwipeRefresh {
    pub fn builder(state: SmartSwipeRefreshState, content: Rc<dyn Measurable>) -> SmartSwipeRefreshBuilder {
        SmartSwipeRefreshBuilder {
            state,
            content,
            config: SmartSwipeRefreshConfig::default(),
            header: None,
            footer: None,
            scroll_state: None,
            on_refresh: None,
            on_load_more: None,
            density: Density::default(),
        }
    }

    pub fn state(&self) -> &SmartSwipeRefreshState {
        &self.inner.state
    }

    pub fn config(&self) -> &SmartSwipeRefreshConfig {
        &self.inner.config
    }

    /// The arbitrator for the most recently measured indicator heights.
    pub fn connection(&self) -> Rc<SmartSwipeRefreshConnection> {
        self.inner.current_connection()
    }

    /// A connection that always forwards to the current arbitrator and goes
    /// quiet once the container is dropped.
    pub fn nested_scroll_connection(&self) -> Rc<dyn NestedScrollConnection> {
        Rc::new(ShellConnection {
            shell: Rc::downgrade(&self.inner),
        })
    }

    /// Measures the indicators and the content under `constraints`.
    ///
    /// Indicator heights feed the state; a disabled edge measures as zero.
    pub fn measure(&self, constraints: Constraints) -> SmartSwipeLayout {
        let inner = &*self.inner;
        let config = &inner.config;
        let indicator_constraints = constraints.loosen_width().with_unbounded_height();
        let header_height = if config.refresh_enabled {
            inner.header.measure(indicator_constraints).height
        } else {
            0.0
        };
        let footer_height = if config.load_more_enabled {
            inner.footer.measure(indicator_constraints).height
        } else {
            0.0
        };

        let current = inner.current_connection();
        if current.header_height() != header_height || current.footer_height() != footer_height {
            debug!("indicator heights {header_height}/{footer_height}");
            inner.state.set_indicator_heights(header_height, footer_height);
            *inner.connection.borrow_mut() = Rc::new(SmartSwipeRefreshConnection::new(
                inner.state.clone(),
                *config,
                header_height,
                footer_height,
            ));
        }

        if inner.first_entry_pending.replace(false) && config.refresh_on_first_entry && config.refresh_enabled {
            let state = inner.state.clone();
            *inner.first_entry_task.borrow_mut() = inner
                .state
                .runtime()
                .spawn_ui(async move { state.init_refresh().await });
        }

        let offset = inner.state.indicator_offset();
        let size = inner.content.measure(constraints);
        let content = match inner.scroll_state {
            Some(_) => ContentShift::Padding {
                top: offset.max(0.0),
                bottom: (-offset).max(0.0),
            },
            None => ContentShift::Translate(offset),
        };
        let footer_anchor = size.height - footer_height;
        SmartSwipeLayout {
            size,
            content,
            header_y: offset - header_height,
            header_height,
            footer_y: footer_anchor + offset + footer_height,
            footer_height,
        }
    }
}

impl Drop for SmartSwipeRefresh {
    fn drop(&mut self) {
        if let Some(task) = self.inner.first_entry_task.borrow_mut().take() {
            task.cancel();
        }
        self.inner.refresh_effect.borrow_mut().cancel_current();
        self.inner.load_more_effect.borrow_mut().cancel_current();
    }
}

impl std::fmt::Debug for SmartSwipeRefresh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartSwipeRefresh")
            .field("state", &self.inner.state)
            .field("connection", &*self.inner.connection.borrow())
            .finish()
    }
}

pub struct SmartSwipeRefreshBuilder {
    state: SmartSwipeRefreshState,
    content: Rc<dyn Measurable>,
    config: SmartSwipeRefreshConfig,
    header: Option<Rc<dyn Measurable>>,
    footer: Option<Rc<dyn Measurable>>,
    scroll_state: Option<ScrollState>,
    on_refresh: Option<RefreshCallback>,
    on_load_more: Option<RefreshCallback>,
    density: Density,
}

impl SmartSwipeRefreshBuilder {
    pub fn config(mut self, config: SmartSwipeRefreshConfig) -> Self {
        self.config = config;
        self
    }

    pub fn header(mut self, header: Rc<dyn Measurable>) -> Self {
        self.header = Some(header);
        self
    }

    pub fn footer(mut self, footer: Rc<dyn Measurable>) -> Self {
        self.footer = Some(footer);
        self
    }

    /// The content scrolls on its own; shift it with padding.
    pub fn scroll_state(mut self, scroll_state: ScrollState) -> Self {
        self.scroll_state = Some(scroll_state);
        self
    }

    pub fn on_refresh<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.on_refresh = Some(boxed_callback(callback));
        self
    }

    pub fn on_load_more<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.on_load_more = Some(boxed_callback(callback));
        self
    }

    /// Used for the default indicators.
    pub fn density(mut self, density: Density) -> Self {
        self.density = density;
        self
    }

    pub fn build(self) -> SmartSwipeRefresh {
        let config = self.config.sanitized();
        let state = self.state;
        state.set_settle_animation(config.settle_animation);
        let density = self.density;
        let header = self
            .header
            .unwrap_or_else(|| Rc::new(RefreshIndicator::header(&state, density)));
        let footer = self
            .footer
            .unwrap_or_else(|| Rc::new(RefreshIndicator::footer(&state, density)));
        let runtime = state.runtime();
        let inner = Rc::new(ShellInner {
            connection: RefCell::new(Rc::new(SmartSwipeRefreshConnection::new(state.clone(), config, 0.0, 0.0))),
            state,
            config,
            header,
            footer,
            content: self.content,
            scroll_state: self.scroll_state,
            refresh_effect: RefCell::new(KeyedEffect::new(runtime.clone())),
            load_more_effect: RefCell::new(KeyedEffect::new(runtime)),
            on_refresh: self.on_refresh,
            on_load_more: self.on_load_more,
            first_entry_pending: Cell::new(true),
            first_entry_task: RefCell::new(None),
        });
        let subscriptions = [IndicatorEdge::Header, IndicatorEdge::Footer].map(|edge| {
            let shell: Weak<ShellInner> = Rc::downgrade(&inner);
            inner.state.flag_state(edge).subscribe(move |flag| {
                if let Some(shell) = shell.upgrade() {
                    shell.on_flag(edge, *flag);
                }
            })
        });
        SmartSwipeRefresh {
            inner,
            _subscriptions: subscriptions,
        }
    }
}

fn boxed_callback<F, Fut>(callback: F) -> RefreshCallback
where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Rc::new(move || Box::pin(callback()) as Pin<Box<dyn Future<Output = ()>>>)
}

/// Forwards to whichever arbitrator the container currently holds.
struct ShellConnection {
    shell: Weak<ShellInner>,
}

impl ShellConnection {
    fn current(&self) -> Option<Rc<SmartSwipeRefreshConnection>> {
        self.shell.upgrade().map(|shell| shell.current_connection())
    }
}

impl NestedScrollConnection for ShellConnection {
    fn on_pre_scroll(&self, available: Offset, source: NestedScrollSource) -> Offset {
        self.current()
            .map(|connection| connection.on_pre_scroll(available, source))
            .unwrap_or(Offset::ZERO)
    }

    fn on_post_scroll(&self, consumed: Offset, available: Offset, source: NestedScrollSource) -> Offset {
        self.current()
            .map(|connection| connection.on_post_scroll(consumed, available, source))
            .unwrap_or(Offset::ZERO)
    }

    fn on_pre_fling(&self, available: Velocity) -> FlingFuture<'_> {
        let current = self.current();
        Box::pin(async move {
            match current {
                Some(connection) => connection.on_pre_fling(available).await,
                None => Velocity::ZERO,
            }
        })
    }

    fn on_post_fling(&self, consumed: Velocity, available: Velocity) -> FlingFuture<'_> {
        let current = self.current();
        Box::pin(async move {
            match current {
                Some(connection) => connection.on_post_fling(consumed, available).await,
                None => Velocity::ZERO,
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
