//! The demo screen: a topic list inside a [`SmartSwipeRefresh`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use smartrefresh::{
    Constraints, Density, Dp, IndicatorModel, Measurable, NestedScrollDispatcher, NestedScrollSource,
    Offset, RefreshIndicator, ScrollState, Size, SmartSwipeLayout, SmartSwipeRefresh,
    SmartSwipeRefreshConfig, SmartSwipeRefreshState, SmartSwipeStateFlag, ThresholdStrategy,
    Velocity, INDICATOR_HEIGHT,
};
use smartrefresh_core::{RuntimeHandle, Subscription, TaskHandle};

use crate::view_model::MainViewModel;

pub const ROW_HEIGHT: Dp = Dp(56.0);

/// Rows of the view model's topics, one [`ROW_HEIGHT`] each.
pub struct TopicList {
    scroll: ScrollState,
    view_model: Rc<MainViewModel>,
    row_height: f32,
}

impl TopicList {
    pub fn new(view_model: Rc<MainViewModel>, density: Density) -> Self {
        Self {
            scroll: ScrollState::new(0.0),
            view_model,
            row_height: ROW_HEIGHT.to_px(density),
        }
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll.clone()
    }

    pub fn content_height(&self) -> f32 {
        self.view_model.item_count() as f32 * self.row_height
    }
}

impl Measurable for TopicList {
    fn measure(&self, constraints: Constraints) -> Size {
        let content = self.content_height();
        let viewport = if constraints.has_bounded_height() {
            constraints.max_height
        } else {
            content
        };
        let (width, height) = constraints.constrain(constraints.max_width, viewport);
        self.scroll.set_max_value(content - height);
        Size::new(width, height)
    }
}

/// What the screen shows at one moment.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenSnapshot {
    pub offset: f32,
    pub refresh_flag: SmartSwipeStateFlag,
    pub load_more_flag: SmartSwipeStateFlag,
    pub header: IndicatorModel,
    pub footer: IndicatorModel,
    pub item_count: usize,
    pub first_title: Option<String>,
    pub scroll: f32,
}

impl fmt::Display for ScreenSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offset {:.1} | header {:?} \"{}\" | footer {:?} \"{}\" | {} topics, scrolled {:.0}",
            self.offset,
            self.refresh_flag,
            self.header.label,
            self.load_more_flag,
            self.footer.label,
            self.item_count,
            self.scroll,
        )?;
        if let Some(title) = &self.first_title {
            write!(f, ", first \"{title}\"")?;
        }
        Ok(())
    }
}

/// Counts a fling as running until its task ends or is cancelled.
struct FlingInFlight(Rc<Cell<u32>>);

impl Drop for FlingInFlight {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

pub struct DemoScreen {
    runtime: RuntimeHandle,
    state: SmartSwipeRefreshState,
    view_model: Rc<MainViewModel>,
    list: Rc<TopicList>,
    header: Rc<RefreshIndicator>,
    footer: Rc<RefreshIndicator>,
    shell: SmartSwipeRefresh,
    dispatcher: Rc<NestedScrollDispatcher>,
    flings: Rc<Cell<u32>>,
    constraints: Constraints,
    _results: Subscription,
}

impl DemoScreen {
    /// Refreshes on first entry. Flings may not reveal the header but may
    /// pull the footer out by one indicator height.
    pub fn new(runtime: RuntimeHandle, density: Density, constraints: Constraints) -> Self {
        let state = SmartSwipeRefreshState::new(runtime.clone());
        let view_model = Rc::new(MainViewModel::new(runtime.clone()));
        let list = Rc::new(TopicList::new(Rc::clone(&view_model), density));
        let header = Rc::new(RefreshIndicator::header(&state, density));
        let footer = Rc::new(RefreshIndicator::footer(&state, density));
        let config = SmartSwipeRefreshConfig::default()
            .with_fling_strategies(
                ThresholdStrategy::None,
                ThresholdStrategy::Fixed(INDICATOR_HEIGHT.to_px(density)),
            )
            .with_refresh_on_first_entry(true);

        let refresher = Rc::clone(&view_model);
        let loader = Rc::clone(&view_model);
        let shell = SmartSwipeRefresh::builder(state.clone(), list.clone())
            .config(config)
            .header(header.clone())
            .footer(footer.clone())
            .scroll_state(list.scroll_state())
            .density(density)
            .on_refresh(move || {
                let view_model = Rc::clone(&refresher);
                async move { view_model.fill_data(true).await }
            })
            .on_load_more(move || {
                let view_model = Rc::clone(&loader);
                async move { view_model.fill_data(false).await }
            })
            .build();

        let flags = state.clone();
        let results = view_model.subscribe(move |ui_state| {
            let Some(ui_state) = ui_state else {
                return;
            };
            let flag = if ui_state.succeeded {
                SmartSwipeStateFlag::Success
            } else {
                SmartSwipeStateFlag::Error
            };
            if ui_state.is_load_more {
                flags.set_load_more_flag(flag);
            } else {
                flags.set_refresh_flag(flag);
            }
        });

        let dispatcher = Rc::new(NestedScrollDispatcher::new(
            shell.nested_scroll_connection(),
            list.scroll_state(),
            runtime.clone(),
        ));

        Self {
            runtime,
            state,
            view_model,
            list,
            header,
            footer,
            shell,
            dispatcher,
            flings: Rc::new(Cell::new(0)),
            constraints,
            _results: results,
        }
    }

    pub fn state(&self) -> &SmartSwipeRefreshState {
        &self.state
    }

    pub fn view_model(&self) -> &MainViewModel {
        &self.view_model
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.list.scroll_state()
    }

    pub fn layout(&self) -> SmartSwipeLayout {
        self.shell.measure(self.constraints)
    }

    /// One drag event; positive moves the finger down. Returns what the
    /// indicator and the list consumed together.
    pub fn drag(&self, delta: f32) -> f32 {
        self.dispatcher
            .dispatch_scroll(Offset::vertical(delta), NestedScrollSource::Drag)
            .y
    }

    /// Lifts the finger. The fling runs on the UI runtime.
    pub fn release(&self, velocity: f32) -> Option<TaskHandle> {
        let dispatcher = Rc::clone(&self.dispatcher);
        self.flings.set(self.flings.get() + 1);
        let in_flight = FlingInFlight(Rc::clone(&self.flings));
        self.runtime.spawn_ui(async move {
            let _in_flight = in_flight;
            dispatcher.dispatch_fling(Velocity::vertical(velocity)).await;
        })
    }

    /// A released fling, including its spring back, has not finished yet.
    pub fn is_flinging(&self) -> bool {
        self.flings.get() > 0
    }

    /// No fling is running, the indicator is at rest and neither edge has
    /// anything to show.
    pub fn is_settled(&self) -> bool {
        let state = &self.state;
        !self.is_flinging()
            && state.indicator_offset() == 0.0
            && state.animation_finished()
            && state.refresh_flag() == SmartSwipeStateFlag::Idle
            && state.load_more_flag() == SmartSwipeStateFlag::Idle
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot {
            offset: self.state.indicator_offset(),
            refresh_flag: self.state.refresh_flag(),
            load_more_flag: self.state.load_more_flag(),
            header: self.header.model(),
            footer: self.footer.model(),
            item_count: self.view_model.item_count(),
            first_title: self.view_model.first_title(),
            scroll: self.list.scroll_state().value(),
        }
    }
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
