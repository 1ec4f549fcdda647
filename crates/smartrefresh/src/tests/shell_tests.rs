use super::*;

use smartrefresh_core::{DefaultScheduler, Runtime, FRAME_INTERVAL_NANOS};
use smartrefresh_ui_layout::FixedSize;
use std::sync::Arc;

struct Resizable(Cell<f32>);

impl Measurable for Resizable {
    fn measure(&self, constraints: Constraints) -> Size {
        let (width, height) = constraints.constrain(constraints.max_width, self.0.get());
        Size::new(width, height)
    }
}

fn new_state() -> (Runtime, SmartSwipeRefreshState) {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let state = SmartSwipeRefreshState::new(runtime.handle());
    (runtime, state)
}

fn content() -> Rc<dyn Measurable> {
    Rc::new(FixedSize::new(360.0, 640.0))
}

fn screen() -> Constraints {
    Constraints::tight(360.0, 640.0)
}

fn run_frames(runtime: &Runtime, frames: u64) {
    let handle = runtime.handle();
    handle.drain_ui();
    for _ in 0..frames {
        handle.drain_frame_callbacks(handle.frame_time_nanos() + FRAME_INTERVAL_NANOS);
        handle.drain_ui();
    }
}

fn counter() -> (Rc<Cell<u32>>, impl Fn() -> std::future::Ready<()> + 'static) {
    let calls = Rc::new(Cell::new(0));
    let counted = Rc::clone(&calls);
    let callback = move || {
        counted.set(counted.get() + 1);
        std::future::ready(())
    };
    (calls, callback)
}

#[test]
fn measure_places_indicators_around_content() {
    let (_runtime, state) = new_state();
    let shell = SmartSwipeRefresh::builder(state.clone(), content()).build();

    let layout = shell.measure(screen());

    assert_eq!(layout.size, Size::new(360.0, 640.0));
    assert_eq!(layout.header_height, 80.0);
    assert_eq!(layout.footer_height, 80.0);
    assert_eq!(layout.header_y, -80.0);
    assert_eq!(layout.footer_y, 640.0);
    assert_eq!(layout.content, ContentShift::Translate(0.0));
    assert_eq!(state.header_height(), 80.0);
    assert_eq!(shell.connection().footer_height(), 80.0);
}

#[test]
fn default_indicators_scale_with_density() {
    let (_runtime, state) = new_state();
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .density(Density::new(2.0))
        .build();

    let layout = shell.measure(screen());

    assert_eq!(layout.header_height, 160.0);
    assert_eq!(state.footer_height(), 160.0);
}

#[test]
fn disabled_edge_measures_as_zero() {
    let (_runtime, state) = new_state();
    let config = SmartSwipeRefreshConfig::default().with_load_more_enabled(false);
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .config(config)
        .build();

    let layout = shell.measure(screen());

    assert_eq!(layout.header_height, 80.0);
    assert_eq!(layout.footer_height, 0.0);
    assert_eq!(state.footer_height(), 0.0);
    assert_eq!(shell.connection().footer_height(), 0.0);
}

#[test]
fn connection_is_rebuilt_only_when_heights_change() {
    let (_runtime, state) = new_state();
    let header = Rc::new(Resizable(Cell::new(50.0)));
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .header(header.clone())
        .build();

    shell.measure(screen());
    let first = shell.connection();
    shell.measure(screen());
    assert!(Rc::ptr_eq(&first, &shell.connection()));

    header.0.set(64.0);
    shell.measure(screen());

    let rebuilt = shell.connection();
    assert!(!Rc::ptr_eq(&first, &rebuilt));
    assert_eq!(rebuilt.header_height(), 64.0);
    assert_eq!(state.header_height(), 64.0);
}

#[test]
fn entering_refreshing_runs_the_callback_once() {
    let (runtime, state) = new_state();
    let (calls, callback) = counter();
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .on_refresh(callback)
        .build();
    shell.measure(screen());

    state.set_refresh_flag(SmartSwipeStateFlag::Refreshing);
    run_frames(&runtime, 1);
    state.set_refresh_flag(SmartSwipeStateFlag::Refreshing);
    run_frames(&runtime, 1);

    assert_eq!(calls.get(), 1);
}

#[test]
fn load_more_runs_its_own_callback() {
    let (runtime, state) = new_state();
    let (refreshes, on_refresh) = counter();
    let (loads, on_load_more) = counter();
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .on_refresh(on_refresh)
        .on_load_more(on_load_more)
        .build();
    shell.measure(screen());

    state.set_load_more_flag(SmartSwipeStateFlag::Refreshing);
    run_frames(&runtime, 1);

    assert_eq!(loads.get(), 1);
    assert_eq!(refreshes.get(), 0);
}

#[test]
fn first_entry_reveals_header_and_refreshes() {
    let (runtime, state) = new_state();
    let (calls, callback) = counter();
    let scroll = ScrollState::new(0.0);
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .config(SmartSwipeRefreshConfig::default().with_refresh_on_first_entry(true))
        .scroll_state(scroll)
        .on_refresh(callback)
        .build();

    shell.measure(screen());
    runtime.handle().drain_ui();
    let layout = shell.measure(screen());

    assert_eq!(calls.get(), 1);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Refreshing);
    assert_eq!(state.indicator_offset(), 80.0);
    assert!(!state.animation_finished());
    assert_eq!(layout.header_y, 0.0);
    assert_eq!(layout.content, ContentShift::Padding { top: 80.0, bottom: 0.0 });

    shell.measure(screen());
    runtime.handle().drain_ui();
    assert_eq!(calls.get(), 1);
}

#[test]
fn first_entry_refresh_is_off_by_default() {
    let (runtime, state) = new_state();
    let (calls, callback) = counter();
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .on_refresh(callback)
        .build();

    shell.measure(screen());
    runtime.handle().drain_ui();

    assert_eq!(calls.get(), 0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Idle);
}

#[test]
fn result_is_shown_then_settles_to_rest() {
    let (runtime, state) = new_state();
    let finisher = state.clone();
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .config(SmartSwipeRefreshConfig::default().with_refresh_on_first_entry(true))
        .on_refresh(move || {
            let state = finisher.clone();
            async move { state.set_refresh_flag(SmartSwipeStateFlag::Success) }
        })
        .build();
    shell.measure(screen());
    runtime.handle().drain_ui();
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Success);

    run_frames(&runtime, 59);
    assert_eq!(state.indicator_offset(), 80.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Success);

    run_frames(&runtime, 40);
    assert_eq!(state.indicator_offset(), 0.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Idle);
    assert!(state.animation_finished());
    assert!(!state.is_loading());
}

#[test]
fn dropping_the_container_cancels_the_pending_settle() {
    let (runtime, state) = new_state();
    let shell = SmartSwipeRefresh::builder(state.clone(), content())
        .config(SmartSwipeRefreshConfig::default().with_refresh_on_first_entry(true))
        .build();
    shell.measure(screen());
    runtime.handle().drain_ui();
    state.set_refresh_flag(SmartSwipeStateFlag::Error);
    runtime.handle().drain_ui();

    drop(shell);
    run_frames(&runtime, 120);

    assert_eq!(state.indicator_offset(), 80.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Error);
}

#[test]
fn forwarding_connection_goes_quiet_after_drop() {
    let (runtime, state) = new_state();
    let shell = SmartSwipeRefresh::builder(state.clone(), content()).build();
    shell.measure(screen());
    let connection = shell.nested_scroll_connection();

    let claimed = connection.on_post_scroll(Offset::ZERO, Offset::vertical(40.0), NestedScrollSource::Drag);
    runtime.handle().drain_ui();
    assert_eq!(claimed, Offset::vertical(40.0));
    assert_eq!(state.indicator_offset(), 20.0);

    drop(shell);
    let claimed = connection.on_post_scroll(Offset::ZERO, Offset::vertical(40.0), NestedScrollSource::Drag);
    runtime.handle().drain_ui();

    assert_eq!(claimed, Offset::ZERO);
    assert_eq!(state.indicator_offset(), 20.0);
}
