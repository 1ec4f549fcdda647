use super::*;

use smartrefresh_core::{DefaultScheduler, Runtime, FRAME_INTERVAL_NANOS};
use std::cell::Cell;
use std::future::Future;
use std::sync::Arc;

fn new_state() -> (Runtime, SmartSwipeRefreshState) {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let state = SmartSwipeRefreshState::new(runtime.handle());
    state.set_indicator_heights(80.0, 80.0);
    (runtime, state)
}

fn run(runtime: &Runtime, future: impl Future<Output = ()> + 'static) {
    let handle = runtime.handle();
    handle.spawn_ui(future).expect("runtime alive");
    handle.drain_ui();
}

fn run_frames(runtime: &Runtime, frames: u64) {
    let handle = runtime.handle();
    handle.drain_ui();
    for _ in 0..frames {
        handle.drain_frame_callbacks(handle.frame_time_nanos() + FRAME_INTERVAL_NANOS);
        handle.drain_ui();
    }
}

fn snap(runtime: &Runtime, state: &SmartSwipeRefreshState, value: f32) {
    let state = state.clone();
    run(runtime, async move { state.snap_offset_to(value).await });
}

#[test]
fn snap_tracks_thresholds_on_both_edges() {
    let (runtime, state) = new_state();

    snap(&runtime, &state, 30.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::TipsDown);
    assert!(state.header_is_show());

    snap(&runtime, &state, 80.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::TipsRelease);

    snap(&runtime, &state, -20.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Idle);
    assert_eq!(state.load_more_flag(), SmartSwipeStateFlag::TipsDown);
    assert!(state.footer_is_show());

    snap(&runtime, &state, -95.0);
    assert_eq!(state.load_more_flag(), SmartSwipeStateFlag::TipsRelease);

    snap(&runtime, &state, 0.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Idle);
    assert_eq!(state.load_more_flag(), SmartSwipeStateFlag::Idle);
    assert!(!state.header_is_show() && !state.footer_is_show());
}

#[test]
fn repeated_snap_changes_nothing() {
    let (runtime, state) = new_state();
    let transitions = Rc::new(Cell::new(0));
    let _subscription = {
        let transitions = Rc::clone(&transitions);
        state.subscribe_refresh_flag(move |_| transitions.set(transitions.get() + 1))
    };

    snap(&runtime, &state, 50.0);
    snap(&runtime, &state, 50.0);

    assert_eq!(state.indicator_offset(), 50.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::TipsDown);
    assert_eq!(transitions.get(), 1);
}

#[test]
fn snaps_leave_busy_flags_alone() {
    let (runtime, state) = new_state();
    state.set_refresh_flag(SmartSwipeStateFlag::Refreshing);

    snap(&runtime, &state, 10.0);
    snap(&runtime, &state, 0.0);

    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Refreshing);
    assert!(state.is_loading());
}

#[test]
fn header_without_height_never_asks_for_release() {
    let (runtime, state) = new_state();
    state.set_indicator_heights(0.0, 80.0);

    snap(&runtime, &state, 500.0);

    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::TipsDown);
}

#[test]
fn snap_interrupts_settle_animation() {
    let (runtime, state) = new_state();
    snap(&runtime, &state, 80.0);

    {
        let state = state.clone();
        run(&runtime, async move { state.animate_offset_to(0.0).await });
    }
    run_frames(&runtime, 4);
    let midway = state.indicator_offset();
    assert!(midway > 0.0 && midway < 80.0, "offset {midway}");
    assert!(state.is_animating());

    snap(&runtime, &state, 40.0);
    assert_eq!(state.indicator_offset(), 40.0);
    assert!(!state.is_animating());

    run_frames(&runtime, 30);
    assert_eq!(state.indicator_offset(), 40.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::TipsDown);
}

#[test]
fn settling_at_zero_finishes_and_clears_results() {
    let (runtime, state) = new_state();
    snap(&runtime, &state, 80.0);
    state.set_animation_finished(false);
    state.set_refresh_flag(SmartSwipeStateFlag::Success);
    assert!(state.is_loading());

    {
        let state = state.clone();
        run(&runtime, async move { state.animate_offset_to(0.0).await });
    }
    run_frames(&runtime, 5);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Success);
    assert!(!state.animation_finished());

    run_frames(&runtime, 30);
    assert_eq!(state.indicator_offset(), 0.0);
    assert!(state.animation_finished());
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Idle);
    assert!(!state.is_loading());
}

#[test]
fn settling_keeps_a_running_refresh() {
    let (runtime, state) = new_state();
    snap(&runtime, &state, 30.0);
    state.set_refresh_flag(SmartSwipeStateFlag::Refreshing);

    {
        let state = state.clone();
        run(&runtime, async move { state.animate_offset_to(0.0).await });
    }
    run_frames(&runtime, 30);

    assert_eq!(state.indicator_offset(), 0.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Refreshing);
}

#[test]
fn init_refresh_reveals_header_and_refreshes() {
    let (runtime, state) = new_state();
    {
        let state = state.clone();
        run(&runtime, async move { state.init_refresh().await });
    }

    assert_eq!(state.indicator_offset(), 80.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Refreshing);
    assert!(!state.animation_finished());
    assert!(state.is_loading());
}

#[test]
fn dispatched_delta_is_projected_until_applied() {
    let (runtime, state) = new_state();

    state.dispatch_offset_delta(100.0, 0.0, 80.0);
    assert_eq!(state.indicator_offset(), 0.0);
    assert_eq!(state.projected_offset(), 100.0);

    runtime.handle().drain_ui();
    assert_eq!(state.indicator_offset(), 80.0);
    assert_eq!(state.projected_offset(), 80.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::TipsRelease);
}

#[test]
fn queued_deltas_apply_in_order() {
    let (runtime, state) = new_state();

    state.dispatch_offset_delta(-30.0, f32::NEG_INFINITY, 0.0);
    state.dispatch_offset_delta(20.0, f32::NEG_INFINITY, 0.0);
    state.dispatch_offset_delta(20.0, f32::NEG_INFINITY, 0.0);
    runtime.handle().drain_ui();

    assert_eq!(state.indicator_offset(), 0.0);
    assert_eq!(state.projected_offset(), 0.0);
    assert_eq!(state.load_more_flag(), SmartSwipeStateFlag::Idle);
}

#[test]
fn settle_waits_for_claims_dispatched_before_it_runs() {
    let (runtime, state) = new_state();
    snap(&runtime, &state, 30.0);

    // The settle task is polled first, with a claim still queued behind it.
    {
        let state = state.clone();
        runtime
            .handle()
            .spawn_ui(async move { state.animate_offset_to(0.0).await })
            .expect("runtime alive");
    }
    state.dispatch_offset_delta(10.0, 0.0, 40.0);
    assert_eq!(state.pending_applies(), 1);

    runtime.handle().drain_ui();
    assert_eq!(state.pending_applies(), 0);
    assert_eq!(state.indicator_offset(), 40.0);

    run_frames(&runtime, 40);
    assert_eq!(state.indicator_offset(), 0.0);
    assert_eq!(state.refresh_flag(), SmartSwipeStateFlag::Idle);
    assert!(state.animation_finished());
    assert!(!state.is_animating());
}

#[test]
fn pending_applied_resolves_once_the_queue_drains() {
    let (runtime, state) = new_state();
    let done = Rc::new(Cell::new(false));

    state.dispatch_offset_delta(-10.0, f32::NEG_INFINITY, 0.0);
    state.dispatch_offset_delta(-10.0, f32::NEG_INFINITY, 0.0);
    {
        let (state, done) = (state.clone(), Rc::clone(&done));
        runtime
            .handle()
            .spawn_ui(async move {
                state.pending_applied().await;
                done.set(true);
            })
            .expect("runtime alive");
    }
    assert!(!done.get());

    runtime.handle().drain_ui();
    assert!(done.get());
    assert_eq!(state.indicator_offset(), -20.0);
    assert_eq!(state.projected_offset(), -20.0);
}
