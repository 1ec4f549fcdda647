use super::*;

use smartrefresh_core::FRAME_INTERVAL_NANOS;

#[test]
fn frames_advance_by_fixed_interval() {
    let runtime = TestRuntime::new();

    runtime.advance_frames(3);

    assert_eq!(runtime.frame_time_nanos(), 3 * FRAME_INTERVAL_NANOS);
}

#[test]
fn advance_millis_reaches_the_deadline() {
    let runtime = TestRuntime::new();

    runtime.advance_millis(100);

    assert!(runtime.frame_time_millis() >= 100);
    assert!(runtime.frame_time_nanos() < 100 * 1_000_000 + FRAME_INTERVAL_NANOS);
}

#[test]
fn spawned_work_runs_on_frames() {
    let runtime = TestRuntime::new();
    let done = Rc::new(Cell::new(false));
    let flag = Rc::clone(&done);
    let clock = runtime.handle().frame_clock();
    runtime.spawn(async move {
        clock.delay(50).await;
        flag.set(true);
    });

    assert!(!done.get());
    assert!(runtime.run_frames_until(10, || done.get()));
}

#[test]
fn fake_list_scroll_range_follows_measure() {
    let list = FakeList::new(20, 56.0);

    let size = list.measure(Constraints::tight(360.0, 640.0));

    assert_eq!(size, Size::new(360.0, 640.0));
    assert_eq!(list.scroll_state().max_value(), 20.0 * 56.0 - 640.0);

    list.set_item_count(5);
    list.measure(Constraints::tight(360.0, 640.0));
    assert_eq!(list.scroll_state().max_value(), 0.0);
}

#[test]
fn call_counter_counts_invocations() {
    let counter = CallCounter::new();
    let callback = counter.callback();

    let _ = callback();
    let _ = callback();

    assert_eq!(counter.count(), 2);
}

struct Inert;

impl NestedScrollConnection for Inert {}

#[test]
fn finger_scrolls_list_against_the_drag() {
    let runtime = TestRuntime::new();
    let list = FakeList::new(40, 50.0);
    list.measure(Constraints::tight(360.0, 500.0));
    let finger = Finger::new(&runtime, Rc::new(Inert), list.scroll_state());

    let consumed = finger.drag(&runtime, -300.0, 3);

    assert_eq!(consumed, -300.0);
    assert_eq!(list.scroll_state().value(), 300.0);
}

#[test]
fn release_finishes_after_list_fling() {
    let runtime = TestRuntime::new();
    let list = FakeList::new(400, 50.0);
    list.measure(Constraints::tight(360.0, 500.0));
    let finger = Finger::new(&runtime, Rc::new(Inert), list.scroll_state());

    let release = finger.release(&runtime, -2000.0);
    assert!(runtime.run_frames_until(600, || release.is_finished()));

    assert!(list.scroll_state().value() > 0.0);
}
