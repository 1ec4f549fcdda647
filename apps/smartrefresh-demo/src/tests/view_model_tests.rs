use super::*;

use std::rc::Rc;

use smartrefresh_testing::TestRuntime;

fn fill(runtime: &TestRuntime, view_model: &Rc<MainViewModel>, is_refresh: bool) {
    let view_model = Rc::clone(view_model);
    runtime.spawn(async move { view_model.fill_data(is_refresh).await });
    runtime.advance_millis(FETCH_DELAY_MILLIS + 50);
}

#[test]
fn fetch_waits_on_the_frame_clock() {
    let runtime = TestRuntime::new();
    let view_model = Rc::new(MainViewModel::new(runtime.handle()));
    let filler = Rc::clone(&view_model);
    runtime.spawn(async move { filler.fill_data(true).await });

    runtime.advance_millis(FETCH_DELAY_MILLIS - 100);
    assert_eq!(view_model.ui_state(), None);

    runtime.advance_millis(150);
    let state = view_model.ui_state().expect("fetch finished");
    assert!(state.succeeded);
    assert!(!state.is_load_more);
    assert_eq!(state.data.len(), 22);
}

#[test]
fn refresh_stamps_the_first_title() {
    let runtime = TestRuntime::new();
    let view_model = Rc::new(MainViewModel::new(runtime.handle()));

    fill(&runtime, &view_model, true);

    let title = view_model.first_title().expect("data present");
    assert!(title.parse::<i64>().is_ok(), "title {title}");
    let state = view_model.ui_state().expect("data present");
    assert_eq!(state.data[1].title, "Beauty");
}

#[test]
fn failures_alternate_and_keep_the_list() {
    let runtime = TestRuntime::new();
    let view_model = Rc::new(MainViewModel::new(runtime.handle()));
    fill(&runtime, &view_model, true);

    fill(&runtime, &view_model, false);
    let failed = view_model.ui_state().expect("result published");
    assert!(!failed.succeeded);
    assert!(failed.is_load_more);
    assert_eq!(failed.data.len(), 22);

    fill(&runtime, &view_model, false);
    let loaded = view_model.ui_state().expect("result published");
    assert!(loaded.succeeded);
    assert_eq!(loaded.data.len(), 44);
    assert_eq!(view_model.item_count(), 44);
}

#[test]
fn every_result_notifies_subscribers() {
    let runtime = TestRuntime::new();
    let view_model = Rc::new(MainViewModel::new(runtime.handle()));
    let seen = Rc::new(std::cell::Cell::new(0));
    let counter = Rc::clone(&seen);
    let _subscription = view_model.subscribe(move |_| counter.set(counter.get() + 1));

    fill(&runtime, &view_model, true);
    fill(&runtime, &view_model, true);
    fill(&runtime, &view_model, true);

    assert_eq!(seen.get(), 3);
}

#[test]
fn fetch_error_names_the_operation() {
    assert_eq!(
        FetchError::Simulated { is_refresh: true }.to_string(),
        "simulated refresh failure"
    );
    assert_eq!(
        FetchError::Simulated { is_refresh: false }.to_string(),
        "simulated load failure"
    );
}
