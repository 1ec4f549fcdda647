use super::*;

use smartrefresh_core::{DefaultScheduler, Runtime, RuntimeHandle, FRAME_INTERVAL_NANOS};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn run_frames(handle: &RuntimeHandle, frames: u64) {
    handle.drain_ui();
    let start = handle.frame_time_nanos();
    for frame in 1..=frames {
        handle.drain_frame_callbacks(start + frame * FRAME_INTERVAL_NANOS);
        handle.drain_ui();
    }
}

#[test]
fn tween_interpolates_and_lands_on_target() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let animatable = Animatable::new(0.0f32, handle.clone());
    let samples = Rc::new(RefCell::new(Vec::new()));
    let result = Rc::new(RefCell::new(None));

    {
        let animatable = animatable.clone();
        let samples = Rc::clone(&samples);
        let result = Rc::clone(&result);
        handle
            .spawn_ui(async move {
                let outcome = animatable
                    .animate_to(100.0, AnimationType::Tween(AnimationSpec::linear(100)), |v| {
                        samples.borrow_mut().push(*v)
                    })
                    .await;
                *result.borrow_mut() = Some(outcome);
            })
            .expect("runtime alive");
    }

    run_frames(&handle, 12);

    let outcome = result.borrow().clone().expect("animation finished");
    assert_eq!(outcome.end_reason, AnimationEndReason::Finished);
    assert_eq!(outcome.end_value, 100.0);
    assert_eq!(animatable.value(), 100.0);
    assert!(!animatable.is_running());
    let samples = samples.borrow();
    assert!(samples.iter().any(|v| *v > 0.0 && *v < 100.0));
    assert!(samples.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(samples.last().copied(), Some(100.0));
}

#[test]
fn snap_interrupts_running_animation() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let animatable = Animatable::new(0.0f32, handle.clone());
    let result = Rc::new(RefCell::new(None));

    {
        let animatable = animatable.clone();
        let result = Rc::clone(&result);
        handle
            .spawn_ui(async move {
                let outcome = animatable
                    .animate_to(100.0, AnimationType::default(), |_| {})
                    .await;
                *result.borrow_mut() = Some(outcome);
            })
            .expect("runtime alive");
    }
    run_frames(&handle, 3);
    assert!(animatable.is_running());

    animatable.snap_to(-20.0);
    run_frames(&handle, 1);

    let outcome = result.borrow().clone().expect("animation ended");
    assert_eq!(outcome.end_reason, AnimationEndReason::Interrupted);
    assert_eq!(animatable.value(), -20.0);
    assert_eq!(animatable.target(), -20.0);
}

#[test]
fn animating_to_current_value_finishes_without_frames() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let animatable = Animatable::new(80.0f32, handle.clone());
    let calls = Rc::new(RefCell::new(Vec::new()));

    {
        let animatable = animatable.clone();
        let calls = Rc::clone(&calls);
        handle
            .spawn_ui(async move {
                animatable
                    .animate_to(80.0, AnimationType::default(), |v| calls.borrow_mut().push(*v))
                    .await;
            })
            .expect("runtime alive");
    }
    handle.drain_ui();

    assert_eq!(*calls.borrow(), vec![80.0]);
    assert_eq!(handle.task_count(), 0);
    assert!(!handle.has_frame_callbacks());
}

#[test]
fn spring_settles_on_target() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let animatable = Animatable::new(0.0f32, handle.clone());
    {
        let animatable = animatable.clone();
        handle
            .spawn_ui(async move {
                animatable
                    .animate_to(50.0, AnimationType::Spring(SpringSpec::stiff()), |_| {})
                    .await;
            })
            .expect("runtime alive");
    }

    run_frames(&handle, 120);

    assert_eq!(animatable.value(), 50.0);
    assert!(!animatable.is_running());
}

#[test]
fn easing_curves_pin_their_endpoints() {
    for easing in [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::FastOutSlowIn,
        Easing::LinearOutSlowIn,
        Easing::FastOutLinearIn,
    ] {
        assert_eq!(easing.transform(0.0), 0.0, "{easing:?}");
        assert_eq!(easing.transform(1.0), 1.0, "{easing:?}");
        let mid = easing.transform(0.5);
        assert!(mid > 0.0 && mid < 1.0, "{easing:?} mid {mid}");
    }
}

#[test]
fn dropping_the_animation_leaves_value_in_place() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let animatable = Animatable::new(0.0f32, handle.clone());
    let task = {
        let animatable = animatable.clone();
        handle
            .spawn_ui(async move {
                animatable
                    .animate_to(100.0, AnimationType::Tween(AnimationSpec::linear(300)), |_| {})
                    .await;
            })
            .expect("runtime alive")
    };
    run_frames(&handle, 4);
    let paused_at = animatable.value();
    assert!(paused_at > 0.0 && paused_at < 100.0);

    task.cancel();
    run_frames(&handle, 4);

    assert_eq!(animatable.value(), paused_at);
    assert!(!animatable.is_running());
}
