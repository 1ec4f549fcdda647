use super::*;
use crate::platform::DefaultScheduler;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn new_runtime() -> Runtime {
    Runtime::new(Arc::new(DefaultScheduler))
}

#[test]
fn spawned_task_runs_on_drain() {
    let runtime = new_runtime();
    let handle = runtime.handle();
    let ran = Rc::new(Cell::new(false));
    let flag = Rc::clone(&ran);
    handle.spawn_ui(async move { flag.set(true) }).expect("runtime alive");

    assert!(!ran.get());
    assert!(handle.has_pending_ui());
    handle.drain_ui();
    assert!(ran.get());
    assert_eq!(handle.task_count(), 0);
}

#[test]
fn frame_suspended_task_resumes_with_frame_time() {
    let runtime = new_runtime();
    let handle = runtime.handle();
    let clock = runtime.frame_clock();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    handle
        .spawn_ui(async move {
            let first = clock.next_frame().await;
            let second = clock.next_frame().await;
            sink.borrow_mut().extend([first, second]);
        })
        .expect("runtime alive");

    handle.drain_ui();
    assert!(runtime.needs_frame());
    handle.drain_frame_callbacks(100);
    handle.drain_ui();
    handle.drain_frame_callbacks(200);
    handle.drain_ui();

    assert_eq!(*seen.borrow(), vec![100, 200]);
    assert_eq!(handle.task_count(), 0);
}

#[test]
fn cancelled_task_never_completes() {
    let runtime = new_runtime();
    let handle = runtime.handle();
    let clock = runtime.frame_clock();
    let done = Rc::new(Cell::new(false));
    let flag = Rc::clone(&done);
    let task = handle
        .spawn_ui(async move {
            clock.next_frame().await;
            flag.set(true);
        })
        .expect("runtime alive");
    handle.drain_ui();

    task.cancel();
    handle.drain_frame_callbacks(16);
    handle.drain_ui();

    assert!(!done.get());
    assert_eq!(handle.task_count(), 0);
    assert!(!handle.has_frame_callbacks());
}

#[test]
fn task_can_cancel_a_sibling_in_the_same_batch() {
    let runtime = new_runtime();
    let handle = runtime.handle();
    let clock = runtime.frame_clock();
    let sibling_done = Rc::new(Cell::new(false));
    let sibling_slot: Rc<RefCell<Option<TaskHandle>>> = Rc::new(RefCell::new(None));

    {
        let slot = Rc::clone(&sibling_slot);
        let clock = clock.clone();
        handle
            .spawn_ui(async move {
                clock.next_frame().await;
                if let Some(sibling) = slot.borrow_mut().take() {
                    sibling.cancel();
                }
            })
            .expect("runtime alive");
    }
    {
        let flag = Rc::clone(&sibling_done);
        let sibling = handle
            .spawn_ui(async move {
                clock.next_frame().await;
                flag.set(true);
            })
            .expect("runtime alive");
        *sibling_slot.borrow_mut() = Some(sibling);
    }

    handle.drain_ui();
    handle.drain_frame_callbacks(16);
    handle.drain_ui();

    assert!(!sibling_done.get());
    assert_eq!(handle.task_count(), 0);
}

#[test]
fn delay_waits_for_enough_frame_time() {
    let runtime = new_runtime();
    let handle = runtime.handle();
    let clock = runtime.frame_clock();
    let done = Rc::new(Cell::new(false));
    let flag = Rc::clone(&done);
    handle
        .spawn_ui(async move {
            clock.delay(50).await;
            flag.set(true);
        })
        .expect("runtime alive");
    handle.drain_ui();

    let mut time = 0;
    for _ in 0..2 {
        time += crate::FRAME_INTERVAL_NANOS;
        handle.drain_frame_callbacks(time);
        handle.drain_ui();
    }
    assert!(!done.get(), "two frames are ~33ms");

    time += crate::FRAME_INTERVAL_NANOS;
    handle.drain_frame_callbacks(time);
    handle.drain_ui();
    assert!(done.get());
}

#[test]
fn dropped_runtime_rejects_spawns() {
    let runtime = new_runtime();
    let handle = runtime.handle();
    drop(runtime);
    assert!(!handle.is_alive());
    assert!(handle.spawn_ui(async {}).is_none());
}

#[test]
fn local_tasks_run_before_async_tasks_in_a_drain() {
    let runtime = new_runtime();
    let handle = runtime.handle();
    let order = Rc::new(RefCell::new(Vec::new()));
    {
        let order = Rc::clone(&order);
        handle
            .spawn_ui(async move { order.borrow_mut().push("async") })
            .expect("runtime alive");
    }
    {
        let order = Rc::clone(&order);
        handle.enqueue_ui_task(Box::new(move || order.borrow_mut().push("local")));
    }
    handle.drain_ui();
    assert_eq!(*order.borrow(), vec!["local", "async"]);
}

#[test]
fn cancelled_frame_wait_withdraws_its_callback() {
    let runtime = new_runtime();
    let handle = runtime.handle();
    let clock = runtime.frame_clock();
    let task = handle
        .spawn_ui(async move {
            clock.next_frame().await;
        })
        .expect("runtime alive");
    handle.drain_ui();
    assert!(runtime.needs_frame());

    task.cancel();

    assert!(!runtime.needs_frame());
}
