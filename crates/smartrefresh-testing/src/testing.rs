use std::cell::Cell;
use std::future::{Future, Ready};
use std::rc::Rc;
use std::sync::Arc;

use smartrefresh::{NestedScrollConnection, NestedScrollDispatcher, NestedScrollSource, ScrollState};
use smartrefresh_core::{DefaultScheduler, Runtime, RuntimeHandle, TaskHandle, FRAME_INTERVAL_NANOS};
use smartrefresh_ui_layout::{Constraints, Measurable, Offset, Size, Velocity};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// A UI runtime whose frames only advance when the test says so.
///
/// Every frame is [`FRAME_INTERVAL_NANOS`] after the previous one, and each
/// frame is followed by draining all ready tasks.
pub struct TestRuntime {
    runtime: Runtime,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self {
            runtime: Runtime::new(Arc::new(DefaultScheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn frame_time_nanos(&self) -> u64 {
        self.runtime.handle().frame_time_nanos()
    }

    pub fn frame_time_millis(&self) -> u64 {
        self.frame_time_nanos() / NANOS_PER_MILLI
    }

    /// Spawns `future` and polls it until nothing is ready.
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> TaskHandle {
        let handle = self.runtime.handle();
        let task = handle
            .spawn_ui(future)
            .expect("test runtime is owned by the test");
        handle.drain_ui();
        task
    }

    /// Polls ready tasks without producing a frame.
    pub fn run_until_idle(&self) {
        self.runtime.handle().drain_ui();
    }

    pub fn advance_frame(&self) {
        let handle = self.runtime.handle();
        handle.drain_ui();
        handle.drain_frame_callbacks(handle.frame_time_nanos() + FRAME_INTERVAL_NANOS);
        handle.drain_ui();
    }

    pub fn advance_frames(&self, frames: u64) {
        for _ in 0..frames {
            self.advance_frame();
        }
    }

    /// Produces frames until at least `millis` of frame time has passed.
    pub fn advance_millis(&self, millis: u64) {
        let deadline = self.frame_time_nanos() + millis * NANOS_PER_MILLI;
        while self.frame_time_nanos() < deadline {
            self.advance_frame();
        }
    }

    /// Produces frames until `done` holds, at most `max_frames` of them.
    /// Returns whether `done` was reached.
    pub fn run_frames_until(&self, max_frames: u64, mut done: impl FnMut() -> bool) -> bool {
        self.run_until_idle();
        for _ in 0..max_frames {
            if done() {
                return true;
            }
            self.advance_frame();
        }
        done()
    }
}

impl Default for TestRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// A list of equally tall rows that fills its viewport.
///
/// Measuring it updates the scroll range of its [`ScrollState`].
pub struct FakeList {
    scroll: ScrollState,
    item_count: Cell<usize>,
    item_height: f32,
}

impl FakeList {
    pub fn new(item_count: usize, item_height: f32) -> Self {
        Self {
            scroll: ScrollState::new(0.0),
            item_count: Cell::new(item_count),
            item_height,
        }
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll.clone()
    }

    pub fn item_count(&self) -> usize {
        self.item_count.get()
    }

    pub fn set_item_count(&self, count: usize) {
        self.item_count.set(count);
    }

    pub fn content_height(&self) -> f32 {
        self.item_count.get() as f32 * self.item_height
    }
}

impl Measurable for FakeList {
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

/// Counts how often a refresh callback ran.
#[derive(Clone, Default)]
pub struct CallCounter {
    calls: Rc<Cell<u32>>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.calls.get()
    }

    /// A callback that bumps the count and completes at once.
    pub fn callback(&self) -> impl Fn() -> Ready<()> + 'static {
        let calls = Rc::clone(&self.calls);
        move || {
            calls.set(calls.get() + 1);
            std::future::ready(())
        }
    }
}

/// Scripted gestures against a nested scroll parent and a list.
///
/// Positive deltas move the finger down.
pub struct Finger {
    dispatcher: Rc<NestedScrollDispatcher>,
}

impl Finger {
    pub fn new(runtime: &TestRuntime, connection: Rc<dyn NestedScrollConnection>, list: ScrollState) -> Self {
        Self {
            dispatcher: Rc::new(NestedScrollDispatcher::new(connection, list, runtime.handle())),
        }
    }

    pub fn dispatcher(&self) -> &NestedScrollDispatcher {
        &self.dispatcher
    }

    /// Moves `total` pixels in `steps` equal drag events, letting the
    /// runtime apply each claim before the next event. Returns the total
    /// consumed.
    pub fn drag(&self, runtime: &TestRuntime, total: f32, steps: u32) -> f32 {
        let steps = steps.max(1);
        let step = total / steps as f32;
        let mut consumed = 0.0;
        for _ in 0..steps {
            consumed += self
                .dispatcher
                .dispatch_scroll(Offset::vertical(step), NestedScrollSource::Drag)
                .y;
            runtime.run_until_idle();
        }
        consumed
    }

    /// Lifts the finger with `velocity`. The fling keeps running on the
    /// runtime; poll the returned handle for its result.
    pub fn release(&self, runtime: &TestRuntime, velocity: f32) -> FingerRelease {
        let result = Rc::new(Cell::new(None));
        let slot = Rc::clone(&result);
        let dispatcher = Rc::clone(&self.dispatcher);
        let task = runtime.spawn(async move {
            let consumed = dispatcher.dispatch_fling(Velocity::vertical(velocity)).await;
            slot.set(Some(consumed));
        });
        FingerRelease { result, task }
    }
}

/// A release in flight.
pub struct FingerRelease {
    result: Rc<Cell<Option<Velocity>>>,
    task: TaskHandle,
}

impl FingerRelease {
    /// Total velocity consumed, once the fling chain has finished.
    pub fn consumed(&self) -> Option<Velocity> {
        self.result.get()
    }

    pub fn is_finished(&self) -> bool {
        self.result.get().is_some()
    }

    pub fn cancel(self) {
        self.task.cancel();
    }
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
