use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread::ThreadId;

use crate::frame_clock::FrameClock;
use crate::platform::RuntimeScheduler;

pub type FrameCallbackId = u64;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    frame_callbacks: RefCell<VecDeque<FrameCallbackEntry>>,
    next_frame_callback_id: Cell<u64>,
    frame_time_nanos: Cell<u64>,
    local_tasks: RefCell<VecDeque<Box<dyn FnOnce() + 'static>>>,
    tasks: RefCell<Vec<TaskEntry>>,
    next_task_id: Cell<u64>,
    // Tasks cancelled while their batch was taken out for polling.
    cancelled_while_polling: RefCell<Vec<u64>>,
    polling: Cell<bool>,
    task_waker: RefCell<Option<Waker>>,
    woken: Arc<AtomicBool>,
    ui_thread_id: ThreadId,
}

struct TaskEntry {
    id: u64,
    future: Pin<Box<dyn Future<Output = ()> + 'static>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            needs_frame: Cell::new(false),
            frame_callbacks: RefCell::new(VecDeque::new()),
            next_frame_callback_id: Cell::new(1),
            frame_time_nanos: Cell::new(0),
            local_tasks: RefCell::new(VecDeque::new()),
            tasks: RefCell::new(Vec::new()),
            next_task_id: Cell::new(1),
            cancelled_while_polling: RefCell::new(Vec::new()),
            polling: Cell::new(false),
            task_waker: RefCell::new(None),
            woken: Arc::new(AtomicBool::new(false)),
            ui_thread_id: std::thread::current().id(),
        }
    }

    fn init_task_waker(this: &Rc<Self>) {
        let waker = RuntimeTaskWaker {
            scheduler: Arc::clone(&this.scheduler),
            woken: Arc::clone(&this.woken),
        }
        .into_waker();
        *this.task_waker.borrow_mut() = Some(waker);
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    /// Queues a closure on the UI thread's local queue.
    ///
    /// The closure may capture `Rc`/`RefCell` values because it never leaves the
    /// runtime thread.
    fn enqueue_ui_task(&self, task: Box<dyn FnOnce() + 'static>) {
        self.local_tasks.borrow_mut().push_back(task);
        self.schedule();
    }

    fn spawn_ui_task(&self, future: Pin<Box<dyn Future<Output = ()> + 'static>>) -> u64 {
        let id = self.next_task_id.get();
        self.next_task_id.set(id + 1);
        self.tasks.borrow_mut().push(TaskEntry { id, future });
        // New tasks get their first poll on the next drain.
        self.woken.store(true, Ordering::SeqCst);
        self.schedule();
        id
    }

    fn cancel_task(&self, id: u64) {
        let removed = {
            let mut tasks = self.tasks.borrow_mut();
            tasks
                .iter()
                .position(|entry| entry.id == id)
                .map(|index| tasks.remove(index))
        };
        match removed {
            // Dropped outside the borrow: a future's destructor may spawn or cancel.
            Some(entry) => drop(entry),
            None if self.polling.get() => self.cancelled_while_polling.borrow_mut().push(id),
            None => {}
        }
    }

    fn is_cancelled_while_polling(&self, id: u64) -> bool {
        self.cancelled_while_polling.borrow().contains(&id)
    }

    fn poll_async_tasks(&self) -> bool {
        let waker = match self.task_waker.borrow().as_ref() {
            Some(waker) => waker.clone(),
            None => return false,
        };
        self.woken.store(false, Ordering::SeqCst);
        let mut cx = Context::from_waker(&waker);
        let batch = std::mem::take(&mut *self.tasks.borrow_mut());
        let mut pending = Vec::with_capacity(batch.len());
        let mut made_progress = false;
        self.polling.set(true);
        for mut entry in batch {
            if self.is_cancelled_while_polling(entry.id) {
                continue;
            }
            match entry.future.as_mut().poll(&mut cx) {
                Poll::Ready(()) => made_progress = true,
                Poll::Pending => pending.push(entry),
            }
        }
        self.polling.set(false);
        let cancelled = std::mem::take(&mut *self.cancelled_while_polling.borrow_mut());
        let (survivors, dropped): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|entry| !cancelled.contains(&entry.id));
        if !survivors.is_empty() {
            let mut tasks = self.tasks.borrow_mut();
            // Keep spawn order: survivors were spawned before anything added while polling.
            let spawned_meanwhile = std::mem::take(&mut *tasks);
            tasks.extend(survivors);
            tasks.extend(spawned_meanwhile);
        }
        if !dropped.is_empty() {
            made_progress = true;
            drop(dropped);
        }
        made_progress || self.woken.swap(false, Ordering::SeqCst)
    }

    fn drain_ui(&self) {
        loop {
            let mut executed = false;

            loop {
                let task = self.local_tasks.borrow_mut().pop_front();
                match task {
                    Some(task) => {
                        executed = true;
                        task();
                    }
                    None => break,
                }
            }

            if self.poll_async_tasks() {
                executed = true;
            }

            if !executed {
                break;
            }
        }
    }

    fn has_pending_ui(&self) -> bool {
        let local_pending = self
            .local_tasks
            .try_borrow()
            .map(|tasks| !tasks.is_empty())
            .unwrap_or(true);
        local_pending || self.woken.load(Ordering::SeqCst)
    }

    fn task_count(&self) -> usize {
        self.tasks.try_borrow().map(|tasks| tasks.len()).unwrap_or(0)
    }

    fn register_frame_callback(&self, callback: Box<dyn FnOnce(u64) + 'static>) -> FrameCallbackId {
        let id = self.next_frame_callback_id.get();
        self.next_frame_callback_id.set(id + 1);
        self.frame_callbacks
            .borrow_mut()
            .push_back(FrameCallbackEntry {
                id,
                callback: Some(callback),
            });
        self.schedule();
        id
    }

    fn cancel_frame_callback(&self, id: FrameCallbackId) {
        let removed = {
            let mut callbacks = self.frame_callbacks.borrow_mut();
            callbacks
                .iter()
                .position(|entry| entry.id == id)
                .and_then(|index| callbacks.remove(index))
        };
        drop(removed);
        if !self.has_frame_callbacks() && !self.has_pending_ui() {
            self.needs_frame.set(false);
        }
    }

    fn has_frame_callbacks(&self) -> bool {
        self.frame_callbacks
            .try_borrow()
            .map(|callbacks| !callbacks.is_empty())
            .unwrap_or(true)
    }

    fn drain_frame_callbacks(&self, frame_time_nanos: u64) {
        self.frame_time_nanos.set(frame_time_nanos);
        let pending: Vec<Box<dyn FnOnce(u64) + 'static>> = {
            let mut callbacks = self.frame_callbacks.borrow_mut();
            callbacks
                .drain(..)
                .filter_map(|mut entry| entry.callback.take())
                .collect()
        };
        for callback in pending {
            callback(frame_time_nanos);
        }
        if !self.has_frame_callbacks() && !self.has_pending_ui() {
            self.needs_frame.set(false);
        }
    }
}

/// Owner of the UI runtime. Dropping it makes every handle inert.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        let inner = Rc::new(RuntimeInner::new(scheduler));
        RuntimeInner::init_task_waker(&inner);
        Self { inner }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
            ui_thread_id: self.inner.ui_thread_id,
        }
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get() || self.inner.has_frame_callbacks()
    }

    pub fn set_needs_frame(&self, value: bool) {
        self.inner.needs_frame.set(value);
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.handle())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("tasks", &self.inner.task_count())
            .field("frame_time_nanos", &self.inner.frame_time_nanos.get())
            .finish()
    }
}

#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
    ui_thread_id: ThreadId,
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[derive(Debug)]
pub struct TaskHandle {
    id: u64,
    runtime: RuntimeHandle,
}

impl RuntimeHandle {
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn schedule(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.schedule();
        }
    }

    /// Schedules work that must run on the runtime thread.
    ///
    /// Runs inline when the runtime is already gone.
    pub fn enqueue_ui_task(&self, task: Box<dyn FnOnce() + 'static>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.enqueue_ui_task(task);
        } else {
            task();
        }
    }

    /// Spawns a `!Send` future on the UI thread.
    ///
    /// Returns `None` when the runtime has been dropped.
    pub fn spawn_ui<F>(&self, fut: F) -> Option<TaskHandle>
    where
        F: Future<Output = ()> + 'static,
    {
        self.assert_ui_thread();
        self.inner.upgrade().map(|inner| {
            let id = inner.spawn_ui_task(Box::pin(fut));
            TaskHandle {
                id,
                runtime: self.clone(),
            }
        })
    }

    pub fn cancel_task(&self, id: u64) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel_task(id);
        }
    }

    pub fn drain_ui(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.drain_ui();
        }
    }

    pub fn has_pending_ui(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_pending_ui())
            .unwrap_or(false)
    }

    /// Number of spawned tasks that have not completed yet.
    pub fn task_count(&self) -> usize {
        self.inner
            .upgrade()
            .map(|inner| inner.task_count())
            .unwrap_or(0)
    }

    pub fn register_frame_callback(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> Option<FrameCallbackId> {
        self.inner
            .upgrade()
            .map(|inner| inner.register_frame_callback(Box::new(callback)))
    }

    pub fn cancel_frame_callback(&self, id: FrameCallbackId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel_frame_callback(id);
        }
    }

    pub fn drain_frame_callbacks(&self, frame_time_nanos: u64) {
        if let Some(inner) = self.inner.upgrade() {
            inner.drain_frame_callbacks(frame_time_nanos);
        }
    }

    pub fn has_frame_callbacks(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_frame_callbacks())
            .unwrap_or(false)
    }

    /// Timestamp of the most recently drained frame.
    pub fn frame_time_nanos(&self) -> u64 {
        self.inner
            .upgrade()
            .map(|inner| inner.frame_time_nanos.get())
            .unwrap_or(0)
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.clone())
    }

    pub fn set_needs_frame(&self, value: bool) {
        if let Some(inner) = self.inner.upgrade() {
            inner.needs_frame.set(value);
        }
    }

    pub fn assert_ui_thread(&self) {
        debug_assert_eq!(
            std::thread::current().id(),
            self.ui_thread_id,
            "UI runtime used off its thread"
        );
    }
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(self) {
        self.runtime.cancel_task(self.id);
    }
}

struct FrameCallbackEntry {
    id: FrameCallbackId,
    callback: Option<Box<dyn FnOnce(u64) + 'static>>,
}

struct RuntimeTaskWaker {
    scheduler: Arc<dyn RuntimeScheduler>,
    woken: Arc<AtomicBool>,
}

impl RuntimeTaskWaker {
    fn into_waker(self) -> Waker {
        futures_task::waker(Arc::new(self))
    }
}

impl futures_task::ArcWake for RuntimeTaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::SeqCst);
        arc_self.scheduler.schedule_frame();
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
