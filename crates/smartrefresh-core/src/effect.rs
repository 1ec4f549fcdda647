use crate::runtime::{RuntimeHandle, TaskHandle};
use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Runs one async effect per key on the UI runtime.
///
/// Launching with a new key cancels the effect started for the previous key;
/// launching with the current key is a no-op. Dropping the effect cancels
/// whatever is still running.
pub struct KeyedEffect<K> {
    runtime: RuntimeHandle,
    key: Option<K>,
    task: Option<TaskHandle>,
    active: Rc<Cell<bool>>,
}

impl<K: PartialEq + Clone> KeyedEffect<K> {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self {
            runtime,
            key: None,
            task: None,
            active: Rc::new(Cell::new(false)),
        }
    }

    pub fn should_run(&self, key: &K) -> bool {
        match &self.key {
            Some(current) => current != key,
            None => true,
        }
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Whether the effect launched for the current key is still running.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Starts `future` for `key`. Returns `false` if `key` is already current.
    pub fn launch<F>(&mut self, key: K, future: F) -> bool
    where
        F: Future<Output = ()> + 'static,
    {
        if !self.should_run(&key) {
            return false;
        }
        self.cancel_current();
        self.key = Some(key);
        let active = Rc::new(Cell::new(true));
        self.active = Rc::clone(&active);
        let finished = Rc::clone(&active);
        match self.runtime.spawn_ui(async move {
            future.await;
            finished.set(false);
        }) {
            Some(handle) => self.task = Some(handle),
            None => active.set(false),
        }
        true
    }

    /// Records `key` without starting work, cancelling the previous effect.
    pub fn settle(&mut self, key: K) {
        if self.should_run(&key) {
            self.cancel_current();
            self.key = Some(key);
        }
    }

    pub fn cancel_current(&mut self) {
        self.active.set(false);
        if let Some(handle) = self.task.take() {
            handle.cancel();
        }
    }
}

impl<K> Drop for KeyedEffect<K> {
    fn drop(&mut self) {
        self.active.set(false);
        if let Some(handle) = self.task.take() {
            handle.cancel();
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for KeyedEffect<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedEffect")
            .field("key", &self.key)
            .field("active", &self.active.get())
            .finish()
    }
}
