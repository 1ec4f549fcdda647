//! Observable state cells.
//!
//! A [`MutableState`] holds a value on the UI thread and notifies subscribers
//! synchronously whenever a write changes it. Writes that are structurally
//! equal to the current value are dropped, so observers see each transition
//! exactly once.

use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Observer<T> = Rc<dyn Fn(&T)>;

struct StateCell<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    observers: RefCell<FxHashMap<u64, Observer<T>>>,
    next_observer_id: Cell<u64>,
}

pub struct MutableState<T> {
    inner: Rc<StateCell<T>>,
}

/// Read-only view of a [`MutableState`].
pub struct State<T> {
    inner: Rc<StateCell<T>>,
}

/// Keeps an observer registered until dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl<T: Clone + PartialEq + 'static> MutableState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(StateCell {
                value: RefCell::new(value),
                version: Cell::new(0),
                observers: RefCell::new(FxHashMap::default()),
                next_observer_id: Cell::new(1),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Stores `value` and notifies observers. Returns `false` when nothing changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.inner.version.set(self.inner.version.get() + 1);
        notify(&self.inner, &value);
        true
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.inner.value.borrow());
        self.set(next)
    }

    /// Number of effective writes since creation.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        subscribe(&self.inner, Rc::new(observer))
    }

    pub fn as_state(&self) -> State<T> {
        State {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> State<T> {
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        subscribe(&self.inner, Rc::new(observer))
    }
}

fn subscribe<T: 'static>(cell: &Rc<StateCell<T>>, observer: Observer<T>) -> Subscription {
    let id = cell.next_observer_id.get();
    cell.next_observer_id.set(id + 1);
    cell.observers.borrow_mut().insert(id, observer);
    let weak: Weak<StateCell<T>> = Rc::downgrade(cell);
    Subscription {
        unsubscribe: Some(Box::new(move || {
            if let Some(cell) = weak.upgrade() {
                cell.observers.borrow_mut().remove(&id);
            }
        })),
    }
}

fn notify<T>(cell: &StateCell<T>, value: &T) {
    // Observers may write other states or subscribe; never hold the map borrow.
    let mut observers: Vec<(u64, Observer<T>)> = cell
        .observers
        .borrow()
        .iter()
        .map(|(id, observer)| (*id, Rc::clone(observer)))
        .collect();
    observers.sort_unstable_by_key(|(id, _)| *id);
    for (_, observer) in observers {
        observer(value);
    }
}

impl<T> Clone for MutableState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MutableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableState")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
