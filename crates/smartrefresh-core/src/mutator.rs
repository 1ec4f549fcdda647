//! Priority mutual exclusion for state that several async writers drive.
//!
//! A [`MutatorMutex`] admits one mutator at a time. A request with a strictly
//! higher [`MutatePriority`] interrupts the current holder: the holder's
//! `mutate` call resolves with [`MutationInterrupted`] the next time its task is
//! polled, and the slot passes to the new request. Requests of equal or lower
//! priority queue, highest priority first and FIFO within a priority.

use log::trace;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MutatePriority {
    /// Programmatic changes such as settle animations.
    #[default]
    Default,
    /// Changes that follow the user's finger.
    UserInput,
    /// Changes that user input must not interrupt.
    PreventUserInput,
}

/// Returned by [`MutatorMutex::mutate`] when a higher-priority mutator took over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationInterrupted;

impl fmt::Display for MutationInterrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("mutation interrupted by a higher-priority mutator")
    }
}

impl std::error::Error for MutationInterrupted {}

struct Mutator {
    priority: MutatePriority,
    interrupted: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

impl Mutator {
    fn new(priority: MutatePriority) -> Self {
        Self {
            priority,
            interrupted: Cell::new(false),
            waker: RefCell::new(None),
        }
    }

    fn interrupt(&self) {
        if self.interrupted.replace(true) {
            return;
        }
        trace!("mutator at {:?} interrupted", self.priority);
        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

struct Waiter {
    ticket: u64,
    priority: MutatePriority,
    waker: Option<Waker>,
}

#[derive(Default)]
struct MutexInner {
    holder: RefCell<Option<Rc<Mutator>>>,
    waiters: RefCell<SmallVec<[Waiter; 4]>>,
    next_ticket: Cell<u64>,
}

impl MutexInner {
    fn enqueue(&self, priority: MutatePriority) -> u64 {
        let ticket = self.next_ticket.get();
        self.next_ticket.set(ticket + 1);
        self.waiters.borrow_mut().push(Waiter {
            ticket,
            priority,
            waker: None,
        });
        ticket
    }

    /// Whether `ticket` is the first waiter among the highest priority.
    fn is_next(&self, ticket: u64) -> bool {
        let waiters = self.waiters.borrow();
        let Some(top) = waiters.iter().map(|waiter| waiter.priority).max() else {
            return false;
        };
        waiters
            .iter()
            .find(|waiter| waiter.priority == top)
            .is_some_and(|waiter| waiter.ticket == ticket)
    }

    fn remove_waiter(&self, ticket: u64) {
        self.waiters
            .borrow_mut()
            .retain(|waiter| waiter.ticket != ticket);
    }

    fn register_waker(&self, ticket: u64, waker: &Waker) {
        if let Some(waiter) = self
            .waiters
            .borrow_mut()
            .iter_mut()
            .find(|waiter| waiter.ticket == ticket)
        {
            waiter.waker = Some(waker.clone());
        }
    }

    fn wake_waiters(&self) {
        let wakers: SmallVec<[Waker; 4]> = self
            .waiters
            .borrow_mut()
            .iter_mut()
            .filter_map(|waiter| waiter.waker.take())
            .collect();
        for waker in wakers {
            waker.wake();
        }
    }

    fn release(&self, mutator: &Rc<Mutator>) {
        let released = {
            let mut holder = self.holder.borrow_mut();
            match holder.as_ref() {
                Some(current) if Rc::ptr_eq(current, mutator) => holder.take(),
                _ => None,
            }
        };
        if released.is_some() {
            self.wake_waiters();
        }
    }
}

/// Single-slot mutex with priority preemption.
#[derive(Clone, Default)]
pub struct MutatorMutex {
    inner: Rc<MutexInner>,
}

impl MutatorMutex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.holder.borrow().is_some()
    }

    /// Priority of the current holder, if any.
    pub fn holder_priority(&self) -> Option<MutatePriority> {
        self.inner
            .holder
            .borrow()
            .as_ref()
            .map(|holder| holder.priority)
    }

    /// Runs `block` once this request owns the mutex.
    ///
    /// Waits behind equal or higher priority holders, interrupts lower ones.
    pub async fn mutate<R, Fut>(
        &self,
        priority: MutatePriority,
        block: impl FnOnce() -> Fut,
    ) -> Result<R, MutationInterrupted>
    where
        Fut: Future<Output = R>,
    {
        let mutator = Acquire::new(Rc::clone(&self.inner), priority).await;
        let _guard = MutatorGuard {
            mutex: Rc::clone(&self.inner),
            mutator: Rc::clone(&mutator),
        };
        Interruptible {
            mutator,
            future: Box::pin(block()),
        }
        .await
    }
}

impl fmt::Debug for MutatorMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutatorMutex")
            .field("holder", &self.holder_priority())
            .field("waiters", &self.inner.waiters.borrow().len())
            .finish()
    }
}

struct Acquire {
    mutex: Rc<MutexInner>,
    ticket: u64,
    priority: MutatePriority,
    acquired: bool,
}

impl Acquire {
    fn new(mutex: Rc<MutexInner>, priority: MutatePriority) -> Self {
        let ticket = mutex.enqueue(priority);
        Self {
            mutex,
            ticket,
            priority,
            acquired: false,
        }
    }
}

impl Future for Acquire {
    type Output = Rc<Mutator>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let holder = this.mutex.holder.borrow().clone();
        match holder {
            None if this.mutex.is_next(this.ticket) => {
                this.mutex.remove_waiter(this.ticket);
                let mutator = Rc::new(Mutator::new(this.priority));
                *this.mutex.holder.borrow_mut() = Some(Rc::clone(&mutator));
                this.acquired = true;
                Poll::Ready(mutator)
            }
            Some(holder) if this.priority > holder.priority => {
                this.mutex.register_waker(this.ticket, cx.waker());
                holder.interrupt();
                Poll::Pending
            }
            _ => {
                this.mutex.register_waker(this.ticket, cx.waker());
                Poll::Pending
            }
        }
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        if !self.acquired {
            self.mutex.remove_waiter(self.ticket);
            // The next candidate may have been parked behind this ticket.
            if self.mutex.holder.borrow().is_none() {
                self.mutex.wake_waiters();
            }
        }
    }
}

struct MutatorGuard {
    mutex: Rc<MutexInner>,
    mutator: Rc<Mutator>,
}

impl Drop for MutatorGuard {
    fn drop(&mut self) {
        self.mutex.release(&self.mutator);
    }
}

struct Interruptible<F> {
    mutator: Rc<Mutator>,
    future: Pin<Box<F>>,
}

impl<F: Future> Future for Interruptible<F> {
    type Output = Result<F::Output, MutationInterrupted>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.mutator.interrupted.get() {
            return Poll::Ready(Err(MutationInterrupted));
        }
        *this.mutator.waker.borrow_mut() = Some(cx.waker().clone());
        this.future.as_mut().poll(cx).map(Ok)
    }
}

#[cfg(test)]
#[path = "tests/mutator_tests.rs"]
mod tests;
