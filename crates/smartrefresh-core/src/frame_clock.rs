//! Frame-time futures: the next drained frame, and delays measured in frames.

use crate::runtime::{FrameCallbackId, RuntimeHandle};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

const NANOS_PER_MILLI: u64 = 1_000_000;

#[derive(Clone, Debug)]
pub struct FrameClock {
    runtime: RuntimeHandle,
}

impl FrameClock {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self { runtime }
    }

    /// Timestamp of the last drained frame.
    pub fn frame_time_nanos(&self) -> u64 {
        self.runtime.frame_time_nanos()
    }

    /// Resolves with the timestamp of the next drained frame.
    pub fn next_frame(&self) -> NextFrame {
        NextFrame {
            runtime: self.runtime.clone(),
            slot: Rc::new(FrameSlot::default()),
            callback: None,
        }
    }

    /// Suspends until at least `millis` of frame time has elapsed.
    ///
    /// Time is measured from the last drained frame, so the delay only advances
    /// while the host keeps producing frames. Dropping the future discards it.
    pub async fn delay(&self, millis: u64) {
        let deadline = self
            .frame_time_nanos()
            .saturating_add(millis.saturating_mul(NANOS_PER_MILLI));
        while self.next_frame().await < deadline {}
    }
}

/// Written by the frame callback, read by the future.
#[derive(Default)]
struct FrameSlot {
    time: Cell<Option<u64>>,
    waker: RefCell<Option<Waker>>,
}

impl FrameSlot {
    fn fill(&self, time: u64) {
        self.time.set(Some(time));
        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// One-shot future for the next frame. Registers its frame callback on first
/// poll and withdraws it when dropped early.
///
/// On a dropped runtime it never resolves.
pub struct NextFrame {
    runtime: RuntimeHandle,
    slot: Rc<FrameSlot>,
    callback: Option<FrameCallbackId>,
}

impl Future for NextFrame {
    type Output = u64;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<u64> {
        if let Some(time) = self.slot.time.get() {
            return Poll::Ready(time);
        }
        *self.slot.waker.borrow_mut() = Some(cx.waker().clone());
        if self.callback.is_none() {
            let slot = Rc::downgrade(&self.slot);
            self.callback = self.runtime.register_frame_callback(move |time| {
                if let Some(slot) = slot.upgrade() {
                    slot.fill(time);
                }
            });
        }
        Poll::Pending
    }
}

impl Drop for NextFrame {
    fn drop(&mut self) {
        let fired = self.slot.time.get().is_some();
        match self.callback.take() {
            Some(id) if !fired => self.runtime.cancel_frame_callback(id),
            _ => {}
        }
    }
}

impl std::fmt::Debug for NextFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextFrame")
            .field("registered", &self.callback.is_some())
            .field("time", &self.slot.time.get())
            .finish()
    }
}
