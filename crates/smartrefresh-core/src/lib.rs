//! Core runtime for SmartRefresh.
//!
//! A single-threaded UI runtime: spawned `!Send` tasks,
//! a host-driven frame clock, keyed effects, observable state cells and a
//! priority mutator mutex that serializes async writers.

pub mod effect;
pub mod frame_clock;
pub mod mutator;
pub mod platform;
pub mod runtime;
pub mod state;

pub use effect::KeyedEffect;
pub use frame_clock::{FrameClock, NextFrame};
pub use mutator::{MutatePriority, MutationInterrupted, MutatorMutex};
pub use platform::{Clock, DefaultScheduler, RuntimeScheduler};
pub use runtime::{FrameCallbackId, Runtime, RuntimeHandle, TaskHandle};
pub use state::{MutableState, State, Subscription};

/// Nanoseconds between frames at 60 Hz.
pub const FRAME_INTERVAL_NANOS: u64 = 16_666_667;
