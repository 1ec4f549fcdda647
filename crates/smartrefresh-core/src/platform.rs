//! Platform abstraction traits for the UI runtime.
//!
//! The host decides when frames happen; the runtime only asks for one.

/// Schedules work for the UI runtime.
///
/// Implementations must be safe to call from wakers, which may be cloned
/// into any thread.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}

/// Provides timing information for hosts that pace frames from a wall clock.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of milliseconds elapsed since `since`.
    fn elapsed_millis(&self, since: Self::Instant) -> u64;
}

/// Scheduler for hosts that poll the runtime on their own cadence.
#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}
