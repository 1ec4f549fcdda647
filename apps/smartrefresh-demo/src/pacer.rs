//! Wall-clock frame pacing for the headless session.

use std::time::Duration;

use smartrefresh_core::{Clock, FRAME_INTERVAL_NANOS};

#[derive(Clone, Copy, Debug, Default)]
pub struct WallClock;

impl Clock for WallClock {
    type Instant = web_time::Instant;

    fn now(&self) -> Self::Instant {
        web_time::Instant::now()
    }

    fn elapsed_millis(&self, since: Self::Instant) -> u64 {
        since.elapsed().as_millis() as u64
    }
}

/// Sleeps so that frame `n` starts no earlier than `n` frame intervals after
/// the pacer was created.
pub struct FramePacer<C: Clock> {
    clock: C,
    started: C::Instant,
    frames: u64,
}

impl<C: Clock> FramePacer<C> {
    pub fn new(clock: C) -> Self {
        let started = clock.now();
        Self {
            clock,
            started,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Millis the next frame should wait, without waiting.
    pub fn lag_millis(&self) -> u64 {
        let due = (self.frames + 1) * FRAME_INTERVAL_NANOS / 1_000_000;
        due.saturating_sub(self.clock.elapsed_millis(self.started))
    }

    pub fn wait_for_frame(&mut self) {
        let wait = self.lag_millis();
        if wait > 0 {
            std::thread::sleep(Duration::from_millis(wait));
        }
        self.frames += 1;
    }
}
