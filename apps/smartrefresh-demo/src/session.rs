//! A scripted, headless run of the demo screen.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use smartrefresh::{Constraints, Density};
use smartrefresh_core::{DefaultScheduler, Runtime, FRAME_INTERVAL_NANOS};

use crate::screen::DemoScreen;

/// Frames a step may take before the session gives up on it.
const MAX_STEP_FRAMES: u64 = 900;
const SCROLL_EVENT: f32 = -40.0;
const LOG_EVERY_FRAMES: u64 = 30;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Run frames until the indicator is back at rest.
    Settle,
    /// Drag `distance` pixels in `events` events, one per frame.
    Pull { distance: f32, events: u32 },
    /// Lift the finger with a velocity in px/s.
    Release(f32),
    /// Drag the list up until its last row is visible.
    ScrollToBottom,
}

/// Pull to refresh, scroll to the bottom, pull to load more.
pub const SCRIPT: &[Step] = &[
    Step::Settle,
    Step::Pull {
        distance: 400.0,
        events: 16,
    },
    Step::Release(0.0),
    Step::Settle,
    Step::ScrollToBottom,
    Step::Pull {
        distance: -400.0,
        events: 16,
    },
    Step::Release(0.0),
    Step::Settle,
];

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    StepTimedOut { step: Step, frames: u64 },
    RuntimeGone,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::StepTimedOut { step, frames } => {
                write!(f, "step {step:?} did not finish within {frames} frames")
            }
            SessionError::RuntimeGone => write!(f, "UI runtime dropped during the session"),
        }
    }
}

impl std::error::Error for SessionError {}

pub struct Session {
    runtime: Runtime,
    screen: DemoScreen,
    frames: u64,
}

impl Session {
    /// Lays the screen out once, which starts the first-entry refresh.
    pub fn new(density: Density, constraints: Constraints) -> Self {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let screen = DemoScreen::new(runtime.handle(), density, constraints);
        screen.layout();
        runtime.handle().drain_ui();
        Self {
            runtime,
            screen,
            frames: 0,
        }
    }

    pub fn screen(&self) -> &DemoScreen {
        &self.screen
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame_time_nanos(&self) -> u64 {
        self.runtime.handle().frame_time_nanos()
    }

    /// Produces one frame and lays the screen out again.
    pub fn advance_frame(&mut self) {
        let handle = self.runtime.handle();
        handle.drain_ui();
        handle.drain_frame_callbacks(handle.frame_time_nanos() + FRAME_INTERVAL_NANOS);
        handle.drain_ui();
        self.screen.layout();
        self.frames += 1;
        if self.frames % LOG_EVERY_FRAMES == 0 {
            debug!("frame {}: {}", self.frames, self.screen.snapshot());
        }
    }

    /// Runs every step in order. `on_frame` runs before each frame.
    pub fn run(&mut self, script: &[Step], mut on_frame: impl FnMut()) -> Result<(), SessionError> {
        for &step in script {
            self.run_step(step, &mut on_frame)?;
            info!("{step:?} done: {}", self.screen.snapshot());
        }
        Ok(())
    }

    pub fn run_step(&mut self, step: Step, on_frame: &mut impl FnMut()) -> Result<(), SessionError> {
        match step {
            Step::Settle => self.frames_until(step, on_frame, |screen| screen.is_settled()),
            Step::Pull { distance, events } => {
                let events = events.max(1);
                let delta = distance / events as f32;
                for _ in 0..events {
                    self.screen.drag(delta);
                    on_frame();
                    self.advance_frame();
                }
                Ok(())
            }
            Step::Release(velocity) => {
                self.screen
                    .release(velocity)
                    .ok_or(SessionError::RuntimeGone)?;
                self.runtime.handle().drain_ui();
                Ok(())
            }
            Step::ScrollToBottom => self.frames_until(step, on_frame, |screen| {
                let at_bottom = screen.scroll_state().is_at_bottom();
                if !at_bottom {
                    screen.drag(SCROLL_EVENT);
                }
                at_bottom
            }),
        }
    }

    fn frames_until(
        &mut self,
        step: Step,
        on_frame: &mut impl FnMut(),
        mut done: impl FnMut(&DemoScreen) -> bool,
    ) -> Result<(), SessionError> {
        for _ in 0..MAX_STEP_FRAMES {
            if done(&self.screen) {
                return Ok(());
            }
            on_frame();
            self.advance_frame();
        }
        if done(&self.screen) {
            Ok(())
        } else {
            Err(SessionError::StepTimedOut {
                step,
                frames: MAX_STEP_FRAMES,
            })
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
