//! Headless harness for SmartRefresh.
//!
//! Tests drive frames by hand through [`TestRuntime`], stand a [`FakeList`]
//! in for a real list and push gestures through a [`Finger`].

mod testing;

pub use smartrefresh_ui_layout::FixedSize;
pub use testing::{CallCounter, FakeList, FingerRelease, Finger, TestRuntime};
