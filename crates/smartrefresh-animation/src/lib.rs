//! Animation system for SmartRefresh.
//!
//! Easing curves, tween and spring specs, exponential decay, and a suspending
//! [`Animatable`] that advances on the runtime's frame clock.

pub mod animation;
pub mod decay;

pub use animation::{
    Animatable, AnimationEndReason, AnimationResult, AnimationSpec, AnimationType, Easing, Lerp,
    SpringScalar, SpringSpec,
};
pub use decay::{ExponentialDecaySpec, FloatDecayAnimationSpec};
