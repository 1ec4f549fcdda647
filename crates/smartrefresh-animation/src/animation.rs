//! Time-based and physics-based animation of a single value.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smartrefresh_core::{FrameClock, MutableState, RuntimeHandle, State};

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SECOND: f32 = 1_000_000_000.0;

/// Types that can be linearly interpolated.
pub trait Lerp {
    fn lerp(&self, target: &Self, fraction: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction
    }
}

impl Lerp for f64 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction as f64
    }
}

/// Values that can run through a spring.
pub trait SpringScalar: Lerp + Clone + PartialEq {
    fn to_f32(&self) -> f32;

    /// Progress of `current` on the way from `start` to `target`.
    fn spring_progress(start: &Self, target: &Self, current: &Self) -> f32 {
        let start_val = start.to_f32();
        let target_val = target.to_f32();
        if (target_val - start_val).abs() < f32::EPSILON {
            1.0
        } else {
            (current.to_f32() - start_val) / (target_val - start_val)
        }
    }

    fn is_near_target(current: &Self, target: &Self, threshold: f32) -> bool {
        (current.to_f32() - target.to_f32()).abs() < threshold
    }
}

impl SpringScalar for f32 {
    fn to_f32(&self) -> f32 {
        *self
    }
}

impl SpringScalar for f64 {
    fn to_f32(&self) -> f32 {
        *self as f32
    }
}

/// Easing curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Material standard curve.
    FastOutSlowIn,
    LinearOutSlowIn,
    FastOutLinearIn,
}

impl Easing {
    /// Maps a linear fraction in `[0, 1]` onto the curve.
    pub fn transform(&self, fraction: f32) -> f32 {
        match self {
            Easing::Linear => fraction,
            Easing::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, fraction),
            Easing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, fraction),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, fraction),
            Easing::FastOutSlowIn => cubic_bezier(0.4, 0.0, 0.2, 1.0, fraction),
            Easing::LinearOutSlowIn => cubic_bezier(0.0, 0.0, 0.2, 1.0, fraction),
            Easing::FastOutLinearIn => cubic_bezier(0.4, 0.0, 1.0, 1.0, fraction),
        }
    }
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, fraction: f32) -> f32 {
    if fraction <= 0.0 {
        return 0.0;
    }
    if fraction >= 1.0 {
        return 1.0;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let curve = |a: f32, b: f32, c: f32, t: f32| ((a * t + b) * t + c) * t;
    let slope = |a: f32, b: f32, c: f32, t: f32| (3.0 * a * t + 2.0 * b) * t + c;

    // Newton-Raphson for the parameter whose x matches `fraction`.
    let mut t = fraction;
    let mut solved = false;
    for _ in 0..8 {
        let error = curve(ax, bx, cx, t) - fraction;
        if error.abs() < 1e-6 {
            solved = true;
            break;
        }
        let dx = slope(ax, bx, cx, t);
        if dx.abs() < 1e-6 {
            break;
        }
        t = (t - error / dx).clamp(0.0, 1.0);
    }

    if !solved {
        // Bisection fallback for flat regions.
        let (mut low, mut high) = (0.0f32, 1.0f32);
        t = fraction;
        for _ in 0..16 {
            let error = curve(ax, bx, cx, t) - fraction;
            if error.abs() < 1e-6 {
                break;
            }
            if error > 0.0 {
                high = t;
            } else {
                low = t;
            }
            t = 0.5 * (low + high);
        }
    }

    curve(ay, by, cy, t)
}

/// Tween: fixed duration with easing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSpec {
    pub duration_millis: u64,
    pub easing: Easing,
    pub delay_millis: u64,
}

impl AnimationSpec {
    pub fn tween(duration_millis: u64, easing: Easing) -> Self {
        Self {
            duration_millis,
            easing,
            delay_millis: 0,
        }
    }

    pub fn linear(duration_millis: u64) -> Self {
        Self::tween(duration_millis, Easing::Linear)
    }

    pub fn with_delay(mut self, delay_millis: u64) -> Self {
        self.delay_millis = delay_millis;
        self
    }
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self::tween(300, Easing::FastOutSlowIn)
    }
}

/// Damped spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSpec {
    /// 1.0 is critically damped, below bounces, above creeps.
    pub damping_ratio: f32,
    pub stiffness: f32,
    pub velocity_threshold: f32,
    pub position_threshold: f32,
}

impl SpringSpec {
    pub fn default_spring() -> Self {
        Self {
            damping_ratio: 1.0,
            stiffness: 1500.0,
            velocity_threshold: 0.01,
            position_threshold: 0.001,
        }
    }

    pub fn bouncy() -> Self {
        Self {
            damping_ratio: 0.5,
            ..Self::default_spring()
        }
    }

    pub fn stiff() -> Self {
        Self {
            stiffness: 3000.0,
            ..Self::default_spring()
        }
    }
}

impl Default for SpringSpec {
    fn default() -> Self {
        Self::default_spring()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationType {
    Tween(AnimationSpec),
    Spring(SpringSpec),
}

impl Default for AnimationType {
    fn default() -> Self {
        AnimationType::Tween(AnimationSpec::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEndReason {
    /// The value reached the target.
    Finished,
    /// A snap or a newer animation took over the value.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationResult<T> {
    pub end_reason: AnimationEndReason,
    pub end_value: T,
}

/// A value that animates on the frame clock.
///
/// `animate_to` suspends until the target is reached or until `snap_to` or a
/// newer `animate_to` supersedes it. Dropping the future stops the animation
/// where it is.
pub struct Animatable<T: SpringScalar + 'static> {
    inner: Rc<AnimatableInner<T>>,
}

struct AnimatableInner<T: SpringScalar + 'static> {
    state: MutableState<T>,
    clock: FrameClock,
    target: RefCell<T>,
    generation: Cell<u64>,
    running: Cell<bool>,
}

/// Clears the running flag if the owning animation is dropped mid-flight.
struct RunningGuard<'a, T: SpringScalar + 'static> {
    inner: &'a AnimatableInner<T>,
    generation: u64,
}

impl<T: SpringScalar + 'static> Drop for RunningGuard<'_, T> {
    fn drop(&mut self) {
        if self.inner.generation.get() == self.generation {
            self.inner.running.set(false);
        }
    }
}

impl<T: SpringScalar + 'static> Animatable<T> {
    pub fn new(initial: T, runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(AnimatableInner {
                state: MutableState::new(initial.clone()),
                clock: runtime.frame_clock(),
                target: RefCell::new(initial),
                generation: Cell::new(0),
                running: Cell::new(false),
            }),
        }
    }

    pub fn value(&self) -> T {
        self.inner.state.get()
    }

    pub fn target(&self) -> T {
        self.inner.target.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    pub fn state(&self) -> State<T> {
        self.inner.state.as_state()
    }

    /// Jumps to `target`, superseding any running animation.
    pub fn snap_to(&self, target: T) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.inner.running.set(false);
        *self.inner.target.borrow_mut() = target.clone();
        self.inner.state.set(target);
    }

    /// Animates to `target`, calling `on_frame` with every produced value.
    pub async fn animate_to(
        &self,
        target: T,
        animation: AnimationType,
        mut on_frame: impl FnMut(&T),
    ) -> AnimationResult<T> {
        let inner = &*self.inner;
        let generation = inner.generation.get() + 1;
        inner.generation.set(generation);
        *inner.target.borrow_mut() = target.clone();

        let start = inner.state.get();
        if start == target {
            on_frame(&target);
            return AnimationResult {
                end_reason: AnimationEndReason::Finished,
                end_value: target,
            };
        }

        inner.running.set(true);
        let _guard = RunningGuard { inner, generation };
        let mut current = start.clone();
        let mut velocity = 0.0f32;
        let mut start_time: Option<u64> = None;
        let mut last_time: Option<u64> = None;

        loop {
            let frame_time = inner.clock.next_frame().await;
            if inner.generation.get() != generation {
                log::trace!("animation superseded at generation {generation}");
                return AnimationResult {
                    end_reason: AnimationEndReason::Interrupted,
                    end_value: inner.state.get(),
                };
            }
            let started = *start_time.get_or_insert(frame_time);

            let finished = match animation {
                AnimationType::Tween(spec) => {
                    let elapsed = frame_time.saturating_sub(started);
                    let delay = spec.delay_millis * NANOS_PER_MILLI;
                    if elapsed < delay {
                        false
                    } else {
                        let duration = (spec.duration_millis * NANOS_PER_MILLI).max(1);
                        let linear = ((elapsed - delay) as f32 / duration as f32).clamp(0.0, 1.0);
                        current = start.lerp(&target, spec.easing.transform(linear));
                        linear >= 1.0
                    }
                }
                AnimationType::Spring(spec) => {
                    let previous = last_time.replace(frame_time).unwrap_or(frame_time);
                    let dt = frame_time.saturating_sub(previous) as f32 / NANOS_PER_SECOND;
                    let (next, next_velocity) = spring_step(&start, &target, &current, velocity, dt, spec);
                    current = next;
                    velocity = next_velocity;
                    dt > 0.0
                        && velocity.abs() < spec.velocity_threshold
                        && T::is_near_target(&current, &target, spec.position_threshold)
                }
            };

            if finished {
                inner.running.set(false);
                inner.state.set(target.clone());
                on_frame(&target);
                return AnimationResult {
                    end_reason: AnimationEndReason::Finished,
                    end_value: target,
                };
            }
            inner.state.set(current.clone());
            on_frame(&current);
        }
    }
}

/// Advances a damped spring by `dt` seconds with semi-implicit Euler substeps.
fn spring_step<T: SpringScalar>(
    start: &T,
    target: &T,
    current: &T,
    mut velocity: f32,
    dt: f32,
    spec: SpringSpec,
) -> (T, f32) {
    const SUBSTEP: f32 = 0.004;
    let damping = 2.0 * spec.damping_ratio * spec.stiffness.sqrt();
    let mut progress = T::spring_progress(start, target, current);
    let mut remaining = dt;
    while remaining > 0.0 {
        let step = SUBSTEP.min(remaining);
        let displacement = progress - 1.0;
        let force = -spec.stiffness * displacement - damping * velocity;
        velocity += force * step;
        progress += velocity * step;
        remaining -= step;
    }
    (start.lerp(target, progress.clamp(-1.0, 2.0)), velocity)
}

impl<T: SpringScalar + 'static> Clone for Animatable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: SpringScalar + std::fmt::Debug + 'static> std::fmt::Debug for Animatable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animatable")
            .field("value", &self.value())
            .field("target", &self.target())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/animation_tests.rs"]
mod tests;
