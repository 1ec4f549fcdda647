//! Decay specs for flings: no target, only a starting velocity that bleeds off.

/// A decay animation has no fixed target; it starts with a velocity and
/// decelerates to rest. The final position depends on the initial velocity.
pub trait FloatDecayAnimationSpec {
    /// Speed below which the animation is considered at rest, in px/s.
    fn abs_velocity_threshold(&self) -> f32;

    fn value_from_nanos(&self, play_time_nanos: u64, initial_value: f32, initial_velocity: f32)
        -> f32;

    fn velocity_from_nanos(&self, play_time_nanos: u64, initial_velocity: f32) -> f32;

    fn duration_nanos(&self, initial_velocity: f32) -> u64;

    fn target_value(&self, initial_value: f32, initial_velocity: f32) -> f32;
}

/// Velocity decays as `v·e^(f·t)` with `f = -4.2 × friction_multiplier`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecaySpec {
    friction: f32,
    abs_velocity_threshold: f32,
}

impl ExponentialDecaySpec {
    const BASE_FRICTION: f32 = -4.2;

    pub fn new(friction_multiplier: f32, abs_velocity_threshold: f32) -> Self {
        Self {
            friction: Self::BASE_FRICTION * friction_multiplier.max(f32::EPSILON),
            abs_velocity_threshold: abs_velocity_threshold.max(0.1),
        }
    }
}

impl Default for ExponentialDecaySpec {
    fn default() -> Self {
        Self::new(1.0, 0.1)
    }
}

impl FloatDecayAnimationSpec for ExponentialDecaySpec {
    fn abs_velocity_threshold(&self) -> f32 {
        self.abs_velocity_threshold
    }

    fn value_from_nanos(
        &self,
        play_time_nanos: u64,
        initial_value: f32,
        initial_velocity: f32,
    ) -> f32 {
        let seconds = play_time_nanos as f32 / 1_000_000_000.0;
        let ratio = initial_velocity / self.friction;
        initial_value - ratio + ratio * (self.friction * seconds).exp()
    }

    fn velocity_from_nanos(&self, play_time_nanos: u64, initial_velocity: f32) -> f32 {
        let seconds = play_time_nanos as f32 / 1_000_000_000.0;
        initial_velocity * (self.friction * seconds).exp()
    }

    fn duration_nanos(&self, initial_velocity: f32) -> u64 {
        if initial_velocity.abs() <= self.abs_velocity_threshold {
            return 0;
        }
        let seconds = (self.abs_velocity_threshold / initial_velocity.abs()).ln() / self.friction;
        (seconds * 1_000_000_000.0) as u64
    }

    fn target_value(&self, initial_value: f32, initial_velocity: f32) -> f32 {
        if initial_velocity.abs() <= self.abs_velocity_threshold {
            return initial_value;
        }
        let duration = self.duration_nanos(initial_velocity);
        self.value_from_nanos(duration, initial_value, initial_velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_travels_in_velocity_direction_and_stops() {
        let spec = ExponentialDecaySpec::default();
        let forward = spec.target_value(0.0, 2000.0);
        let backward = spec.target_value(0.0, -2000.0);
        assert!(forward > 0.0);
        assert!((forward + backward).abs() < 0.01);

        let duration = spec.duration_nanos(2000.0);
        let end_velocity = spec.velocity_from_nanos(duration, 2000.0);
        assert!(end_velocity.abs() <= spec.abs_velocity_threshold() + 0.01);
    }

    #[test]
    fn slow_velocity_does_not_move() {
        let spec = ExponentialDecaySpec::default();
        assert_eq!(spec.duration_nanos(0.05), 0);
        assert_eq!(spec.target_value(12.0, 0.05), 12.0);
    }

    #[test]
    fn higher_friction_shortens_the_fling() {
        let loose = ExponentialDecaySpec::new(1.0, 0.1);
        let tight = ExponentialDecaySpec::new(3.0, 0.1);
        assert!(tight.target_value(0.0, 1500.0) < loose.target_value(0.0, 1500.0));
    }
}
