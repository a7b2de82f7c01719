//! Time based spin animation.
//!
//! A spin is a closed-form curve: the wheel starts at `start_angle`, ends
//! at `start_angle + total_delta`, and follows [`ease_out_cubic`] over a
//! fixed duration. Times are seconds on any monotonic session clock.

use log::{debug, info};
use rand::Rng;

use crate::angle::{wrap_angle, TAU};
use crate::error::{ConfigError, SpinError};

/// Decelerating curve: 0 at `t = 0`, 1 at `t = 1`, zero slope at the end.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t - 1.0;
    t * t * t + 1.0
}

/// Duration and turn range for one spin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinParams {
    pub duration: f64,
    pub min_turns: f64,
    pub max_turns: f64,
}

impl SpinParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.duration > 0.0) {
            return Err(ConfigError::NonPositiveDuration(self.duration));
        }
        if !(self.min_turns > 0.0 && self.max_turns > 0.0) {
            return Err(ConfigError::NonPositiveTurns {
                min: self.min_turns,
                max: self.max_turns,
            });
        }
        if self.min_turns > self.max_turns {
            return Err(ConfigError::InvertedTurns {
                min: self.min_turns,
                max: self.max_turns,
            });
        }
        Ok(())
    }

    fn sample_turns<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min_turns < self.max_turns {
            rng.random_range(self.min_turns..=self.max_turns)
        } else {
            self.min_turns
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    /// No spin in progress; nothing changed.
    Idle,
    Running,
    /// Returned once, on the tick that completes the spin.
    Finished,
}

#[derive(Debug, Clone, Default)]
pub struct SpinAnimator {
    current_angle: f64,
    is_spinning: bool,
    start_time: f64,
    duration: f64,
    start_angle: f64,
    total_delta: f64,
}

impl SpinAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a spin at `now`.
    ///
    /// With `landing` set, the settled angle (mod `TAU`) equals `landing`;
    /// without it, the sampled turns alone decide where the wheel stops.
    /// The rotation always increases the angle.
    pub fn begin<R: Rng + ?Sized>(
        &mut self,
        now: f64,
        params: &SpinParams,
        landing: Option<f64>,
        rng: &mut R,
    ) -> Result<(), SpinError> {
        if self.is_spinning {
            debug!("spin rejected, wheel busy");
            return Err(SpinError::Busy);
        }
        params.validate()?;

        let turns = params.sample_turns(rng);
        let start_angle = wrap_angle(self.current_angle);
        let whole = turns * TAU;
        let correction = match landing {
            Some(target) => wrap_angle(wrap_angle(target) - wrap_angle(start_angle + whole)),
            None => 0.0,
        };

        self.is_spinning = true;
        self.start_time = now;
        self.duration = params.duration;
        self.start_angle = start_angle;
        self.total_delta = whole + correction;
        info!(
            "spin started: {:.2} turns over {:.2}s (delta {:.3} rad)",
            self.total_delta / TAU,
            self.duration,
            self.total_delta
        );
        Ok(())
    }

    /// Move the wheel to where it should be at `now`.
    pub fn advance(&mut self, now: f64) -> AnimationStatus {
        if !self.is_spinning {
            return AnimationStatus::Idle;
        }
        let t = self.progress(now);
        self.current_angle = self.start_angle + self.total_delta * ease_out_cubic(t);
        if t >= 1.0 {
            self.is_spinning = false;
            self.current_angle = wrap_angle(self.current_angle);
            return AnimationStatus::Finished;
        }
        AnimationStatus::Running
    }

    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    pub fn is_spinning(&self) -> bool {
        self.is_spinning
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    pub fn total_delta(&self) -> f64 {
        self.total_delta
    }

    /// Normalised progress of the current spin, 1.0 when idle.
    pub fn progress(&self, now: f64) -> f64 {
        if self.is_spinning {
            ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(duration: f64, min_turns: f64, max_turns: f64) -> SpinParams {
        SpinParams {
            duration,
            min_turns,
            max_turns,
        }
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
        // decelerating: second half covers less ground than the first
        assert!(ease_out_cubic(0.5) > 1.0 - ease_out_cubic(0.5));
    }

    #[test]
    fn test_advance_before_begin_is_idle() {
        let mut animator = SpinAnimator::new();
        assert_eq!(animator.advance(10.0), AnimationStatus::Idle);
        assert_eq!(animator.current_angle(), 0.0);
        assert!(!animator.is_spinning());
    }

    #[test]
    fn test_begin_rejects_bad_params() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut animator = SpinAnimator::new();
        assert_eq!(
            animator.begin(0.0, &params(0.0, 3.0, 4.0), None, &mut rng),
            Err(SpinError::Config(ConfigError::NonPositiveDuration(0.0)))
        );
        assert_eq!(
            animator.begin(0.0, &params(1.0, 5.0, 4.0), None, &mut rng),
            Err(SpinError::Config(ConfigError::InvertedTurns { min: 5.0, max: 4.0 }))
        );
        assert_eq!(
            animator.begin(0.0, &params(1.0, 0.0, 4.0), None, &mut rng),
            Err(SpinError::Config(ConfigError::NonPositiveTurns { min: 0.0, max: 4.0 }))
        );
        assert!(!animator.is_spinning());
    }

    #[test]
    fn test_begin_while_spinning_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut animator = SpinAnimator::new();
        let p = params(4.0, 3.0, 5.0);
        animator.begin(0.0, &p, None, &mut rng).unwrap();
        let delta = animator.total_delta();
        assert_eq!(animator.begin(1.0, &p, None, &mut rng), Err(SpinError::Busy));
        assert_eq!(animator.total_delta(), delta);
        assert_eq!(animator.start_time(), 0.0);
    }

    #[test]
    fn test_free_spin_turns_within_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = params(2.0, 6.2, 12.4);
        let mut animator = SpinAnimator::new();
        for round in 0..50 {
            let now = round as f64 * 10.0;
            animator.begin(now, &p, None, &mut rng).unwrap();
            let turns = animator.total_delta() / TAU;
            assert!(turns > 6.2 - 1e-9 && turns < 12.4 + 1e-9, "turns {turns}");
            assert_eq!(animator.advance(now + 2.0), AnimationStatus::Finished);
        }
    }

    #[test]
    fn test_landing_spin_settles_on_target_angle() {
        let mut rng = StdRng::seed_from_u64(4);
        let p = params(4.0, 3.0, 3.0);
        let mut animator = SpinAnimator::new();
        animator.begin(0.0, &p, Some(1.25), &mut rng).unwrap();
        let turns = animator.total_delta() / TAU;
        assert!(turns > 3.0 - 1e-9 && turns < 4.0);
        assert_eq!(animator.advance(4.0), AnimationStatus::Finished);
        assert!((animator.current_angle() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_angle_moves_monotonically() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut animator = SpinAnimator::new();
        animator.begin(0.0, &params(3.0, 2.0, 4.0), Some(0.4), &mut rng).unwrap();
        let mut last = animator.start_angle();
        let mut now = 0.0;
        while now < 3.0 {
            now += 1.0 / 60.0;
            animator.advance(now);
            if !animator.is_spinning() {
                break;
            }
            assert!(animator.current_angle() >= last);
            last = animator.current_angle();
        }
        assert!(!animator.is_spinning());
    }

    #[test]
    fn test_finish_reported_once() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut animator = SpinAnimator::new();
        animator.begin(1.0, &params(2.0, 1.0, 2.0), None, &mut rng).unwrap();
        assert_eq!(animator.advance(2.0), AnimationStatus::Running);
        assert!(animator.is_spinning());
        assert_eq!(animator.advance(3.5), AnimationStatus::Finished);
        let settled = animator.current_angle();
        assert!((0.0..TAU).contains(&settled));
        for _ in 0..3 {
            assert_eq!(animator.advance(3.5), AnimationStatus::Idle);
            assert_eq!(animator.current_angle(), settled);
        }
    }

    #[test]
    fn test_clock_before_start_clamps_to_start() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut animator = SpinAnimator::new();
        animator.begin(5.0, &params(2.0, 1.0, 1.0), None, &mut rng).unwrap();
        assert_eq!(animator.advance(4.0), AnimationStatus::Running);
        assert_eq!(animator.current_angle(), animator.start_angle());
        assert_eq!(animator.progress(4.0), 0.0);
    }
}
