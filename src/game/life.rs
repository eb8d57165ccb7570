use log::{info, warn};

use crate::game::judgment::JudgeGrade;

pub const DEFAULT_MAX_HEALTH: f32 = 100.0;

/// Result of one health mutation. `exhausted` is true only on the call that
/// crossed to zero.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LifeUpdate {
    pub before: f32,
    pub after: f32,
    pub exhausted: bool,
}

impl LifeUpdate {
    #[inline(always)]
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// Bounded health in `[0, max]`. Once it reaches zero it stays pinned there
/// and every further mutation is a no-op.
#[derive(Clone, Debug)]
pub struct HealthModel {
    value: f32,
    max: f32,
    exhausted: bool,
}

impl HealthModel {
    pub fn new(max: f32, start: f32) -> Self {
        let max = if max.is_finite() && max > 0.0 {
            max
        } else {
            warn!("Max health {max} is not positive; using {DEFAULT_MAX_HEALTH}.");
            DEFAULT_MAX_HEALTH
        };
        let value = if start.is_finite() && start > 0.0 {
            start.min(max)
        } else {
            warn!("Start health {start} is not positive; starting full.");
            max
        };
        Self {
            value,
            max,
            exhausted: false,
        }
    }

    pub fn full(max: f32) -> Self {
        Self::new(max, max)
    }

    #[inline(always)]
    pub const fn value(&self) -> f32 {
        self.value
    }

    #[inline(always)]
    pub const fn max(&self) -> f32 {
        self.max
    }

    #[inline(always)]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[inline(always)]
    pub fn ratio(&self) -> f32 {
        self.value / self.max
    }

    /// Drains `rate_per_second * delta_time`. Large steps are not capped; the
    /// result is only clamped.
    pub fn apply_continuous_decay(&mut self, delta_time: f32, rate_per_second: f32) -> LifeUpdate {
        let amount = rate_per_second * delta_time;
        if !amount.is_finite() || amount <= 0.0 {
            return self.unchanged();
        }
        self.apply(-amount)
    }

    /// Adds the stage's signed delta for `grade`.
    pub fn apply_judgment_delta(&mut self, grade: JudgeGrade, delta: f32) -> LifeUpdate {
        if !delta.is_finite() {
            warn!("Ignoring non-finite health delta {delta} for {grade}.");
            return self.unchanged();
        }
        self.apply(delta)
    }

    fn unchanged(&self) -> LifeUpdate {
        LifeUpdate {
            before: self.value,
            after: self.value,
            exhausted: false,
        }
    }

    fn apply(&mut self, delta: f32) -> LifeUpdate {
        if self.exhausted {
            return self.unchanged();
        }
        let before = self.value;
        self.value = (self.value + delta).clamp(0.0, self.max);
        let mut exhausted = false;
        if self.value <= 0.0 {
            self.value = 0.0;
            self.exhausted = true;
            exhausted = true;
            info!("Health exhausted.");
        }
        LifeUpdate {
            before,
            after: self.value,
            exhausted,
        }
    }
}
