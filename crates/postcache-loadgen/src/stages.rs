//! Ramping virtual-user profiles.

use std::time::Duration;

/// Move linearly to `target` virtual users over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

/// A sequence of stages starting from zero virtual users.
#[derive(Debug, Clone)]
pub struct RampProfile {
    stages: Vec<Stage>,
}

impl RampProfile {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Ramp up to `peak`, hold it, ramp down to zero.
    pub fn ramp_hold_ramp(peak: usize, up: Duration, hold: Duration, down: Duration) -> Self {
        Self::new(vec![
            Stage::new(up, peak),
            Stage::new(hold, peak),
            Stage::new(down, 0),
        ])
    }

    pub fn total(&self) -> Duration {
        self.stages.iter().map(|stage| stage.duration).sum()
    }

    pub fn peak(&self) -> usize {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .max()
            .unwrap_or(0)
    }

    /// Number of virtual users that should be active `elapsed` into the run.
    pub fn target_at(&self, elapsed: Duration) -> usize {
        let mut from = 0usize;
        let mut offset = elapsed;

        for stage in &self.stages {
            if offset < stage.duration {
                let progress = offset.as_secs_f64() / stage.duration.as_secs_f64();
                let delta = stage.target as f64 - from as f64;
                return (from as f64 + delta * progress).round() as usize;
            }
            offset -= stage.duration;
            from = stage.target;
        }

        from
    }
}
