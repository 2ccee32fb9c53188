//! Fixed-step timing for integrator-backed scenarios.
//!
//! Display frames arrive at whatever rate the host manages. The engine
//! always advances in fixed substeps; leftover time is carried to the next
//! frame, and time beyond `max_substeps` is dropped.

use bl_rigid::IntegratorType;
use serde::{Deserialize, Serialize};

use crate::error::{ScenarioError, ScenarioResult};

/// Substep configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOptions {
    /// Substep length in seconds.
    pub dt: f64,
    /// Maximum substeps consumed per frame.
    pub max_substeps: u32,
    /// Integrator used by the scenario's world.
    #[serde(default)]
    pub integrator: IntegratorType,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            dt: 1.0 / 240.0,
            max_substeps: 16,
            integrator: IntegratorType::RK4,
        }
    }
}

impl StepOptions {
    pub fn validate(&self) -> ScenarioResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ScenarioError::InvalidConfig {
                what: "step dt must be positive",
            });
        }
        if self.max_substeps == 0 {
            return Err(ScenarioError::InvalidConfig {
                what: "max_substeps must be at least 1",
            });
        }
        Ok(())
    }
}

/// Accumulates frame time and hands out whole substeps.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStepClock {
    pub options: StepOptions,
    /// Unconsumed time (s), always below one substep after `take_steps`.
    accumulator: f64,
}

impl FixedStepClock {
    pub fn new(options: StepOptions) -> Self {
        Self {
            options,
            accumulator: 0.0,
        }
    }

    /// Add `elapsed` seconds and return how many substeps to run now.
    ///
    /// Negative or non-finite elapsed time counts as zero.
    pub fn take_steps(&mut self, elapsed: f64) -> u32 {
        if elapsed.is_finite() && elapsed > 0.0 {
            self.accumulator += elapsed;
        }
        let due = (self.accumulator / self.options.dt).floor();
        let max = f64::from(self.options.max_substeps);
        if due > max {
            self.accumulator = 0.0;
            return self.options.max_substeps;
        }
        // `due` is in [0, max_substeps] here
        let steps = due as u32;
        self.accumulator -= f64::from(steps) * self.options.dt;
        if self.accumulator < 0.0 {
            self.accumulator = 0.0;
        }
        steps
    }

    /// Time waiting for the next substep.
    pub fn pending(&self) -> f64 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(dt: f64, max_substeps: u32) -> FixedStepClock {
        FixedStepClock::new(StepOptions {
            dt,
            max_substeps,
            ..StepOptions::default()
        })
    }

    #[test]
    fn accumulates_fractional_frames() {
        let mut c = clock(0.1, 16);
        assert_eq!(c.take_steps(0.05), 0);
        assert_eq!(c.take_steps(0.05), 1);
        assert!(c.pending() < 1e-12);
        assert_eq!(c.take_steps(0.25), 2);
        assert!((c.pending() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn excess_time_is_dropped() {
        let mut c = clock(0.01, 4);
        assert_eq!(c.take_steps(1.0), 4);
        assert_eq!(c.pending(), 0.0);
        assert_eq!(c.take_steps(0.0), 0);
    }

    #[test]
    fn bogus_elapsed_is_ignored() {
        let mut c = clock(0.01, 4);
        assert_eq!(c.take_steps(-1.0), 0);
        assert_eq!(c.take_steps(f64::NAN), 0);
        assert_eq!(c.pending(), 0.0);
    }

    #[test]
    fn options_validation() {
        assert!(StepOptions::default().validate().is_ok());
        let base = StepOptions::default();
        assert!(StepOptions { dt: 0.0, ..base }.validate().is_err());
        assert!(StepOptions { max_substeps: 0, ..base }.validate().is_err());
        assert!(StepOptions { integrator: IntegratorType::ForwardEuler, ..base }
            .validate()
            .is_ok());
    }
}
