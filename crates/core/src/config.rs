//! Run configuration
//!
//! Plain serde structs with `Default` so callers can write
//! `ModelConfig { duration: 86_400.0, ..Default::default() }` or load them
//! from any serde format.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Top-level run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model start time (seconds since an arbitrary epoch)
    pub start_time: f64,
    /// Run length in seconds
    pub duration: f64,
    /// Step length in seconds
    pub time_step: f64,
    /// Seed for every random draw in the run (windage, random walk, uncertainty)
    pub seed: u64,
    /// Apply mover uncertainty perturbations
    pub uncertain: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            duration: 86_400.0,
            time_step: 900.0,
            seed: 0,
            uncertain: false,
        }
    }
}

impl ModelConfig {
    /// Absolute time at which the run finishes
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Number of steps a full run takes
    pub fn num_steps(&self) -> usize {
        if self.duration <= 0.0 {
            return 0;
        }
        (self.duration / self.time_step).ceil() as usize
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(SimError::configuration(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(SimError::configuration(format!(
                "duration must be non-negative, got {}",
                self.duration
            )));
        }
        if !self.start_time.is_finite() {
            return Err(SimError::configuration("start_time must be finite"));
        }
        Ok(())
    }
}

/// Mover uncertainty parameters
///
/// A perturbation (speed factor, angle offset) is drawn per element and kept
/// for `duration` seconds before being redrawn. Nothing is perturbed until
/// `time_delay` seconds into the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyParams {
    /// Seconds a drawn perturbation is kept
    pub duration: f64,
    /// Seconds after run start before uncertainty applies
    pub time_delay: f64,
    /// Speed factor is log-uniform in `[1/speed_scale, speed_scale]`
    pub speed_scale: f64,
    /// Angle offset is uniform in `[-angle_scale, angle_scale]` radians
    pub angle_scale: f64,
}

impl Default for UncertaintyParams {
    fn default() -> Self {
        Self {
            duration: 10_800.0,
            time_delay: 0.0,
            speed_scale: 2.0,
            angle_scale: 0.4,
        }
    }
}

impl UncertaintyParams {
    pub fn validate(&self) -> SimResult<()> {
        if self.duration <= 0.0 || self.time_delay < 0.0 {
            return Err(SimError::configuration(
                "uncertainty duration must be positive and time_delay non-negative",
            ));
        }
        if self.speed_scale < 1.0 || self.angle_scale < 0.0 {
            return Err(SimError::configuration(
                "uncertainty speed_scale must be >= 1 and angle_scale >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_steps_rounds_up() {
        let config = ModelConfig {
            duration: 3_600.0,
            time_step: 900.0,
            ..Default::default()
        };
        assert_eq!(config.num_steps(), 4);

        let config = ModelConfig {
            duration: 1_000.0,
            time_step: 900.0,
            ..Default::default()
        };
        assert_eq!(config.num_steps(), 2);
    }

    #[test]
    fn test_zero_time_step_rejected() {
        let config = ModelConfig {
            time_step: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::Configuration { .. })
        ));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ModelConfig =
            serde_json::from_str(r#"{ "duration": 7200.0, "seed": 42 }"#).unwrap();
        assert_eq!(config.duration, 7200.0);
        assert_eq!(config.seed, 42);
        assert_eq!(config.time_step, ModelConfig::default().time_step);
    }

    #[test]
    fn test_uncertainty_defaults_are_valid() {
        assert!(UncertaintyParams::default().validate().is_ok());
        let bad = UncertaintyParams {
            speed_scale: 0.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
