//! Error taxonomy for the step engine
//!
//! Provides the `SimError` enum and `SimResult` alias used across the crate.
//!
//! | variant | when | effect on the run |
//! |---|---|---|
//! | `Configuration` | invalid static setup | surfaced before the first step commits |
//! | `Physics` | invariant violated mid-run | run enters `Failed`, not resumable |
//! | `DataGap` | field has no coverage | recovered inside movers, never leaves `step` |
//! | `Release` | degenerate spill geometry | fatal for the step, earlier elements untouched |
//! | `SimulationComplete` | `step` after the run ended | no mutation |

use thiserror::Error;

/// Crate-wide result type
pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Missing or invalid static setup
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A physical invariant was violated during a step
    #[error("physics error in {process}: {message}")]
    Physics {
        /// Component that detected the violation
        process: String,
        message: String,
    },

    /// Field sampler has no coverage at the requested time/place
    #[error("no field data for {field} at t={time}s")]
    DataGap { field: String, time: f64 },

    /// Spill geometry cannot produce elements
    #[error("release error for spill '{spill}': {message}")]
    Release { spill: String, message: String },

    /// The run already reached its terminal state
    #[error("simulation complete at t={model_time}s")]
    SimulationComplete { model_time: f64 },
}

impl SimError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SimError::Configuration {
            message: message.into(),
        }
    }

    pub fn physics(process: impl Into<String>, message: impl Into<String>) -> Self {
        SimError::Physics {
            process: process.into(),
            message: message.into(),
        }
    }

    pub fn release(spill: impl Into<String>, message: impl Into<String>) -> Self {
        SimError::Release {
            spill: spill.into(),
            message: message.into(),
        }
    }

    /// Fatal errors halt stepping; only data gaps are recoverable
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SimError::DataGap { .. })
    }
}
