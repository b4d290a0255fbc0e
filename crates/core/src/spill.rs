//! Spill release definitions
//!
//! A spill owns a fixed number of elements. They are allocated (status
//! `NotReleased`) when the run is prepared and materialize into the water as
//! model time passes their release times:
//!
//! - instantaneous spill (no `end_release_time`): every element at `release_time`
//! - continuous spill: element `k` of `n` at
//!   `release_time + k/n · (end_release_time − release_time)`
//!
//! Line releases spread element `k` evenly from `start_position` to
//! `end_position`.

use crate::core_types::{is_finite, Vec3};
use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Windage range applied when a spill does not set one
pub const DEFAULT_WINDAGE_RANGE: (f64, f64) = (0.01, 0.04);

/// Seconds a sampled windage persists before it is redrawn
pub const DEFAULT_WINDAGE_PERSIST: f64 = 900.0;

/// Scheduled release of oil elements sharing one origin and substance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spill {
    pub name: String,
    /// Substance id resolved through the run's substance library
    pub substance_id: String,
    pub num_elements: usize,
    /// Total released mass (kg)
    pub amount: f64,
    /// (lon, lat, z)
    pub start_position: Vec3,
    /// Far end of a line release
    pub end_position: Option<Vec3>,
    pub release_time: f64,
    /// End of a continuous release
    pub end_release_time: Option<f64>,
    /// Per-element windage drawn uniformly in `[min, max]`
    pub windage_range: (f64, f64),
    /// Seconds between windage redraws; negative draws once per element
    pub windage_persist: f64,
    pub on: bool,
}

impl Spill {
    /// Instantaneous point release
    pub fn point_release(
        name: impl Into<String>,
        substance_id: impl Into<String>,
        num_elements: usize,
        amount: f64,
        position: Vec3,
        release_time: f64,
    ) -> Self {
        Self {
            name: name.into(),
            substance_id: substance_id.into(),
            num_elements,
            amount,
            start_position: position,
            end_position: None,
            release_time,
            end_release_time: None,
            windage_range: DEFAULT_WINDAGE_RANGE,
            windage_persist: DEFAULT_WINDAGE_PERSIST,
            on: true,
        }
    }

    pub fn with_line_to(mut self, end_position: Vec3) -> Self {
        self.end_position = Some(end_position);
        self
    }

    pub fn with_continuous_release(mut self, end_release_time: f64) -> Self {
        self.end_release_time = Some(end_release_time);
        self
    }

    pub fn with_windage(mut self, range: (f64, f64), persist: f64) -> Self {
        self.windage_range = range;
        self.windage_persist = persist;
        self
    }

    /// Mass carried by each element (kg)
    pub fn mass_per_element(&self) -> f64 {
        if self.num_elements == 0 {
            0.0
        } else {
            self.amount / self.num_elements as f64
        }
    }

    /// Static checks run before the first step
    pub fn validate(&self) -> SimResult<()> {
        let (lo, hi) = self.windage_range;
        if !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && lo <= hi) {
            return Err(SimError::configuration(format!(
                "spill '{}' windage range ({lo}, {hi}) is invalid",
                self.name
            )));
        }
        if !self.release_time.is_finite() {
            return Err(SimError::configuration(format!(
                "spill '{}' release time is not finite",
                self.name
            )));
        }
        if let Some(end) = self.end_release_time {
            if !(end.is_finite() && end >= self.release_time) {
                return Err(SimError::configuration(format!(
                    "spill '{}' ends its release before it starts",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Geometry checks performed when elements are materialized
    pub fn check_geometry(&self) -> SimResult<()> {
        if !is_finite(&self.start_position) || self.end_position.is_some_and(|p| !is_finite(&p))
        {
            return Err(SimError::release(&self.name, "release position is not finite"));
        }
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(SimError::release(
                &self.name,
                format!("amount must be positive, got {}", self.amount),
            ));
        }
        if self.num_elements == 0 {
            return Err(SimError::release(
                &self.name,
                "positive amount but no elements to carry it",
            ));
        }
        Ok(())
    }

    /// Release time of the spill's element `k`
    pub fn element_release_time(&self, k: usize) -> f64 {
        match self.end_release_time {
            Some(end) if end > self.release_time && self.num_elements > 0 => {
                let span = end - self.release_time;
                self.release_time + span * k as f64 / self.num_elements as f64
            }
            _ => self.release_time,
        }
    }

    /// Number of elements whose release time is at or before `model_time`
    pub fn num_released_by(&self, model_time: f64) -> usize {
        if !self.on || model_time < self.release_time {
            return 0;
        }
        match self.end_release_time {
            Some(end) if end > self.release_time => {
                let fraction = (model_time - self.release_time) / (end - self.release_time);
                let count = (fraction * self.num_elements as f64).floor() as usize + 1;
                count.min(self.num_elements)
            }
            _ => self.num_elements,
        }
    }

    /// Start position of the spill's element `k`
    pub fn element_position(&self, k: usize) -> Vec3 {
        match self.end_position {
            Some(end) if self.num_elements > 1 => {
                let t = k as f64 / (self.num_elements - 1) as f64;
                self.start_position + (end - self.start_position) * t
            }
            _ => self.start_position,
        }
    }
}
