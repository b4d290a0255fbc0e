//! Boundary maps: land/water/off-map classification and refloating
//!
//! The map is an external collaborator; the store asks it to classify each
//! moved element once per step, after all mover displacements are summed.
//!
//! # Refloating
//!
//! Beached oil returns to the water with a half-life:
//!
//! ```text
//! p(refloat during dt) = 1 − 0.5^(dt / t_half)
//! ```
//!
//! A half-life of zero or below means beached oil never refloats.

use crate::core_types::Vec3;
use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a position lies relative to the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    InWater,
    OnLand,
    OffMap,
}

/// Land/water boundary collaborator
pub trait BoundaryMap: Send + Sync + fmt::Debug {
    fn classify(&self, position: &Vec3) -> Classification;

    /// Probability that an element beached for `time_since_beached` seconds
    /// refloats during the next `time_step`
    fn refloat_probability(&self, time_since_beached: f64, time_step: f64) -> f64;
}

/// Half-life refloat probability shared by the map implementations
pub fn halflife_refloat_probability(halflife: f64, time_step: f64) -> f64 {
    if halflife <= 0.0 || time_step <= 0.0 {
        return 0.0;
    }
    1.0 - 0.5_f64.powf(time_step / halflife)
}

/// Unbounded ocean: everything is water, nothing beaches
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenWaterMap;

impl BoundaryMap for OpenWaterMap {
    fn classify(&self, _position: &Vec3) -> Classification {
        Classification::InWater
    }

    fn refloat_probability(&self, _time_since_beached: f64, _time_step: f64) -> f64 {
        0.0
    }
}

/// Lon/lat rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLatBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl LonLatBox {
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    pub fn contains(&self, position: &Vec3) -> bool {
        position.x >= self.lon_min
            && position.x <= self.lon_max
            && position.y >= self.lat_min
            && position.y <= self.lat_max
    }

    fn is_valid(&self) -> bool {
        [self.lon_min, self.lat_min, self.lon_max, self.lat_max]
            .iter()
            .all(|v| v.is_finite())
            && self.lon_min < self.lon_max
            && self.lat_min < self.lat_max
    }
}

/// Rectangular domain with rectangular land patches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangularMap {
    bounds: LonLatBox,
    land: Vec<LonLatBox>,
    /// Refloat half-life in seconds
    refloat_halflife: f64,
}

impl RectangularMap {
    pub fn new(bounds: LonLatBox) -> SimResult<Self> {
        if !bounds.is_valid() {
            return Err(SimError::configuration(format!(
                "map bounds are degenerate: {bounds:?}"
            )));
        }
        Ok(Self {
            bounds,
            land: Vec::new(),
            refloat_halflife: 0.0,
        })
    }

    pub fn with_land(mut self, land: LonLatBox) -> SimResult<Self> {
        if !land.is_valid() {
            return Err(SimError::configuration(format!(
                "land polygon is degenerate: {land:?}"
            )));
        }
        self.land.push(land);
        Ok(self)
    }

    pub fn with_refloat_halflife(mut self, seconds: f64) -> Self {
        self.refloat_halflife = seconds;
        self
    }

    pub fn bounds(&self) -> &LonLatBox {
        &self.bounds
    }
}

impl BoundaryMap for RectangularMap {
    fn classify(&self, position: &Vec3) -> Classification {
        if !self.bounds.contains(position) {
            Classification::OffMap
        } else if self.land.iter().any(|l| l.contains(position)) {
            Classification::OnLand
        } else {
            Classification::InWater
        }
    }

    fn refloat_probability(&self, _time_since_beached: f64, time_step: f64) -> f64 {
        halflife_refloat_probability(self.refloat_halflife, time_step)
    }
}
