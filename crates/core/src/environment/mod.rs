//! Environment collaborators: water properties, wind/current samplers and
//! grid topology discovery
//!
//! The [`Environment`] is built once per run and only read afterwards;
//! movers and weatherers never mutate it.

pub mod field;
pub mod topology;
pub mod water;

pub use field::{
    velocity_from_speed_direction, ConstantField, Coverage, FieldSampler, TimeSeriesField,
};
pub use topology::{discover_node_coordinates, GridKind, NodeCoordinates, TopologyStrategy};
pub use water::{Unit, Water, WaterProperty};

use crate::core_types::Vec3;
use crate::error::SimResult;
use std::sync::Arc;

/// Read-only environmental conditions for a run
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub water: Water,
    /// Wind used by weathering processes (evaporation, dispersion)
    pub wind: Option<Arc<dyn FieldSampler>>,
}

impl Environment {
    pub fn new(water: Water) -> Self {
        Self { water, wind: None }
    }

    pub fn with_wind(mut self, wind: Arc<dyn FieldSampler>) -> Self {
        self.wind = Some(wind);
        self
    }

    /// Horizontal wind speed (m/s) at `position`; 0 without wind or coverage
    pub fn wind_speed(&self, time: f64, position: &Vec3) -> f64 {
        self.wind
            .as_ref()
            .and_then(|wind| wind.sample(time, position).ok())
            .map_or(0.0, |v| v.x.hypot(v.y))
    }

    pub fn validate(&self) -> SimResult<()> {
        self.water.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::MetersPerSecond;
    use approx::assert_relative_eq;

    #[test]
    fn test_wind_speed_without_wind_is_zero() {
        let env = Environment::default();
        assert_eq!(env.wind_speed(0.0, &Vec3::zeros()), 0.0);
    }

    #[test]
    fn test_wind_speed_magnitude() {
        let env = Environment::default().with_wind(Arc::new(ConstantField::wind(
            MetersPerSecond::new(7.0),
            45.0,
        )));
        assert_relative_eq!(env.wind_speed(0.0, &Vec3::zeros()), 7.0, epsilon = 1e-12);
    }
}
