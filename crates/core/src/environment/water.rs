//! Water properties for the run

use crate::core_types::units::{Celsius, Kelvin};
use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Scalar water properties the core queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterProperty {
    Temperature,
    Density,
    KinematicViscosity,
}

/// Units accepted by [`Water::get`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Kelvin,
    Celsius,
    /// kg/m³
    KilogramsPerCubicMeter,
    /// g/cm³
    GramsPerCubicCentimeter,
    /// m²/s
    SquareMetersPerSecond,
    /// cSt (mm²/s)
    Centistokes,
}

/// Water body conditions, fixed for the duration of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Water {
    pub temperature: Kelvin,
    /// kg/m³
    pub density: f64,
    /// m²/s
    pub kinematic_viscosity: f64,
}

impl Default for Water {
    fn default() -> Self {
        Self {
            temperature: Kelvin::new(288.15),
            density: 1025.0,
            kinematic_viscosity: 1.0e-6,
        }
    }
}

impl Water {
    pub fn new(temperature: Kelvin, density: f64, kinematic_viscosity: f64) -> Self {
        Self {
            temperature,
            density,
            kinematic_viscosity,
        }
    }

    /// Property value converted to `unit`
    pub fn get(&self, property: WaterProperty, unit: Unit) -> SimResult<f64> {
        match (property, unit) {
            (WaterProperty::Temperature, Unit::Kelvin) => Ok(self.temperature.value()),
            (WaterProperty::Temperature, Unit::Celsius) => {
                Ok(*Celsius::from(self.temperature))
            }
            (WaterProperty::Density, Unit::KilogramsPerCubicMeter) => Ok(self.density),
            (WaterProperty::Density, Unit::GramsPerCubicCentimeter) => Ok(self.density / 1000.0),
            (WaterProperty::KinematicViscosity, Unit::SquareMetersPerSecond) => {
                Ok(self.kinematic_viscosity)
            }
            (WaterProperty::KinematicViscosity, Unit::Centistokes) => {
                Ok(self.kinematic_viscosity * 1.0e6)
            }
            (property, unit) => Err(SimError::configuration(format!(
                "unit {unit:?} does not apply to water {property:?}"
            ))),
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(SimError::configuration("water density must be positive"));
        }
        if !(self.kinematic_viscosity.is_finite() && self.kinematic_viscosity > 0.0) {
            return Err(SimError::configuration(
                "water kinematic viscosity must be positive",
            ));
        }
        if self.temperature.value() <= 0.0 {
            return Err(SimError::configuration("water temperature must be above 0 K"));
        }
        Ok(())
    }
}
