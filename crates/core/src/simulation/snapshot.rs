//! Post-step views of the run for reporting

use super::ModelState;
use crate::core_types::{StatusCode, Vec3};
use crate::elements::ElementStore;
use crate::intrinsic::WeatheringData;
use crate::mass_balance::MassBalance;
use serde::{Deserialize, Serialize};

/// Read-only view of the committed run state
///
/// Borrowed from the model; it cannot outlive the next `step`.
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub state: ModelState,
    /// Model time the committed state corresponds to (s)
    pub model_time: f64,
    /// Number of committed steps
    pub step: usize,
    pub elements: &'a ElementStore,
    pub mass_balance: &'a MassBalance,
    pub weathering: &'a WeatheringData,
}

impl Snapshot<'_> {
    pub fn num_released(&self) -> usize {
        self.elements.released_count()
    }

    /// Copy the view into a serializable value
    pub fn to_owned(&self) -> OwnedSnapshot {
        let e = self.elements;
        OwnedSnapshot {
            state: self.state,
            model_time: self.model_time,
            step: self.step,
            id: e.id.clone(),
            spill_index: e.spill_index.clone(),
            position: e.position.clone(),
            status: e.status.clone(),
            mass: e.mass.clone(),
            density: e.density.clone(),
            viscosity: e.viscosity.clone(),
            age: e.age.clone(),
            area: e.area.clone(),
            windage: e.windage.clone(),
            droplet_avg_size: e.droplet_avg_size.clone(),
            mass_balance: self
                .mass_balance
                .entries()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            weathering: *self.weathering,
        }
    }
}

/// Owned, serializable copy of a [`Snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedSnapshot {
    pub state: ModelState,
    pub model_time: f64,
    pub step: usize,
    pub id: Vec<usize>,
    pub spill_index: Vec<usize>,
    pub position: Vec<Vec3>,
    pub status: Vec<StatusCode>,
    pub mass: Vec<f64>,
    pub density: Vec<f64>,
    pub viscosity: Vec<f64>,
    pub age: Vec<f64>,
    pub area: Vec<f64>,
    pub windage: Vec<f64>,
    pub droplet_avg_size: Vec<f64>,
    /// Ledger entries sorted by key
    pub mass_balance: Vec<(String, f64)>,
    pub weathering: WeatheringData,
}

impl OwnedSnapshot {
    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    pub fn count_with_status(&self, status: StatusCode) -> usize {
        self.status.iter().filter(|&&s| s == status).count()
    }
}
