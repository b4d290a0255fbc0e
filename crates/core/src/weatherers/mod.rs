//! Weathering processes
//!
//! A [`Weatherer`] mutates element mass (and derived arrays) in place and
//! reports the mass it removed. The orchestrator, not the weatherer, writes
//! that amount into the ledger under [`Weatherer::ledger_key`].
//!
//! Weatherers run in a fixed order by [`WeathererKind`], ties broken by
//! registration order. Biodegradation reads `droplet_avg_size`, which
//! natural dispersion sets, so it always runs last.

pub mod biodegradation;
pub mod dispersion;
pub mod evaporation;

pub use biodegradation::{rate_constant, Biodegradation, BiodegradationConfig, Climate};
pub use dispersion::NaturalDispersion;
pub use evaporation::Evaporation;

use crate::core_types::{Activity, MIN_COMPONENT_MASS};
use crate::elements::{ElementStore, SubstanceGroup};
use crate::environment::Environment;
use crate::error::SimResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Explicit weatherer variant tag; the derived order is the run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeathererKind {
    Evaporation,
    NaturalDispersion,
    Biodegradation,
}

impl WeathererKind {
    pub fn name(self) -> &'static str {
        match self {
            WeathererKind::Evaporation => "Evaporation",
            WeathererKind::NaturalDispersion => "NaturalDispersion",
            WeathererKind::Biodegradation => "Biodegradation",
        }
    }
}

/// Step inputs shared by every weatherer
#[derive(Debug, Clone, Copy)]
pub struct WeatherContext<'a> {
    pub model_time: f64,
    pub time_step: f64,
    pub environment: &'a Environment,
}

/// Mass/property transform applied to in-water elements each step
pub trait Weatherer: Send + Sync + fmt::Debug {
    fn kind(&self) -> WeathererKind;

    /// Ledger entry this weatherer's removed mass is booked under
    fn ledger_key(&self) -> &'static str;

    /// Whether the process needs the `area` array maintained
    fn needs_area(&self) -> bool {
        false
    }

    fn activity(&self) -> &Activity;

    fn activity_mut(&mut self) -> &mut Activity;

    /// Resolve environment-dependent settings once per run
    fn prepare_for_run(&mut self, _environment: &Environment) -> SimResult<()> {
        Ok(())
    }

    /// Weather the elements in `groups` over one step
    ///
    /// # Arguments
    ///
    /// * `groups` - In-water elements, one group per substance
    /// * `elements` - Store whose mass arrays are mutated in place
    /// * `ctx` - Step time and environment
    ///
    /// # Returns
    ///
    /// Mass removed this step (kg), never negative
    fn weather(
        &mut self,
        groups: &[SubstanceGroup],
        elements: &mut ElementStore,
        ctx: &WeatherContext<'_>,
    ) -> SimResult<f64>;
}

/// Apply per-component first-order decay `m_j ← m_j · exp(−k_j)` to element `i`
///
/// `exponent(j)` returns the dimensionless `k_j` for component `j`; components
/// at or below [`MIN_COMPONENT_MASS`] are skipped. Returns the mass removed.
pub(crate) fn decay_components(
    elements: &mut ElementStore,
    i: usize,
    num_components: usize,
    mut exponent: impl FnMut(usize) -> f64,
) -> f64 {
    let before = elements.mass[i];
    let components = elements.components_mut(i);
    for (j, m) in components.iter_mut().take(num_components).enumerate() {
        if *m <= MIN_COMPONENT_MASS {
            continue;
        }
        let k = exponent(j);
        if k > 0.0 {
            *m *= (-k).exp();
        }
    }
    elements.sync_mass(i);
    (before - elements.mass[i]).max(0.0)
}
