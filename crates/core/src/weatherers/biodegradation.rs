//! Biodegradation of dispersed oil droplets
//!
//! Only saturates lighter than C30 and aromatics degrade. Each component gets
//! a first-order rate constant (per day) from a fixed table keyed by class,
//! boiling point and climate:
//!
//! | class | boiling point | temperate | arctic |
//! |---|---|---|---|
//! | Saturate | ≤ 722.85 K (C30) | 0.941386396 | 0.128807242 |
//! | Saturate | > 722.85 K | 0.0 | 0.0 |
//! | Aromatic | ≤ 630 K | 0.575541103 | 0.126982603 |
//! | Aromatic | > 630 K | 0.084840485 | 0.021054707 |
//! | Resin, Asphaltene | any | 0.0 | 0.0 |
//!
//! A boiling point exactly at a threshold counts as below it.
//!
//! # Formula
//!
//! ```text
//! m_j ← m_j · exp(−π · d² · k_j · (dt / 86400) / M)
//! ```
//!
//! `d` is the element's `droplet_avg_size` and `M` its total component mass.

use super::{decay_components, WeatherContext, Weatherer, WeathererKind};
use crate::core_types::units::{Celsius, Kelvin};
use crate::core_types::{Activity, MIN_COMPONENT_MASS, SECONDS_PER_DAY};
use crate::elements::{ElementStore, SubstanceGroup};
use crate::environment::Environment;
use crate::error::SimResult;
use crate::substance::ComponentClass;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Boiling point of the C30 saturate (K)
pub const SATURATE_C30_BOILING_POINT: f64 = 722.85;

/// Aromatic boiling point splitting fast and slow degraders (K)
pub const AROMATIC_BOILING_POINT_SPLIT: f64 = 630.0;

/// Water colder than this counts as arctic
pub const ARCTIC_WATER_TEMPERATURE: Celsius = Celsius::new(6.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Climate {
    Temperate,
    Arctic,
}

impl Climate {
    pub fn from_water_temperature(temperature: Kelvin) -> Self {
        if Celsius::from(temperature) < ARCTIC_WATER_TEMPERATURE {
            Climate::Arctic
        } else {
            Climate::Temperate
        }
    }
}

/// First-order biodegradation rate constant (1/day) for one pseudocomponent
pub fn rate_constant(class: ComponentClass, boiling_point: f64, climate: Climate) -> f64 {
    let arctic = climate == Climate::Arctic;
    match class {
        ComponentClass::Saturate if boiling_point <= SATURATE_C30_BOILING_POINT => {
            if arctic {
                0.128_807_242
            } else {
                0.941_386_396
            }
        }
        ComponentClass::Aromatic if boiling_point <= AROMATIC_BOILING_POINT_SPLIT => {
            if arctic {
                0.126_982_603
            } else {
                0.575_541_103
            }
        }
        ComponentClass::Aromatic => {
            if arctic {
                0.021_054_707
            } else {
                0.084_840_485
            }
        }
        ComponentClass::Saturate | ComponentClass::Resin | ComponentClass::Asphaltene => 0.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiodegradationConfig {
    /// Fixed climate; derived from the water temperature when unset
    pub climate: Option<Climate>,
}

#[derive(Debug, Clone, Default)]
pub struct Biodegradation {
    pub config: BiodegradationConfig,
    activity: Activity,
    climate: Option<Climate>,
}

impl Biodegradation {
    pub fn new(config: BiodegradationConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Climate resolved for the current run
    pub fn climate(&self) -> Option<Climate> {
        self.climate
    }
}

impl Weatherer for Biodegradation {
    fn kind(&self) -> WeathererKind {
        WeathererKind::Biodegradation
    }

    fn ledger_key(&self) -> &'static str {
        "bio_degradation"
    }

    fn activity(&self) -> &Activity {
        &self.activity
    }

    fn activity_mut(&mut self) -> &mut Activity {
        &mut self.activity
    }

    fn prepare_for_run(&mut self, environment: &Environment) -> SimResult<()> {
        let climate = self
            .config
            .climate
            .unwrap_or_else(|| Climate::from_water_temperature(environment.water.temperature));
        debug!("Biodegradation climate: {:?}", climate);
        self.climate = Some(climate);
        Ok(())
    }

    fn weather(
        &mut self,
        groups: &[SubstanceGroup],
        elements: &mut ElementStore,
        ctx: &WeatherContext<'_>,
    ) -> SimResult<f64> {
        let climate = self.climate.unwrap_or_else(|| {
            Climate::from_water_temperature(ctx.environment.water.temperature)
        });
        let day_fraction = ctx.time_step / SECONDS_PER_DAY;
        let mut removed = 0.0;

        for group in groups {
            let rates: Vec<f64> = group
                .substance
                .components()
                .iter()
                .map(|c| rate_constant(c.class, c.boiling_point, climate))
                .collect();

            for &i in &group.indices {
                let total = elements.mass[i];
                let diameter = elements.droplet_avg_size[i];
                if total <= MIN_COMPONENT_MASS || diameter <= 0.0 {
                    continue;
                }
                let scale = PI * diameter * diameter * day_fraction / total;
                removed += decay_components(elements, i, rates.len(), |j| scale * rates[j]);
            }
            debug!(
                "Biodegradation of {}: {:.6} kg removed so far this step",
                group.substance.name(),
                removed
            );
        }
        Ok(removed)
    }
}
