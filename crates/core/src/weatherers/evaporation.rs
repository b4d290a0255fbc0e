//! Evaporation of volatile pseudocomponents
//!
//! # Formula
//!
//! Per component `j`, first-order loss over the step:
//!
//! ```text
//! m_j ← m_j · exp(−A · K · P_j / (R · T · Σn) · dt)
//! K   = 0.0025 · max(U, 1)^0.78                     mass transfer coefficient (m/s)
//! P_j = 101325 · exp(10.57 · (1 − T_b,j / T))       vapour pressure (Pa)
//! n_j = m_j / MW_j                                  moles
//! ```
//!
//! `A` is the element's share of its slick's area, `U` the wind speed at the element
//! (0 where the wind has no coverage) and `T` the water temperature.
//!
//! # References
//! - Mackay, D. & Matsugu, R.S. (1973) "Evaporation rates of liquid hydrocarbon spills"

use super::{decay_components, WeatherContext, Weatherer, WeathererKind};
use crate::core_types::{
    Activity, StatusCode, ATMOSPHERIC_PRESSURE, GAS_CONSTANT, MIN_COMPONENT_MASS,
};
use crate::elements::{ElementStore, SubstanceGroup};
use crate::error::SimResult;
use tracing::debug;

/// Mass transfer coefficient at 1 m/s wind (m/s)
const MASS_TRANSFER_BASE: f64 = 0.0025;
const MASS_TRANSFER_WIND_EXPONENT: f64 = 0.78;
/// Clausius-Clapeyron slope of the vapour pressure correlation
const VAPOR_PRESSURE_SLOPE: f64 = 10.57;

#[derive(Debug, Clone, Default)]
pub struct Evaporation {
    activity: Activity,
}

impl Evaporation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mass transfer coefficient (m/s) at wind speed `wind_speed` (m/s)
    pub fn mass_transfer_coefficient(wind_speed: f64) -> f64 {
        MASS_TRANSFER_BASE * wind_speed.max(1.0).powf(MASS_TRANSFER_WIND_EXPONENT)
    }

    /// Vapour pressure (Pa) of a component boiling at `boiling_point` (K)
    pub fn vapor_pressure(boiling_point: f64, water_temperature: f64) -> f64 {
        ATMOSPHERIC_PRESSURE
            * (VAPOR_PRESSURE_SLOPE * (1.0 - boiling_point / water_temperature)).exp()
    }
}

impl Weatherer for Evaporation {
    fn kind(&self) -> WeathererKind {
        WeathererKind::Evaporation
    }

    fn ledger_key(&self) -> &'static str {
        "evaporated"
    }

    fn needs_area(&self) -> bool {
        true
    }

    fn activity(&self) -> &Activity {
        &self.activity
    }

    fn activity_mut(&mut self) -> &mut Activity {
        &mut self.activity
    }

    fn weather(
        &mut self,
        groups: &[SubstanceGroup],
        elements: &mut ElementStore,
        ctx: &WeatherContext<'_>,
    ) -> SimResult<f64> {
        let temperature = ctx.environment.water.temperature.value();
        let mut removed = 0.0;
        let mut evaporated = 0;

        for group in groups {
            let components = group.substance.components();
            let pressures: Vec<f64> = components
                .iter()
                .map(|c| Self::vapor_pressure(c.boiling_point, temperature))
                .collect();

            for &i in &group.indices {
                let moles: f64 = elements
                    .components(i)
                    .iter()
                    .zip(components)
                    .filter(|(m, _)| **m > MIN_COMPONENT_MASS)
                    .map(|(m, c)| m / c.molecular_weight)
                    .sum();
                if moles <= 0.0 {
                    continue;
                }
                let wind = ctx
                    .environment
                    .wind_speed(ctx.model_time, &elements.position[i]);
                let k = Self::mass_transfer_coefficient(wind);
                let scale = elements.area[i] * k * ctx.time_step
                    / (GAS_CONSTANT * temperature * moles);

                removed += decay_components(elements, i, components.len(), |j| {
                    scale * pressures[j]
                });

                if elements.mass[i] <= MIN_COMPONENT_MASS {
                    elements.status[i] = StatusCode::Evaporated;
                    evaporated += 1;
                }
            }
        }

        if evaporated > 0 {
            debug!("{} elements fully evaporated", evaporated);
        }
        Ok(removed)
    }
}
