//! Natural dispersion of surface oil by breaking waves
//!
//! Also sets `droplet_avg_size`, which biodegradation consumes later in the
//! same step.
//!
//! # Formula
//!
//! ```text
//! H     = min(0.0248 · U², 10)                       wave height (m)
//! D_ba  = 0.0034 · ρ_w · g · H²                      dissipated wave energy (J/m²)
//! C_roy = 2400 · exp(−73.682 · √ν_oil)               entrainment coefficient
//! f_bw  = min(0.032 · (U − 5) / 5, 1)   for U > 5    breaking-wave fraction
//! Q     = C_roy · D_ba^0.57 · f_bw · 1e-6            mass flux (kg/m²/s)
//! d     = clamp(1818e-6 · D_ba^−0.5 · ν_oil^0.34, 1e-6, 4e-4)
//! ```
//!
//! Each element loses `Q · A · dt`, capped at its mass, with `A` its share
//! of the slick's area.
//!
//! # References
//! - Delvigne, G.A.L. & Sweeney, C.E. (1988) "Natural dispersion of oil"
//! - Li, Z. et al. (2017) droplet size correlation

use super::{WeatherContext, Weatherer, WeathererKind};
use crate::core_types::{Activity, GRAVITY, MIN_COMPONENT_MASS};
use crate::elements::{ElementStore, SubstanceGroup};
use crate::error::SimResult;
use tracing::debug;

const WAVE_HEIGHT_COEFF: f64 = 0.0248;
const MAX_WAVE_HEIGHT: f64 = 10.0;
const DISSIPATION_COEFF: f64 = 0.0034;
const ENTRAINMENT_BASE: f64 = 2400.0;
const ENTRAINMENT_VISCOSITY_COEFF: f64 = 73.682;
/// Wind speed (m/s) above which waves break
const BREAKING_WIND_SPEED: f64 = 5.0;
const MIN_DROPLET_SIZE: f64 = 1e-6;
const MAX_DROPLET_SIZE: f64 = 4e-4;

#[derive(Debug, Clone, Default)]
pub struct NaturalDispersion {
    activity: Activity,
}

impl NaturalDispersion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wave energy dissipation (J/m²) at wind speed `wind_speed`
    pub fn dissipation_energy(wind_speed: f64, water_density: f64) -> f64 {
        let height = (WAVE_HEIGHT_COEFF * wind_speed * wind_speed).min(MAX_WAVE_HEIGHT);
        DISSIPATION_COEFF * water_density * GRAVITY * height * height
    }

    pub fn breaking_wave_fraction(wind_speed: f64) -> f64 {
        if wind_speed > BREAKING_WIND_SPEED {
            (0.032 * (wind_speed - BREAKING_WIND_SPEED) / BREAKING_WIND_SPEED).min(1.0)
        } else {
            0.0
        }
    }

    /// Dispersed mass flux (kg/m²/s)
    pub fn mass_flux(wind_speed: f64, water_density: f64, oil_viscosity: f64) -> f64 {
        let d_ba = Self::dissipation_energy(wind_speed, water_density);
        let c_roy =
            ENTRAINMENT_BASE * (-ENTRAINMENT_VISCOSITY_COEFF * oil_viscosity.max(0.0).sqrt()).exp();
        c_roy * d_ba.powf(0.57) * Self::breaking_wave_fraction(wind_speed) * 1e-6
    }

    /// Mean entrained droplet diameter (m); `None` without wave energy
    pub fn droplet_size(dissipation_energy: f64, oil_viscosity: f64) -> Option<f64> {
        (dissipation_energy > 0.0).then(|| {
            (1818e-6 * dissipation_energy.powf(-0.5) * oil_viscosity.max(0.0).powf(0.34))
                .clamp(MIN_DROPLET_SIZE, MAX_DROPLET_SIZE)
        })
    }
}

impl Weatherer for NaturalDispersion {
    fn kind(&self) -> WeathererKind {
        WeathererKind::NaturalDispersion
    }

    fn ledger_key(&self) -> &'static str {
        "dispersed"
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
        let water_density = ctx.environment.water.density;
        let mut removed = 0.0;

        for group in groups {
            for &i in &group.indices {
                let mass = elements.mass[i];
                if mass <= MIN_COMPONENT_MASS {
                    continue;
                }
                let wind = ctx
                    .environment
                    .wind_speed(ctx.model_time, &elements.position[i]);
                let viscosity = elements.viscosity[i];

                let d_ba = Self::dissipation_energy(wind, water_density);
                if let Some(size) = Self::droplet_size(d_ba, viscosity) {
                    elements.droplet_avg_size[i] = size;
                }

                let flux = Self::mass_flux(wind, water_density, viscosity);
                let loss = (flux * elements.area[i] * ctx.time_step).min(mass);
                if loss <= 0.0 {
                    continue;
                }
                let keep = (mass - loss) / mass;
                for m in elements.components_mut(i) {
                    if *m > MIN_COMPONENT_MASS {
                        *m *= keep;
                    }
                }
                elements.sync_mass(i);
                removed += mass - elements.mass[i];
            }
            debug!(
                "Natural dispersion of {}: {:.6} kg dispersed so far this step",
                group.substance.name(),
                removed
            );
        }
        Ok(removed)
    }
}
