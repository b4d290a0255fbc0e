//! Intrinsic property updater
//!
//! Derives per-element physical properties from the substance and the water
//! each step, before any mover or weatherer runs:
//!
//! - newly released elements get `density`, `viscosity` and their
//!   `mass_components` split; with the area capability on, also
//!   `relative_buoyancy`, `init_volume` and `init_area`
//! - every released element gets its slick `area` refreshed (area capability)
//!   as its `volume_share` of the whole slick's area
//! - [`WeatheringData`] aggregates are recomputed over the whole population
//!
//! # Spreading (Fay gravity-viscous)
//!
//! ```text
//! A0      = π · (k2⁴ / k1²) · ((V0⁵ · g · Δb) / ν²)^(1/6)
//! A(age)  = A0 + (ΔFay + ΔEddy) · age                      age > 0
//! ΔFay    = (k2² / 16) · (g · Δb · V0² / √(ν · age))
//! ΔEddy   = 0.033 · age^(4/25)
//! ```
//!
//! with `k1 = 1.53`, `k2 = 1.21`, `Δb = (ρ_w − ρ_oil) / ρ_w` and `ν` the water
//! kinematic viscosity. At `age == 0` the area is exactly `A0`.
//!
//! `A` is the area of the whole slick released together. Element `i` carries
//! `area_i = A(age) · frac_coverage_i · (m_i / ρ_i) / V0`, with the volume
//! share taken at release, so the slick's total area does not depend on how
//! many elements it is split into.
//!
//! # References
//! - Fay, J.A. (1971) "Physical processes in the spread of oil on a water surface"

use crate::core_types::GRAVITY;
use crate::elements::ElementStore;
use crate::environment::Water;
use crate::error::{SimError, SimResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::Range;
use tracing::debug;

/// Fay spreading law with the gravity-viscous constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FayGravityViscous {
    pub k1: f64,
    pub k2: f64,
}

impl Default for FayGravityViscous {
    fn default() -> Self {
        Self { k1: 1.53, k2: 1.21 }
    }
}

impl FayGravityViscous {
    /// Initial slick area (m²) for volume `init_volume` (m³)
    pub fn init_area(
        &self,
        water_viscosity: f64,
        init_volume: f64,
        relative_buoyancy: f64,
    ) -> SimResult<f64> {
        check_buoyancy(relative_buoyancy)?;
        let k = PI * self.k2.powi(4) / self.k1.powi(2);
        let inner = init_volume.powi(5) * GRAVITY * relative_buoyancy / water_viscosity.powi(2);
        Ok(k * inner.powf(1.0 / 6.0))
    }

    /// Area (m²) after spreading for `age` seconds
    pub fn update_area(
        &self,
        water_viscosity: f64,
        init_area: f64,
        init_volume: f64,
        relative_buoyancy: f64,
        age: f64,
    ) -> SimResult<f64> {
        check_buoyancy(relative_buoyancy)?;
        if age <= 0.0 {
            return Ok(init_area);
        }
        let d_fay = self.k2.powi(2) / 16.0
            * (GRAVITY * relative_buoyancy * init_volume.powi(2)
                / (water_viscosity * age).sqrt());
        let d_eddy = 0.033 * age.powf(4.0 / 25.0);
        Ok(init_area + (d_fay + d_eddy) * age)
    }
}

fn check_buoyancy(relative_buoyancy: f64) -> SimResult<()> {
    if relative_buoyancy < 0.0 {
        return Err(SimError::physics(
            "spreading",
            format!("relative buoyancy {relative_buoyancy} < 0: oil heavier than water"),
        ));
    }
    Ok(())
}

/// Run-level aggregates maintained alongside the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatheringData {
    /// Mass-weighted mean density of released oil (kg/m³)
    pub avg_density: f64,
    /// Mass-weighted mean kinematic viscosity (m²/s)
    pub avg_viscosity: f64,
    /// Mass of in-water elements (kg)
    pub floating: f64,
    /// Cumulative mass released (kg)
    pub amount_released: f64,
}

/// Updates intrinsic element properties every step
#[derive(Debug, Clone, Default)]
pub struct IntrinsicProps {
    pub spreading: FayGravityViscous,
    /// Maintain `area` and its inputs; on when any weatherer needs area
    pub area_enabled: bool,
}

impl IntrinsicProps {
    pub fn new(area_enabled: bool) -> Self {
        Self {
            area_enabled,
            ..Default::default()
        }
    }

    /// Update `elements` after the elements in `new_elements` were released
    ///
    /// `new_elements` may hold several disjoint ranges (one per spill).
    pub fn update(
        &self,
        new_elements: &[Range<usize>],
        elements: &mut ElementStore,
        water: &Water,
        data: &mut WeatheringData,
    ) -> SimResult<()> {
        let num_new: usize = new_elements.iter().map(|r| r.len()).sum();
        if num_new > 0 {
            self.init_new_elements(new_elements, elements, water)?;
            data.amount_released += new_elements
                .iter()
                .flat_map(|r| r.clone())
                .map(|i| elements.mass[i])
                .sum::<f64>();
            debug!("Initialized intrinsic properties of {} new elements", num_new);
        }

        if self.area_enabled {
            self.update_areas(elements, water)?;
        }

        update_weathering_data(elements, data);
        Ok(())
    }

    fn init_new_elements(
        &self,
        new_elements: &[Range<usize>],
        elements: &mut ElementStore,
        water: &Water,
    ) -> SimResult<()> {
        let mut new_indices: Vec<usize> = new_elements.iter().flat_map(|r| r.clone()).collect();
        new_indices.sort_unstable();

        for substance_index in 0..elements.substances().len() {
            let group: Vec<usize> = new_indices
                .iter()
                .copied()
                .filter(|&i| elements.substance_index[i] == substance_index)
                .collect();
            if group.is_empty() {
                continue;
            }
            let substance = elements.substances()[substance_index].clone();
            let density = substance.density_at(water.temperature);
            let viscosity = substance.viscosity_at(water.temperature);
            let relative_buoyancy = (water.density - density) / water.density;

            if self.area_enabled {
                check_buoyancy(relative_buoyancy).map_err(|_| {
                    SimError::physics(
                        "intrinsic",
                        format!(
                            "{} ({density:.1} kg/m³) is denser than water ({:.1} kg/m³)",
                            substance.name(),
                            water.density
                        ),
                    )
                })?;
            }

            // all elements of a substance released together spread as one slick
            let init_volume: f64 = group.iter().map(|&i| elements.mass[i] / density).sum();
            let init_area = if self.area_enabled {
                self.spreading.init_area(
                    water.kinematic_viscosity,
                    init_volume,
                    relative_buoyancy,
                )?
            } else {
                0.0
            };

            for &i in &group {
                elements.density[i] = density;
                if let Some(nu) = viscosity {
                    elements.viscosity[i] = nu;
                }
                elements.init_components(i);
                if self.area_enabled {
                    elements.relative_buoyancy[i] = relative_buoyancy;
                    elements.init_volume[i] = init_volume;
                    elements.init_area[i] = init_area;
                    elements.volume_share[i] = if init_volume > 0.0 {
                        elements.mass[i] / density / init_volume
                    } else {
                        0.0
                    };
                }
            }
        }
        Ok(())
    }

    fn update_areas(&self, elements: &mut ElementStore, water: &Water) -> SimResult<()> {
        let spreading = self.spreading;
        let nu = water.kinematic_viscosity;
        let ElementStore {
            status,
            init_area,
            init_volume,
            relative_buoyancy,
            age,
            frac_coverage,
            area,
            volume_share,
            ..
        } = elements;

        area.par_iter_mut()
            .enumerate()
            .filter(|(i, _)| status[*i].is_released())
            .try_for_each(|(i, out)| {
                let spread = spreading.update_area(
                    nu,
                    init_area[i],
                    init_volume[i],
                    relative_buoyancy[i],
                    age[i],
                )?;
                *out = spread * frac_coverage[i] * volume_share[i];
                Ok(())
            })
    }
}

/// Recompute mass-weighted averages and floating mass
pub fn update_weathering_data(elements: &ElementStore, data: &mut WeatheringData) {
    let total = elements.total_mass();
    if total > 0.0 {
        let weighted = |values: &[f64]| -> f64 {
            elements
                .mass
                .iter()
                .zip(values)
                .map(|(m, v)| m * v)
                .sum::<f64>()
                / total
        };
        data.avg_density = weighted(&elements.density);
        data.avg_viscosity = weighted(&elements.viscosity);
    } else {
        data.avg_density = 0.0;
        data.avg_viscosity = 0.0;
    }
    data.floating = elements
        .status
        .iter()
        .zip(&elements.mass)
        .filter(|(s, _)| s.is_in_water())
        .map(|(_, m)| m)
        .sum();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::Kelvin;
    use crate::core_types::{seeded_rng, Vec3};
    use crate::spill::Spill;
    use crate::substance::{ComponentClass, PseudoComponent, Substance};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn released_store(substance: Substance, n: usize) -> (ElementStore, Range<usize>) {
        let spills = vec![Spill::point_release(
            "s",
            "oil",
            n,
            1000.0,
            Vec3::zeros(),
            0.0,
        )];
        let mut store = ElementStore::allocate(&spills, &[Arc::new(substance)]).unwrap();
        let mut rng = seeded_rng(0);
        let range = store.release(0, &spills[0], 0.0, &mut rng).unwrap();
        (store, range)
    }

    #[test]
    fn test_area_at_age_zero_is_init_area() {
        let fay = FayGravityViscous::default();
        let a0 = fay.init_area(1e-6, 1.0, 0.13).unwrap();
        assert!(a0 > 0.0);
        assert_eq!(fay.update_area(1e-6, a0, 1.0, 0.13, 0.0).unwrap(), a0);
        assert!(fay.update_area(1e-6, a0, 1.0, 0.13, 900.0).unwrap() > a0);
    }

    #[test]
    fn test_init_area_formula() {
        let fay = FayGravityViscous::default();
        let (nu, v0, db) = (1e-6_f64, 2.0_f64, 0.1_f64);
        let expected = PI * 1.21_f64.powi(4) / 1.53_f64.powi(2)
            * ((v0.powi(5) * GRAVITY * db) / nu.powi(2)).powf(1.0 / 6.0);
        assert_relative_eq!(fay.init_area(nu, v0, db).unwrap(), expected);
    }

    #[test]
    fn test_negative_buoyancy_is_physics_error() {
        let fay = FayGravityViscous::default();
        assert!(matches!(
            fay.init_area(1e-6, 1.0, -0.01),
            Err(SimError::Physics { .. })
        ));
    }

    #[test]
    fn test_new_elements_share_slick_volume() {
        let (mut store, range) = released_store(Substance::medium_crude(), 4);
        let water = Water::default();
        let mut data = WeatheringData::default();
        IntrinsicProps::new(true)
            .update(&[range], &mut store, &water, &mut data)
            .unwrap();

        let rho = Substance::medium_crude().density_at(water.temperature);
        assert_relative_eq!(store.density[0], rho);
        assert_relative_eq!(store.init_volume[0], 1000.0 / rho, epsilon = 1e-12);
        assert_relative_eq!(store.volume_share[0], 0.25, epsilon = 1e-12);
        assert_eq!(store.area[0], store.init_area[0] * store.volume_share[0]);
        let total: f64 = store.area.iter().sum();
        assert_relative_eq!(total, store.init_area[0], max_relative = 1e-12);
        assert_relative_eq!(data.amount_released, 1000.0);
        assert_relative_eq!(data.floating, 1000.0);
        assert_relative_eq!(data.avg_density, rho);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_heavy_oil_rejected_with_area() {
        let components = vec![PseudoComponent::new(ComponentClass::Asphaltene, 900.0, 1.0, 1.0)];
        let heavy = Substance::new("bitumen", components, 1100.0, Kelvin::new(288.15), None)
            .unwrap();
        let (mut store, range) = released_store(heavy.clone(), 2);
        let err = IntrinsicProps::new(true)
            .update(
                &[range.clone()],
                &mut store,
                &Water::default(),
                &mut WeatheringData::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::Physics { .. }));

        // without the area capability buoyancy is irrelevant
        let (mut store, range) = released_store(heavy, 2);
        assert!(IntrinsicProps::new(false)
            .update(
                &[range],
                &mut store,
                &Water::default(),
                &mut WeatheringData::default()
            )
            .is_ok());
    }

    #[test]
    fn test_area_scaled_by_coverage() {
        let (mut store, range) = released_store(Substance::diesel(), 2);
        let water = Water::default();
        let props = IntrinsicProps::new(true);
        let mut data = WeatheringData::default();
        props.update(&[range], &mut store, &water, &mut data).unwrap();
        store.advance_age(3600.0);
        store.frac_coverage[1] = 0.5;
        props.update(&[], &mut store, &water, &mut data).unwrap();
        assert_relative_eq!(store.area[1], 0.5 * store.area[0], epsilon = 1e-9);
        assert!(store.area[0] > store.init_area[0] * store.volume_share[0]);
    }
}
