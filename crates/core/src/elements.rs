//! Columnar per-element state
//!
//! [`ElementStore`] keeps every element attribute in its own `Vec`
//! (structure of arrays). Index `i` is the same element in every array and
//! all arrays always have the same length.
//!
//! Elements for every spill are allocated up front when a run is prepared,
//! each spill owning one contiguous index range. They start `NotReleased`
//! with zero mass and materialize through [`ElementStore::release`].
//!
//! `mass_components` is flattened with a fixed stride equal to the widest
//! substance of the run; element `i` owns
//! `mass_components[i * stride..(i + 1) * stride]` and unused trailing slots
//! stay zero.

use crate::core_types::{StatusCode, Vec3};
use crate::error::{SimError, SimResult};
use crate::map::{BoundaryMap, Classification};
use crate::spill::Spill;
use crate::substance::Substance;
use rand::Rng;
use std::ops::Range;
use std::sync::Arc;

/// Relative tolerance for `Σ mass_components == mass`
const COMPONENT_SUM_TOLERANCE: f64 = 1e-9;

/// Elements of one substance selected by a predicate
#[derive(Debug, Clone)]
pub struct SubstanceGroup {
    pub substance_index: usize,
    pub substance: Arc<Substance>,
    /// Ascending element indices
    pub indices: Vec<usize>,
}

/// Outcome of applying one step's displacements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub moved: usize,
    pub beached: usize,
    pub off_map: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    stride: usize,
    substances: Vec<Arc<Substance>>,
    spill_ranges: Vec<Range<usize>>,
    released_per_spill: Vec<usize>,

    pub id: Vec<usize>,
    pub spill_index: Vec<usize>,
    pub substance_index: Vec<usize>,
    pub position: Vec<Vec3>,
    /// Last position classified as water, used when refloating
    pub last_water_position: Vec<Vec3>,
    pub status: Vec<StatusCode>,
    /// kg
    pub mass: Vec<f64>,
    /// kg per pseudocomponent, flattened with `stride`
    pub mass_components: Vec<f64>,
    /// kg/m³
    pub density: Vec<f64>,
    /// m²/s
    pub viscosity: Vec<f64>,
    /// Seconds since release
    pub age: Vec<f64>,
    /// m
    pub droplet_avg_size: Vec<f64>,
    /// m²
    pub init_area: Vec<f64>,
    /// m³
    pub init_volume: Vec<f64>,
    pub relative_buoyancy: Vec<f64>,
    pub frac_coverage: Vec<f64>,
    /// Current slick area attributed to the element (m²)
    pub area: Vec<f64>,
    /// Element's share of its slick's release volume (0-1)
    pub volume_share: Vec<f64>,
    pub windage: Vec<f64>,
    /// Seconds since windage was last drawn
    pub windage_age: Vec<f64>,
    pub time_on_land: Vec<f64>,
    /// A mover had no field coverage for the element during the last step
    pub no_data: Vec<bool>,
}

impl ElementStore {
    /// Allocate unreleased elements for `spills`
    ///
    /// `spill_substances[s]` is the resolved substance of `spills[s]`.
    /// Substances shared between spills (same `Arc`) share one substance index.
    pub fn allocate(spills: &[Spill], spill_substances: &[Arc<Substance>]) -> SimResult<Self> {
        if spills.len() != spill_substances.len() {
            return Err(SimError::configuration(format!(
                "{} spills but {} resolved substances",
                spills.len(),
                spill_substances.len()
            )));
        }

        let mut store = Self {
            stride: spill_substances
                .iter()
                .map(|s| s.num_components())
                .max()
                .unwrap_or(0),
            ..Default::default()
        };

        for (spill_idx, (spill, substance)) in spills.iter().zip(spill_substances).enumerate() {
            let substance_idx = match store
                .substances
                .iter()
                .position(|s| Arc::ptr_eq(s, substance))
            {
                Some(idx) => idx,
                None => {
                    store.substances.push(Arc::clone(substance));
                    store.substances.len() - 1
                }
            };

            let start = store.len();
            for k in 0..spill.num_elements {
                store.push_unreleased(spill_idx, substance_idx, spill.element_position(k));
            }
            store.spill_ranges.push(start..store.len());
            store.released_per_spill.push(0);
        }

        Ok(store)
    }

    fn push_unreleased(&mut self, spill_idx: usize, substance_idx: usize, position: Vec3) {
        let id = self.len();
        self.id.push(id);
        self.spill_index.push(spill_idx);
        self.substance_index.push(substance_idx);
        self.position.push(position);
        self.last_water_position.push(position);
        self.status.push(StatusCode::NotReleased);
        self.mass.push(0.0);
        self.mass_components
            .resize(self.mass_components.len() + self.stride, 0.0);
        self.density.push(0.0);
        self.viscosity.push(0.0);
        self.age.push(0.0);
        self.droplet_avg_size.push(0.0);
        self.init_area.push(0.0);
        self.init_volume.push(0.0);
        self.relative_buoyancy.push(0.0);
        self.frac_coverage.push(1.0);
        self.area.push(0.0);
        self.volume_share.push(0.0);
        self.windage.push(0.0);
        self.windage_age.push(0.0);
        self.time_on_land.push(0.0);
        self.no_data.push(false);
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn substances(&self) -> &[Arc<Substance>] {
        &self.substances
    }

    pub fn substance_of(&self, i: usize) -> &Arc<Substance> {
        &self.substances[self.substance_index[i]]
    }

    pub fn spill_range(&self, spill_idx: usize) -> Range<usize> {
        self.spill_ranges[spill_idx].clone()
    }

    pub fn components(&self, i: usize) -> &[f64] {
        &self.mass_components[i * self.stride..(i + 1) * self.stride]
    }

    pub fn components_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.mass_components[i * self.stride..(i + 1) * self.stride]
    }

    /// Materialize the spill's elements whose release time has arrived
    ///
    /// Returns the index range of the newly released elements (possibly
    /// empty). Geometry is checked before anything is written, so a failed
    /// release leaves the store untouched.
    pub fn release<R: Rng>(
        &mut self,
        spill_idx: usize,
        spill: &Spill,
        model_time: f64,
        rng: &mut R,
    ) -> SimResult<Range<usize>> {
        let already = self.released_per_spill[spill_idx];
        let target = spill.num_released_by(model_time);
        let range = self.spill_ranges[spill_idx].clone();
        if target <= already {
            return Ok(range.start + already..range.start + already);
        }
        spill.check_geometry()?;

        let mass = spill.mass_per_element();
        let (windage_min, windage_max) = spill.windage_range;
        let released = range.start + already..range.start + target;
        for (k, i) in (already..target).zip(released.clone()) {
            let position = spill.element_position(k);
            self.position[i] = position;
            self.last_water_position[i] = position;
            self.status[i] = StatusCode::InWater;
            self.mass[i] = mass;
            self.age[i] = 0.0;
            self.frac_coverage[i] = 1.0;
            self.windage[i] = sample_windage(rng, windage_min, windage_max);
            self.windage_age[i] = 0.0;
            self.density[i] = 0.0;
            self.components_mut(i).fill(0.0);
        }
        self.released_per_spill[spill_idx] = target;
        Ok(released)
    }

    /// Per-substance views over elements matching `predicate`
    pub fn substance_groups(&self, predicate: impl Fn(usize) -> bool) -> Vec<SubstanceGroup> {
        let mut groups: Vec<SubstanceGroup> = self
            .substances
            .iter()
            .enumerate()
            .map(|(substance_index, substance)| SubstanceGroup {
                substance_index,
                substance: Arc::clone(substance),
                indices: Vec::new(),
            })
            .collect();
        for i in (0..self.len()).filter(|&i| predicate(i)) {
            groups[self.substance_index[i]].indices.push(i);
        }
        groups.retain(|g| !g.indices.is_empty());
        groups
    }

    /// Groups of released elements still in the water
    pub fn in_water_groups(&self) -> Vec<SubstanceGroup> {
        self.substance_groups(|i| self.status[i].is_in_water())
    }

    /// Apply summed displacements and reclassify moved elements against `map`
    pub fn commit(&mut self, deltas: &[Vec3], map: &dyn BoundaryMap) -> SimResult<CommitSummary> {
        if deltas.len() != self.len() {
            return Err(SimError::physics(
                "element store",
                format!("{} deltas for {} elements", deltas.len(), self.len()),
            ));
        }
        let mut summary = CommitSummary::default();
        for (i, delta) in deltas.iter().enumerate() {
            if !self.status[i].is_in_water() {
                continue;
            }
            let moved = self.position[i] + delta;
            self.position[i] = moved;
            summary.moved += 1;
            match map.classify(&moved) {
                Classification::InWater => self.last_water_position[i] = moved,
                Classification::OnLand => {
                    self.status[i] = StatusCode::OnLand;
                    self.time_on_land[i] = 0.0;
                    summary.beached += 1;
                }
                Classification::OffMap => {
                    self.status[i] = StatusCode::OffMaps;
                    summary.off_map += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Redraw windage for in-water elements whose persistence has expired
    ///
    /// Runs once per step before any mover when at least one wind mover is
    /// active. Spills with negative persistence keep the windage drawn at release.
    pub fn refresh_windage<R: Rng>(&mut self, spills: &[Spill], rng: &mut R) {
        for i in 0..self.len() {
            if !self.status[i].is_in_water() {
                continue;
            }
            let spill = &spills[self.spill_index[i]];
            if spill.windage_persist >= 0.0 && self.windage_age[i] >= spill.windage_persist {
                let (lo, hi) = spill.windage_range;
                self.windage[i] = sample_windage(rng, lo, hi);
                self.windage_age[i] = 0.0;
            }
        }
    }

    /// Return beached elements to their last water position with the map's
    /// refloat probability; returns how many refloated
    pub fn refloat<R: Rng>(&mut self, map: &dyn BoundaryMap, time_step: f64, rng: &mut R) -> usize {
        let mut refloated = 0;
        for i in 0..self.len() {
            if self.status[i] != StatusCode::OnLand {
                continue;
            }
            let p = map.refloat_probability(self.time_on_land[i], time_step);
            if p > 0.0 && rng.random::<f64>() < p {
                self.status[i] = StatusCode::InWater;
                self.position[i] = self.last_water_position[i];
                self.time_on_land[i] = 0.0;
                refloated += 1;
            }
        }
        refloated
    }

    /// Advance the per-element clocks of released elements by `dt`
    pub fn advance_age(&mut self, dt: f64) {
        for i in 0..self.len() {
            match self.status[i] {
                StatusCode::NotReleased => {}
                StatusCode::OnLand => {
                    self.age[i] += dt;
                    self.windage_age[i] += dt;
                    self.time_on_land[i] += dt;
                }
                _ => {
                    self.age[i] += dt;
                    self.windage_age[i] += dt;
                }
            }
        }
    }

    /// Split `mass[i]` over the substance's pseudocomponents
    pub fn init_components(&mut self, i: usize) {
        let mass = self.mass[i];
        let substance = Arc::clone(self.substance_of(i));
        let slots = self.components_mut(i);
        slots.fill(0.0);
        for (slot, fraction) in slots.iter_mut().zip(substance.mass_fractions()) {
            *slot = mass * fraction;
        }
    }

    /// Recompute `mass[i]` as the sum of its components
    pub fn sync_mass(&mut self, i: usize) {
        self.mass[i] = self.components(i).iter().sum();
    }

    /// Total mass currently carried by elements (kg)
    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    pub fn released_count(&self) -> usize {
        self.status.iter().filter(|s| s.is_released()).count()
    }

    pub fn count_with_status(&self, status: StatusCode) -> usize {
        self.status.iter().filter(|&&s| s == status).count()
    }

    /// Verify equal array lengths, component sums and non-negative mass
    pub fn check_invariants(&self) -> SimResult<()> {
        let n = self.len();
        let lengths = [
            self.spill_index.len(),
            self.substance_index.len(),
            self.position.len(),
            self.last_water_position.len(),
            self.status.len(),
            self.mass.len(),
            self.density.len(),
            self.viscosity.len(),
            self.age.len(),
            self.droplet_avg_size.len(),
            self.init_area.len(),
            self.init_volume.len(),
            self.relative_buoyancy.len(),
            self.frac_coverage.len(),
            self.area.len(),
            self.volume_share.len(),
            self.windage.len(),
            self.windage_age.len(),
            self.time_on_land.len(),
            self.no_data.len(),
        ];
        if lengths.iter().any(|&len| len != n) || self.mass_components.len() != n * self.stride {
            return Err(SimError::physics(
                "element store",
                "per-element arrays have diverging lengths",
            ));
        }

        for i in 0..n {
            let mass = self.mass[i];
            if !(mass.is_finite() && mass >= 0.0) {
                return Err(SimError::physics(
                    "element store",
                    format!("element {i} has invalid mass {mass}"),
                ));
            }
            let sum: f64 = self.components(i).iter().sum();
            if (sum - mass).abs() > COMPONENT_SUM_TOLERANCE * mass.max(1.0) {
                return Err(SimError::physics(
                    "element store",
                    format!("element {i} components sum to {sum}, mass is {mass}"),
                ));
            }
        }
        Ok(())
    }
}

fn sample_windage<R: Rng>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}
