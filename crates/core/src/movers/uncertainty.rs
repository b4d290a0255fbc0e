//! Per-element velocity perturbation for uncertainty runs
//!
//! Each element carries a speed factor and an angle offset. Both are drawn
//! when the element first needs them and redrawn only once the element's
//! uncertainty clock reaches `duration`:
//!
//! ```text
//! speed factor  = exp(u₁ · ln(speed_scale))     u₁ ~ U[−1, 1]
//! angle offset  = u₂ · angle_scale              u₂ ~ U[−1, 1]
//! ```
//!
//! No perturbation applies until `time_delay` seconds after the run start.

use crate::config::UncertaintyParams;
use crate::core_types::{stream_rng, SimRng, Vec3};
use crate::elements::ElementStore;
use crate::error::SimResult;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct UncertaintyState {
    params: UncertaintyParams,
    rng: SimRng,
    speed_factor: Vec<f64>,
    angle_offset: Vec<f64>,
    /// Seconds since the element's perturbation was drawn (infinite = never)
    clock: Vec<f64>,
    engaged: bool,
}

impl UncertaintyState {
    pub fn new(params: UncertaintyParams, seed: u64, stream: u64) -> SimResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            rng: stream_rng(seed, stream),
            speed_factor: Vec::new(),
            angle_offset: Vec::new(),
            clock: Vec::new(),
            engaged: false,
        })
    }

    pub fn params(&self) -> &UncertaintyParams {
        &self.params
    }

    /// Redraw expired perturbations for in-water elements
    ///
    /// Called once per step before displacements are computed. Draws happen
    /// sequentially in element order so a seed reproduces them exactly.
    pub fn prepare_for_step(
        &mut self,
        elements: &ElementStore,
        model_time: f64,
        start_time: f64,
        time_step: f64,
    ) {
        let n = elements.len();
        if self.clock.len() != n {
            self.speed_factor.resize(n, 1.0);
            self.angle_offset.resize(n, 0.0);
            self.clock.resize(n, f64::INFINITY);
        }

        self.engaged = model_time - start_time >= self.params.time_delay;
        if !self.engaged {
            return;
        }

        let log_scale = self.params.speed_scale.ln();
        for i in 0..n {
            if !elements.status[i].is_in_water() {
                continue;
            }
            if self.clock[i] >= self.params.duration {
                let u_speed: f64 = self.rng.random_range(-1.0..=1.0);
                let u_angle: f64 = self.rng.random_range(-1.0..=1.0);
                self.speed_factor[i] = (u_speed * log_scale).exp();
                self.angle_offset[i] = u_angle * self.params.angle_scale;
                self.clock[i] = 0.0;
            }
            self.clock[i] += time_step;
        }
    }

    /// Apply element `i`'s perturbation to a horizontal velocity
    pub fn perturb(&self, i: usize, velocity: Vec3) -> Vec3 {
        if !self.engaged || i >= self.clock.len() {
            return velocity;
        }
        let (sin, cos) = self.angle_offset[i].sin_cos();
        let factor = self.speed_factor[i];
        Vec3::new(
            factor * (velocity.x * cos - velocity.y * sin),
            factor * (velocity.x * sin + velocity.y * cos),
            velocity.z,
        )
    }

    pub fn speed_factor(&self, i: usize) -> Option<f64> {
        self.speed_factor.get(i).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::seeded_rng;
    use crate::spill::Spill;
    use crate::substance::Substance;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn store(n: usize) -> ElementStore {
        let spills = vec![Spill::point_release("s", "oil", n, 10.0, Vec3::zeros(), 0.0)];
        let mut store =
            ElementStore::allocate(&spills, &[Arc::new(Substance::diesel())]).unwrap();
        store.release(0, &spills[0], 0.0, &mut seeded_rng(0)).unwrap();
        store
    }

    #[test]
    fn test_factors_within_bounds() {
        let elements = store(50);
        let mut state = UncertaintyState::new(UncertaintyParams::default(), 1, 1).unwrap();
        state.prepare_for_step(&elements, 0.0, 0.0, 900.0);
        for i in 0..50 {
            let f = state.speed_factor(i).unwrap();
            assert!((0.5..=2.0).contains(&f));
            let v = state.perturb(i, Vec3::new(1.0, 0.0, 0.0));
            assert_relative_eq!(v.norm(), f, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_perturbation_kept_until_duration() {
        let elements = store(3);
        let params = UncertaintyParams {
            duration: 1800.0,
            ..Default::default()
        };
        let mut state = UncertaintyState::new(params, 9, 1).unwrap();
        state.prepare_for_step(&elements, 0.0, 0.0, 900.0);
        let first = state.speed_factor(0).unwrap();
        state.prepare_for_step(&elements, 900.0, 0.0, 900.0);
        assert_eq!(state.speed_factor(0).unwrap(), first);
        state.prepare_for_step(&elements, 1800.0, 0.0, 900.0);
        assert_ne!(state.speed_factor(0).unwrap(), first);
    }

    #[test]
    fn test_time_delay() {
        let elements = store(2);
        let params = UncertaintyParams {
            time_delay: 3600.0,
            ..Default::default()
        };
        let mut state = UncertaintyState::new(params, 3, 1).unwrap();
        state.prepare_for_step(&elements, 0.0, 0.0, 900.0);
        let v = Vec3::new(0.3, -0.2, 0.0);
        assert_eq!(state.perturb(0, v), v);
        state.prepare_for_step(&elements, 3600.0, 0.0, 900.0);
        assert_ne!(state.perturb(0, v), v);
    }
}
