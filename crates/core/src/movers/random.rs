//! Horizontal random walk (turbulent diffusion)
//!
//! # Formula
//!
//! ```text
//! a  = sqrt(6 · D · dt)            D in m²/s
//! Δx, Δy ~ U[−a, a]
//! ```
//!
//! The coefficient is given in cm²/s. In uncertainty runs it is multiplied
//! by `uncertain_factor`.

use super::{MoveContext, Mover, MoverKind};
use crate::config::ModelConfig;
use crate::core_types::{meters_to_lonlat, stream_rng, Activity, SimRng, Vec3};
use crate::elements::ElementStore;
use crate::error::{SimError, SimResult};
use rand::Rng;

/// cm²/s to m²/s
const CM2_TO_M2: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct RandomMover {
    /// Diffusion coefficient (cm²/s)
    pub diffusion_coef: f64,
    pub uncertain_factor: f64,
    activity: Activity,
    rng: Option<SimRng>,
}

impl Default for RandomMover {
    fn default() -> Self {
        Self {
            diffusion_coef: 100_000.0,
            uncertain_factor: 2.0,
            activity: Activity::default(),
            rng: None,
        }
    }
}

impl RandomMover {
    pub fn new(diffusion_coef: f64) -> Self {
        Self {
            diffusion_coef,
            ..Default::default()
        }
    }

    /// Half-width (m) of the uniform step over `time_step`
    pub fn amplitude(&self, time_step: f64, uncertain: bool) -> f64 {
        let mut d = self.diffusion_coef * CM2_TO_M2;
        if uncertain {
            d *= self.uncertain_factor;
        }
        (6.0 * d * time_step).sqrt()
    }
}

impl Mover for RandomMover {
    fn kind(&self) -> MoverKind {
        MoverKind::RandomWalk
    }

    fn activity(&self) -> &Activity {
        &self.activity
    }

    fn activity_mut(&mut self) -> &mut Activity {
        &mut self.activity
    }

    fn prepare_for_run(&mut self, config: &ModelConfig, stream: u64) -> SimResult<()> {
        if !(self.diffusion_coef.is_finite() && self.diffusion_coef >= 0.0) {
            return Err(SimError::configuration(format!(
                "diffusion coefficient must be non-negative, got {}",
                self.diffusion_coef
            )));
        }
        if !(self.uncertain_factor.is_finite() && self.uncertain_factor >= 1.0) {
            return Err(SimError::configuration(
                "random mover uncertain_factor must be >= 1",
            ));
        }
        self.rng = Some(stream_rng(config.seed, stream));
        Ok(())
    }

    fn get_move(
        &mut self,
        elements: &ElementStore,
        ctx: &MoveContext,
        deltas: &mut [Vec3],
        _no_data: &mut [bool],
    ) -> SimResult<()> {
        let amplitude = self.amplitude(ctx.time_step, ctx.uncertain);
        let rng = self.rng.as_mut().ok_or_else(|| {
            SimError::configuration("random mover used before prepare_for_run")
        })?;
        if amplitude <= 0.0 {
            return Ok(());
        }
        for (i, delta) in deltas.iter_mut().enumerate().take(elements.len()) {
            if !elements.status[i].is_in_water() {
                continue;
            }
            let meters = Vec3::new(
                rng.random_range(-amplitude..=amplitude),
                rng.random_range(-amplitude..=amplitude),
                0.0,
            );
            *delta += meters_to_lonlat(meters, elements.position[i].y);
        }
        Ok(())
    }
}
