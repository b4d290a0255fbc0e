//! Current advection
//!
//! ```text
//! Δx = scale · current(t, x) · dt
//! ```

use super::{field_move, MoveContext, Mover, MoverKind, UncertaintyState};
use crate::config::{ModelConfig, UncertaintyParams};
use crate::core_types::{Activity, Vec3};
use crate::elements::ElementStore;
use crate::environment::FieldSampler;
use crate::error::{SimError, SimResult};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CurrentMover {
    current: Arc<dyn FieldSampler>,
    /// Multiplier applied to the sampled current
    pub scale: f64,
    pub uncertainty: UncertaintyParams,
    activity: Activity,
    state: Option<UncertaintyState>,
}

impl CurrentMover {
    pub fn new(current: Arc<dyn FieldSampler>) -> Self {
        Self {
            current,
            scale: 1.0,
            uncertainty: UncertaintyParams::default(),
            activity: Activity::default(),
            state: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uncertainty(mut self, params: UncertaintyParams) -> Self {
        self.uncertainty = params;
        self
    }
}

impl Mover for CurrentMover {
    fn kind(&self) -> MoverKind {
        MoverKind::Current
    }

    fn activity(&self) -> &Activity {
        &self.activity
    }

    fn activity_mut(&mut self) -> &mut Activity {
        &mut self.activity
    }

    fn prepare_for_run(&mut self, config: &ModelConfig, stream: u64) -> SimResult<()> {
        if !self.current.has_data() {
            return Err(SimError::configuration(format!(
                "current mover has no data in '{}'",
                self.current.name()
            )));
        }
        if !self.scale.is_finite() {
            return Err(SimError::configuration("current scale must be finite"));
        }
        self.state = if config.uncertain {
            Some(UncertaintyState::new(self.uncertainty, config.seed, stream)?)
        } else {
            None
        };
        Ok(())
    }

    fn prepare_for_step(&mut self, elements: &ElementStore, ctx: &MoveContext) -> SimResult<()> {
        if let Some(state) = self.state.as_mut() {
            state.prepare_for_step(elements, ctx.model_time, ctx.start_time, ctx.time_step);
        }
        Ok(())
    }

    fn get_move(
        &mut self,
        elements: &ElementStore,
        ctx: &MoveContext,
        deltas: &mut [Vec3],
        no_data: &mut [bool],
    ) -> SimResult<()> {
        let scale = self.scale;
        let state = self.state.as_ref().filter(|_| ctx.uncertain);
        field_move(
            self.current.as_ref(),
            elements,
            ctx,
            deltas,
            no_data,
            |i, velocity| state.map_or(velocity, |s| s.perturb(i, velocity)) * scale,
        )
    }
}
