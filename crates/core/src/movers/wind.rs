//! Wind drift scaled by per-element windage
//!
//! ```text
//! Δx = wind(t, x) · windage · dt
//! ```
//!
//! Windage itself is owned by the element store and refreshed once per step
//! before any mover runs, so several wind movers over the same population
//! add linearly.

use super::{field_move, MoveContext, Mover, MoverKind, UncertaintyState};
use crate::config::{ModelConfig, UncertaintyParams};
use crate::core_types::{Activity, Vec3};
use crate::elements::ElementStore;
use crate::environment::FieldSampler;
use crate::error::{SimError, SimResult};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct WindMover {
    wind: Arc<dyn FieldSampler>,
    pub uncertainty: UncertaintyParams,
    activity: Activity,
    state: Option<UncertaintyState>,
}

impl WindMover {
    pub fn new(wind: Arc<dyn FieldSampler>) -> Self {
        Self {
            wind,
            uncertainty: UncertaintyParams::default(),
            activity: Activity::default(),
            state: None,
        }
    }

    pub fn with_uncertainty(mut self, params: UncertaintyParams) -> Self {
        self.uncertainty = params;
        self
    }

    pub fn wind(&self) -> &Arc<dyn FieldSampler> {
        &self.wind
    }
}

impl Mover for WindMover {
    fn kind(&self) -> MoverKind {
        MoverKind::Wind
    }

    fn uses_windage(&self) -> bool {
        true
    }

    fn activity(&self) -> &Activity {
        &self.activity
    }

    fn activity_mut(&mut self) -> &mut Activity {
        &mut self.activity
    }

    fn prepare_for_run(&mut self, config: &ModelConfig, stream: u64) -> SimResult<()> {
        if !self.wind.has_data() {
            return Err(SimError::configuration(format!(
                "wind mover has no data in '{}'",
                self.wind.name()
            )));
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
        let state = self.state.as_ref().filter(|_| ctx.uncertain);
        field_move(
            self.wind.as_ref(),
            elements,
            ctx,
            deltas,
            no_data,
            |i, velocity| {
                let horizontal = Vec3::new(velocity.x, velocity.y, 0.0);
                let velocity = state.map_or(horizontal, |s| s.perturb(i, horizontal));
                velocity * elements.windage[i]
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::Knots;
    use crate::core_types::{seeded_rng, METERS_PER_DEGREE_LAT};
    use crate::environment::{ConstantField, Coverage, TimeSeriesField};
    use crate::spill::Spill;
    use crate::substance::Substance;
    use approx::assert_relative_eq;

    fn store() -> ElementStore {
        let spills = vec![Spill::point_release("s", "oil", 4, 10.0, Vec3::zeros(), 0.0)
            .with_windage((0.03, 0.03), -1.0)];
        let mut store =
            ElementStore::allocate(&spills, &[Arc::new(Substance::diesel())]).unwrap();
        store.release(0, &spills[0], 0.0, &mut seeded_rng(0)).unwrap();
        store
    }

    fn ctx() -> MoveContext {
        MoveContext {
            model_time: 0.0,
            time_step: 900.0,
            start_time: 0.0,
            uncertain: false,
        }
    }

    #[test]
    fn test_wind_from_south_moves_north() {
        let elements = store();
        let mut mover = WindMover::new(Arc::new(ConstantField::wind(Knots::new(10.0), 180.0)));
        mover.prepare_for_run(&ModelConfig::default(), 1).unwrap();
        let mut deltas = vec![Vec3::zeros(); 4];
        let mut no_data = vec![false; 4];
        mover.get_move(&elements, &ctx(), &mut deltas, &mut no_data).unwrap();

        let speed = *Knots::new(10.0).to_mps();
        assert_relative_eq!(
            deltas[0].y,
            speed * 0.03 * 900.0 / METERS_PER_DEGREE_LAT,
            max_relative = 1e-12
        );
        assert!(deltas[0].x.abs() < 1e-15);
    }

    #[test]
    fn test_data_gap_flags_element() {
        let mut elements = store();
        elements.position[1] = Vec3::new(50.0, 0.0, 0.0);
        let field = ConstantField::new("patchy wind", Vec3::new(5.0, 0.0, 0.0)).with_coverage(
            Coverage {
                lon_min: -1.0,
                lat_min: -1.0,
                lon_max: 1.0,
                lat_max: 1.0,
            },
        );
        let mut mover = WindMover::new(Arc::new(field));
        mover.prepare_for_run(&ModelConfig::default(), 1).unwrap();
        let mut deltas = vec![Vec3::zeros(); 4];
        let mut no_data = vec![false; 4];
        mover.get_move(&elements, &ctx(), &mut deltas, &mut no_data).unwrap();

        assert!(no_data[1]);
        assert_eq!(deltas[1], Vec3::zeros());
        assert!(!no_data[0]);
        assert!(deltas[0].x > 0.0);
    }

    #[test]
    fn test_empty_wind_rejected_before_run() {
        let empty = TimeSeriesField::new("empty", Vec::new()).unwrap();
        let mut mover = WindMover::new(Arc::new(empty));
        assert!(matches!(
            mover.prepare_for_run(&ModelConfig::default(), 1),
            Err(SimError::Configuration { .. })
        ));
    }
}
