//! Uniform, steady drift

use super::{MoveContext, Mover, MoverKind};
use crate::core_types::{meters_to_lonlat, Activity, Vec3};
use crate::elements::ElementStore;
use crate::error::{SimError, SimResult};
use rayon::prelude::*;

/// Moves every in-water element with the same velocity (m/s east, north, down)
#[derive(Debug, Clone)]
pub struct ConstantMover {
    pub velocity: Vec3,
    activity: Activity,
}

impl ConstantMover {
    pub fn new(velocity: Vec3) -> Self {
        Self {
            velocity,
            activity: Activity::default(),
        }
    }
}

impl Mover for ConstantMover {
    fn kind(&self) -> MoverKind {
        MoverKind::Constant
    }

    fn activity(&self) -> &Activity {
        &self.activity
    }

    fn activity_mut(&mut self) -> &mut Activity {
        &mut self.activity
    }

    fn get_move(
        &mut self,
        elements: &ElementStore,
        ctx: &MoveContext,
        deltas: &mut [Vec3],
        _no_data: &mut [bool],
    ) -> SimResult<()> {
        if deltas.len() != elements.len() {
            return Err(SimError::physics(
                "ConstantMover",
                "delta buffer does not match element count",
            ));
        }
        let meters = self.velocity * ctx.time_step;
        deltas
            .par_iter_mut()
            .enumerate()
            .filter(|(i, _)| elements.status[*i].is_in_water())
            .for_each(|(i, delta)| {
                *delta += meters_to_lonlat(meters, elements.position[i].y);
            });
        Ok(())
    }
}
