//! Movers: per-step element displacement
//!
//! Every active mover reads the pre-step [`ElementStore`] and adds its
//! displacement (degrees lon, degrees lat, metres z) into a shared delta
//! buffer. The orchestrator commits the summed buffer once, so movers are
//! additive and see the same positions regardless of registration order.
//!
//! Only `InWater` elements move. An element the field has no data for gets
//! no displacement from that mover and its `no_data` flag set.

pub mod constant;
pub mod current;
pub mod random;
pub mod uncertainty;
pub mod wind;

pub use constant::ConstantMover;
pub use current::CurrentMover;
pub use random::RandomMover;
pub use uncertainty::UncertaintyState;
pub use wind::WindMover;

use crate::config::ModelConfig;
use crate::core_types::{meters_to_lonlat, Activity, Vec3};
use crate::elements::ElementStore;
use crate::environment::FieldSampler;
use crate::error::{SimError, SimResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Explicit mover variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoverKind {
    Constant,
    Wind,
    Current,
    RandomWalk,
}

impl MoverKind {
    pub fn name(self) -> &'static str {
        match self {
            MoverKind::Constant => "ConstantMover",
            MoverKind::Wind => "WindMover",
            MoverKind::Current => "CurrentMover",
            MoverKind::RandomWalk => "RandomMover",
        }
    }
}

/// Step inputs shared by every mover
#[derive(Debug, Clone, Copy)]
pub struct MoveContext {
    /// Model time at the start of the step (s)
    pub model_time: f64,
    pub time_step: f64,
    /// Run start time (s), for the uncertainty time delay
    pub start_time: f64,
    pub uncertain: bool,
}

/// Displacement capability
pub trait Mover: Send + Sync + fmt::Debug {
    fn kind(&self) -> MoverKind;

    /// Whether the displacement scales with per-element `windage`
    fn uses_windage(&self) -> bool {
        false
    }

    fn activity(&self) -> &Activity;

    fn activity_mut(&mut self) -> &mut Activity;

    /// Validate inputs and reset run state
    ///
    /// # Arguments
    ///
    /// * `config` - Run configuration (seed, uncertainty flag)
    /// * `stream` - RNG stream reserved for this mover
    fn prepare_for_run(&mut self, _config: &ModelConfig, _stream: u64) -> SimResult<()> {
        Ok(())
    }

    /// Per-step setup before any displacement is computed (e.g. redraw
    /// uncertainty perturbations)
    fn prepare_for_step(&mut self, _elements: &ElementStore, _ctx: &MoveContext) -> SimResult<()> {
        Ok(())
    }

    /// Add this mover's displacement for every element into `deltas`
    ///
    /// # Arguments
    ///
    /// * `elements` - Pre-step element state (read only)
    /// * `ctx` - Step time and uncertainty flag
    /// * `deltas` - Per-element accumulator (deg lon, deg lat, m)
    /// * `no_data` - Set for elements the mover had no field data for
    fn get_move(
        &mut self,
        elements: &ElementStore,
        ctx: &MoveContext,
        deltas: &mut [Vec3],
        no_data: &mut [bool],
    ) -> SimResult<()>;
}

/// Shared implementation of field-driven movers (wind, current)
///
/// For each in-water element `i` the sampler velocity (m/s) is turned into a
/// metre displacement by `scale(i, velocity)` and converted to degrees.
/// Data gaps zero the displacement and set `no_data[i]`; any other sampler
/// error aborts the step.
pub(crate) fn field_move(
    sampler: &dyn FieldSampler,
    elements: &ElementStore,
    ctx: &MoveContext,
    deltas: &mut [Vec3],
    no_data: &mut [bool],
    scale: impl Fn(usize, Vec3) -> Vec3 + Sync,
) -> SimResult<()> {
    if deltas.len() != elements.len() || no_data.len() != elements.len() {
        return Err(SimError::physics(
            sampler.name(),
            "delta buffer does not match element count",
        ));
    }

    let gaps = deltas
        .par_iter_mut()
        .zip(no_data.par_iter_mut())
        .enumerate()
        .filter(|(i, _)| elements.status[*i].is_in_water())
        .map(|(i, (delta, gap))| {
            let position = elements.position[i];
            match sampler.sample(ctx.model_time, &position) {
                Ok(velocity) => {
                    let meters = scale(i, velocity) * ctx.time_step;
                    *delta += meters_to_lonlat(meters, position.y);
                    Ok(0usize)
                }
                Err(SimError::DataGap { .. }) => {
                    *gap = true;
                    Ok(1usize)
                }
                Err(e) => Err(e),
            }
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))?;

    if gaps > 0 {
        warn!(
            "{}: no data for {} elements at t={}s",
            sampler.name(),
            gaps,
            ctx.model_time
        );
    }
    Ok(())
}
