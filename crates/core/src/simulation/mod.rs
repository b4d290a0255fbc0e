//! Step orchestrator
//!
//! [`Model`] owns the element store, the mass-balance ledger and the run
//! clock, and drives every step through a fixed sequence:
//!
//! 1. release elements whose release time has arrived
//! 2. update intrinsic properties
//! 3. refloat beached elements and refresh windage if a wind mover is active
//! 4. sum every active mover's displacement and commit it once
//! 5. run active weatherers in kind order, booking removed mass in the ledger
//! 6. age elements and advance the clock
//!
//! Steps are transactional: the sequence runs on working copies of the
//! store, ledger and aggregates, which replace the committed state only when
//! every stage succeeded. A fatal error leaves the committed state untouched
//! and moves the model to [`ModelState::Failed`].
//!
//! # State machine
//!
//! ```text
//! NotStarted ──step──▶ Running{step} ──step──▶ … ──▶ Finished
//!      ▲                    │                            │
//!      └──────reset─────────┴──────── Failed ◀─(fatal)   │
//!      └─────────────────────────reset───────────────────┘
//! ```

pub mod registry;
pub mod snapshot;

pub use registry::ObjectRegistry;
pub use snapshot::{OwnedSnapshot, Snapshot};

use crate::config::ModelConfig;
use crate::core_types::{seeded_rng, SimRng, Vec3};
use crate::elements::ElementStore;
use crate::environment::Environment;
use crate::error::{SimError, SimResult};
use crate::intrinsic::{update_weathering_data, IntrinsicProps, WeatheringData};
use crate::map::{BoundaryMap, OpenWaterMap};
use crate::mass_balance::MassBalance;
use crate::movers::{MoveContext, Mover};
use crate::spill::Spill;
use crate::substance::{InMemorySubstanceLibrary, SubstanceLibrary};
use crate::weatherers::{WeatherContext, Weatherer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelState {
    NotStarted,
    /// `step` steps have been committed
    Running { step: usize },
    Finished,
    /// A fatal error stopped the run; only `reset` leaves this state
    Failed,
}

impl ModelState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ModelState::Finished | ModelState::Failed)
    }
}

/// What one committed step did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// 1-based index of the step
    pub step: usize,
    /// Model time at the end of the step (s)
    pub model_time: f64,
    pub released: usize,
    pub refloated: usize,
    pub beached: usize,
    pub off_map: usize,
    /// Elements some mover had no field data for
    pub no_data: usize,
    /// Mass removed this step per ledger key, in weatherer order
    pub removed: Vec<(String, f64)>,
    /// Mass carried by elements after the step (kg)
    pub total_mass: f64,
}

#[derive(Debug)]
struct MoverEntry {
    id: String,
    /// RNG stream, fixed at registration
    stream: u64,
    mover: Box<dyn Mover>,
}

#[derive(Debug)]
struct WeathererEntry {
    id: String,
    weatherer: Box<dyn Weatherer>,
}

/// Time-stepped oil spill model
pub struct Model {
    config: ModelConfig,
    environment: Environment,
    map: Arc<dyn BoundaryMap>,
    library: Arc<dyn SubstanceLibrary>,
    spills: Vec<Spill>,
    movers: Vec<MoverEntry>,
    /// Kept sorted by kind, registration order within a kind
    weatherers: Vec<WeathererEntry>,
    registry: ObjectRegistry,
    intrinsic: IntrinsicProps,

    state: ModelState,
    model_time: f64,
    step_index: usize,
    elements: ElementStore,
    mass_balance: MassBalance,
    weathering: WeatheringData,
    rng: SimRng,
}

impl Model {
    /// Model over open water with the built-in substance library
    pub fn new(config: ModelConfig) -> Self {
        let model_time = config.start_time;
        let rng = seeded_rng(config.seed);
        Self {
            config,
            environment: Environment::default(),
            map: Arc::new(OpenWaterMap),
            library: Arc::new(InMemorySubstanceLibrary::with_defaults()),
            spills: Vec::new(),
            movers: Vec::new(),
            weatherers: Vec::new(),
            registry: ObjectRegistry::new(),
            intrinsic: IntrinsicProps::default(),
            state: ModelState::NotStarted,
            model_time,
            step_index: 0,
            elements: ElementStore::default(),
            mass_balance: MassBalance::new(),
            weathering: WeatheringData::default(),
            rng,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_map(mut self, map: Arc<dyn BoundaryMap>) -> Self {
        self.map = map;
        self
    }

    pub fn with_library(mut self, library: Arc<dyn SubstanceLibrary>) -> Self {
        self.library = library;
        self
    }

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    fn ensure_not_started(&self, what: &str) -> SimResult<()> {
        if self.state == ModelState::NotStarted {
            Ok(())
        } else {
            Err(SimError::configuration(format!(
                "cannot {what} while the run is in progress; reset first"
            )))
        }
    }

    pub fn add_spill(&mut self, spill: Spill) -> SimResult<()> {
        self.ensure_not_started("add a spill")?;
        spill.validate()?;
        self.spills.push(spill);
        Ok(())
    }

    /// Register a mover and return its id
    pub fn add_mover(&mut self, mover: Box<dyn Mover>) -> SimResult<String> {
        self.ensure_not_started("add a mover")?;
        let (id, stream) = self.registry.next_with_serial(mover.kind().name());
        self.movers.push(MoverEntry {
            id: id.clone(),
            stream,
            mover,
        });
        Ok(id)
    }

    /// Register a weatherer and return its id
    pub fn add_weatherer(&mut self, weatherer: Box<dyn Weatherer>) -> SimResult<String> {
        self.ensure_not_started("add a weatherer")?;
        let kind = weatherer.kind();
        let id = self.registry.next_id(kind.name());
        let pos = self
            .weatherers
            .partition_point(|w| w.weatherer.kind() <= kind);
        self.weatherers.insert(
            pos,
            WeathererEntry {
                id: id.clone(),
                weatherer,
            },
        );
        Ok(id)
    }

    pub fn remove_mover(&mut self, id: &str) -> SimResult<Option<Box<dyn Mover>>> {
        self.ensure_not_started("remove a mover")?;
        Ok(self
            .movers
            .iter()
            .position(|m| m.id == id)
            .map(|pos| self.movers.remove(pos).mover))
    }

    pub fn remove_weatherer(&mut self, id: &str) -> SimResult<Option<Box<dyn Weatherer>>> {
        self.ensure_not_started("remove a weatherer")?;
        Ok(self
            .weatherers
            .iter()
            .position(|w| w.id == id)
            .map(|pos| self.weatherers.remove(pos).weatherer))
    }

    pub fn mover(&self, id: &str) -> Option<&dyn Mover> {
        self.movers
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.mover.as_ref())
    }

    pub fn weatherer(&self, id: &str) -> Option<&dyn Weatherer> {
        self.weatherers
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.weatherer.as_ref())
    }

    pub fn mover_ids(&self) -> Vec<&str> {
        self.movers.iter().map(|m| m.id.as_str()).collect()
    }

    /// Weatherer ids in run order
    pub fn weatherer_ids(&self) -> Vec<&str> {
        self.weatherers.iter().map(|w| w.id.as_str()).collect()
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn spills(&self) -> &[Spill] {
        &self.spills
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn model_time(&self) -> f64 {
        self.model_time
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn elements(&self) -> &ElementStore {
        &self.elements
    }

    pub fn mass_balance(&self) -> &MassBalance {
        &self.mass_balance
    }

    pub fn weathering_data(&self) -> &WeatheringData {
        &self.weathering
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            state: self.state,
            model_time: self.model_time,
            step: self.step_index,
            elements: &self.elements,
            mass_balance: &self.mass_balance,
            weathering: &self.weathering,
        }
    }

    // ========================================================================
    // RUN CONTROL
    // ========================================================================

    /// Return to `NotStarted`, dropping all run state but keeping spills,
    /// movers, weatherers and the environment
    pub fn reset(&mut self) {
        self.state = ModelState::NotStarted;
        self.model_time = self.config.start_time;
        self.step_index = 0;
        self.elements = ElementStore::default();
        self.mass_balance = MassBalance::new();
        self.weathering = WeatheringData::default();
        self.rng = seeded_rng(self.config.seed);
        info!("Model reset to start time {}s", self.config.start_time);
    }

    /// Validate the setup and build run state; runs on the first `step`
    fn prepare_for_run(&mut self) -> SimResult<()> {
        self.config.validate()?;
        self.environment.validate()?;

        let mut substances = Vec::with_capacity(self.spills.len());
        for spill in &self.spills {
            spill.validate()?;
            let substance = self.library.get(&spill.substance_id).ok_or_else(|| {
                SimError::configuration(format!(
                    "spill '{}' references unknown substance '{}'",
                    spill.name, spill.substance_id
                ))
            })?;
            substances.push(substance);
        }
        let elements = ElementStore::allocate(&self.spills, &substances)?;

        for entry in &mut self.movers {
            entry.mover.prepare_for_run(&self.config, entry.stream)?;
        }
        let mut mass_balance = MassBalance::new();
        for entry in &mut self.weatherers {
            entry.weatherer.prepare_for_run(&self.environment)?;
            mass_balance.register(entry.weatherer.ledger_key());
        }

        self.intrinsic = IntrinsicProps::new(
            self.weatherers
                .iter()
                .any(|w| w.weatherer.needs_area()),
        );
        self.elements = elements;
        self.mass_balance = mass_balance;
        self.weathering = WeatheringData::default();
        self.rng = seeded_rng(self.config.seed);
        self.model_time = self.config.start_time;
        self.step_index = 0;
        self.state = ModelState::Running { step: 0 };

        info!(
            "Starting run: {} spills, {} elements, {} movers, {} weatherers, {} steps of {}s",
            self.spills.len(),
            self.elements.len(),
            self.movers.len(),
            self.weatherers.len(),
            self.config.num_steps(),
            self.config.time_step
        );
        Ok(())
    }

    /// Advance the run by one time step
    ///
    /// Returns `SimulationComplete` without touching any state once the run
    /// has finished or failed.
    pub fn step(&mut self) -> SimResult<StepReport> {
        if self.state.is_terminal() {
            return Err(SimError::SimulationComplete {
                model_time: self.model_time,
            });
        }
        if self.state == ModelState::NotStarted {
            self.prepare_for_run()?;
        }
        if self.step_index >= self.config.num_steps() {
            self.finish();
            return Err(SimError::SimulationComplete {
                model_time: self.model_time,
            });
        }

        match self.run_step() {
            Ok(report) => {
                if self.step_index >= self.config.num_steps() {
                    self.finish();
                } else {
                    self.state = ModelState::Running {
                        step: self.step_index,
                    };
                }
                Ok(report)
            }
            Err(e) => {
                warn!(
                    "Step {} failed at t={}s: {}",
                    self.step_index + 1,
                    self.model_time,
                    e
                );
                self.state = ModelState::Failed;
                Err(e)
            }
        }
    }

    /// Step until the run finishes, returning every step's report
    pub fn run(&mut self) -> SimResult<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(self.config.num_steps());
        loop {
            match self.step() {
                Ok(report) => reports.push(report),
                Err(SimError::SimulationComplete { .. }) => return Ok(reports),
                Err(e) => return Err(e),
            }
        }
    }

    fn finish(&mut self) {
        self.state = ModelState::Finished;
        info!(
            "Run finished at t={}s after {} steps: {:.3} kg in elements, {:.3} kg weathered",
            self.model_time,
            self.step_index,
            self.elements.total_mass(),
            self.mass_balance.total_removed()
        );
    }

    fn run_step(&mut self) -> SimResult<StepReport> {
        let time_step = self.config.time_step;
        let model_time = self.model_time;
        let step = self.step_index + 1;

        let mut elements = self.elements.clone();
        let mut mass_balance = self.mass_balance.clone();
        let mut weathering = self.weathering;
        let mut rng = self.rng.clone();

        // 1. releases
        let mut new_elements = Vec::new();
        for (spill_idx, spill) in self.spills.iter().enumerate() {
            let released = elements.release(spill_idx, spill, model_time, &mut rng)?;
            if !released.is_empty() {
                debug!("Spill '{}' released {} elements", spill.name, released.len());
                new_elements.push(released);
            }
        }
        let released: usize = new_elements.iter().map(|r| r.len()).sum();

        // 2. intrinsic properties
        self.intrinsic.update(
            &new_elements,
            &mut elements,
            &self.environment.water,
            &mut weathering,
        )?;

        // 3. refloat, then windage once per step however many wind movers run
        let refloated = elements.refloat(self.map.as_ref(), time_step, &mut rng);
        let windage_used = self.movers.iter().any(|entry| {
            entry.mover.uses_windage() && entry.mover.activity().is_active(model_time)
        });
        if windage_used {
            elements.refresh_windage(&self.spills, &mut rng);
        }

        // 4. movers against the pre-move state, committed once
        let ctx = MoveContext {
            model_time,
            time_step,
            start_time: self.config.start_time,
            uncertain: self.config.uncertain,
        };
        let mut deltas = vec![Vec3::zeros(); elements.len()];
        let mut no_data = vec![false; elements.len()];
        for entry in &mut self.movers {
            if !entry.mover.activity().is_active(model_time) {
                continue;
            }
            entry.mover.prepare_for_step(&elements, &ctx)?;
            entry
                .mover
                .get_move(&elements, &ctx, &mut deltas, &mut no_data)?;
        }
        let no_data_count = no_data.iter().filter(|&&flag| flag).count();
        elements.no_data = no_data;
        let commit = elements.commit(&deltas, self.map.as_ref())?;

        // 5. weatherers in kind order
        let wctx = WeatherContext {
            model_time,
            time_step,
            environment: &self.environment,
        };
        let mut removed = Vec::with_capacity(self.weatherers.len());
        for entry in &mut self.weatherers {
            if !entry.weatherer.activity().is_active(model_time) {
                continue;
            }
            let groups = elements.in_water_groups();
            let mass = entry.weatherer.weather(&groups, &mut elements, &wctx)?;
            let key = entry.weatherer.ledger_key();
            mass_balance.record(key, mass)?;
            debug!("{}: removed {:.6} kg ({})", entry.id, mass, key);
            removed.push((key.to_string(), mass));
        }

        // 6. clocks and end-of-step checks
        elements.advance_age(time_step);
        update_weathering_data(&elements, &mut weathering);
        elements.check_invariants()?;
        mass_balance.check_conservation(elements.total_mass(), weathering.amount_released)?;

        self.elements = elements;
        self.mass_balance = mass_balance;
        self.weathering = weathering;
        self.rng = rng;
        self.step_index = step;
        self.model_time = self.config.start_time + step as f64 * time_step;

        let report = StepReport {
            step,
            model_time: self.model_time,
            released,
            refloated,
            beached: commit.beached,
            off_map: commit.off_map,
            no_data: no_data_count,
            removed,
            total_mass: self.elements.total_mass(),
        };
        debug!(
            "Step {} done at t={}s: {} released, {} beached, {:.3} kg floating",
            step, self.model_time, released, commit.beached, self.weathering.floating
        );
        Ok(report)
    }
}
