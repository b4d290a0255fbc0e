//! Oil Spill Simulation Core Library
//!
//! A Lagrangian fate-and-transport engine for oil spills. A spill is
//! represented by particles ("elements"), each carrying a share of the oil's
//! mass split over pseudocomponents. Every time step the model releases new
//! elements, updates their intrinsic properties (density, viscosity, slick
//! area), moves them with wind, currents and diffusion, and weathers them
//! through evaporation, natural dispersion and biodegradation while a mass
//! ledger accounts for everything removed.
//!
//! ## Running a model
//!
//! ```no_run
//! use spill_sim_core::{Model, ModelConfig, Spill, Vec3, WindMover, Evaporation};
//! use spill_sim_core::environment::{ConstantField, Environment};
//! use spill_sim_core::core_types::Knots;
//! use std::sync::Arc;
//!
//! let wind = Arc::new(ConstantField::wind(Knots::new(15.0), 270.0));
//! let mut model = Model::new(ModelConfig::default())
//!     .with_environment(Environment::default().with_wind(wind.clone()));
//! model.add_spill(Spill::point_release(
//!     "platform", "medium_crude", 1000, 50_000.0, Vec3::new(-88.4, 28.7, 0.0), 0.0,
//! ))?;
//! model.add_mover(Box::new(WindMover::new(wind)))?;
//! model.add_weatherer(Box::new(Evaporation::new()))?;
//! for report in model.run()? {
//!     println!("t={} kg={:.1}", report.model_time, report.total_mass);
//! }
//! # Ok::<(), spill_sim_core::SimError>(())
//! ```

// Core types and utilities
pub mod config;
pub mod core_types;
pub mod error;

// Spill inputs and the per-element state they produce
pub mod elements;
pub mod spill;
pub mod substance;

// Environment and shoreline
pub mod environment;
pub mod map;

// Step processes
pub mod intrinsic;
pub mod mass_balance;
pub mod movers;
pub mod weatherers;

// Orchestration
pub mod simulation;

// Re-export core types
pub use config::{ModelConfig, UncertaintyParams};
pub use core_types::{StatusCode, Vec3};
pub use error::{SimError, SimResult};

// Re-export inputs and state
pub use elements::ElementStore;
pub use spill::Spill;
pub use substance::{InMemorySubstanceLibrary, Substance, SubstanceLibrary};

// Re-export processes
pub use environment::{Environment, FieldSampler};
pub use map::{BoundaryMap, OpenWaterMap, RectangularMap};
pub use mass_balance::MassBalance;
pub use movers::{ConstantMover, CurrentMover, Mover, RandomMover, WindMover};
pub use weatherers::{Biodegradation, Evaporation, NaturalDispersion, Weatherer};

// Re-export orchestration
pub use simulation::{Model, ModelState, OwnedSnapshot, Snapshot, StepReport};
