//! Model lifecycle: run to completion, terminal behaviour, reset, failure
//! handling and snapshots
//!
//! Run tests with: cargo test --test `model_lifecycle`

use approx::assert_relative_eq;
use spill_sim_core::core_types::units::{Kelvin, Knots};
use spill_sim_core::environment::{ConstantField, Environment};
use spill_sim_core::substance::{ComponentClass, PseudoComponent};
use spill_sim_core::{
    Biodegradation, Evaporation, InMemorySubstanceLibrary, Model, ModelConfig, ModelState,
    NaturalDispersion, OwnedSnapshot, RandomMover, SimError, Spill, StatusCode, Substance, Vec3,
    WindMover,
};
use std::sync::Arc;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const AMOUNT: f64 = 10_000.0;

/// Windy day with every weathering process and a random walk
fn weathering_model(hours: usize, seed: u64) -> Model {
    let wind = Arc::new(ConstantField::wind(Knots::new(20.0), 225.0));
    let config = ModelConfig {
        duration: 3600.0 * hours as f64,
        time_step: 900.0,
        seed,
        ..Default::default()
    };
    let mut model =
        Model::new(config).with_environment(Environment::default().with_wind(wind.clone()));
    model
        .add_spill(Spill::point_release(
            "well",
            "medium_crude",
            200,
            AMOUNT,
            Vec3::new(-88.4, 28.7, 0.0),
            0.0,
        ))
        .unwrap();
    model.add_mover(Box::new(WindMover::new(wind))).unwrap();
    model.add_mover(Box::new(RandomMover::default())).unwrap();
    model.add_weatherer(Box::new(Evaporation::new())).unwrap();
    model.add_weatherer(Box::new(NaturalDispersion::new())).unwrap();
    model.add_weatherer(Box::new(Biodegradation::default())).unwrap();
    model
}

#[test]
fn test_mass_conserved_every_step() {
    let mut model = weathering_model(12, 7);
    loop {
        match model.step() {
            Ok(_) => {
                let element_mass = model.elements().total_mass();
                let removed = model.mass_balance().total_removed();
                assert_relative_eq!(element_mass + removed, AMOUNT, max_relative = 1e-9);
            }
            Err(SimError::SimulationComplete { .. }) => break,
            Err(e) => panic!("step failed: {e}"),
        }
    }
    assert_eq!(model.state(), ModelState::Finished);
    assert!(model.mass_balance().get("evaporated").unwrap() > 0.0);
    assert!(model.mass_balance().get("dispersed").unwrap() > 0.0);
    assert!(model.mass_balance().get("bio_degradation").unwrap() >= 0.0);
    assert_relative_eq!(model.weathering_data().amount_released, AMOUNT, max_relative = 1e-12);
}

#[test]
fn test_step_reports_match_ledger() {
    let mut model = weathering_model(3, 1);
    let reports = model.run().unwrap();
    assert_eq!(reports.len(), 12);
    assert_eq!(reports[0].released, 200);
    assert!(reports[1..].iter().all(|r| r.released == 0));

    let evaporated: f64 = reports
        .iter()
        .flat_map(|r| &r.removed)
        .filter(|(key, _)| key == "evaporated")
        .map(|(_, mass)| mass)
        .sum();
    assert_relative_eq!(
        evaporated,
        model.mass_balance().get("evaporated").unwrap(),
        max_relative = 1e-12
    );
    // weatherers report in run order
    let keys: Vec<&str> = reports[0].removed.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["evaporated", "dispersed", "bio_degradation"]);
}

#[test]
fn test_finished_model_is_idempotent() {
    let mut model = weathering_model(1, 3);
    model.run().unwrap();
    let before = model.snapshot().to_owned();
    for _ in 0..3 {
        assert!(matches!(
            model.step(),
            Err(SimError::SimulationComplete { .. })
        ));
    }
    assert_eq!(model.snapshot().to_owned(), before);
    assert_eq!(model.state(), ModelState::Finished);
}

#[test]
fn test_reset_reproduces_run() {
    let mut model = weathering_model(4, 42);
    model.run().unwrap();
    let first = model.snapshot().to_owned();

    model.reset();
    assert_eq!(model.state(), ModelState::NotStarted);
    assert_eq!(model.step_index(), 0);
    assert!(model.mass_balance().is_empty());

    model.run().unwrap();
    let second = model.snapshot().to_owned();
    assert_eq!(first.mass, second.mass);
    assert_eq!(first.position, second.position);
    assert_eq!(first.mass_balance, second.mass_balance);
}

#[test]
fn test_different_seeds_diverge() {
    let mut a = weathering_model(1, 1);
    let mut b = weathering_model(1, 2);
    a.run().unwrap();
    b.run().unwrap();
    assert_ne!(a.elements().position, b.elements().position);
}

#[test]
fn test_sinking_oil_fails_step_without_commit() {
    let mut library = InMemorySubstanceLibrary::with_defaults();
    library.insert(
        "sinking",
        Substance::new(
            "sinking",
            vec![
                PseudoComponent::new(ComponentClass::Resin, 800.0, 0.5, 0.6),
                PseudoComponent::new(ComponentClass::Asphaltene, 900.0, 0.5, 0.9),
            ],
            1050.0,
            Kelvin::new(288.15),
            Some(1e-3),
        )
        .unwrap(),
    );
    let mut model = Model::new(ModelConfig::default()).with_library(Arc::new(library));
    model
        .add_spill(Spill::point_release("s", "sinking", 10, 100.0, Vec3::zeros(), 0.0))
        .unwrap();
    model.add_weatherer(Box::new(Evaporation::new())).unwrap();

    match model.step() {
        Err(SimError::Physics { process, .. }) => assert_eq!(process, "intrinsic"),
        other => panic!("expected a physics error, got {other:?}"),
    }
    assert_eq!(model.state(), ModelState::Failed);
    assert_eq!(model.step_index(), 0);
    assert_eq!(model.elements().count_with_status(StatusCode::InWater), 0);
    assert_eq!(model.elements().total_mass(), 0.0);
    assert!(matches!(
        model.step(),
        Err(SimError::SimulationComplete { .. })
    ));

    // reset leaves Failed and allows reconfiguration
    model.reset();
    assert_eq!(model.state(), ModelState::NotStarted);
}

#[test]
fn test_failed_late_release_keeps_committed_state() {
    let config = ModelConfig {
        duration: 3.0 * 900.0,
        time_step: 900.0,
        ..Default::default()
    };
    let mut model = Model::new(config);
    let site = Vec3::new(3.0, 52.0, 0.0);
    model
        .add_spill(Spill::point_release("early", "diesel", 20, 400.0, site, 0.0))
        .unwrap();
    // accepted at setup; the bad amount only shows once its elements release
    model
        .add_spill(Spill::point_release("late", "diesel", 10, 0.0, site, 900.0))
        .unwrap();
    model.add_weatherer(Box::new(Evaporation::new())).unwrap();

    let report = model.step().unwrap();
    assert_eq!(report.released, 20);
    let committed = model.snapshot().to_owned();
    assert!(model.mass_balance().get("evaporated").unwrap() > 0.0);

    match model.step() {
        Err(SimError::Release { spill, .. }) => assert_eq!(spill, "late"),
        other => panic!("expected a release error, got {other:?}"),
    }
    assert_eq!(model.state(), ModelState::Failed);
    assert_eq!(model.step_index(), 1);

    let after = model.snapshot().to_owned();
    assert_eq!(after.step, committed.step);
    assert_eq!(after.status, committed.status);
    assert_eq!(after.position, committed.position);
    assert_eq!(after.mass, committed.mass);
    assert_eq!(after.mass_balance, committed.mass_balance);
    assert_eq!(model.elements().released_count(), 20);
}

#[test]
fn test_snapshot_survives_json() {
    let mut model = weathering_model(1, 5);
    model.step().unwrap();
    let snapshot = model.snapshot();
    assert_eq!(snapshot.num_released(), 200);
    assert_eq!(snapshot.state, ModelState::Running { step: 1 });

    let owned = snapshot.to_owned();
    let json = serde_json::to_string(&owned).unwrap();
    let back: OwnedSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.step, 1);
    assert_eq!(back.status, owned.status);
    assert_eq!(back.mass_balance.len(), 3);
    assert_relative_eq!(back.total_mass(), owned.total_mass(), max_relative = 1e-12);
}

#[test]
fn test_continuous_release_schedule() {
    let config = ModelConfig {
        duration: 4.0 * 900.0,
        time_step: 900.0,
        ..Default::default()
    };
    let mut model = Model::new(config);
    model
        .add_spill(
            Spill::point_release("pipe", "diesel", 8, 800.0, Vec3::new(10.0, 55.0, 0.0), 0.0)
                .with_continuous_release(3600.0),
        )
        .unwrap();
    let reports = model.run().unwrap();
    let released: Vec<usize> = reports.iter().map(|r| r.released).collect();
    // element k leaves at k·450 s: steps start at 0, 900, 1800, 2700
    assert_eq!(released, vec![1, 2, 2, 2]);
    assert_eq!(model.elements().released_count(), 7);
    assert_eq!(model.elements().count_with_status(StatusCode::NotReleased), 1);
    assert_relative_eq!(model.weathering_data().amount_released, 700.0, max_relative = 1e-12);
}

#[test]
fn test_object_ids_follow_registration() {
    let mut model = Model::new(ModelConfig::default());
    let wind = Arc::new(ConstantField::wind(Knots::new(5.0), 0.0));
    let first = model.add_mover(Box::new(WindMover::new(wind.clone()))).unwrap();
    let second = model.add_mover(Box::new(WindMover::new(wind))).unwrap();
    let walk = model.add_mover(Box::new(RandomMover::default())).unwrap();
    assert_eq!(first, "WindMover_0");
    assert_eq!(second, "WindMover_1");
    assert_eq!(walk, "RandomMover_0");

    let removed = model.remove_mover(&first).unwrap();
    assert!(removed.is_some());
    let third = model
        .add_mover(Box::new(WindMover::new(Arc::new(ConstantField::wind(
            Knots::new(1.0),
            90.0,
        )))))
        .unwrap();
    assert_eq!(third, "WindMover_2");
    assert!(model.mover(&first).is_none());
    assert!(model.mover(&third).is_some());
}
