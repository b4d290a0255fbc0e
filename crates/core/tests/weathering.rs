//! Weathering through the full step: spreading, biodegradation rates,
//! climate selection and activity windows
//!
//! Run tests with: cargo test --test `weathering`

use approx::assert_relative_eq;
use spill_sim_core::core_types::units::{Kelvin, Knots};
use spill_sim_core::core_types::Activity;
use spill_sim_core::environment::{ConstantField, Environment, Water};
use spill_sim_core::intrinsic::FayGravityViscous;
use spill_sim_core::substance::ComponentClass;
use spill_sim_core::weatherers::{rate_constant, Climate};
use spill_sim_core::{
    Biodegradation, Evaporation, Model, ModelConfig, NaturalDispersion, SimError, Spill, Substance,
    Vec3, Weatherer,
};
use std::sync::Arc;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(steps: usize) -> ModelConfig {
    ModelConfig {
        duration: 900.0 * steps as f64,
        time_step: 900.0,
        ..Default::default()
    }
}

fn crude_spill(amount: f64) -> Spill {
    Spill::point_release("tanker", "medium_crude", 100, amount, Vec3::new(5.0, 60.0, 0.0), 0.0)
}

#[test]
fn test_initial_area_is_fay_area() {
    let mut model = Model::new(config(2));
    model.add_spill(crude_spill(5000.0)).unwrap();
    model.add_weatherer(Box::new(Evaporation::new())).unwrap();
    model.step().unwrap();

    let water = Water::default();
    let density = Substance::medium_crude().density_at(water.temperature);
    let buoyancy = (water.density - density) / water.density;
    let a0 = FayGravityViscous::default()
        .init_area(water.kinematic_viscosity, 5000.0 / density, buoyancy)
        .unwrap();

    let elements = model.elements();
    for i in 0..elements.len() {
        assert_relative_eq!(elements.init_area[i], a0, max_relative = 1e-12);
        assert_relative_eq!(elements.volume_share[i], 0.01, max_relative = 1e-12);
        assert_eq!(elements.area[i], elements.init_area[i] * elements.volume_share[i]);
        assert_relative_eq!(elements.init_volume[i], 5000.0 / density, max_relative = 1e-12);
    }
    // the elements together cover the slick
    let total: f64 = elements.area.iter().sum();
    assert_relative_eq!(total, a0, max_relative = 1e-9);

    // the slick keeps spreading afterwards
    model.step().unwrap();
    let total: f64 = model.elements().area.iter().sum();
    assert!(total > a0);
}

#[test]
fn test_weathered_mass_independent_of_element_count() {
    let run = |num_elements: usize| {
        let wind = Arc::new(ConstantField::wind(Knots::new(20.0), 270.0));
        let mut model =
            Model::new(config(2)).with_environment(Environment::default().with_wind(wind));
        model
            .add_spill(Spill::point_release(
                "tanker",
                "medium_crude",
                num_elements,
                10_000.0,
                Vec3::new(5.0, 60.0, 0.0),
                0.0,
            ))
            .unwrap();
        model.add_weatherer(Box::new(Evaporation::new())).unwrap();
        model.add_weatherer(Box::new(NaturalDispersion::new())).unwrap();
        model.run().unwrap();
        let ledger = model.mass_balance();
        (
            ledger.get("evaporated").unwrap(),
            ledger.get("dispersed").unwrap(),
            model.elements().total_mass(),
        )
    };

    let (evaporated, dispersed, remaining) = run(10);
    assert!(evaporated > 0.0);
    assert!(dispersed > 0.0);
    assert!(remaining > 0.0);
    for num_elements in [1, 1000] {
        let (e, d, r) = run(num_elements);
        assert_relative_eq!(e, evaporated, max_relative = 1e-6);
        assert_relative_eq!(d, dispersed, max_relative = 1e-6);
        assert_relative_eq!(r, remaining, max_relative = 1e-6);
    }
}

#[test]
fn test_no_area_without_area_weatherers() {
    let mut model = Model::new(config(1));
    model.add_spill(crude_spill(5000.0)).unwrap();
    model
        .add_weatherer(Box::new(Biodegradation::default()))
        .unwrap();
    model.run().unwrap();
    assert!(model.elements().area.iter().all(|&a| a == 0.0));
    // biodegradation without dispersed droplets removes nothing
    assert_eq!(model.mass_balance().get("bio_degradation"), Some(0.0));
}

#[test]
fn test_crude_rate_table() {
    let crude = Substance::medium_crude();
    let temperate: Vec<f64> = crude
        .components()
        .iter()
        .map(|c| rate_constant(c.class, c.boiling_point, Climate::Temperate))
        .collect();
    assert_eq!(
        temperate,
        vec![
            0.941_386_396,
            0.941_386_396,
            0.941_386_396,
            0.0,
            0.575_541_103,
            0.575_541_103,
            0.084_840_485,
            0.0,
            0.0
        ]
    );
    assert_eq!(
        rate_constant(ComponentClass::Aromatic, 750.0, Climate::Arctic),
        0.021_054_707
    );
}

#[test]
fn test_biodegradation_runs_after_dispersion() {
    let wind = Arc::new(ConstantField::wind(Knots::new(25.0), 90.0));
    let cold = Water::new(Kelvin::new(275.15), 1028.0, 1.8e-6);
    let mut model = Model::new(config(8))
        .with_environment(Environment::new(cold).with_wind(wind));
    model.add_spill(crude_spill(2000.0)).unwrap();
    // registered out of order; the model runs them by kind
    let bio = model
        .add_weatherer(Box::new(Biodegradation::default()))
        .unwrap();
    let disp = model
        .add_weatherer(Box::new(NaturalDispersion::new()))
        .unwrap();
    assert_eq!(model.weatherer_ids(), vec![disp.as_str(), bio.as_str()]);

    model.run().unwrap();
    assert!(model.elements().droplet_avg_size.iter().all(|&d| d > 0.0));
    assert!(model.mass_balance().get("dispersed").unwrap() > 0.0);
    assert!(model.mass_balance().get("bio_degradation").unwrap() > 0.0);
    assert_relative_eq!(
        model.elements().total_mass() + model.mass_balance().total_removed(),
        2000.0,
        max_relative = 1e-9
    );
}

#[test]
fn test_weatherer_waits_for_activity_window() {
    let mut evaporation = Evaporation::new();
    *evaporation.activity_mut() = Activity::window(1800.0, f64::INFINITY);

    let mut model = Model::new(config(4));
    model.add_spill(crude_spill(1000.0)).unwrap();
    model.add_weatherer(Box::new(evaporation)).unwrap();

    let reports = model.run().unwrap();
    assert!(reports[0].removed.is_empty());
    assert!(reports[1].removed.is_empty());
    assert_eq!(reports[2].removed.len(), 1);
    assert!(reports[2].removed[0].1 > 0.0);
    assert!(model.mass_balance().get("evaporated").unwrap() > 0.0);
}

#[test]
fn test_invalid_water_rejected() {
    let bad = Water::new(Kelvin::new(288.15), -1.0, 1e-6);
    let mut model = Model::new(config(1)).with_environment(Environment::new(bad));
    model.add_spill(crude_spill(10.0)).unwrap();
    assert!(matches!(
        model.step(),
        Err(SimError::Configuration { .. })
    ));
}
