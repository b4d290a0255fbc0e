//! Oil substances and pseudocomponents
//!
//! A [`Substance`] is the immutable physical description of one oil type.
//! Elements reference it through an `Arc`, so every element of a spill shares
//! one copy and nothing in a run can mutate it.
//!
//! # Correlations
//!
//! ```text
//! ρ(T) = ρ_ref · (1 − k_ρ · (T − T_ref))          k_ρ = 0.0008 /K
//! ν(T) = ν_ref · exp(k_ν · (1/T − 1/T_ref))       k_ν = 5000 K
//! ```
//!
//! Loading substances from an oil library database is handled outside this
//! crate; callers build them directly or through a [`SubstanceLibrary`].

use crate::core_types::units::Kelvin;
use crate::error::{SimError, SimResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Thermal expansion coefficient for the density correlation (1/K)
const DENSITY_EXPANSION_COEFF: f64 = 0.0008;

/// Andrade-type temperature coefficient for the viscosity correlation (K)
const VISCOSITY_TEMPERATURE_COEFF: f64 = 5000.0;

/// Mass fractions must sum to one within this tolerance
const MASS_FRACTION_TOLERANCE: f64 = 1e-6;

/// SARA class of a pseudocomponent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentClass {
    Saturate,
    Aromatic,
    Resin,
    Asphaltene,
}

/// One lumped chemical fraction of an oil
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PseudoComponent {
    pub class: ComponentClass,
    /// Representative boiling point (K)
    pub boiling_point: f64,
    /// Fraction of the oil's total mass (0-1)
    pub mass_fraction: f64,
    /// Molecular weight (kg/mol)
    pub molecular_weight: f64,
}

impl PseudoComponent {
    pub fn new(
        class: ComponentClass,
        boiling_point: f64,
        mass_fraction: f64,
        molecular_weight: f64,
    ) -> Self {
        Self {
            class,
            boiling_point,
            mass_fraction,
            molecular_weight,
        }
    }
}

/// Immutable physical and chemical description of an oil
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substance {
    name: String,
    components: Vec<PseudoComponent>,
    /// Density at `reference_temperature` (kg/m³)
    reference_density: f64,
    reference_temperature: Kelvin,
    /// Kinematic viscosity at `reference_temperature` (m²/s), when known
    reference_viscosity: Option<f64>,
}

impl Substance {
    /// Build a substance, validating component table and reference values
    pub fn new(
        name: impl Into<String>,
        components: Vec<PseudoComponent>,
        reference_density: f64,
        reference_temperature: Kelvin,
        reference_viscosity: Option<f64>,
    ) -> SimResult<Self> {
        let name = name.into();
        if components.is_empty() {
            return Err(SimError::configuration(format!(
                "substance '{name}' has no pseudocomponents"
            )));
        }
        for c in &components {
            if !(c.mass_fraction >= 0.0 && c.boiling_point > 0.0 && c.molecular_weight > 0.0) {
                return Err(SimError::configuration(format!(
                    "substance '{name}' has an invalid pseudocomponent: {c:?}"
                )));
            }
        }
        let total: f64 = components.iter().map(|c| c.mass_fraction).sum();
        if (total - 1.0).abs() > MASS_FRACTION_TOLERANCE {
            return Err(SimError::configuration(format!(
                "substance '{name}' mass fractions sum to {total}, expected 1"
            )));
        }
        if !(reference_density.is_finite() && reference_density > 0.0) {
            return Err(SimError::configuration(format!(
                "substance '{name}' has non-positive density"
            )));
        }
        if let Some(nu) = reference_viscosity {
            if !(nu.is_finite() && nu > 0.0) {
                return Err(SimError::configuration(format!(
                    "substance '{name}' has non-positive viscosity"
                )));
            }
        }

        Ok(Self {
            name,
            components,
            reference_density,
            reference_temperature,
            reference_viscosity,
        })
    }

    /// Generic medium crude (API ~27)
    pub fn medium_crude() -> Self {
        use ComponentClass::{Aromatic, Asphaltene, Resin, Saturate};
        let components = vec![
            PseudoComponent::new(Saturate, 400.0, 0.15, 0.114),
            PseudoComponent::new(Saturate, 500.0, 0.15, 0.170),
            PseudoComponent::new(Saturate, 650.0, 0.15, 0.300),
            PseudoComponent::new(Saturate, 800.0, 0.10, 0.500),
            PseudoComponent::new(Aromatic, 450.0, 0.10, 0.110),
            PseudoComponent::new(Aromatic, 600.0, 0.10, 0.200),
            PseudoComponent::new(Aromatic, 750.0, 0.10, 0.350),
            PseudoComponent::new(Resin, 800.0, 0.10, 0.800),
            PseudoComponent::new(Asphaltene, 900.0, 0.05, 1.000),
        ];
        Self {
            name: "medium crude".to_string(),
            components,
            reference_density: 890.0,
            reference_temperature: Kelvin::new(288.15),
            reference_viscosity: Some(5.0e-5),
        }
    }

    /// Marine diesel, light and almost entirely distillable
    pub fn diesel() -> Self {
        use ComponentClass::{Aromatic, Saturate};
        let components = vec![
            PseudoComponent::new(Saturate, 450.0, 0.35, 0.150),
            PseudoComponent::new(Saturate, 550.0, 0.30, 0.210),
            PseudoComponent::new(Saturate, 620.0, 0.10, 0.270),
            PseudoComponent::new(Aromatic, 480.0, 0.15, 0.130),
            PseudoComponent::new(Aromatic, 580.0, 0.10, 0.190),
        ];
        Self {
            name: "diesel".to_string(),
            components,
            reference_density: 840.0,
            reference_temperature: Kelvin::new(288.15),
            reference_viscosity: Some(3.0e-6),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[PseudoComponent] {
        &self.components
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn mass_fractions(&self) -> impl Iterator<Item = f64> + '_ {
        self.components.iter().map(|c| c.mass_fraction)
    }

    /// Density (kg/m³) at water temperature `temperature`
    pub fn density_at(&self, temperature: Kelvin) -> f64 {
        let dt = temperature.value() - self.reference_temperature.value();
        self.reference_density * (1.0 - DENSITY_EXPANSION_COEFF * dt)
    }

    /// Kinematic viscosity (m²/s) at `temperature`, `None` if the substance has none
    pub fn viscosity_at(&self, temperature: Kelvin) -> Option<f64> {
        let nu_ref = self.reference_viscosity?;
        let exponent = VISCOSITY_TEMPERATURE_COEFF
            * (1.0 / temperature.value() - 1.0 / self.reference_temperature.value());
        Some(nu_ref * exponent.exp())
    }
}

/// Read-only substance lookup by id
pub trait SubstanceLibrary: Send + Sync {
    fn get(&self, id: &str) -> Option<Arc<Substance>>;
}

/// Library backed by a hash map, filled by the caller
#[derive(Debug, Default, Clone)]
pub struct InMemorySubstanceLibrary {
    substances: FxHashMap<String, Arc<Substance>>,
}

impl InMemorySubstanceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `substance` under `id`, replacing any previous entry
    pub fn insert(&mut self, id: impl Into<String>, substance: Substance) -> Arc<Substance> {
        let substance = Arc::new(substance);
        self.substances.insert(id.into(), Arc::clone(&substance));
        substance
    }

    /// Library holding the built-in oils under `"medium_crude"` and `"diesel"`
    pub fn with_defaults() -> Self {
        let mut library = Self::new();
        library.insert("medium_crude", Substance::medium_crude());
        library.insert("diesel", Substance::diesel());
        library
    }

    pub fn len(&self) -> usize {
        self.substances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }
}

impl SubstanceLibrary for InMemorySubstanceLibrary {
    fn get(&self, id: &str) -> Option<Arc<Substance>> {
        self.substances.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builtin_fractions_sum_to_one() {
        for s in [Substance::medium_crude(), Substance::diesel()] {
            let total: f64 = s.mass_fractions().sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_density_at_reference_temperature() {
        let oil = Substance::medium_crude();
        assert_relative_eq!(oil.density_at(Kelvin::new(288.15)), 890.0);
        // warmer oil is lighter
        assert!(oil.density_at(Kelvin::new(298.15)) < 890.0);
    }

    #[test]
    fn test_viscosity_decreases_with_temperature() {
        let oil = Substance::medium_crude();
        let cold = oil.viscosity_at(Kelvin::new(275.0)).unwrap();
        let warm = oil.viscosity_at(Kelvin::new(300.0)).unwrap();
        assert!(cold > warm);
    }

    #[test]
    fn test_rejects_bad_fraction_sum() {
        let components = vec![PseudoComponent::new(
            ComponentClass::Saturate,
            500.0,
            0.7,
            0.2,
        )];
        let result = Substance::new("bad", components, 850.0, Kelvin::new(288.15), None);
        assert!(matches!(result, Err(SimError::Configuration { .. })));
    }

    #[test]
    fn test_substance_without_viscosity() {
        let components = vec![PseudoComponent::new(
            ComponentClass::Aromatic,
            480.0,
            1.0,
            0.13,
        )];
        let s = Substance::new("aromatic cut", components, 870.0, Kelvin::new(288.15), None)
            .unwrap();
        assert!(s.viscosity_at(Kelvin::new(290.0)).is_none());
    }

    #[test]
    fn test_library_lookup_shares_arc() {
        let library = InMemorySubstanceLibrary::with_defaults();
        let a = library.get("diesel").unwrap();
        let b = library.get("diesel").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(library.get("bunker").is_none());
        assert_eq!(library.len(), 2);
    }
}
