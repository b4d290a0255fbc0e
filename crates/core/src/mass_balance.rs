//! Mass-balance ledger
//!
//! Cumulative mass removed from the elements, keyed by weathering process.
//! At every committed step:
//!
//! ```text
//! Σ ledger + Σ element mass == mass released so far
//! ```

use crate::error::{SimError, SimResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Relative tolerance of the conservation check
pub const CONSERVATION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassBalance {
    removed: FxHashMap<String, f64>,
}

impl MassBalance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zero entry for `key` if it does not exist yet
    pub fn register(&mut self, key: &str) {
        self.removed.entry(key.to_string()).or_insert(0.0);
    }

    /// Add `amount` kg removed by the process `key`
    pub fn record(&mut self, key: &str, amount: f64) -> SimResult<()> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(SimError::physics(
                key,
                format!("removed mass must be finite and non-negative, got {amount}"),
            ));
        }
        *self.removed.entry(key.to_string()).or_insert(0.0) += amount;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.removed.get(key).copied()
    }

    pub fn total_removed(&self) -> f64 {
        self.removed.values().sum()
    }

    /// Entries sorted by key
    pub fn entries(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> =
            self.removed.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    pub fn clear(&mut self) {
        self.removed.clear();
    }

    /// Verify the ledger and the remaining element mass add up to `released`
    pub fn check_conservation(&self, element_mass: f64, released: f64) -> SimResult<()> {
        let accounted = self.total_removed() + element_mass;
        let scale = released.abs().max(f64::MIN_POSITIVE);
        if (accounted - released).abs() / scale > CONSERVATION_TOLERANCE && released > 0.0 {
            return Err(SimError::physics(
                "mass balance",
                format!("released {released} kg but {accounted} kg accounted for"),
            ));
        }
        Ok(())
    }
}
