//! Model-owned instance naming
//!
//! Movers and weatherers get ids like `"WindMover_0"`, `"WindMover_1"`,
//! `"Evaporation_0"` from per-kind counters held by the model. Two models in
//! one process number their objects independently.
//!
//! Each id also carries a serial across all kinds, never reused after a
//! removal. Movers draw their RNG stream from it.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    counters: FxHashMap<&'static str, usize>,
    serial: u64,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for an object of kind `kind_name`
    pub fn next_id(&mut self, kind_name: &'static str) -> String {
        self.next_with_serial(kind_name).0
    }

    /// Next id for `kind_name` with its registration serial (1-based)
    pub fn next_with_serial(&mut self, kind_name: &'static str) -> (String, u64) {
        let counter = self.counters.entry(kind_name).or_insert(0);
        let id = format!("{kind_name}_{counter}");
        *counter += 1;
        self.serial += 1;
        (id, self.serial)
    }

    /// How many ids were handed out for `kind_name`
    pub fn issued(&self, kind_name: &str) -> usize {
        self.counters.get(kind_name).copied().unwrap_or(0)
    }
}
