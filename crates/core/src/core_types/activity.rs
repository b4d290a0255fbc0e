//! On/off switch and active time window shared by movers and weatherers

/// When a mover or weatherer takes part in a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activity {
    pub on: bool,
    /// First model time (s) the process runs
    pub active_start: f64,
    /// Model time (s) from which the process no longer runs
    pub active_stop: f64,
}

impl Default for Activity {
    fn default() -> Self {
        Self {
            on: true,
            active_start: f64::NEG_INFINITY,
            active_stop: f64::INFINITY,
        }
    }
}

impl Activity {
    pub fn window(active_start: f64, active_stop: f64) -> Self {
        Self {
            on: true,
            active_start,
            active_stop,
        }
    }

    /// Whether a step starting at `model_time` runs this process
    #[inline]
    pub fn is_active(&self, model_time: f64) -> bool {
        self.on && self.active_start <= model_time && model_time < self.active_stop
    }
}
