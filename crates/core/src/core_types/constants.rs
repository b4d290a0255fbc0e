//! Physical constants shared by the intrinsic updater and weatherers

/// Standard gravity (m/s²)
pub const GRAVITY: f64 = 9.80665;

/// Universal gas constant (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.314462618;

/// Standard atmospheric pressure (Pa)
pub const ATMOSPHERIC_PRESSURE: f64 = 101_325.0;

/// Seconds in one day; biodegradation rates are tabulated per day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Component masses at or below this value (kg) are treated as fully weathered
pub const MIN_COMPONENT_MASS: f64 = 1e-12;
