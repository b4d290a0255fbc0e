//! Core types and utilities

pub mod activity;
pub mod constants;
pub mod rng;
pub mod status;
pub mod units;
pub mod vec3;

pub use activity::Activity;
pub use constants::*;
pub use rng::{seeded_rng, stream_rng, SimRng};
pub use status::StatusCode;
pub use units::*;
pub use vec3::{is_finite, lonlat_to_meters, meters_to_lonlat, Vec3, METERS_PER_DEGREE_LAT};
