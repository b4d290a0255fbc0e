//! Vector type alias and geodesy helpers for element positions.
//!
//! Positions are `(longitude, latitude, z)` with longitude/latitude in
//! decimal degrees and `z` in metres (positive down, 0 at the surface).
//! Movers work in metres and convert to degrees through [`meters_to_lonlat`].

use nalgebra::Vector3;

/// 3D vector type for positions, velocities, and displacements.
///
/// This is an alias for `nalgebra::Vector3<f64>`; f64 keeps round-off below
/// the mass-balance tolerance and the sub-metre resolution of a degree grid.
pub type Vec3 = Vector3<f64>;

/// Metres per degree of latitude (60 nautical miles)
pub const METERS_PER_DEGREE_LAT: f64 = 111_120.0;

/// Convert a displacement in metres (east, north, down) at `latitude` into
/// a displacement in (degrees lon, degrees lat, metres).
///
/// Longitude spacing shrinks with `cos(latitude)`; the cosine is clamped so a
/// position at a pole does not produce an infinite delta.
#[inline]
pub fn meters_to_lonlat(delta_m: Vec3, latitude: f64) -> Vec3 {
    let cos_lat = latitude.to_radians().cos().max(1e-6);
    Vec3::new(
        delta_m.x / (METERS_PER_DEGREE_LAT * cos_lat),
        delta_m.y / METERS_PER_DEGREE_LAT,
        delta_m.z,
    )
}

/// Inverse of [`meters_to_lonlat`]
#[inline]
pub fn lonlat_to_meters(delta_deg: Vec3, latitude: f64) -> Vec3 {
    let cos_lat = latitude.to_radians().cos().max(1e-6);
    Vec3::new(
        delta_deg.x * METERS_PER_DEGREE_LAT * cos_lat,
        delta_deg.y * METERS_PER_DEGREE_LAT,
        delta_deg.z,
    )
}

/// True when every coordinate is finite
#[inline]
pub fn is_finite(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
