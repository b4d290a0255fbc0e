//! Vector-field samplers for wind and current
//!
//! The engine treats gridded wind/current data as a black box behind
//! [`FieldSampler`]. Interpolation kernels over real grids live outside the
//! crate; the samplers here cover uniform fields and point time series.

use crate::core_types::units::MetersPerSecond;
use crate::core_types::Vec3;
use crate::error::{SimError, SimResult};
use std::fmt;

/// Velocity field queried by movers and weatherers
///
/// `sample` returns `Err(SimError::DataGap)` when the field has no coverage
/// at `(time, position)`. Callers treat that as "no data", never as zero
/// wind or current.
pub trait FieldSampler: Send + Sync + fmt::Debug {
    /// Name used in logs and data-gap errors
    fn name(&self) -> &str;

    /// Velocity (m/s, east/north/down) at `time` seconds and `position` (lon, lat, z)
    fn sample(&self, time: f64, position: &Vec3) -> SimResult<Vec3>;

    /// False when the sampler holds no data at all
    fn has_data(&self) -> bool {
        true
    }
}

/// Horizontal velocity from a speed and a meteorological direction
/// (degrees true the flow comes *from*)
pub fn velocity_from_speed_direction(speed: MetersPerSecond, direction_from_deg: f64) -> Vec3 {
    let theta = direction_from_deg.to_radians();
    Vec3::new(-*speed * theta.sin(), -*speed * theta.cos(), 0.0)
}

/// Axis-aligned lon/lat box limiting a field's coverage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl Coverage {
    pub fn contains(&self, position: &Vec3) -> bool {
        position.x >= self.lon_min
            && position.x <= self.lon_max
            && position.y >= self.lat_min
            && position.y <= self.lat_max
    }
}

/// Spatially and temporally uniform field
#[derive(Debug, Clone)]
pub struct ConstantField {
    name: String,
    velocity: Vec3,
    coverage: Option<Coverage>,
}

impl ConstantField {
    pub fn new(name: impl Into<String>, velocity: Vec3) -> Self {
        Self {
            name: name.into(),
            velocity,
            coverage: None,
        }
    }

    /// Uniform wind from a speed and "from" direction
    pub fn wind(speed: impl Into<MetersPerSecond>, direction_from_deg: f64) -> Self {
        Self::new(
            "constant wind",
            velocity_from_speed_direction(speed.into(), direction_from_deg),
        )
    }

    /// Restrict the field to `coverage`; positions outside report a data gap
    pub fn with_coverage(mut self, coverage: Coverage) -> Self {
        self.coverage = Some(coverage);
        self
    }
}

impl FieldSampler for ConstantField {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&self, time: f64, position: &Vec3) -> SimResult<Vec3> {
        match self.coverage {
            Some(coverage) if !coverage.contains(position) => Err(SimError::DataGap {
                field: self.name.clone(),
                time,
            }),
            _ => Ok(self.velocity),
        }
    }
}

/// Point time series, linearly interpolated in time and uniform in space
#[derive(Debug, Clone)]
pub struct TimeSeriesField {
    name: String,
    times: Vec<f64>,
    values: Vec<Vec3>,
    /// Hold the end values outside the series instead of reporting a gap
    extrapolate: bool,
}

impl TimeSeriesField {
    /// Build from `(time, velocity)` pairs; times must be strictly increasing
    pub fn new(name: impl Into<String>, series: Vec<(f64, Vec3)>) -> SimResult<Self> {
        let name = name.into();
        if series.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(SimError::configuration(format!(
                "time series '{name}' must have strictly increasing times"
            )));
        }
        let (times, values) = series.into_iter().unzip();
        Ok(Self {
            name,
            times,
            values,
            extrapolate: false,
        })
    }

    /// Build from `(time, speed, direction_from_deg)` records
    pub fn from_speed_direction(
        name: impl Into<String>,
        records: &[(f64, MetersPerSecond, f64)],
    ) -> SimResult<Self> {
        let series = records
            .iter()
            .map(|&(t, speed, dir)| (t, velocity_from_speed_direction(speed, dir)))
            .collect();
        Self::new(name, series)
    }

    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    fn interpolate(&self, time: f64) -> Option<Vec3> {
        let first = *self.times.first()?;
        let last = *self.times.last()?;
        if self.times.len() == 1 {
            return Some(self.values[0]);
        }
        if time < first || time > last {
            if !self.extrapolate {
                return None;
            }
            return Some(if time < first {
                self.values[0]
            } else {
                self.values[self.values.len() - 1]
            });
        }
        // first index whose time is >= `time`
        let hi = self.times.partition_point(|&t| t < time);
        if hi == 0 {
            return Some(self.values[0]);
        }
        let lo = hi - 1;
        let w = (time - self.times[lo]) / (self.times[hi] - self.times[lo]);
        Some(self.values[lo] * (1.0 - w) + self.values[hi] * w)
    }
}

impl FieldSampler for TimeSeriesField {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&self, time: f64, _position: &Vec3) -> SimResult<Vec3> {
        self.interpolate(time).ok_or_else(|| SimError::DataGap {
            field: self.name.clone(),
            time,
        })
    }

    fn has_data(&self) -> bool {
        !self.times.is_empty()
    }
}
