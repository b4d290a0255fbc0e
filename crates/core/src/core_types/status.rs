//! Element status codes

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single element.
///
/// Elements are created `NotReleased`, become `InWater` when their spill
/// releases them, and may end `OnLand`, `OffMaps` or `Evaporated`. Only
/// `InWater` elements are moved or weathered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusCode {
    #[default]
    NotReleased,
    InWater,
    OnLand,
    OffMaps,
    Evaporated,
}

impl StatusCode {
    /// Element has been released into the run (any status but `NotReleased`)
    #[inline]
    pub fn is_released(self) -> bool {
        self != StatusCode::NotReleased
    }

    #[inline]
    pub fn is_in_water(self) -> bool {
        self == StatusCode::InWater
    }
}
