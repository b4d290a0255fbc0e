//! Grid topology discovery for gridded wind/current datasets
//!
//! Gridded field readers hand the core a list of variable names (and the
//! optional `grid_type` attribute). Which variables hold the node coordinates
//! is decided by an explicit strategy, tried in a fixed priority order; the
//! first strategy that matches wins.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Paired coordinate variable names, highest priority first
const NAMED_NODE_PAIRS: [(&str, &str); 3] = [
    ("node_lon", "node_lat"),
    ("lon", "lat"),
    ("lon_psi", "lat_psi"),
];

/// Single variables holding interleaved (lon, lat) pairs
const COMPOSITE_NODE_NAMES: [&str; 2] = ["nodes", "node"];

/// Structured (curvilinear) or unstructured (triangular) grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridKind {
    Structured,
    Unstructured,
}

impl GridKind {
    /// Parse a dataset `grid_type` attribute (case-insensitive)
    pub fn from_grid_type(grid_type: &str) -> SimResult<Self> {
        match grid_type.to_ascii_lowercase().as_str() {
            "sgrid" | "staggered" | "curvilinear" | "roms" => Ok(GridKind::Structured),
            "ugrid" | "triangular" | "unstructured" => Ok(GridKind::Unstructured),
            other => Err(SimError::configuration(format!(
                "unable to determine grid type from '{other}'"
            ))),
        }
    }
}

/// How node coordinates are located in a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopologyStrategy {
    /// Separate longitude and latitude variables with known names
    NamedVariables,
    /// One variable with interleaved (lon, lat) pairs
    CompositeVariable,
    /// No coordinate variables; the reader generates a regular lattice
    GeneratedDefault,
}

/// Result of node-coordinate discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCoordinates {
    NamedVariables { lon: String, lat: String },
    CompositeVariable { name: String },
    GeneratedDefault,
}

impl NodeCoordinates {
    pub fn strategy(&self) -> TopologyStrategy {
        match self {
            NodeCoordinates::NamedVariables { .. } => TopologyStrategy::NamedVariables,
            NodeCoordinates::CompositeVariable { .. } => TopologyStrategy::CompositeVariable,
            NodeCoordinates::GeneratedDefault => TopologyStrategy::GeneratedDefault,
        }
    }
}

/// Strategies in the order they are tried
pub const STRATEGY_PRIORITY: [TopologyStrategy; 3] = [
    TopologyStrategy::NamedVariables,
    TopologyStrategy::CompositeVariable,
    TopologyStrategy::GeneratedDefault,
];

impl TopologyStrategy {
    /// Apply this strategy to `variables`, `None` if it does not match
    pub fn resolve(self, variables: &[&str]) -> Option<NodeCoordinates> {
        let has = |name: &str| variables.contains(&name);
        match self {
            TopologyStrategy::NamedVariables => NAMED_NODE_PAIRS
                .iter()
                .find(|(lon, lat)| has(lon) && has(lat))
                .map(|(lon, lat)| NodeCoordinates::NamedVariables {
                    lon: (*lon).to_string(),
                    lat: (*lat).to_string(),
                }),
            TopologyStrategy::CompositeVariable => COMPOSITE_NODE_NAMES
                .iter()
                .find(|name| has(name))
                .map(|name| NodeCoordinates::CompositeVariable {
                    name: (*name).to_string(),
                }),
            TopologyStrategy::GeneratedDefault => Some(NodeCoordinates::GeneratedDefault),
        }
    }
}

/// First-match discovery over [`STRATEGY_PRIORITY`]
pub fn discover_node_coordinates(variables: &[&str]) -> NodeCoordinates {
    STRATEGY_PRIORITY
        .iter()
        .find_map(|strategy| strategy.resolve(variables))
        .unwrap_or(NodeCoordinates::GeneratedDefault)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_pair_wins_over_composite() {
        let found = discover_node_coordinates(&["nodes", "lon", "lat", "u", "v"]);
        assert_eq!(
            found,
            NodeCoordinates::NamedVariables {
                lon: "lon".into(),
                lat: "lat".into()
            }
        );
    }

    #[test]
    fn test_named_pairs_follow_priority() {
        let found = discover_node_coordinates(&["lon_psi", "lat_psi", "node_lon", "node_lat"]);
        assert_eq!(found.strategy(), TopologyStrategy::NamedVariables);
        assert_eq!(
            found,
            NodeCoordinates::NamedVariables {
                lon: "node_lon".into(),
                lat: "node_lat".into()
            }
        );
    }

    #[test]
    fn test_half_pair_falls_through_to_composite() {
        let found = discover_node_coordinates(&["lon", "node"]);
        assert_eq!(
            found,
            NodeCoordinates::CompositeVariable {
                name: "node".into()
            }
        );
    }

    #[test]
    fn test_generated_default_when_nothing_matches() {
        let found = discover_node_coordinates(&["u", "v", "time"]);
        assert_eq!(found.strategy(), TopologyStrategy::GeneratedDefault);
    }

    #[test]
    fn test_grid_kind_from_attribute() {
        assert_eq!(GridKind::from_grid_type("ROMS").unwrap(), GridKind::Structured);
        assert_eq!(
            GridKind::from_grid_type("ugrid").unwrap(),
            GridKind::Unstructured
        );
        assert!(GridKind::from_grid_type("hex").is_err());
    }
}
