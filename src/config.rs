//! Clustering parameters
//!
//! Parameters are plain serde structs so callers can keep them in a JSON file
//! next to their data and override individual fields from the command line.

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Default spatial epsilon (meters)
pub const DEFAULT_EPS_SPATIAL_M: f64 = 100.0;

/// Default temporal epsilon (seconds)
pub const DEFAULT_EPS_TEMPORAL_S: f64 = 3600.0;

/// Parameters for neighbor queries and cluster expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum great-circle distance between neighbors (meters)
    pub eps_spatial_m: f64,
    /// Padding applied to both ends of a record's interval (seconds)
    pub eps_temporal_s: f64,
    /// Neighborhood size a record needs to seed or extend a cluster.
    ///
    /// The incident entry points always use 0, which turns expansion into
    /// plain reachability clustering with no noise.
    pub min_neighbors: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            eps_spatial_m: DEFAULT_EPS_SPATIAL_M,
            eps_temporal_s: DEFAULT_EPS_TEMPORAL_S,
            min_neighbors: 0,
        }
    }
}

impl ClusterConfig {
    pub fn new(eps_spatial_m: f64, eps_temporal_s: f64, min_neighbors: usize) -> Self {
        Self {
            eps_spatial_m,
            eps_temporal_s,
            min_neighbors,
        }
    }

    /// Incident clustering parameters (`min_neighbors = 0`)
    pub fn incidents(eps_spatial_m: f64, eps_temporal_s: f64) -> Self {
        Self::new(eps_spatial_m, eps_temporal_s, 0)
    }

    /// Reject negative or non-finite epsilons
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.eps_spatial_m.is_finite() || self.eps_spatial_m < 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "eps_spatial_m must be a non-negative number, got {}",
                self.eps_spatial_m
            )));
        }
        if !self.eps_temporal_s.is_finite() || self.eps_temporal_s < 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "eps_temporal_s must be a non-negative number, got {}",
                self.eps_temporal_s
            )));
        }
        Ok(())
    }

    /// Load and validate parameters from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: ClusterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize parameters to pretty JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}
