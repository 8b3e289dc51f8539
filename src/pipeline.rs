//! Pipeline orchestration
//!
//! This module provides the public API for incident clustering.
//! It runs the full pipeline from raw alert JSON to a cluster report.

use log::info;

use crate::aggregator::ClusterAggregator;
use crate::config::ClusterConfig;
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::expander::{ClusterExpander, ExpansionStats};
use crate::schema::{RawAlert, RawAlertAdapter};
use crate::types::{ClusterReport, ClusterSummary, EventRecord};

/// Group records into incidents and summarize each one.
///
/// Expansion always runs with `min_neighbors = 0`, so no record is ever
/// labeled noise: every record reachable through a chain of neighbors ends up
/// in the same incident. Labels are written back into `records`.
///
/// # Arguments
/// * `records` - Records to cluster, in the order that fixes cluster numbering
/// * `eps_spatial_m` - Maximum neighbor distance in meters
/// * `eps_temporal_s` - Interval padding in seconds
pub fn cluster_records(
    records: &mut [EventRecord],
    eps_spatial_m: f64,
    eps_temporal_s: f64,
) -> Vec<ClusterSummary> {
    if records.is_empty() {
        return Vec::new();
    }

    ClusterExpander::new(eps_spatial_m, eps_temporal_s, 0).expand(records);
    ClusterAggregator::aggregate(records)
}

/// Label records in place using the configured `min_neighbors`.
pub fn label_records(records: &mut [EventRecord], config: &ClusterConfig) -> ExpansionStats {
    ClusterExpander::from_config(config).expand(records)
}

/// Convert a raw JSON array of geo.alert.v1 alerts into a cluster report.
///
/// # Returns
/// Pretty-printed JSON `ClusterReport`
///
/// # Example
/// ```ignore
/// let report_json = alerts_to_clusters(alerts_json, 100.0, 600.0)?;
/// ```
pub fn alerts_to_clusters(
    raw_json: String,
    eps_spatial_m: f64,
    eps_temporal_s: f64,
) -> Result<String, ComputeError> {
    let processor = ClusterProcessor::with_config(ClusterConfig::incidents(
        eps_spatial_m,
        eps_temporal_s,
    ))?;
    processor.process_json(&raw_json)
}

/// Stateful processor holding clustering parameters and a report encoder.
///
/// Use this when the same parameters are applied to many batches.
pub struct ClusterProcessor {
    config: ClusterConfig,
    encoder: ReportEncoder,
}

impl Default for ClusterProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterProcessor {
    /// Create a new processor with default parameters
    pub fn new() -> Self {
        Self {
            config: ClusterConfig::default(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a processor with validated parameters
    pub fn with_config(config: ClusterConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Load parameters from JSON
    pub fn load_config(&mut self, json: &str) -> Result<(), ComputeError> {
        self.config = ClusterConfig::from_json(json)?;
        Ok(())
    }

    /// Save parameters to JSON
    pub fn save_config(&self) -> Result<String, ComputeError> {
        self.config.to_json()
    }

    /// Cluster records into a report.
    ///
    /// Incident reports always use reachability clustering (`min_neighbors =
    /// 0`); the configured `min_neighbors` only applies to [`Self::label`].
    pub fn process(&self, records: &mut [EventRecord]) -> ClusterReport {
        let summaries = cluster_records(
            records,
            self.config.eps_spatial_m,
            self.config.eps_temporal_s,
        );
        info!(
            "clustered {} records into {} incidents",
            records.len(),
            summaries.len()
        );

        let parameters =
            ClusterConfig::incidents(self.config.eps_spatial_m, self.config.eps_temporal_s);
        self.encoder.encode(summaries, &parameters, records.len())
    }

    /// Label records with the configured density threshold
    pub fn label(&self, records: &mut [EventRecord]) -> ExpansionStats {
        label_records(records, &self.config)
    }

    /// Process a JSON array of alerts into a JSON report
    pub fn process_json(&self, raw_json: &str) -> Result<String, ComputeError> {
        let alerts = RawAlertAdapter::parse_array(raw_json)?;
        self.process_alerts(&alerts)
    }

    /// Process NDJSON alerts into a JSON report
    pub fn process_ndjson(&self, raw: &str) -> Result<String, ComputeError> {
        let alerts = RawAlertAdapter::parse_ndjson(raw)?;
        self.process_alerts(&alerts)
    }

    fn process_alerts(&self, alerts: &[RawAlert]) -> Result<String, ComputeError> {
        let mut records = RawAlertAdapter::to_records(alerts)?;
        let report = self.process(&mut records);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}
