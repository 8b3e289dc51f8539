//! Report encoding
//!
//! This module wraps cluster summaries in a `ClusterReport` envelope carrying
//! producer metadata, the parameters used, and headline counts.

use crate::config::ClusterConfig;
use crate::error::ComputeError;
use crate::types::{ClusterReport, ClusterSummary, ReportProducer};
use crate::{CRATE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "incident.report.v1";

/// Encoder for producing cluster reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build a report for `record_count` input records
    pub fn encode(
        &self,
        summaries: Vec<ClusterSummary>,
        parameters: &ClusterConfig,
        record_count: usize,
    ) -> ClusterReport {
        let noise_count: usize = summaries
            .iter()
            .filter(|s| s.cluster.is_noise())
            .map(|s| s.len())
            .sum();
        let cluster_count = summaries.iter().filter(|s| !s.cluster.is_noise()).count();

        ClusterReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: CRATE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            parameters: parameters.clone(),
            record_count,
            cluster_count,
            noise_count,
            clusters: summaries,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        summaries: Vec<ClusterSummary>,
        parameters: &ClusterConfig,
        record_count: usize,
    ) -> Result<String, ComputeError> {
        let report = self.encode(summaries, parameters, record_count);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}
