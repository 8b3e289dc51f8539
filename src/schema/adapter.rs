//! Adapter for converting geo.alert.v1 alerts to clustering records
//!
//! Parsing accepts either a JSON array or NDJSON. Conversion validates every
//! alert and keeps input order, which determines cluster numbering downstream.

use log::warn;

use crate::error::ComputeError;
use crate::schema::raw_alert::*;
use crate::types::EventRecord;

/// Adapter for converting raw alerts to event records
pub struct RawAlertAdapter;

impl RawAlertAdapter {
    /// Parse a JSON string containing an array of RawAlerts
    pub fn parse_array(json: &str) -> Result<Vec<RawAlert>, ComputeError> {
        let alerts: Vec<RawAlert> = serde_json::from_str(json)?;
        Ok(alerts)
    }

    /// Parse NDJSON (newline-delimited JSON) containing RawAlerts
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawAlert>, ComputeError> {
        let mut alerts = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawAlert>(trimmed) {
                Ok(alert) => alerts.push(alert),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(alerts)
    }

    /// Validate alerts and convert them to unmarked records, in input order
    pub fn to_records(alerts: &[RawAlert]) -> Result<Vec<EventRecord>, ComputeError> {
        let mut records = Vec::with_capacity(alerts.len());

        for (index, alert) in alerts.iter().enumerate() {
            if let Err(e) = alert.validate() {
                return Err(ComputeError::InvalidAlert(format!(
                    "alert {} (index {}): {}",
                    alert.id, index, e
                )));
            }

            if alert.has_inverted_interval() {
                warn!(
                    "alert {} ends before it starts ({} < {}); clustering it as-is",
                    alert.id, alert.end_time, alert.initial_time
                );
            }

            records.push(alert.to_record());
        }

        Ok(records)
    }

    /// Validate a batch of alerts, returning only the failures
    pub fn validate_alerts(alerts: &[RawAlert]) -> Vec<ValidationResult> {
        alerts
            .iter()
            .enumerate()
            .map(|(idx, alert)| ValidationResult {
                index: idx,
                alert_id: alert.id.clone(),
                result: alert.validate().err(),
            })
            .filter(|r| r.result.is_some())
            .collect()
    }

    /// Indices of alerts whose interval ends before it starts
    pub fn inverted_intervals(alerts: &[RawAlert]) -> Vec<usize> {
        alerts
            .iter()
            .enumerate()
            .filter(|(_, alert)| alert.has_inverted_interval())
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Result of alert validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub alert_id: String,
    pub result: Option<ValidationError>,
}
