//! Core types for incident clustering
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: event records carrying a mutable cluster label, the summaries the
//! aggregator folds them into, and the report envelope handed to callers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::config::ClusterConfig;

/// Cluster assignment of a single record.
///
/// Ordering places `Noise` first, then cluster ids ascending, then `Unmarked`,
/// which is the order summaries are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum ClusterLabel {
    /// Not yet visited by the expander
    #[default]
    Unmarked,
    /// Neighborhood was too sparse when first visited
    Noise,
    /// Member of the cluster with this id (ids start at 1)
    Cluster(u32),
}

impl ClusterLabel {
    /// Wire value for noise
    pub const NOISE_VALUE: i64 = -1;
    /// Wire value for unmarked records
    pub const UNMARKED_VALUE: i64 = 0;

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }

    pub fn is_unmarked(&self) -> bool {
        matches!(self, ClusterLabel::Unmarked)
    }

    /// Noise and unmarked records can still be absorbed into a cluster
    pub fn is_absorbable(&self) -> bool {
        matches!(self, ClusterLabel::Noise | ClusterLabel::Unmarked)
    }

    /// Cluster id, if this label names a cluster
    pub fn cluster_id(&self) -> Option<u32> {
        match self {
            ClusterLabel::Cluster(id) => Some(*id),
            _ => None,
        }
    }

    fn rank(&self) -> (u8, u32) {
        match self {
            ClusterLabel::Noise => (0, 0),
            ClusterLabel::Cluster(id) => (1, *id),
            ClusterLabel::Unmarked => (2, 0),
        }
    }
}

impl PartialOrd for ClusterLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClusterLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterLabel::Unmarked => write!(f, "unmarked"),
            ClusterLabel::Noise => write!(f, "noise"),
            ClusterLabel::Cluster(id) => write!(f, "{}", id),
        }
    }
}

impl From<ClusterLabel> for i64 {
    fn from(label: ClusterLabel) -> Self {
        match label {
            ClusterLabel::Unmarked => ClusterLabel::UNMARKED_VALUE,
            ClusterLabel::Noise => ClusterLabel::NOISE_VALUE,
            ClusterLabel::Cluster(id) => i64::from(id),
        }
    }
}

impl TryFrom<i64> for ClusterLabel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            ClusterLabel::NOISE_VALUE => Ok(ClusterLabel::Noise),
            ClusterLabel::UNMARKED_VALUE => Ok(ClusterLabel::Unmarked),
            v if v > 0 => u32::try_from(v)
                .map(ClusterLabel::Cluster)
                .map_err(|_| format!("cluster id {} out of range", v)),
            v => Err(format!("invalid cluster label {}", v)),
        }
    }
}

/// A geotagged, time-interval-stamped alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Opaque alert identifier
    #[serde(alias = "uuid")]
    pub id: String,
    /// Latitude (degrees)
    pub latitude: f64,
    /// Longitude (degrees)
    pub longitude: f64,
    /// Start of the alert interval (UTC)
    pub initial_time: DateTime<Utc>,
    /// End of the alert interval (UTC)
    pub end_time: DateTime<Utc>,
    /// Cluster label assigned during expansion
    #[serde(default)]
    pub cluster: ClusterLabel,
}

impl EventRecord {
    /// Create an unmarked record
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        initial_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            initial_time,
            end_time,
            cluster: ClusterLabel::Unmarked,
        }
    }

    /// Create an unmarked record whose interval is a single instant
    pub fn instant(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(id, latitude, longitude, at, at)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// True when the interval ends before it starts
    pub fn has_inverted_interval(&self) -> bool {
        self.end_time < self.initial_time
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One incident: every record sharing a label, folded together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Shared label of the members (may be noise)
    pub cluster: ClusterLabel,
    /// Member record ids, in aggregation order
    pub ids: Vec<String>,
    /// Earliest member start time
    pub initial_time: DateTime<Utc>,
    /// Latest member end time
    pub end_time: DateTime<Utc>,
    /// `end_time - initial_time`; negative only for inverted input intervals
    #[serde(with = "duration_seconds")]
    pub total_time: Duration,
    /// Unweighted mean of member coordinates
    pub estimated_center: Coordinates,
}

impl ClusterSummary {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete clustering report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    /// Parameters the clustering ran with
    pub parameters: ClusterConfig,
    /// Number of input records
    pub record_count: usize,
    /// Number of non-noise clusters
    pub cluster_count: usize,
    /// Number of records labeled noise
    pub noise_count: usize,
    pub clusters: Vec<ClusterSummary>,
}

/// (De)serialize a `chrono::Duration` as fractional seconds
pub mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let seconds = match duration.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => duration.num_milliseconds() as f64 / 1_000.0,
        };
        serializer.serialize_f64(seconds)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        if !seconds.is_finite() {
            return Err(serde::de::Error::custom("duration must be finite"));
        }
        Ok(Duration::microseconds((seconds * 1_000_000.0).round() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_label_ordering() {
        let mut labels = vec![
            ClusterLabel::Cluster(3),
            ClusterLabel::Unmarked,
            ClusterLabel::Cluster(1),
            ClusterLabel::Noise,
        ];
        labels.sort();
        assert_eq!(
            labels,
            vec![
                ClusterLabel::Noise,
                ClusterLabel::Cluster(1),
                ClusterLabel::Cluster(3),
                ClusterLabel::Unmarked,
            ]
        );
    }

    #[test]
    fn test_label_wire_values() {
        assert_eq!(serde_json::to_string(&ClusterLabel::Noise).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&ClusterLabel::Unmarked).unwrap(), "0");
        assert_eq!(serde_json::to_string(&ClusterLabel::Cluster(7)).unwrap(), "7");

        let label: ClusterLabel = serde_json::from_str("2").unwrap();
        assert_eq!(label, ClusterLabel::Cluster(2));
        assert!(serde_json::from_str::<ClusterLabel>("-5").is_err());
    }

    #[test]
    fn test_record_accepts_uuid_key_and_defaults_label() {
        let json = r#"{
            "uuid": "alert-1",
            "latitude": -23.55,
            "longitude": -46.63,
            "initial_time": "2024-03-01T10:00:00Z",
            "end_time": "2024-03-01T10:05:00Z"
        }"#;

        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "alert-1");
        assert!(record.cluster.is_unmarked());
        assert!(!record.has_inverted_interval());
    }

    #[test]
    fn test_total_time_serialized_as_seconds() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let summary = ClusterSummary {
            cluster: ClusterLabel::Cluster(1),
            ids: vec!["a".to_string()],
            initial_time: start,
            end_time: start + Duration::seconds(90),
            total_time: Duration::milliseconds(90_500),
            estimated_center: Coordinates::new(1.0, 2.0),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["total_time"], 90.5);
        assert_eq!(value["cluster"], 1);

        let back: ClusterSummary = serde_json::from_value(value).unwrap();
        assert_eq!(back.total_time, Duration::milliseconds(90_500));
    }
}
