//! geo.alert.v1 schema definition
//!
//! A single geotagged alert as emitted by an upstream source: where it was
//! raised, and the interval during which it was active.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EventRecord;

/// Current schema version
pub const SCHEMA_VERSION: &str = "geo.alert.v1";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// The main geo.alert.v1 schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAlert {
    /// Schema version identifier (defaults to the current version)
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Unique alert identifier
    #[serde(alias = "uuid")]
    pub id: String,
    /// Latitude (degrees, -90..=90)
    pub latitude: f64,
    /// Longitude (degrees, -180..=180)
    pub longitude: f64,
    /// Alert start time (UTC)
    pub initial_time: DateTime<Utc>,
    /// Alert end time (UTC)
    pub end_time: DateTime<Utc>,
    /// Name of the system that raised the alert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Arbitrary tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl RawAlert {
    /// Create a new alert
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        initial_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        RawAlert {
            schema_version: SCHEMA_VERSION.to_string(),
            id: id.into(),
            latitude,
            longitude,
            initial_time,
            end_time,
            source: None,
            tags: Vec::new(),
        }
    }

    /// Record the originating system
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Validate the alert schema.
    ///
    /// Interval ordering is intentionally not checked; see
    /// [`RawAlert::has_inverted_interval`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::LatitudeOutOfRange(self.latitude));
        }

        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::LongitudeOutOfRange(self.longitude));
        }

        Ok(())
    }

    /// True when the alert ends before it starts
    pub fn has_inverted_interval(&self) -> bool {
        self.end_time < self.initial_time
    }

    /// Convert into an unmarked clustering record
    pub fn to_record(&self) -> EventRecord {
        EventRecord::new(
            self.id.clone(),
            self.latitude,
            self.longitude,
            self.initial_time,
            self.end_time,
        )
    }
}

/// Validation errors for raw alerts
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Alert id is empty")]
    EmptyId,

    #[error("Latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
}
