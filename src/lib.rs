//! Incident Cluster - spatiotemporal clustering of geotagged alerts
//!
//! Independent sources often raise several alerts for the same real-world
//! event. This crate groups alerts that are close in both space and time and
//! collapses each group into a single incident: member ids, time span and an
//! estimated center.
//!
//! Pipeline: alert JSON → schema adapter → neighbor queries → cluster
//! expansion → aggregation → report encoding.
//!
//! ## Modules
//!
//! - **Core**: `neighbors`, `expander`, `aggregator` operate on one in-memory
//!   arena of [`EventRecord`]s and perform no I/O
//! - **Edges**: `schema`, `config`, `encoder`, `pipeline` and `ffi` handle JSON
//!   input, parameters and report output

pub mod aggregator;
pub mod config;
pub mod encoder;
pub mod error;
pub mod expander;
pub mod geo;
pub mod neighbors;
pub mod pipeline;
pub mod schema;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregator::ClusterAggregator;
pub use config::ClusterConfig;
pub use error::ComputeError;
pub use expander::{ClusterExpander, ExpansionStats};
pub use neighbors::{find_neighbors, TemporalWindow};
pub use pipeline::{alerts_to_clusters, cluster_records, label_records, ClusterProcessor};
pub use types::{ClusterLabel, ClusterReport, ClusterSummary, Coordinates, EventRecord};

// Schema exports
pub use schema::{RawAlert, RawAlertAdapter, SCHEMA_VERSION};

/// Crate version embedded in all reports
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "incident-cluster";
