//! geo.alert.v1 input schema
//!
//! This module defines the input schema for alerts and the adapter that turns
//! a batch of them into clustering records.

mod raw_alert;
mod adapter;

pub use raw_alert::*;
pub use adapter::*;
