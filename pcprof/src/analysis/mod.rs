//! Analysis logic for profiling data
//!
//! This module contains the aggregation of parsed samples into ranked
//! symbol weights, separated from report presentation.

pub mod profile;
pub mod report;

pub use profile::{percent, Profile};
pub use report::{Report, ReportRow};
