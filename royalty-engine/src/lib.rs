//! royalty-engine library interface
//!
//! Aggregates quarterly royalty statements into per-track summaries.
//! Exposes the pipeline stages for integration testing and embedding.

pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::db::{RoyaltyStore, SqliteRoyaltyStore};
pub use crate::error::{SummaryError, SummaryResult};
pub use crate::models::{FailedRowRecord, ProcessSummaryOptions, SummaryComputationResult, SummaryRecord};
pub use crate::services::{export_failed_rows_csv, SummaryEngine};
