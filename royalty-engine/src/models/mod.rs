//! Data models for the royalty summary engine
//!
//! - Run input ([`ProcessSummaryOptions`])
//! - Persisted output ([`SummaryRecord`])
//! - Run report ([`SummaryComputationResult`], [`FailedRowRecord`])
//! - Run history ([`RunRecord`])

pub mod options;
pub mod run;
pub mod summary;
pub mod summary_result;

pub use options::ProcessSummaryOptions;
pub use run::RunRecord;
pub use summary::SummaryRecord;
pub use summary_result::{FailedRowRecord, SummaryComputationResult};
