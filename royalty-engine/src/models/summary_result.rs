//! Run report returned to the caller

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A statement row excluded from aggregation
///
/// Captured for the post-run export; never retried automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRowRecord {
    /// 1-based position among the data rows (the header is not counted)
    pub row_index: usize,
    /// The row exactly as ingested, keyed by source header
    pub original_row: IndexMap<String, String>,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one summary run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryComputationResult {
    /// True only when at least one summary was written and no batch failed
    pub success: bool,
    pub summaries_created: usize,
    pub summaries_updated: usize,
    /// Data rows read from the statement
    pub total_rows: usize,
    pub errors: Vec<String>,
    #[serde(rename = "duration_ms")]
    pub duration_ms: u64,
    pub failed_rows: Vec<FailedRowRecord>,
}

impl SummaryComputationResult {
    /// Mark the run stopped by a fatal error; nothing counts as written
    pub fn abort(&mut self, message: impl Into<String>) {
        self.success = false;
        self.summaries_created = 0;
        self.summaries_updated = 0;
        self.errors.push(message.into());
    }

    /// Summaries written (created or replaced)
    pub fn records_written(&self) -> usize {
        self.summaries_created + self.summaries_updated
    }
}
