//! Run history entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProcessSummaryOptions, SummaryComputationResult};

/// One row of the `summary_runs` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub artist_id: String,
    pub year: i32,
    pub quarter: u8,
    pub upload_id: Option<String>,
    pub success: bool,
    pub total_rows: usize,
    pub summaries_created: usize,
    pub summaries_updated: usize,
    pub failed_rows: usize,
    pub error_count: usize,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn from_result(
        run_id: Uuid,
        options: &ProcessSummaryOptions,
        result: &SummaryComputationResult,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            artist_id: options.artist_id.clone(),
            year: options.year,
            quarter: options.quarter,
            upload_id: options.upload_id.clone(),
            success: result.success,
            total_rows: result.total_rows,
            summaries_created: result.summaries_created,
            summaries_updated: result.summaries_updated,
            failed_rows: result.failed_rows.len(),
            error_count: result.errors.len(),
            duration_ms: result.duration_ms,
            started_at,
        }
    }
}
