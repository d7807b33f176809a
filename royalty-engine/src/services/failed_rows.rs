//! Failed row collection and export
//!
//! Rows excluded from aggregation are kept verbatim with the reason, so the
//! caller can fix the statement and re-upload.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexSet;
use royalty_common::{Error, Result};
use std::fmt;

use super::csv_ingestor::RawRow;
use crate::models::FailedRowRecord;

/// Why a row was excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFailure {
    MissingSongTitle,
    TrackNotFound { title: String },
    AmountOverflow { title: String },
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFailure::MissingSongTitle => f.write_str("Missing song title"),
            RowFailure::TrackNotFound { title } => {
                write!(f, "Track not found for song title \"{}\"", title)
            }
            RowFailure::AmountOverflow { title } => {
                write!(f, "Amounts for song title \"{}\" overflow the track totals", title)
            }
        }
    }
}

/// Accumulates failed rows in input order
#[derive(Debug, Default)]
pub struct FailedRowCollector {
    rows: Vec<FailedRowRecord>,
}

impl FailedRowCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for the data row at 0-based `position`
    pub fn record(&mut self, position: usize, row: &RawRow, failure: RowFailure) {
        self.record_at(position, row, failure, Utc::now());
    }

    pub fn record_at(&mut self, position: usize, row: &RawRow, failure: RowFailure, at: DateTime<Utc>) {
        self.rows.push(FailedRowRecord {
            row_index: position + 1,
            original_row: row.clone(),
            error_message: failure.to_string(),
            timestamp: at,
        });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_records(self) -> Vec<FailedRowRecord> {
        self.rows
    }
}

/// Render failed rows as CSV
///
/// Columns: `Row Index`, `Error Message`, `Timestamp`, then every original
/// column seen across the rows in first-seen order. Identical input always
/// yields identical bytes.
pub fn export_failed_rows_csv(rows: &[FailedRowRecord]) -> Result<String> {
    let columns: IndexSet<&str> = rows
        .iter()
        .flat_map(|r| r.original_row.keys().map(String::as_str))
        .collect();

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    let mut header = vec!["Row Index", "Error Message", "Timestamp"];
    header.extend(columns.iter().copied());
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.row_index.to_string(),
            row.error_message.clone(),
            row.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        ];
        record.extend(
            columns
                .iter()
                .map(|c| row.original_row.get(*c).cloned().unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Failed to flush CSV writer: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("Export is not UTF-8: {}", e)))
}
