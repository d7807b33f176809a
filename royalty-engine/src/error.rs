//! Error types for royalty-engine
//!
//! Only fatal preconditions live here. Per-row and per-batch failures are
//! not errors in this sense: they are collected into the run report.

use thiserror::Error;

/// Fatal summary run error
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Options no run could succeed with (blank artist, bad quarter)
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Header line present but nothing below it
    #[error("CSV contains no data rows")]
    NoDataRows,

    /// No header matches any known song title spelling
    #[error("Could not map a song title column from headers: {}", headers.join(", "))]
    SongTitleUnmapped { headers: Vec<String> },

    /// Caller cancelled between stages
    #[error("Run cancelled before {stage}")]
    Cancelled { stage: &'static str },

    /// royalty-common error
    #[error(transparent)]
    Common(#[from] royalty_common::Error),
}

/// Result type for fatal summary errors
pub type SummaryResult<T> = Result<T, SummaryError>;
