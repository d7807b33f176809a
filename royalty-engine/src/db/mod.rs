//! Persistence for the summary engine
//!
//! [`RoyaltyStore`] is the only way the engine talks to its backend. Every
//! method is one blocking round-trip; the engine awaits each to completion
//! before moving on to the next stage.

pub mod artists;
pub mod runs;
pub mod summaries;
pub mod tracks;

use async_trait::async_trait;
use royalty_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;

use crate::models::{RunRecord, SummaryRecord};

pub use summaries::StoredSummary;

/// Track to be created for titles seen in a statement but unknown to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub title: String,
    pub iswc: Option<String>,
    pub composer: Option<String>,
}

impl NewTrack {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            iswc: None,
            composer: None,
        }
    }
}

/// Outcome of one committed summary batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Natural keys that did not exist before the batch
    pub created: usize,
    /// Natural keys whose previous values were replaced
    pub updated: usize,
}

/// Backend operations used by the summary engine
#[async_trait]
pub trait RoyaltyStore: Send + Sync {
    /// Display name for the artist, if the artist is known
    async fn artist_display_name(&self, artist_id: &str) -> Result<Option<String>>;

    /// Existing track ids for the given titles, keyed by title
    async fn find_tracks(&self, artist_id: &str, titles: &[String]) -> Result<HashMap<String, String>>;

    /// Create tracks in one batch, returning ids keyed by title
    ///
    /// Titles that already exist are returned with their existing id.
    async fn create_tracks(
        &self,
        artist_id: &str,
        artist_name: &str,
        tracks: &[NewTrack],
    ) -> Result<HashMap<String, String>>;

    /// Upsert one batch of summaries keyed by (artist, track, year, quarter)
    ///
    /// The batch is atomic: either every record is written or none is.
    async fn upsert_summaries(&self, records: &[SummaryRecord]) -> Result<BatchOutcome>;

    /// Append a run to the run history
    async fn record_run(&self, run: &RunRecord) -> Result<()>;

    /// Stored summaries for one artist and reporting quarter
    async fn load_summaries(&self, artist_id: &str, year: i32, quarter: u8) -> Result<Vec<StoredSummary>>;
}

/// [`RoyaltyStore`] backed by the shared SQLite database
#[derive(Clone)]
pub struct SqliteRoyaltyStore {
    pool: SqlitePool,
}

impl SqliteRoyaltyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file and wrap it
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = royalty_common::db::init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RoyaltyStore for SqliteRoyaltyStore {
    async fn artist_display_name(&self, artist_id: &str) -> Result<Option<String>> {
        artists::load_display_name(&self.pool, artist_id).await
    }

    async fn find_tracks(&self, artist_id: &str, titles: &[String]) -> Result<HashMap<String, String>> {
        tracks::find_tracks_by_title(&self.pool, artist_id, titles).await
    }

    async fn create_tracks(
        &self,
        artist_id: &str,
        artist_name: &str,
        new_tracks: &[NewTrack],
    ) -> Result<HashMap<String, String>> {
        tracks::create_tracks(&self.pool, artist_id, artist_name, new_tracks).await
    }

    async fn upsert_summaries(&self, records: &[SummaryRecord]) -> Result<BatchOutcome> {
        summaries::upsert_summary_batch(&self.pool, records).await
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        runs::record_run(&self.pool, run).await
    }

    async fn load_summaries(&self, artist_id: &str, year: i32, quarter: u8) -> Result<Vec<StoredSummary>> {
        summaries::load_summaries(&self.pool, artist_id, year, quarter).await
    }
}
