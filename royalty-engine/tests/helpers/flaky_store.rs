//! Store wrapper with injectable backend failures

use async_trait::async_trait;
use royalty_common::{Error, Result};
use royalty_engine::db::{BatchOutcome, NewTrack, StoredSummary};
use royalty_engine::models::{RunRecord, SummaryRecord};
use royalty_engine::{RoyaltyStore, SqliteRoyaltyStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Delegates to a real store, failing the operations a test asks for
pub struct FlakyStore {
    pub inner: SqliteRoyaltyStore,
    /// 1-based upsert calls that fail
    fail_batches: HashSet<usize>,
    fail_track_creation: bool,
    fail_run_history: bool,
    /// Cancelled as soon as track lookup starts
    cancel_on_lookup: Option<CancellationToken>,
    upsert_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: SqliteRoyaltyStore) -> Self {
        Self {
            inner,
            fail_batches: HashSet::new(),
            fail_track_creation: false,
            fail_run_history: false,
            cancel_on_lookup: None,
            upsert_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_batches(mut self, batches: &[usize]) -> Self {
        self.fail_batches = batches.iter().copied().collect();
        self
    }

    pub fn failing_track_creation(mut self) -> Self {
        self.fail_track_creation = true;
        self
    }

    pub fn failing_run_history(mut self) -> Self {
        self.fail_run_history = true;
        self
    }

    pub fn cancelling_during_lookup(mut self, token: CancellationToken) -> Self {
        self.cancel_on_lookup = Some(token);
        self
    }

    /// Upsert calls seen so far, failed ones included
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoyaltyStore for FlakyStore {
    async fn artist_display_name(&self, artist_id: &str) -> Result<Option<String>> {
        self.inner.artist_display_name(artist_id).await
    }

    async fn find_tracks(&self, artist_id: &str, titles: &[String]) -> Result<HashMap<String, String>> {
        if let Some(token) = &self.cancel_on_lookup {
            token.cancel();
        }
        self.inner.find_tracks(artist_id, titles).await
    }

    async fn create_tracks(
        &self,
        artist_id: &str,
        artist_name: &str,
        tracks: &[NewTrack],
    ) -> Result<HashMap<String, String>> {
        if self.fail_track_creation {
            return Err(Error::Internal("track insert rejected".to_string()));
        }
        self.inner.create_tracks(artist_id, artist_name, tracks).await
    }

    async fn upsert_summaries(&self, records: &[SummaryRecord]) -> Result<BatchOutcome> {
        let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_batches.contains(&call) {
            return Err(Error::Internal("payload rejected".to_string()));
        }
        self.inner.upsert_summaries(records).await
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        if self.fail_run_history {
            return Err(Error::Internal("history unavailable".to_string()));
        }
        self.inner.record_run(run).await
    }

    async fn load_summaries(&self, artist_id: &str, year: i32, quarter: u8) -> Result<Vec<StoredSummary>> {
        self.inner.load_summaries(artist_id, year, quarter).await
    }
}
