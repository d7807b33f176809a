//! Summary run orchestrator
//!
//! Stage progression:
//! INGEST → MAP COLUMNS → RESOLVE TRACKS → AGGREGATE → DISTRIBUTE → UPSERT
//!
//! Each stage is awaited to completion before the next begins. Cancellation
//! is honored only between stages; a batch write that has started always
//! finishes.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::aggregation::aggregate_rows;
use super::column_mapper::{infer_mapping, CanonicalField};
use super::csv_ingestor::ingest;
use super::failed_rows::FailedRowCollector;
use super::summary_writer::SummaryWriter;
use super::track_resolver::resolve_tracks;
use crate::db::RoyaltyStore;
use crate::error::{SummaryError, SummaryResult};
use crate::models::{ProcessSummaryOptions, RunRecord, SummaryComputationResult};

/// Runs royalty summaries against a store
pub struct SummaryEngine {
    store: Arc<dyn RoyaltyStore>,
    writer: SummaryWriter,
}

impl SummaryEngine {
    pub fn new(store: Arc<dyn RoyaltyStore>) -> Self {
        Self {
            store,
            writer: SummaryWriter::default(),
        }
    }

    /// Override the number of summaries written per batch
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.writer = SummaryWriter::new(batch_size);
        self
    }

    pub fn store(&self) -> &Arc<dyn RoyaltyStore> {
        &self.store
    }

    /// Process one statement to completion
    pub async fn process(&self, options: ProcessSummaryOptions) -> SummaryComputationResult {
        self.process_with_cancel(options, CancellationToken::new()).await
    }

    /// Process one statement, stopping between stages if `cancel` fires
    ///
    /// Never fails: fatal preconditions come back as a result with
    /// `success: false` and the reason in `errors`.
    pub async fn process_with_cancel(
        &self,
        options: ProcessSummaryOptions,
        cancel: CancellationToken,
    ) -> SummaryComputationResult {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "royalty_summary",
            run_id = %run_id,
            artist_id = %options.artist_id,
            year = options.year,
            quarter = options.quarter
        );

        async move {
            let started_at = Utc::now();
            let start_time = Instant::now();

            info!(upload_id = ?options.upload_id, "Starting royalty summary run");

            let mut result = SummaryComputationResult::default();
            if let Err(e) = self.run(&options, &cancel, &mut result).await {
                warn!("Summary run stopped: {}", e);
                result.abort(e.to_string());
            }
            result.duration_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);

            let run = RunRecord::from_result(run_id, &options, &result, started_at);
            if let Err(e) = self.store.record_run(&run).await {
                warn!("Failed to record summary run: {}", e);
                result.errors.push(format!("Failed to record run history: {}", e));
            }

            info!(
                success = result.success,
                created = result.summaries_created,
                updated = result.summaries_updated,
                total_rows = result.total_rows,
                failed_rows = result.failed_rows.len(),
                errors = result.errors.len(),
                duration_ms = result.duration_ms,
                "Royalty summary run finished"
            );

            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        options: &ProcessSummaryOptions,
        cancel: &CancellationToken,
        result: &mut SummaryComputationResult,
    ) -> SummaryResult<()> {
        options.validate()?;

        let csv = ingest(&options.csv_content)?;
        result.total_rows = csv.rows.len();
        if csv.rows.is_empty() {
            return Err(SummaryError::NoDataRows);
        }

        let mapping = infer_mapping(&csv.headers);
        if !mapping.is_mapped(CanonicalField::SongTitle) {
            return Err(SummaryError::SongTitleUnmapped {
                headers: csv.headers.clone(),
            });
        }

        check_cancelled(cancel, "track resolution")?;
        let resolution =
            resolve_tracks(self.store.as_ref(), &options.artist_id, &csv.rows, &mapping).await;
        result.errors.extend(resolution.errors.iter().cloned());

        check_cancelled(cancel, "aggregation")?;
        let mut failed = FailedRowCollector::new();
        let engine = aggregate_rows(&csv.rows, &mapping, &resolution, &mut failed);
        result.failed_rows = failed.into_records();
        info!(
            "Aggregated {} tracks, {} rows rejected",
            engine.len(),
            result.failed_rows.len()
        );

        let records = SummaryWriter::build_records(
            &engine.into_tracks(),
            &options.artist_id,
            options.year,
            options.quarter,
        );
        if records.is_empty() {
            result
                .errors
                .push("No summaries computed: every row was rejected".to_string());
            return Ok(());
        }

        check_cancelled(cancel, "summary upsert")?;
        let report = self.writer.write(self.store.as_ref(), &records).await;
        result.summaries_created = report.summaries_created;
        result.summaries_updated = report.summaries_updated;
        result.errors.extend(report.errors);
        result.success = report.failed_batches == 0 && result.records_written() > 0;

        Ok(())
    }
}

fn check_cancelled(cancel: &CancellationToken, stage: &'static str) -> SummaryResult<()> {
    if cancel.is_cancelled() {
        return Err(SummaryError::Cancelled { stage });
    }
    Ok(())
}
