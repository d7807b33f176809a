//! Summary upsert writer
//!
//! Converts aggregations into [`SummaryRecord`]s and persists them in
//! fixed-size batches. Batches run one after another; a failed batch is
//! reported and skipped while earlier batches stay committed.

use royalty_common::config::DEFAULT_BATCH_SIZE;
use tracing::{debug, error, info};

use super::aggregation::TrackAggregation;
use super::distribution::compute_metrics;
use crate::db::RoyaltyStore;
use crate::models::SummaryRecord;

/// What the writer managed to persist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub summaries_created: usize,
    pub summaries_updated: usize,
    pub failed_batches: usize,
    /// One message per failed batch
    pub errors: Vec<String>,
}

impl WriteReport {
    pub fn records_written(&self) -> usize {
        self.summaries_created + self.summaries_updated
    }
}

/// Batched summary writer
#[derive(Debug, Clone, Copy)]
pub struct SummaryWriter {
    batch_size: usize,
}

impl Default for SummaryWriter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl SummaryWriter {
    /// A `batch_size` of zero is treated as one
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Build one record per aggregated track
    pub fn build_records(
        tracks: &[TrackAggregation],
        artist_id: &str,
        year: i32,
        quarter: u8,
    ) -> Vec<SummaryRecord> {
        tracks
            .iter()
            .map(|agg| {
                let metrics = compute_metrics(agg);
                SummaryRecord {
                    artist_id: artist_id.to_string(),
                    track_id: agg.track_id.clone(),
                    track_title: agg.track_title.clone(),
                    year,
                    quarter,
                    total_streams: agg.total_streams,
                    total_revenue: agg.total_revenue,
                    total_net: agg.total_net,
                    total_gross: agg.total_gross,
                    avg_per_stream: metrics.avg_per_stream,
                    revenue_per_play: metrics.revenue_per_play,
                    top_territory: metrics.top_territory,
                    top_platform: metrics.top_platform,
                    highest_revenue: metrics.highest_revenue,
                    platform_distribution: metrics.platform_distribution,
                    territory_distribution: metrics.territory_distribution,
                    monthly_breakdown: metrics.monthly_breakdown,
                    record_count: agg.record_count,
                }
            })
            .collect()
    }

    /// Upsert every record, batch by batch
    pub async fn write(&self, store: &dyn RoyaltyStore, records: &[SummaryRecord]) -> WriteReport {
        let mut report = WriteReport::default();
        let batch_count = records.len().div_ceil(self.batch_size);

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            let batch_number = index + 1;
            match store.upsert_summaries(batch).await {
                Ok(outcome) => {
                    report.summaries_created += outcome.created;
                    report.summaries_updated += outcome.updated;
                    debug!(
                        "Batch {}/{}: {} created, {} updated",
                        batch_number, batch_count, outcome.created, outcome.updated
                    );
                }
                Err(e) => {
                    error!("Batch {}/{} failed: {}", batch_number, batch_count, e);
                    report.failed_batches += 1;
                    report.errors.push(format!(
                        "Batch {} ({} summaries) failed: {}",
                        batch_number,
                        batch.len(),
                        e
                    ));
                }
            }
        }

        info!(
            "Wrote {} summaries in {} batches ({} failed)",
            report.records_written(),
            batch_count,
            report.failed_batches
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aggregation::BreakdownEntry;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_build_record_from_aggregation() {
        let mut agg = TrackAggregation::new("t-1", "Blue Hour");
        agg.total_streams = 30;
        agg.total_net = dec("150.00");
        agg.total_gross = dec("180.00");
        agg.total_revenue = dec("180.00");
        agg.record_count = 2;
        agg.territories.insert(
            "US".into(),
            BreakdownEntry { streams: 10, revenue: dec("100.00") },
        );
        agg.territories.insert(
            "UK".into(),
            BreakdownEntry { streams: 20, revenue: dec("50.00") },
        );

        let records = SummaryWriter::build_records(&[agg], "artist-1", 2024, 1);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.natural_key(), ("artist-1", "t-1", 2024, 1));
        assert_eq!(record.track_title, "Blue Hour");
        assert_eq!(record.top_territory.as_deref(), Some("US"));
        assert_eq!(record.territory_distribution["US"], dec("0.666667"));
        assert_eq!(record.avg_per_stream, dec("5"));
        assert_eq!(record.revenue_per_play, dec("6"));
        assert_eq!(record.record_count, 2);
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        assert_eq!(SummaryWriter::new(0).batch_size(), 1);
        assert_eq!(SummaryWriter::default().batch_size(), DEFAULT_BATCH_SIZE);
    }
}
