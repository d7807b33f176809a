//! Per-track aggregation
//!
//! Second pass over the statement. Rows are folded strictly in input order
//! into one [`TrackAggregation`] per resolved track. All amounts are exact
//! decimals, so totals do not depend on row order.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use royalty_common::money::{parse_amount, parse_count};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::column_mapper::{CanonicalField, ColumnMapping};
use super::csv_ingestor::RawRow;
use super::failed_rows::{FailedRowCollector, RowFailure};
use super::track_resolver::TrackResolution;

/// Label for missing territory, platform or month
pub const UNKNOWN: &str = "Unknown";

/// Month labels in calendar order
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// Usage and net revenue accumulated under one breakdown key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakdownEntry {
    pub streams: u64,
    pub revenue: Decimal,
}

impl BreakdownEntry {
    fn record(&mut self, streams: u64, revenue: Decimal) {
        self.streams = self.streams.saturating_add(streams);
        self.revenue = revenue;
    }
}

fn breakdown_revenue(map: Option<&IndexMap<String, BreakdownEntry>>, key: &str) -> Decimal {
    map.and_then(|m| m.get(key))
        .map_or(Decimal::ZERO, |entry| entry.revenue)
}

/// Every running sum a line would produce, computed before any state changes
struct LineSums {
    revenue: Decimal,
    gross: Decimal,
    net: Decimal,
    platform: Decimal,
    territory: Decimal,
    month: Decimal,
}

impl LineSums {
    /// `None` when any sum leaves the decimal range
    fn after(agg: Option<&TrackAggregation>, line: &UsageLine<'_>) -> Option<Self> {
        let (revenue, gross, net) = agg.map_or((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO), |a| {
            (a.total_revenue, a.total_gross, a.total_net)
        });

        Some(Self {
            revenue: revenue.checked_add(line.gross)?,
            gross: gross.checked_add(line.gross)?,
            net: net.checked_add(line.net)?,
            platform: breakdown_revenue(agg.map(|a| &a.platforms), line.platform)
                .checked_add(line.net)?,
            territory: breakdown_revenue(agg.map(|a| &a.territories), line.territory)
                .checked_add(line.net)?,
            month: breakdown_revenue(agg.map(|a| &a.months), line.month).checked_add(line.net)?,
        })
    }
}

/// Running totals for one track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAggregation {
    pub track_id: String,
    pub track_title: String,
    pub total_streams: u64,
    pub total_revenue: Decimal,
    pub total_gross: Decimal,
    pub total_net: Decimal,
    pub record_count: u64,
    pub platforms: IndexMap<String, BreakdownEntry>,
    pub territories: IndexMap<String, BreakdownEntry>,
    pub months: IndexMap<String, BreakdownEntry>,
}

impl TrackAggregation {
    pub fn new(track_id: impl Into<String>, track_title: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            track_title: track_title.into(),
            total_streams: 0,
            total_revenue: Decimal::ZERO,
            total_gross: Decimal::ZERO,
            total_net: Decimal::ZERO,
            record_count: 0,
            platforms: IndexMap::new(),
            territories: IndexMap::new(),
            months: IndexMap::new(),
        }
    }
}

/// Values pulled out of one row, already parsed
#[derive(Debug, Clone, PartialEq)]
pub struct UsageLine<'a> {
    pub title: &'a str,
    pub territory: &'a str,
    pub platform: &'a str,
    pub month: &'static str,
    pub streams: u64,
    pub gross: Decimal,
    pub net: Decimal,
}

impl<'a> UsageLine<'a> {
    /// Parse a row; `None` when it carries no song title
    pub fn from_row(row: &'a RawRow, mapping: &ColumnMapping) -> Option<Self> {
        let title = mapping.non_empty(row, CanonicalField::SongTitle)?;
        Some(Self {
            title,
            territory: mapping.non_empty(row, CanonicalField::Territory).unwrap_or(UNKNOWN),
            platform: mapping.non_empty(row, CanonicalField::Source).unwrap_or(UNKNOWN),
            month: month_label(mapping.value(row, CanonicalField::Date)),
            streams: parse_count(mapping.value(row, CanonicalField::UsageCount)),
            gross: parse_amount(mapping.value(row, CanonicalField::Gross)),
            net: parse_amount(mapping.value(row, CanonicalField::Net)),
        })
    }
}

/// Owns every track's running state for one run
#[derive(Debug, Default)]
pub struct AggregationEngine {
    tracks: IndexMap<String, TrackAggregation>,
}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed line into the track's totals
    ///
    /// A line whose amounts would overflow a running total is rejected and
    /// leaves the track untouched.
    pub fn fold(&mut self, track_id: &str, line: &UsageLine<'_>) -> Result<(), RowFailure> {
        let Some(sums) = LineSums::after(self.tracks.get(track_id), line) else {
            warn!(
                "Amounts for {:?} overflow the running totals of track {}",
                line.title, track_id
            );
            return Err(RowFailure::AmountOverflow {
                title: line.title.to_string(),
            });
        };

        let agg = self
            .tracks
            .entry(track_id.to_string())
            .or_insert_with(|| TrackAggregation::new(track_id, line.title));

        agg.total_streams = agg.total_streams.saturating_add(line.streams);
        agg.total_revenue = sums.revenue;
        agg.total_gross = sums.gross;
        agg.total_net = sums.net;
        agg.record_count += 1;

        // Breakdowns carry net: it is the distributable figure
        agg.platforms
            .entry(line.platform.to_string())
            .or_default()
            .record(line.streams, sums.platform);
        agg.territories
            .entry(line.territory.to_string())
            .or_default()
            .record(line.streams, sums.territory);
        agg.months
            .entry(line.month.to_string())
            .or_default()
            .record(line.streams, sums.month);

        Ok(())
    }

    /// Fold a raw row, reporting why it was rejected
    pub fn fold_row(
        &mut self,
        row: &RawRow,
        mapping: &ColumnMapping,
        resolution: &TrackResolution,
    ) -> Result<(), RowFailure> {
        let line = UsageLine::from_row(row, mapping).ok_or(RowFailure::MissingSongTitle)?;
        let track_id = resolution
            .track_id(line.title)
            .ok_or_else(|| RowFailure::TrackNotFound {
                title: line.title.to_string(),
            })?;
        self.fold(track_id, &line)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, track_id: &str) -> Option<&TrackAggregation> {
        self.tracks.get(track_id)
    }

    /// Hand the finished aggregations over, in first-seen track order
    pub fn into_tracks(self) -> Vec<TrackAggregation> {
        self.tracks.into_values().collect()
    }
}

/// Aggregate every row, recording rejected rows in `failed`
pub fn aggregate_rows(
    rows: &[RawRow],
    mapping: &ColumnMapping,
    resolution: &TrackResolution,
    failed: &mut FailedRowCollector,
) -> AggregationEngine {
    let mut engine = AggregationEngine::new();

    for (position, row) in rows.iter().enumerate() {
        if let Err(failure) = engine.fold_row(row, mapping, resolution) {
            failed.record(position, row, failure);
        }
    }

    debug!(
        "Aggregated {} rows into {} tracks ({} rejected)",
        rows.len(),
        engine.len(),
        failed.len()
    );

    engine
}

/// Month label for a statement date, or `"Unknown"`
pub fn month_label(raw: &str) -> &'static str {
    parse_date(raw.trim())
        .and_then(|date| MONTH_LABELS.get(date.month0() as usize).copied())
        .unwrap_or(UNKNOWN)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.date());
    }

    // Month-only periods ("2024-03") and compact dates ("20240315")
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return Some(date);
    }
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(raw, "%Y%m%d").ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::column_mapper::infer_mapping;
    use crate::services::csv_ingestor::ingest;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn resolution(titles: &[(&str, &str)]) -> TrackResolution {
        TrackResolution {
            lookup: titles
                .iter()
                .map(|(title, id)| (title.to_string(), id.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_month_label_formats() {
        assert_eq!(month_label("2024-01-15"), "Jan");
        assert_eq!(month_label("2024/02/29"), "Feb");
        assert_eq!(month_label("03/31/2024"), "Mar");
        assert_eq!(month_label("30/04/2024"), "Apr");
        assert_eq!(month_label("15.05.2024"), "May");
        assert_eq!(month_label("2024-06"), "Jun");
        assert_eq!(month_label("20240715"), "Jul");
        assert_eq!(month_label("2024-08-01T12:00:00Z"), "Aug");
        assert_eq!(month_label("2024-09-01 08:15:00"), "Sep");
    }

    #[test]
    fn test_month_label_unknown() {
        assert_eq!(month_label(""), UNKNOWN);
        assert_eq!(month_label("   "), UNKNOWN);
        assert_eq!(month_label("Q1 2024"), UNKNOWN);
        assert_eq!(month_label("2024-13-01"), UNKNOWN);
    }

    #[test]
    fn test_totals_and_breakdowns() {
        let csv = ingest(
            "Song Title,Date,Territory,Source,Usage Count,Gross,Net\n\
             A,2024-01-10,US,Spotify,100,12.00,10.10\n\
             A,2024-02-10,UK,Spotify,50,24.00,20.20\n\
             A,,US,Apple,abc,1.00,0.003\n",
        )
        .unwrap();
        let mapping = infer_mapping(&csv.headers);
        let mut failed = FailedRowCollector::new();

        let engine = aggregate_rows(&csv.rows, &mapping, &resolution(&[("A", "t-a")]), &mut failed);

        assert!(failed.is_empty());
        let agg = engine.get("t-a").unwrap();
        assert_eq!(agg.track_title, "A");
        assert_eq!(agg.total_streams, 150);
        assert_eq!(agg.total_net, dec("30.303"));
        assert_eq!(agg.total_gross, dec("37.00"));
        assert_eq!(agg.total_revenue, agg.total_gross);
        assert_eq!(agg.record_count, 3);

        assert_eq!(agg.platforms["Spotify"], BreakdownEntry { streams: 150, revenue: dec("30.30") });
        assert_eq!(agg.platforms["Apple"].revenue, dec("0.003"));
        assert_eq!(agg.territories["US"].revenue, dec("10.103"));
        assert_eq!(agg.months.keys().collect::<Vec<_>>(), vec!["Jan", "Feb", UNKNOWN]);
    }

    #[test]
    fn test_unmapped_dimensions_default_to_unknown() {
        let csv = ingest("Song Title,Net\nA,5\n").unwrap();
        let mapping = infer_mapping(&csv.headers);
        let mut failed = FailedRowCollector::new();

        let engine = aggregate_rows(&csv.rows, &mapping, &resolution(&[("A", "t-a")]), &mut failed);

        let agg = engine.get("t-a").unwrap();
        assert_eq!(agg.platforms.keys().collect::<Vec<_>>(), vec![UNKNOWN]);
        assert_eq!(agg.territories.keys().collect::<Vec<_>>(), vec![UNKNOWN]);
        assert_eq!(agg.months.keys().collect::<Vec<_>>(), vec![UNKNOWN]);
        assert_eq!(agg.total_streams, 0);
    }

    #[test]
    fn test_rejected_rows_are_excluded() {
        let csv = ingest("Song Title,Net\n,9.99\nA,1.00\nGhost,5.00\n").unwrap();
        let mapping = infer_mapping(&csv.headers);
        let mut failed = FailedRowCollector::new();

        let engine = aggregate_rows(&csv.rows, &mapping, &resolution(&[("A", "t-a")]), &mut failed);

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.get("t-a").unwrap().total_net, dec("1.00"));

        let failed = failed.into_records();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].row_index, 1);
        assert!(failed[0].error_message.to_lowercase().contains("song title"));
        assert_eq!(failed[1].row_index, 3);
        assert_eq!(failed[1].error_message, "Track not found for song title \"Ghost\"");
        assert_eq!(failed[1].original_row["Net"], "5.00");
    }

    #[test]
    fn test_overflowing_row_rejected_without_panic() {
        let max = "79228162514264337593543950335";
        let csv = ingest(&format!(
            "Song Title,Territory,Net\nA,US,{max}\nA,UK,{max}\nA,US,1\n"
        ))
        .unwrap();
        let mapping = infer_mapping(&csv.headers);
        let mut failed = FailedRowCollector::new();

        let engine = aggregate_rows(&csv.rows, &mapping, &resolution(&[("A", "t-a")]), &mut failed);

        let agg = engine.get("t-a").unwrap();
        assert_eq!(agg.total_net, Decimal::MAX);
        assert_eq!(agg.record_count, 1);
        assert!(!agg.territories.contains_key("UK"));

        let failed = failed.into_records();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].row_index, 2);
        assert_eq!(failed[1].row_index, 3);
        assert_eq!(
            failed[0].error_message,
            "Amounts for song title \"A\" overflow the track totals"
        );
    }

    #[test]
    fn test_row_order_does_not_change_totals() {
        let forward = "Song Title,Net\nA,0.1\nA,0.2\nA,0.3\nA,1e-3\n";
        let backward = "Song Title,Net\nA,1e-3\nA,0.3\nA,0.2\nA,0.1\n";
        let lookup = resolution(&[("A", "t-a")]);

        let totals: Vec<Decimal> = [forward, backward]
            .iter()
            .map(|content| {
                let csv = ingest(content).unwrap();
                let mapping = infer_mapping(&csv.headers);
                let engine = aggregate_rows(&csv.rows, &mapping, &lookup, &mut FailedRowCollector::new());
                engine.get("t-a").unwrap().total_net
            })
            .collect();

        assert_eq!(totals[0], totals[1]);
        assert_eq!(totals[0], dec("0.601"));
    }
}
