//! Per-track quarterly summary record

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One aggregated summary per (artist, track, year, quarter)
///
/// Computed fresh on every run. Writing a record whose natural key already
/// exists replaces every computed field; nothing accumulates across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub artist_id: String,
    pub track_id: String,
    pub track_title: String,
    pub year: i32,
    pub quarter: u8,

    pub total_streams: u64,
    /// Sum of gross amounts
    pub total_revenue: Decimal,
    pub total_net: Decimal,
    pub total_gross: Decimal,
    /// total_net / total_streams
    pub avg_per_stream: Decimal,
    /// total_revenue / total_streams
    pub revenue_per_play: Decimal,

    pub top_territory: Option<String>,
    pub top_platform: Option<String>,
    /// Best single month of net revenue
    pub highest_revenue: Decimal,

    /// Share of net revenue per platform (fractions of 1)
    pub platform_distribution: IndexMap<String, Decimal>,
    /// Share of net revenue per territory (fractions of 1)
    pub territory_distribution: IndexMap<String, Decimal>,
    /// Net revenue per month label, currency precision
    pub monthly_breakdown: IndexMap<String, Decimal>,

    pub record_count: u64,
}

impl SummaryRecord {
    /// Natural key (artist, track, year, quarter)
    pub fn natural_key(&self) -> (&str, &str, i32, u8) {
        (&self.artist_id, &self.track_id, self.year, self.quarter)
    }
}
