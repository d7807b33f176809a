//! Distribution calculator
//!
//! Turns a finished [`TrackAggregation`] into the derived figures stored on a
//! summary: top territory and platform, revenue shares, the monthly
//! breakdown and per-stream rates.

use indexmap::IndexMap;
use royalty_common::money::{ratio, round_to, CURRENCY_SCALE, RATIO_SCALE};
use rust_decimal::Decimal;

use super::aggregation::{BreakdownEntry, TrackAggregation, MONTH_LABELS, UNKNOWN};

/// Derived figures for one track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetrics {
    pub avg_per_stream: Decimal,
    pub revenue_per_play: Decimal,
    pub top_territory: Option<String>,
    pub top_platform: Option<String>,
    pub highest_revenue: Decimal,
    pub platform_distribution: IndexMap<String, Decimal>,
    pub territory_distribution: IndexMap<String, Decimal>,
    pub monthly_breakdown: IndexMap<String, Decimal>,
}

/// Key with the strictly greatest revenue; earlier keys win ties
///
/// `None` when the map is empty or no entry has positive revenue.
pub fn top_item(breakdown: &IndexMap<String, BreakdownEntry>) -> Option<String> {
    let mut best: Option<(&String, Decimal)> = None;
    for (key, entry) in breakdown {
        if entry.revenue <= Decimal::ZERO {
            continue;
        }
        match best {
            Some((_, revenue)) if entry.revenue <= revenue => {}
            _ => best = Some((key, entry.revenue)),
        }
    }
    best.map(|(key, _)| key.clone())
}

/// Each key's share of `total_net`, rounded to six places
///
/// Empty when `total_net` is zero. Shares are rounded independently, so
/// they sum to 1 only within rounding tolerance.
pub fn distribution(
    breakdown: &IndexMap<String, BreakdownEntry>,
    total_net: Decimal,
) -> IndexMap<String, Decimal> {
    if total_net.is_zero() {
        return IndexMap::new();
    }
    breakdown
        .iter()
        .map(|(key, entry)| (key.clone(), round_to(ratio(entry.revenue, total_net), RATIO_SCALE)))
        .collect()
}

/// Net revenue per month at currency precision, in calendar order
///
/// `"Unknown"` comes last when present.
pub fn monthly_breakdown(months: &IndexMap<String, BreakdownEntry>) -> IndexMap<String, Decimal> {
    MONTH_LABELS
        .iter()
        .chain(std::iter::once(&UNKNOWN))
        .filter_map(|label| {
            months
                .get(*label)
                .map(|entry| (label.to_string(), round_to(entry.revenue, CURRENCY_SCALE)))
        })
        .collect()
}

/// Best single month of net revenue, zero when the track has no months
pub fn highest_monthly_revenue(months: &IndexMap<String, BreakdownEntry>) -> Decimal {
    months
        .values()
        .map(|entry| entry.revenue)
        .max()
        .map(|best| round_to(best, CURRENCY_SCALE))
        .unwrap_or(Decimal::ZERO)
}

/// Compute every derived figure for a track
pub fn compute_metrics(agg: &TrackAggregation) -> TrackMetrics {
    let streams = Decimal::from(agg.total_streams);

    TrackMetrics {
        avg_per_stream: round_to(ratio(agg.total_net, streams), RATIO_SCALE),
        revenue_per_play: round_to(ratio(agg.total_revenue, streams), RATIO_SCALE),
        top_territory: top_item(&agg.territories),
        top_platform: top_item(&agg.platforms),
        highest_revenue: highest_monthly_revenue(&agg.months),
        platform_distribution: distribution(&agg.platforms, agg.total_net),
        territory_distribution: distribution(&agg.territories, agg.total_net),
        monthly_breakdown: monthly_breakdown(&agg.months),
    }
}
