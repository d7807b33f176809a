//! Royalty summary database operations
//!
//! Natural key: (artist_id, track_id, year, quarter). A write for an
//! existing key replaces all computed columns.

use indexmap::IndexMap;
use royalty_common::money::to_f64;
use royalty_common::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::BatchOutcome;
use crate::models::SummaryRecord;

/// Summary row as read back from the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSummary {
    pub id: String,
    pub artist_id: String,
    pub track_id: String,
    pub track_title: Option<String>,
    pub year: i64,
    pub quarter: i64,
    pub total_streams: i64,
    pub total_revenue: String,
    pub total_net: String,
    pub total_gross: String,
    pub avg_per_stream: String,
    pub revenue_per_play: String,
    pub top_territory: Option<String>,
    pub top_platform: Option<String>,
    pub highest_revenue: String,
    pub platform_distribution: IndexMap<String, f64>,
    pub territory_distribution: IndexMap<String, f64>,
    pub monthly_breakdown: IndexMap<String, f64>,
    pub record_count: i64,
    pub updated_at: String,
}

/// Encode a decimal map as a JSON object of numbers, keeping key order
fn decimal_map_json(map: &IndexMap<String, Decimal>) -> Result<String> {
    let numbers: IndexMap<&str, f64> = map.iter().map(|(k, v)| (k.as_str(), to_f64(*v))).collect();
    Ok(serde_json::to_string(&numbers)?)
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Upsert one batch of summaries in a single transaction
pub async fn upsert_summary_batch(pool: &SqlitePool, records: &[SummaryRecord]) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    if records.is_empty() {
        return Ok(outcome);
    }

    let mut tx = pool.begin().await?;

    for record in records {
        let existing: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM royalty_summaries
            WHERE artist_id = ? AND track_id = ? AND year = ? AND quarter = ?
            "#,
        )
        .bind(&record.artist_id)
        .bind(&record.track_id)
        .bind(record.year)
        .bind(i64::from(record.quarter))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO royalty_summaries (
                id, artist_id, track_id, year, quarter,
                total_streams, total_revenue, total_net, total_gross,
                avg_per_stream, revenue_per_play, top_territory, top_platform,
                highest_revenue, platform_distribution, territory_distribution,
                monthly_breakdown, record_count, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            ON CONFLICT(artist_id, track_id, year, quarter) DO UPDATE SET
                total_streams = excluded.total_streams,
                total_revenue = excluded.total_revenue,
                total_net = excluded.total_net,
                total_gross = excluded.total_gross,
                avg_per_stream = excluded.avg_per_stream,
                revenue_per_play = excluded.revenue_per_play,
                top_territory = excluded.top_territory,
                top_platform = excluded.top_platform,
                highest_revenue = excluded.highest_revenue,
                platform_distribution = excluded.platform_distribution,
                territory_distribution = excluded.territory_distribution,
                monthly_breakdown = excluded.monthly_breakdown,
                record_count = excluded.record_count,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.artist_id)
        .bind(&record.track_id)
        .bind(record.year)
        .bind(i64::from(record.quarter))
        .bind(saturating_i64(record.total_streams))
        .bind(record.total_revenue.to_string())
        .bind(record.total_net.to_string())
        .bind(record.total_gross.to_string())
        .bind(record.avg_per_stream.to_string())
        .bind(record.revenue_per_play.to_string())
        .bind(&record.top_territory)
        .bind(&record.top_platform)
        .bind(record.highest_revenue.to_string())
        .bind(decimal_map_json(&record.platform_distribution)?)
        .bind(decimal_map_json(&record.territory_distribution)?)
        .bind(decimal_map_json(&record.monthly_breakdown)?)
        .bind(saturating_i64(record.record_count))
        .execute(&mut *tx)
        .await?;

        if existing > 0 {
            outcome.updated += 1;
        } else {
            outcome.created += 1;
        }
    }

    tx.commit().await?;

    debug!(
        "Summary batch committed: {} created, {} updated",
        outcome.created, outcome.updated
    );

    Ok(outcome)
}

/// Load all summaries for an artist's reporting quarter, ordered by track title
pub async fn load_summaries(
    pool: &SqlitePool,
    artist_id: &str,
    year: i32,
    quarter: u8,
) -> Result<Vec<StoredSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.artist_id, s.track_id, t.title AS track_title, s.year, s.quarter,
               s.total_streams, s.total_revenue, s.total_net, s.total_gross,
               s.avg_per_stream, s.revenue_per_play, s.top_territory, s.top_platform,
               s.highest_revenue, s.platform_distribution, s.territory_distribution,
               s.monthly_breakdown, s.record_count, CAST(s.updated_at AS TEXT) AS updated_at
        FROM royalty_summaries s
        LEFT JOIN tracks t ON t.id = s.track_id
        WHERE s.artist_id = ? AND s.year = ? AND s.quarter = ?
        ORDER BY t.title, s.track_id
        "#,
    )
    .bind(artist_id)
    .bind(year)
    .bind(i64::from(quarter))
    .fetch_all(pool)
    .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for row in rows {
        let platform_json: String = row.try_get("platform_distribution")?;
        let territory_json: String = row.try_get("territory_distribution")?;
        let monthly_json: String = row.try_get("monthly_breakdown")?;

        summaries.push(StoredSummary {
            id: row.try_get("id")?,
            artist_id: row.try_get("artist_id")?,
            track_id: row.try_get("track_id")?,
            track_title: row.try_get("track_title")?,
            year: row.try_get("year")?,
            quarter: row.try_get("quarter")?,
            total_streams: row.try_get("total_streams")?,
            total_revenue: row.try_get("total_revenue")?,
            total_net: row.try_get("total_net")?,
            total_gross: row.try_get("total_gross")?,
            avg_per_stream: row.try_get("avg_per_stream")?,
            revenue_per_play: row.try_get("revenue_per_play")?,
            top_territory: row.try_get("top_territory")?,
            top_platform: row.try_get("top_platform")?,
            highest_revenue: row.try_get("highest_revenue")?,
            platform_distribution: serde_json::from_str(&platform_json)?,
            territory_distribution: serde_json::from_str(&territory_json)?,
            monthly_breakdown: serde_json::from_str(&monthly_json)?,
            record_count: row.try_get("record_count")?,
            updated_at: row.try_get("updated_at")?,
        });
    }

    Ok(summaries)
}
