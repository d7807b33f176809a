//! Summary run history

use royalty_common::Result;
use sqlx::SqlitePool;

use crate::models::RunRecord;

fn as_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Save a run record
pub async fn record_run(pool: &SqlitePool, run: &RunRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO summary_runs (
            run_id, artist_id, year, quarter, upload_id, success, total_rows,
            summaries_created, summaries_updated, failed_rows, error_count,
            duration_ms, started_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(run.run_id.to_string())
    .bind(&run.artist_id)
    .bind(run.year)
    .bind(i64::from(run.quarter))
    .bind(&run.upload_id)
    .bind(run.success)
    .bind(as_i64(run.total_rows))
    .bind(as_i64(run.summaries_created))
    .bind(as_i64(run.summaries_updated))
    .bind(as_i64(run.failed_rows))
    .bind(as_i64(run.error_count))
    .bind(i64::try_from(run.duration_ms).unwrap_or(i64::MAX))
    .bind(run.started_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
