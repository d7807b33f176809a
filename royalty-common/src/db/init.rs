//! Database initialization
//!
//! Creates the database file on first run and brings every table the
//! summary engine touches into existence. All statements are idempotent,
//! so this is safe to run on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL keeps readers (the `show` command, reporting tools) off the writer's back
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables on an already-open pool
///
/// Used directly by tests running against `sqlite::memory:`.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_artists_table(pool).await?;
    create_tracks_table(pool).await?;
    create_royalty_summaries_table(pool).await?;
    create_summary_runs_table(pool).await?;

    info!("Database tables initialized (artists, tracks, royalty_summaries, summary_runs)");
    Ok(())
}

async fn create_artists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the tracks table
///
/// One row per (artist, title). `split_percent` is the artist's share of the
/// track; tracks created by the summary engine start at 100.
async fn create_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            id TEXT PRIMARY KEY,
            artist_id TEXT NOT NULL,
            title TEXT NOT NULL,
            artist_name TEXT NOT NULL,
            iswc TEXT,
            composer TEXT,
            split_percent TEXT NOT NULL DEFAULT '100',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(artist_id, title)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the royalty_summaries table
///
/// Money columns are exact decimal strings. Distribution and monthly maps
/// are JSON objects of numbers.
async fn create_royalty_summaries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS royalty_summaries (
            id TEXT PRIMARY KEY,
            artist_id TEXT NOT NULL,
            track_id TEXT NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL CHECK (quarter BETWEEN 1 AND 4),
            total_streams INTEGER NOT NULL DEFAULT 0,
            total_revenue TEXT NOT NULL DEFAULT '0',
            total_net TEXT NOT NULL DEFAULT '0',
            total_gross TEXT NOT NULL DEFAULT '0',
            avg_per_stream TEXT NOT NULL DEFAULT '0',
            revenue_per_play TEXT NOT NULL DEFAULT '0',
            top_territory TEXT,
            top_platform TEXT,
            highest_revenue TEXT NOT NULL DEFAULT '0',
            platform_distribution TEXT NOT NULL DEFAULT '{}',
            territory_distribution TEXT NOT NULL DEFAULT '{}',
            monthly_breakdown TEXT NOT NULL DEFAULT '{}',
            record_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(artist_id, track_id, year, quarter)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_royalty_summaries_period ON royalty_summaries(artist_id, year, quarter)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the summary_runs table (one row per engine invocation)
async fn create_summary_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS summary_runs (
            run_id TEXT PRIMARY KEY,
            artist_id TEXT NOT NULL,
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL,
            upload_id TEXT,
            success INTEGER NOT NULL,
            total_rows INTEGER NOT NULL DEFAULT 0,
            summaries_created INTEGER NOT NULL DEFAULT 0,
            summaries_updated INTEGER NOT NULL DEFAULT 0,
            failed_rows INTEGER NOT NULL DEFAULT 0,
            error_count INTEGER NOT NULL DEFAULT 0,
            duration_ms INTEGER NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
