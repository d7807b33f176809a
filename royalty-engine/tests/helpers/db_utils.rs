//! Database Test Utilities

use anyhow::Result;
use royalty_engine::SqliteRoyaltyStore;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create an on-disk test database with the full schema
///
/// Returns (TempDir, store) - TempDir must be kept alive for duration of test
pub async fn create_test_store() -> Result<(TempDir, SqliteRoyaltyStore)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("royalty_test.db");
    let store = SqliteRoyaltyStore::open(&db_path).await?;
    Ok((temp_dir, store))
}

/// In-memory store on a single connection (every connection to
/// `sqlite::memory:` is its own database)
pub async fn memory_store() -> SqliteRoyaltyStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    royalty_common::db::init_schema(&pool)
        .await
        .expect("Schema initialization failed");
    SqliteRoyaltyStore::new(pool)
}

/// Row count of a table
pub async fn count_rows(pool: &SqlitePool, table_name: &str) -> i64 {
    let query = format!("SELECT COUNT(*) FROM {}", table_name);
    sqlx::query_scalar(&query)
        .fetch_one(pool)
        .await
        .expect("Count query failed")
}

/// Runs recorded for an upload id
pub async fn count_runs_for_upload(pool: &SqlitePool, upload_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM summary_runs WHERE upload_id = ?")
        .bind(upload_id)
        .fetch_one(pool)
        .await
        .expect("Count query failed")
}
