//! Artist database operations

use royalty_common::Result;
use sqlx::SqlitePool;

/// Save artist (insert or rename)
pub async fn save_artist(pool: &SqlitePool, artist_id: &str, display_name: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO artists (id, display_name, created_at, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            display_name = excluded.display_name,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(artist_id)
    .bind(display_name)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load artist display name by id
pub async fn load_display_name(pool: &SqlitePool, artist_id: &str) -> Result<Option<String>> {
    let name = sqlx::query_scalar::<_, String>("SELECT display_name FROM artists WHERE id = ?")
        .bind(artist_id)
        .fetch_optional(pool)
        .await?;

    Ok(name)
}
