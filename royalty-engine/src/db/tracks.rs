//! Track database operations

use royalty_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::NewTrack;

/// Artist share assigned to tracks created from a statement
pub const DEFAULT_SPLIT_PERCENT: &str = "100";

// Keeps every statement under SQLite's bound-parameter limit
const LOOKUP_CHUNK: usize = 500;
const INSERT_CHUNK: usize = 100;

/// Look up track ids for an artist's titles (exact title match)
pub async fn find_tracks_by_title(
    pool: &SqlitePool,
    artist_id: &str,
    titles: &[String],
) -> Result<HashMap<String, String>> {
    let mut found = HashMap::with_capacity(titles.len());

    for chunk in titles.chunks(LOOKUP_CHUNK) {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, title FROM tracks WHERE artist_id = ");
        query.push_bind(artist_id);
        query.push(" AND title IN (");
        let mut separated = query.separated(", ");
        for title in chunk {
            separated.push_bind(title.as_str());
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String)> = query.build_query_as().fetch_all(pool).await?;
        for (id, title) in rows {
            found.insert(title, id);
        }
    }

    debug!(
        "Track lookup for artist {}: {} of {} titles known",
        artist_id,
        found.len(),
        titles.len()
    );

    Ok(found)
}

/// Create tracks in a single transaction
///
/// Titles that already exist for the artist are left untouched. Returns the
/// id of every requested title, new or pre-existing.
pub async fn create_tracks(
    pool: &SqlitePool,
    artist_id: &str,
    artist_name: &str,
    new_tracks: &[NewTrack],
) -> Result<HashMap<String, String>> {
    if new_tracks.is_empty() {
        return Ok(HashMap::new());
    }

    let mut tx = pool.begin().await?;

    for chunk in new_tracks.chunks(INSERT_CHUNK) {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO tracks (id, artist_id, title, artist_name, iswc, composer, split_percent) ",
        );
        query.push_values(chunk, |mut row, track| {
            row.push_bind(Uuid::new_v4().to_string())
                .push_bind(artist_id)
                .push_bind(track.title.as_str())
                .push_bind(artist_name)
                .push_bind(track.iswc.as_deref())
                .push_bind(track.composer.as_deref())
                .push_bind(DEFAULT_SPLIT_PERCENT);
        });
        query.push(" ON CONFLICT(artist_id, title) DO NOTHING");
        query.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    let titles: Vec<String> = new_tracks.iter().map(|t| t.title.clone()).collect();
    find_tracks_by_title(pool, artist_id, &titles).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        royalty_common::db::init_schema(&pool)
            .await
            .expect("Schema initialization failed");
        pool
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let pool = test_pool().await;

        let mut with_codes = NewTrack::new("Blue Hour");
        with_codes.iswc = Some("T-123.456.789-0".to_string());
        with_codes.composer = Some("J. Writer".to_string());
        let created = create_tracks(
            &pool,
            "artist-1",
            "The Band",
            &[with_codes, NewTrack::new("Red Dawn")],
        )
        .await
        .unwrap();

        assert_eq!(created.len(), 2);

        let found = find_tracks_by_title(
            &pool,
            "artist-1",
            &["Blue Hour".to_string(), "Unknown Song".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("Blue Hour"), created.get("Blue Hour"));

        let (artist_name, split, iswc): (String, String, Option<String>) = sqlx::query_as(
            "SELECT artist_name, split_percent, iswc FROM tracks WHERE title = 'Blue Hour'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(artist_name, "The Band");
        assert_eq!(split, "100");
        assert_eq!(iswc.as_deref(), Some("T-123.456.789-0"));
    }

    #[tokio::test]
    async fn test_create_keeps_existing_ids() {
        let pool = test_pool().await;

        let first = create_tracks(&pool, "artist-1", "The Band", &[NewTrack::new("Song")])
            .await
            .unwrap();
        let second = create_tracks(&pool, "artist-1", "The Band", &[NewTrack::new("Song")])
            .await
            .unwrap();

        assert_eq!(first.get("Song"), second.get("Song"));
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_artist() {
        let pool = test_pool().await;

        create_tracks(&pool, "artist-1", "The Band", &[NewTrack::new("Song")])
            .await
            .unwrap();

        let found = find_tracks_by_title(&pool, "artist-2", &["Song".to_string()])
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
