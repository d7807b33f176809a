//! Track resolution
//!
//! First pass over the statement: collect each distinct song title once,
//! look the titles up in bulk, then create whatever is missing in a single
//! batch. Aggregation afterwards only reads the resulting lookup.

use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{info, warn};

use super::column_mapper::{CanonicalField, ColumnMapping};
use super::csv_ingestor::RawRow;
use crate::db::{NewTrack, RoyaltyStore};

/// Title → track id lookup plus what it took to build it
#[derive(Debug, Clone, Default)]
pub struct TrackResolution {
    pub lookup: HashMap<String, String>,
    /// Titles that had to be created during this run
    pub created: usize,
    /// Backend failures; affected titles are simply absent from `lookup`
    pub errors: Vec<String>,
}

impl TrackResolution {
    pub fn track_id(&self, title: &str) -> Option<&str> {
        self.lookup.get(title).map(String::as_str)
    }
}

/// Distinct non-empty titles in first-seen order, with the first ISWC and
/// composer seen for each
pub fn collect_titles(rows: &[RawRow], mapping: &ColumnMapping) -> Vec<NewTrack> {
    let mut titles: IndexMap<String, NewTrack> = IndexMap::new();

    for row in rows {
        let Some(title) = mapping.non_empty(row, CanonicalField::SongTitle) else {
            continue;
        };
        let track = titles
            .entry(title.to_string())
            .or_insert_with(|| NewTrack::new(title));
        if track.iswc.is_none() {
            track.iswc = mapping.non_empty(row, CanonicalField::Iswc).map(str::to_string);
        }
        if track.composer.is_none() {
            track.composer = mapping.non_empty(row, CanonicalField::Composer).map(str::to_string);
        }
    }

    titles.into_values().collect()
}

/// Resolve every distinct title for the artist, creating missing tracks
///
/// Never fails: a lookup or creation error is recorded and the titles it
/// covers stay unresolved, so their rows fail individually later.
pub async fn resolve_tracks(
    store: &dyn RoyaltyStore,
    artist_id: &str,
    rows: &[RawRow],
    mapping: &ColumnMapping,
) -> TrackResolution {
    let mut resolution = TrackResolution::default();

    let candidates = collect_titles(rows, mapping);
    if candidates.is_empty() {
        return resolution;
    }
    let titles: Vec<String> = candidates.iter().map(|t| t.title.clone()).collect();

    match store.find_tracks(artist_id, &titles).await {
        Ok(found) => resolution.lookup = found,
        Err(e) => {
            warn!("Track lookup failed for artist {}: {}", artist_id, e);
            resolution.errors.push(format!("Track lookup failed: {}", e));
            return resolution;
        }
    }

    let missing: Vec<NewTrack> = candidates
        .into_iter()
        .filter(|t| !resolution.lookup.contains_key(&t.title))
        .collect();

    if missing.is_empty() {
        info!("All {} titles already in catalog", titles.len());
        return resolution;
    }

    let artist_name = match store.artist_display_name(artist_id).await {
        Ok(Some(name)) if !name.trim().is_empty() => name,
        Ok(_) => artist_id.to_string(),
        Err(e) => {
            warn!("Artist lookup failed, using id as display name: {}", e);
            artist_id.to_string()
        }
    };

    match store.create_tracks(artist_id, &artist_name, &missing).await {
        Ok(created) => {
            for track in &missing {
                if created.contains_key(&track.title) {
                    resolution.created += 1;
                }
            }
            resolution.lookup.extend(created);
            info!(
                "Resolved {} titles ({} created)",
                titles.len(),
                resolution.created
            );
        }
        Err(e) => {
            warn!("Creating {} tracks failed: {}", missing.len(), e);
            resolution
                .errors
                .push(format!("Track creation failed for {} titles: {}", missing.len(), e));
        }
    }

    resolution
}
