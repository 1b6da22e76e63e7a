//! Display-path grouping: collapses episodic items into series rows that a
//! renderer can treat like ordinary catalog items.

use episodic_core::types::{MediaItem, MediaKind};
use serde::Serialize;

use crate::assemble::EpisodeEntry;
use crate::cluster::{SeriesCluster, Strictness, build_clusters};
use crate::trace::GroupingTrace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    Standalone,
    Episodic,
    Series,
}

/// One row of the grouped catalog, shaped like a `MediaItem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub media_url: String,
    pub thumbnail_url: String,
    pub genre: String,
    pub release_year: Option<i32>,
    pub kind: DisplayKind,
    pub series_key: Option<String>,
    pub episode_count: usize,
    pub episodes: Vec<EpisodeEntry>,
}

impl DisplayEntry {
    fn from_item(item: &MediaItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            media_url: item.media_url.clone(),
            thumbnail_url: item.thumbnail_url.clone(),
            genre: item.genre.clone(),
            release_year: item.release_year,
            kind: match item.kind {
                MediaKind::Standalone => DisplayKind::Standalone,
                MediaKind::Episodic => DisplayKind::Episodic,
            },
            series_key: None,
            episode_count: 0,
            episodes: Vec::new(),
        }
    }

    fn from_series(series: SeriesCluster) -> Self {
        // A series plays from its first episode.
        let media_url = series
            .episodes
            .first()
            .map(|e| e.media_url.clone())
            .unwrap_or_default();
        Self {
            id: series_id(&series.key),
            title: series.display_title,
            description: series.description,
            media_url,
            thumbnail_url: series.thumbnail_url,
            genre: series.genre,
            release_year: series.release_year,
            kind: DisplayKind::Series,
            series_key: Some(series.key),
            episode_count: series.episodes.len(),
            episodes: series.episodes,
        }
    }
}

/// Identifier of a synthesized series row.
pub fn series_id(key: &str) -> String {
    format!("series:{key}")
}

/// Grouped catalog plus the decisions that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayCatalog {
    pub entries: Vec<DisplayEntry>,
    pub trace: GroupingTrace,
}

/// Group a catalog snapshot for display.
///
/// Each series row takes the catalog position of its first member; everything
/// else keeps its original order.
pub fn group_for_display(items: &[MediaItem]) -> DisplayCatalog {
    let grouping = build_clusters(items, Strictness::ExplicitOnly);
    let mut trace = grouping.trace;

    let mut rows: Vec<(usize, DisplayEntry)> =
        Vec::with_capacity(grouping.clusters.len() + grouping.standalone.len());
    for cluster in &grouping.clusters {
        if let Some(series) = cluster.to_series(Strictness::ExplicitOnly, &mut trace) {
            rows.push((cluster.first_position, DisplayEntry::from_series(series)));
        }
    }
    for (position, item) in grouping.standalone {
        rows.push((position, DisplayEntry::from_item(item)));
    }
    rows.sort_by_key(|(position, _)| *position);

    DisplayCatalog {
        entries: rows.into_iter().map(|(_, entry)| entry).collect(),
        trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, title: &str) -> MediaItem {
        MediaItem {
            id: id.into(),
            title: title.into(),
            media_url: format!("https://cdn.example/{id}.mp4"),
            ..Default::default()
        }
    }

    #[test]
    fn empty_catalog_yields_no_rows() {
        let catalog = group_for_display(&[]);
        assert!(catalog.entries.is_empty());
        assert!(catalog.trace.is_empty());
    }

    #[test]
    fn series_row_takes_first_member_position() {
        let items = vec![
            item("a", "Avatar"),
            item("e2", "Breaking Bad S01E02 - Cat's in the Bag"),
            item("z", "Zodiac"),
            item("e1", "Breaking Bad S01E01 - Pilot"),
        ];
        let catalog = group_for_display(&items);
        let ids: Vec<_> = catalog.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "series:breaking bad", "z"]);

        let series = &catalog.entries[1];
        assert_eq!(series.kind, DisplayKind::Series);
        assert_eq!(series.title, "Breaking Bad");
        assert_eq!(series.episode_count, 2);
        assert_eq!(series.episodes[0].descriptor.source_item_id, "e1");
        assert_eq!(series.media_url, "https://cdn.example/e1.mp4");
        assert_eq!(series.description, "2 episodes available");
    }

    #[test]
    fn standalone_rows_pass_through() {
        let mut movie = item("m", "Heat (1995)");
        movie.genre = "Crime".into();
        movie.release_year = Some(1995);
        let catalog = group_for_display(std::slice::from_ref(&movie));
        let row = &catalog.entries[0];
        assert_eq!(row.kind, DisplayKind::Standalone);
        assert_eq!(row.title, "Heat (1995)");
        assert_eq!(row.genre, "Crime");
        assert_eq!(row.series_key, None);
        assert!(row.episodes.is_empty());
    }
}
