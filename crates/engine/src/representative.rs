//! Representative selection and series-level metadata.
//!
//! Selection rules, first match wins:
//! 1. The member numbered episode 1 that has a thumbnail.
//! 2. The first member in catalog order that has a thumbnail.
//! 3. The first member in catalog order.

use episodic_core::types::MediaItem;
use serde::Serialize;

use crate::assemble::known_episode;
use crate::cluster::Strictness;
use crate::normalize::clean_title;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    FirstEpisodeWithThumbnail,
    FirstWithThumbnail,
    FirstMember,
}

#[derive(Debug, Clone, Copy)]
pub struct Representative<'a> {
    pub item: &'a MediaItem,
    pub rule: SelectionRule,
}

/// Pick the member that supplies series metadata. `None` only for an empty slice.
pub fn select_representative<'a>(members: &[&'a MediaItem]) -> Option<Representative<'a>> {
    if let Some(item) = members
        .iter()
        .copied()
        .find(|m| m.has_thumbnail() && known_episode(m) == Some(1))
    {
        return Some(Representative {
            item,
            rule: SelectionRule::FirstEpisodeWithThumbnail,
        });
    }

    if let Some(item) = members.iter().copied().find(|m| m.has_thumbnail()) {
        return Some(Representative {
            item,
            rule: SelectionRule::FirstWithThumbnail,
        });
    }

    members.first().copied().map(|item| Representative {
        item,
        rule: SelectionRule::FirstMember,
    })
}

/// Metadata shown for a series as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesMetadata {
    pub display_title: String,
    pub representative_item_id: String,
    pub genre: String,
    pub release_year: Option<i32>,
    pub thumbnail_url: String,
    pub description: String,
}

/// Derive series metadata from the representative, filling blanks from the
/// other members.
pub fn series_metadata(
    key: &str,
    members: &[&MediaItem],
    rep: &Representative<'_>,
    episode_count: usize,
    strictness: Strictness,
) -> SeriesMetadata {
    let display_title = display_title(key, members, rep.item, strictness);

    let genre = if rep.item.genre.trim().is_empty() {
        members
            .iter()
            .map(|m| m.genre.trim())
            .find(|g| !g.is_empty())
            .unwrap_or_default()
            .to_string()
    } else {
        rep.item.genre.clone()
    };

    let release_year = rep
        .item
        .release_year
        .or_else(|| members.iter().find_map(|m| m.release_year));

    let description = if rep.item.has_description() {
        rep.item.description.clone()
    } else {
        members
            .iter()
            .find(|m| m.has_description())
            .map(|m| m.description.clone())
            .unwrap_or_else(|| format!("{episode_count} episodes available"))
    };

    SeriesMetadata {
        display_title,
        representative_item_id: rep.item.id.clone(),
        genre,
        release_year,
        thumbnail_url: rep.item.thumbnail_url.clone(),
        description,
    }
}

/// An explicit series title on any member wins. Otherwise use a member's
/// cleaned title, then a raw series key, that folds to the key, so the
/// original casing survives.
fn display_title(
    key: &str,
    members: &[&MediaItem],
    rep: &MediaItem,
    strictness: Strictness,
) -> String {
    if let Some(title) = members.iter().find_map(|m| m.series_title()) {
        return title.to_string();
    }

    std::iter::once(rep)
        .chain(members.iter().copied())
        .map(|m| clean_title(&m.title, strictness))
        .find(|t| t.to_lowercase() == key)
        .or_else(|| {
            // Keep the casing the series key was written with.
            members
                .iter()
                .filter_map(|m| m.series_key())
                .map(|k| k.split_whitespace().collect::<Vec<_>>().join(" "))
                .find(|k| k.to_lowercase() == key)
        })
        .unwrap_or_else(|| key.to_string())
}
