//! Episode list assembly for one cluster.

use episodic_core::types::{DescriptorSource, EpisodeDescriptor, MediaItem};
use serde::Serialize;

use crate::extract::{PatternFamily, extract_episode};
use crate::trace::{GroupingTrace, TraceEvent};

/// One row of a series' episode list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeEntry {
    #[serde(flatten)]
    pub descriptor: EpisodeDescriptor,
    pub title: String,
    pub media_url: String,
    pub thumbnail_url: String,
    pub description: String,
    pub source: DescriptorSource,
}

/// Episode number from explicit fields or the title. No ordinal fallback.
pub fn known_episode(item: &MediaItem) -> Option<u32> {
    item.explicit_episode
        .or_else(|| extract_episode(&item.title).map(|p| p.episode))
}

/// Position of one member. Explicit fields win over the title; `ordinal` is
/// used when neither yields an episode number.
pub fn describe(
    item: &MediaItem,
    ordinal: u32,
    trace: &mut GroupingTrace,
) -> (EpisodeDescriptor, DescriptorSource) {
    let parsed = extract_episode(&item.title);

    let season = item
        .explicit_season
        .or(parsed.map(|p| p.season))
        .unwrap_or(1);

    let (episode, source) = match (item.explicit_episode, parsed) {
        (Some(e), _) => (e, DescriptorSource::Explicit),
        (None, Some(p)) => (p.episode, DescriptorSource::Extracted),
        (None, None) => {
            trace.push(TraceEvent::OrdinalFallback {
                item_id: item.id.clone(),
                episode: ordinal,
            });
            (ordinal, DescriptorSource::Ordinal)
        }
    };

    if let Some(p) = parsed {
        // An episode-only title carries no season of its own.
        let season_conflict = p.family != PatternFamily::EpisodeOnly
            && item.explicit_season.is_some_and(|s| s != p.season);
        let episode_conflict = item.explicit_episode.is_some_and(|e| e != p.episode);
        if season_conflict || episode_conflict {
            trace.push(TraceEvent::ExplicitOverride {
                item_id: item.id.clone(),
                explicit: (season, episode),
                extracted: (p.season, p.episode),
            });
        }
    }

    (
        EpisodeDescriptor {
            season_number: season,
            episode_number: episode,
            source_item_id: item.id.clone(),
        },
        source,
    )
}

/// Build the episode list for cluster members given in catalog order.
///
/// The result is sorted by `(season, episode)`. The sort is stable, so
/// members that land on the same position keep their catalog order.
pub fn assemble_episodes(members: &[&MediaItem], trace: &mut GroupingTrace) -> Vec<EpisodeEntry> {
    let mut entries: Vec<EpisodeEntry> = members
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let ordinal = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            let (descriptor, source) = describe(item, ordinal, trace);
            EpisodeEntry {
                descriptor,
                title: item.title.clone(),
                media_url: item.media_url.clone(),
                thumbnail_url: item.thumbnail_url.clone(),
                description: item.description.clone(),
                source,
            }
        })
        .collect();

    entries.sort_by_key(|e| (e.descriptor.season_number, e.descriptor.episode_number));
    entries
}
