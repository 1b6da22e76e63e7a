//! Bucketing of catalog items into series clusters.

use std::collections::HashMap;

use episodic_core::types::MediaItem;
use serde::Serialize;

use crate::assemble::{EpisodeEntry, assemble_episodes};
use crate::extract::has_episode_marker;
use crate::normalize::{canonical_key, explicit_key};
use crate::representative::{SelectionRule, select_representative, series_metadata};
use crate::trace::{GroupingTrace, TraceEvent};

/// Inferred buckets below this size are not treated as a series.
pub const MIN_INFERRED_CLUSTER_SIZE: usize = 2;

/// How much evidence a grouping pass requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Display-time grouping: items with episodic metadata or an episode
    /// marker in the title. Single-member clusters are kept.
    ExplicitOnly,
    /// Catalog-wide reclassification: untagged items only, trailing numbers
    /// stripped, clusters of fewer than two members dropped.
    Inferred,
}

/// Items sharing one canonical key, in catalog order.
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    pub key: String,
    /// Catalog position of the first member.
    pub first_position: usize,
    pub members: Vec<&'a MediaItem>,
    /// Members that already carry this series key. Only set by inferred
    /// grouping, when untagged items join a series that already exists.
    pub existing: Vec<&'a MediaItem>,
}

/// A cluster resolved into display metadata plus its episode list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesCluster {
    pub key: String,
    pub display_title: String,
    pub representative_item_id: String,
    pub selection: SelectionRule,
    pub genre: String,
    pub release_year: Option<i32>,
    pub thumbnail_url: String,
    pub description: String,
    pub episodes: Vec<EpisodeEntry>,
    /// Episodes that are already stored under this series key.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub existing_item_ids: Vec<String>,
}

impl SeriesCluster {
    /// Episodes that still need their episodic fields written.
    pub fn pending_episodes(&self) -> impl Iterator<Item = &EpisodeEntry> {
        self.episodes
            .iter()
            .filter(|e| !self.existing_item_ids.contains(&e.descriptor.source_item_id))
    }
}

impl<'a> Cluster<'a> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Assemble episodes and pick a representative.
    pub fn to_series(
        &self,
        strictness: Strictness,
        trace: &mut GroupingTrace,
    ) -> Option<SeriesCluster> {
        let rep = select_representative(&self.members)?;
        let episodes = assemble_episodes(&self.members, trace);
        let meta = series_metadata(&self.key, &self.members, &rep, episodes.len(), strictness);
        Some(SeriesCluster {
            key: self.key.clone(),
            display_title: meta.display_title,
            representative_item_id: meta.representative_item_id,
            selection: rep.rule,
            genre: meta.genre,
            release_year: meta.release_year,
            thumbnail_url: meta.thumbnail_url,
            description: meta.description,
            episodes,
            existing_item_ids: self.existing.iter().map(|m| m.id.clone()).collect(),
        })
    }
}

/// Output of one grouping pass.
#[derive(Debug, Clone)]
pub struct Grouping<'a> {
    /// Clusters in order of first appearance.
    pub clusters: Vec<Cluster<'a>>,
    /// Items left ungrouped, with their catalog positions.
    pub standalone: Vec<(usize, &'a MediaItem)>,
    pub trace: GroupingTrace,
}

enum Placement {
    Bucket(String),
    Standalone,
    /// Not considered by this pass at all.
    Skipped,
}

/// Bucket `items` by canonical key. Pure and deterministic: the same input
/// always yields the same clusters in the same order.
pub fn build_clusters(items: &[MediaItem], strictness: Strictness) -> Grouping<'_> {
    let mut trace = GroupingTrace::default();
    let mut clusters: Vec<Cluster<'_>> = Vec::new();
    // Catalog positions of each cluster's members, parallel to `clusters`.
    let mut positions: Vec<Vec<usize>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut standalone = Vec::new();
    // Inferred only: members of series that already exist, by folded key.
    let mut grouped: HashMap<String, Vec<(usize, &MediaItem)>> = HashMap::new();

    for (position, item) in items.iter().enumerate() {
        if strictness == Strictness::Inferred {
            if let Some(key) = item.series_key().and_then(explicit_key) {
                grouped.entry(key).or_default().push((position, item));
            }
        }
        let key = match placement(item, strictness, &mut trace) {
            Placement::Bucket(key) => key,
            Placement::Standalone => {
                standalone.push((position, item));
                continue;
            }
            Placement::Skipped => continue,
        };

        trace.push(TraceEvent::Bucketed {
            item_id: item.id.clone(),
            key: key.clone(),
        });
        match index.get(&key) {
            Some(&idx) => {
                clusters[idx].members.push(item);
                positions[idx].push(position);
            }
            None => {
                index.insert(key.clone(), clusters.len());
                clusters.push(Cluster {
                    key,
                    first_position: position,
                    members: vec![item],
                    existing: Vec::new(),
                });
                positions.push(vec![position]);
            }
        }
    }

    if strictness == Strictness::Inferred {
        let mut kept = Vec::with_capacity(clusters.len());
        for (mut cluster, mut member_positions) in clusters.into_iter().zip(positions) {
            if let Some(existing) = grouped.remove(&cluster.key) {
                trace.push(TraceEvent::ExtendsSeries {
                    key: cluster.key.clone(),
                    existing: existing.len(),
                });
                merge_existing(&mut cluster, &mut member_positions, existing);
            }
            if cluster.len() >= MIN_INFERRED_CLUSTER_SIZE {
                kept.push(cluster);
                continue;
            }
            trace.push(TraceEvent::BucketDiscarded {
                key: cluster.key.clone(),
                size: cluster.len(),
            });
            standalone.extend(member_positions.into_iter().zip(cluster.members));
        }
        // Merged clusters may now start before their first untagged member.
        kept.sort_by_key(|c| c.first_position);
        clusters = kept;
        standalone.sort_by_key(|(position, _)| *position);
    }

    Grouping {
        clusters,
        standalone,
        trace,
    }
}

/// Interleave already-grouped members into `cluster` by catalog position, so
/// ordinal numbering lines up with the run that tagged them.
fn merge_existing<'a>(
    cluster: &mut Cluster<'a>,
    member_positions: &mut Vec<usize>,
    existing: Vec<(usize, &'a MediaItem)>,
) {
    let mut merged: Vec<(usize, &'a MediaItem)> = member_positions
        .iter()
        .copied()
        .zip(cluster.members.iter().copied())
        .chain(existing.iter().copied())
        .collect();
    merged.sort_by_key(|(position, _)| *position);

    if let Some(&(first, _)) = merged.first() {
        cluster.first_position = first;
    }
    *member_positions = merged.iter().map(|(position, _)| *position).collect();
    cluster.members = merged.into_iter().map(|(_, item)| item).collect();
    cluster.existing = existing.into_iter().map(|(_, item)| item).collect();
}

fn placement(item: &MediaItem, strictness: Strictness, trace: &mut GroupingTrace) -> Placement {
    match strictness {
        Strictness::ExplicitOnly => {
            if let Some(key) = item.series_key().and_then(explicit_key) {
                return Placement::Bucket(key);
            }
            if !item.has_episodic_metadata() && !has_episode_marker(&item.title) {
                return Placement::Standalone;
            }
        }
        Strictness::Inferred => {
            if let Some(key) = item.series_key() {
                trace.push(TraceEvent::AlreadyGrouped {
                    item_id: item.id.clone(),
                    key: key.to_string(),
                });
                return Placement::Skipped;
            }
        }
    }

    match canonical_key(&item.title, strictness) {
        Some(key) => Placement::Bucket(key),
        None => {
            trace.push(TraceEvent::Ineligible {
                item_id: item.id.clone(),
                title: item.title.clone(),
            });
            Placement::Standalone
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use episodic_core::types::MediaKind;

    fn item(id: &str, title: &str) -> MediaItem {
        MediaItem {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    fn member_ids(cluster: &Cluster<'_>) -> Vec<String> {
        cluster.members.iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn episode_titles_cluster_at_display_time() {
        let items = vec![
            item("2", "Breaking Bad S01E02 - Cat's in the Bag"),
            item("m", "Avatar"),
            item("1", "Breaking Bad S01E01 - Pilot"),
        ];
        let grouping = build_clusters(&items, Strictness::ExplicitOnly);
        assert_eq!(grouping.clusters.len(), 1);
        let cluster = &grouping.clusters[0];
        assert_eq!(cluster.key, "breaking bad");
        assert_eq!(cluster.first_position, 0);
        assert_eq!(member_ids(cluster), vec!["2", "1"]);

        let mut trace = GroupingTrace::default();
        let series = cluster.to_series(Strictness::ExplicitOnly, &mut trace).unwrap();
        assert_eq!(series.display_title, "Breaking Bad");
        let order: Vec<_> = series
            .episodes
            .iter()
            .map(|e| e.descriptor.episode_number)
            .collect();
        assert_eq!(order, vec![1, 2]);

        assert_eq!(grouping.standalone.len(), 1);
        assert_eq!(grouping.standalone[0].0, 1);
        assert_eq!(grouping.standalone[0].1.id, "m");
    }

    #[test]
    fn display_time_keeps_single_member_clusters() {
        let items = vec![item("a", "Chernobyl S01E03")];
        let grouping = build_clusters(&items, Strictness::ExplicitOnly);
        assert_eq!(grouping.clusters.len(), 1);
        assert_eq!(grouping.clusters[0].len(), 1);
    }

    #[test]
    fn display_time_ignores_numbered_titles_without_markers() {
        let items = vec![item("a", "Hostage 1"), item("b", "Hostage 2")];
        let grouping = build_clusters(&items, Strictness::ExplicitOnly);
        assert!(grouping.clusters.is_empty());
        assert_eq!(grouping.standalone.len(), 2);
    }

    #[test]
    fn explicit_series_key_drives_display_bucket() {
        let mut a = item("a", "Pilot");
        a.kind = MediaKind::Episodic;
        a.explicit_series_key = Some("Breaking Bad".into());
        let b = item("b", "Breaking Bad S01E02");
        let items = vec![a, b];
        let grouping = build_clusters(&items, Strictness::ExplicitOnly);
        assert_eq!(grouping.clusters.len(), 1);
        assert_eq!(member_ids(&grouping.clusters[0]), vec!["a", "b"]);
    }

    #[test]
    fn episodic_kind_without_marker_is_grouped_by_title() {
        let mut a = item("a", "Planet Earth");
        a.kind = MediaKind::Episodic;
        let items = vec![a];
        let grouping = build_clusters(&items, Strictness::ExplicitOnly);
        assert_eq!(grouping.clusters[0].key, "planet earth");
    }

    #[test]
    fn short_key_is_ineligible() {
        let items = vec![item("a", "S01E01")];
        let grouping = build_clusters(&items, Strictness::ExplicitOnly);
        assert!(grouping.clusters.is_empty());
        assert_eq!(grouping.standalone.len(), 1);
        assert_eq!(grouping.trace.count("ineligible"), 1);
    }

    #[test]
    fn inferred_rejects_single_items() {
        let items = vec![item("a", "Avatar"), item("b", "Heat 2")];
        let grouping = build_clusters(&items, Strictness::Inferred);
        assert!(grouping.clusters.is_empty());
        let ids: Vec<_> = grouping.standalone.iter().map(|(_, i)| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(grouping.trace.count("bucket_discarded"), 2);
    }

    #[test]
    fn inferred_groups_numbered_titles() {
        let items = vec![
            item("h1", "Hostage 1"),
            item("x", "Avatar"),
            item("h2", "Hostage 2"),
            item("h3", "Hostage 3"),
        ];
        let grouping = build_clusters(&items, Strictness::Inferred);
        assert_eq!(grouping.clusters.len(), 1);
        assert_eq!(grouping.clusters[0].key, "hostage");
        assert_eq!(member_ids(&grouping.clusters[0]), vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn inferred_skips_explicitly_grouped_items() {
        let mut a = item("a", "Hostage 1");
        a.explicit_series_key = Some("hostage".into());
        let mut b = item("b", "Hostage 2");
        b.explicit_series_key = Some("hostage".into());
        let items = vec![a, b, item("c", "Avatar")];
        let grouping = build_clusters(&items, Strictness::Inferred);
        assert!(grouping.clusters.is_empty());
        let ids: Vec<_> = grouping.standalone.iter().map(|(_, i)| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
        assert_eq!(grouping.trace.count("already_grouped"), 2);
        assert_eq!(grouping.trace.count("extends_series"), 0);
    }

    #[test]
    fn untagged_item_joins_existing_series() {
        let mut a = item("a", "Hostage 1");
        a.explicit_series_key = Some("Hostage".into());
        let mut c = item("c", "Hostage 3");
        c.explicit_series_key = Some("hostage".into());
        let items = vec![a, item("b", "Hostage 2"), c];
        let grouping = build_clusters(&items, Strictness::Inferred);

        assert_eq!(grouping.clusters.len(), 1);
        let cluster = &grouping.clusters[0];
        assert_eq!(cluster.key, "hostage");
        assert_eq!(cluster.first_position, 0);
        assert_eq!(member_ids(cluster), vec!["a", "b", "c"]);
        let existing: Vec<_> = cluster.existing.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(existing, vec!["a", "c"]);
        assert!(grouping.standalone.is_empty());
        assert_eq!(
            grouping.trace.count("extends_series"),
            1,
            "{:?}",
            grouping.trace
        );

        let mut trace = GroupingTrace::default();
        let series = cluster.to_series(Strictness::Inferred, &mut trace).unwrap();
        let pending: Vec<_> = series
            .pending_episodes()
            .map(|e| (e.descriptor.source_item_id.as_str(), e.descriptor.episode_number))
            .collect();
        assert_eq!(pending, vec![("b", 2)]);
    }

    #[test]
    fn grouping_is_deterministic() {
        let items = vec![
            item("a", "Show S01E02"),
            item("b", "Other Ep 1"),
            item("c", "Show S01E01"),
            item("d", "Other Ep 2"),
        ];
        let first = build_clusters(&items, Strictness::Inferred);
        let second = build_clusters(&items, Strictness::Inferred);
        let keys = |g: &Grouping<'_>| -> Vec<(String, Vec<String>)> {
            g.clusters.iter().map(|c| (c.key.clone(), member_ids(c))).collect()
        };
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(first.trace, second.trace);
        assert_eq!(keys(&first)[0].0, "show");
        assert_eq!(keys(&first)[1].0, "other");
    }
}
