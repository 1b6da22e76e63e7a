use serde::{Deserialize, Serialize};

/// Catalog record kind stored in the `media_item.kind` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Standalone,
    Episodic,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Episodic => "episodic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standalone" => Some(Self::Standalone),
            "episodic" => Some(Self::Episodic),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog record as supplied by the catalog store.
///
/// Missing fields deserialize to empty values so partially filled records
/// still flow through grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub media_url: String,
    pub thumbnail_url: String,
    pub genre: String,
    pub release_year: Option<i32>,
    pub kind: MediaKind,
    pub explicit_series_key: Option<String>,
    /// Human series title, written together with the series key.
    pub series_title: Option<String>,
    pub explicit_season: Option<u32>,
    pub explicit_episode: Option<u32>,
}

impl MediaItem {
    /// Explicit series key, if set to something non-blank.
    pub fn series_key(&self) -> Option<&str> {
        self.explicit_series_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn series_title(&self) -> Option<&str> {
        self.series_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// True when any episodic field is already set on the record.
    pub fn has_episodic_metadata(&self) -> bool {
        self.kind == MediaKind::Episodic
            || self.series_key().is_some()
            || self.explicit_season.is_some()
            || self.explicit_episode.is_some()
    }

    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail_url.trim().is_empty()
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// Where an episode position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorSource {
    Explicit,
    Extracted,
    Ordinal,
}

/// Season/episode position of one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeDescriptor {
    pub season_number: u32,
    pub episode_number: u32,
    pub source_item_id: String,
}

/// Reclassification instruction for one item, applied by the catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCommand {
    pub id: String,
    pub kind: MediaKind,
    pub series_key: String,
    pub series_title: String,
    pub season: u32,
    pub episode: u32,
}

impl UpdateCommand {
    /// True when applying this command to `item` would change nothing.
    pub fn is_satisfied_by(&self, item: &MediaItem) -> bool {
        item.id == self.id
            && item.kind == self.kind
            && item.explicit_series_key.as_deref() == Some(self.series_key.as_str())
            && item.series_title.as_deref() == Some(self.series_title.as_str())
            && item.explicit_season == Some(self.season)
            && item.explicit_episode == Some(self.episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let item: MediaItem =
            serde_json::from_str(r#"{ "id": "a", "title": "Avatar" }"#).unwrap();
        assert_eq!(item.kind, MediaKind::Standalone);
        assert!(item.description.is_empty());
        assert!(item.explicit_series_key.is_none());
        assert!(!item.has_episodic_metadata());
    }

    #[test]
    fn blank_series_key_is_not_explicit() {
        let item = MediaItem {
            explicit_series_key: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(item.series_key(), None);
        assert!(!item.has_episodic_metadata());
    }

    #[test]
    fn kind_parses_its_own_name() {
        for kind in [MediaKind::Standalone, MediaKind::Episodic] {
            assert_eq!(MediaKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MediaKind::parse("series"), None);
    }

    #[test]
    fn command_satisfied_only_when_every_field_matches() {
        let cmd = UpdateCommand {
            id: "x".into(),
            kind: MediaKind::Episodic,
            series_key: "hostage".into(),
            series_title: "Hostage".into(),
            season: 1,
            episode: 2,
        };
        let mut item = MediaItem {
            id: "x".into(),
            kind: MediaKind::Episodic,
            explicit_series_key: Some("hostage".into()),
            series_title: Some("Hostage".into()),
            explicit_season: Some(1),
            explicit_episode: Some(2),
            ..Default::default()
        };
        assert!(cmd.is_satisfied_by(&item));
        item.explicit_episode = Some(3);
        assert!(!cmd.is_satisfied_by(&item));
    }
}
