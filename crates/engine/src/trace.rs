use serde::Serialize;

/// One decision taken while grouping a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Item placed in the bucket for `key`.
    Bucketed { item_id: String, key: String },
    /// Title normalized to nothing usable; item stays standalone.
    Ineligible { item_id: String, title: String },
    /// Item already carries a series key and is left to explicit grouping.
    AlreadyGrouped { item_id: String, key: String },
    /// Untagged items matched a series key already in the catalog; its
    /// `existing` members join the bucket.
    ExtendsSeries { key: String, existing: usize },
    /// Inferred bucket too small to count as a series.
    BucketDiscarded { key: String, size: usize },
    /// Explicit season/episode disagreed with the title; explicit kept.
    ExplicitOverride {
        item_id: String,
        explicit: (u32, u32),
        extracted: (u32, u32),
    },
    /// No number available; position in the cluster used instead.
    OrdinalFallback { item_id: String, episode: u32 },
}

impl TraceEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bucketed { .. } => "bucketed",
            Self::Ineligible { .. } => "ineligible",
            Self::AlreadyGrouped { .. } => "already_grouped",
            Self::ExtendsSeries { .. } => "extends_series",
            Self::BucketDiscarded { .. } => "bucket_discarded",
            Self::ExplicitOverride { .. } => "explicit_override",
            Self::OrdinalFallback { .. } => "ordinal_fallback",
        }
    }
}

/// Ordered record of grouping decisions, returned next to the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingTrace {
    pub events: Vec<TraceEvent>,
}

impl GroupingTrace {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, other: GroupingTrace) {
        self.events.extend(other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events with the given label.
    pub fn count(&self, label: &str) -> usize {
        self.events.iter().filter(|e| e.label() == label).count()
    }
}
