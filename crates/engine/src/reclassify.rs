//! Catalog-wide series reclassification.
//!
//! Workflow: `Detected -> Confirmed -> Applied -> Reported`. Detection and
//! command generation are pure; [`apply`] is the only step that touches a
//! store, one command at a time.

use std::time::Duration;

use episodic_core::store::CatalogWriter;
use episodic_core::types::{MediaItem, MediaKind, UpdateCommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cluster::{SeriesCluster, Strictness, build_clusters};
use crate::normalize::{clean_title, explicit_key};
use crate::trace::GroupingTrace;

/// A series that already exists through explicit series keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedSeries {
    pub series_key: String,
    pub title: String,
    pub episode_count: usize,
}

/// Result of a Detect pass.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub already_grouped: Vec<GroupedSeries>,
    pub newly_detected: Vec<SeriesCluster>,
    pub trace: GroupingTrace,
}

impl DetectionReport {
    /// Items that Apply would write.
    pub fn detected_item_count(&self) -> usize {
        self.newly_detected
            .iter()
            .map(|s| s.pending_episodes().count())
            .sum()
    }
}

/// Scan a catalog snapshot for series.
pub fn detect(catalog: &[MediaItem]) -> DetectionReport {
    let already_grouped = summarize_grouped(catalog);

    let grouping = build_clusters(catalog, Strictness::Inferred);
    let mut trace = grouping.trace;
    let newly_detected = grouping
        .clusters
        .iter()
        .filter_map(|c| c.to_series(Strictness::Inferred, &mut trace))
        .collect();

    DetectionReport {
        already_grouped,
        newly_detected,
        trace,
    }
}

fn summarize_grouped(catalog: &[MediaItem]) -> Vec<GroupedSeries> {
    let mut out: Vec<GroupedSeries> = Vec::new();
    // Parallel to `out`: whether the title came from a stored series title.
    let mut titled: Vec<bool> = Vec::new();
    for item in catalog {
        let Some(raw) = item.series_key() else {
            continue;
        };
        let Some(key) = explicit_key(raw) else {
            continue;
        };
        match out.iter().position(|g| g.series_key == key) {
            Some(idx) => {
                out[idx].episode_count += 1;
                if let Some(title) = item.series_title() {
                    if !titled[idx] {
                        out[idx].title = title.to_string();
                        titled[idx] = true;
                    }
                }
            }
            None => {
                let title = match item.series_title() {
                    Some(title) => title.to_string(),
                    None => {
                        let cleaned = clean_title(&item.title, Strictness::ExplicitOnly);
                        if cleaned.to_lowercase() == key {
                            cleaned
                        } else {
                            raw.split_whitespace().collect::<Vec<_>>().join(" ")
                        }
                    }
                };
                titled.push(item.series_title().is_some());
                out.push(GroupedSeries {
                    series_key: key,
                    title,
                    episode_count: 1,
                });
            }
        }
    }
    out
}

/// One update per untagged member of every newly detected series.
pub fn update_commands(report: &DetectionReport) -> Vec<UpdateCommand> {
    report
        .newly_detected
        .iter()
        .flat_map(|series| {
            series.pending_episodes().map(move |ep| UpdateCommand {
                id: ep.descriptor.source_item_id.clone(),
                kind: MediaKind::Episodic,
                series_key: series.key.clone(),
                series_title: series.display_title.clone(),
                season: ep.descriptor.season_number,
                episode: ep.descriptor.episode_number,
            })
        })
        .collect()
}

/// Spacing between consecutive store writes.
#[derive(Debug, Clone, Copy)]
pub struct ApplyPacing {
    pub delay: Duration,
}

impl Default for ApplyPacing {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyFailure {
    pub item_id: String,
    pub error: String,
}

/// Tally of one Apply run. Failed items are not rolled back or retried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ApplyFailure>,
}

/// Send `commands` to `writer` sequentially, sleeping `pacing.delay` between
/// writes. A failed write is counted and the batch continues.
pub async fn apply(
    commands: &[UpdateCommand],
    writer: &dyn CatalogWriter,
    pacing: &ApplyPacing,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for (idx, command) in commands.iter().enumerate() {
        if idx > 0 && !pacing.delay.is_zero() {
            tokio::time::sleep(pacing.delay).await;
        }
        outcome.attempted += 1;
        match writer.apply_update(command).await {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                warn!(
                    store = writer.name(),
                    item_id = %command.id,
                    error = %e,
                    "series update failed"
                );
                outcome.failed += 1;
                outcome.failures.push(ApplyFailure {
                    item_id: command.id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        store = writer.name(),
        attempted = outcome.attempted,
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        "series reclassification applied"
    );
    outcome
}

/// Admin workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReclassifyPhase {
    Detected,
    Confirmed,
    Applied,
    Reported,
}

impl ReclassifyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "Detected",
            Self::Confirmed => "Confirmed",
            Self::Applied => "Applied",
            Self::Reported => "Reported",
        }
    }
}

impl std::fmt::Display for ReclassifyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReclassifyError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: ReclassifyPhase,
    },
}

/// Final report handed back to the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct ReclassifyReport {
    pub already_grouped: usize,
    pub newly_detected: usize,
    pub commands: usize,
    pub outcome: ApplyOutcome,
}

/// Drives one Detect/Confirm/Apply/Report cycle.
#[derive(Debug)]
pub struct ReclassifySession {
    phase: ReclassifyPhase,
    report: DetectionReport,
    commands: Vec<UpdateCommand>,
    outcome: Option<ApplyOutcome>,
}

impl ReclassifySession {
    pub fn detect(catalog: &[MediaItem]) -> Self {
        let report = detect(catalog);
        let commands = update_commands(&report);
        Self {
            phase: ReclassifyPhase::Detected,
            report,
            commands,
            outcome: None,
        }
    }

    pub fn phase(&self) -> ReclassifyPhase {
        self.phase
    }

    /// The detection preview shown before confirmation.
    pub fn preview(&self) -> &DetectionReport {
        &self.report
    }

    /// Accept the preview. Returns the commands that `apply` will send.
    pub fn confirm(&mut self) -> Result<&[UpdateCommand], ReclassifyError> {
        self.require(ReclassifyPhase::Detected, "confirm")?;
        self.phase = ReclassifyPhase::Confirmed;
        Ok(&self.commands)
    }

    pub async fn apply(
        &mut self,
        writer: &dyn CatalogWriter,
        pacing: &ApplyPacing,
    ) -> Result<&ApplyOutcome, ReclassifyError> {
        self.require(ReclassifyPhase::Confirmed, "apply")?;
        let outcome = apply(&self.commands, writer, pacing).await;
        self.phase = ReclassifyPhase::Applied;
        Ok(self.outcome.insert(outcome))
    }

    pub fn report(&mut self) -> Result<ReclassifyReport, ReclassifyError> {
        self.require(ReclassifyPhase::Applied, "report")?;
        self.phase = ReclassifyPhase::Reported;
        Ok(ReclassifyReport {
            already_grouped: self.report.already_grouped.len(),
            newly_detected: self.report.newly_detected.len(),
            commands: self.commands.len(),
            outcome: self.outcome.clone().unwrap_or_default(),
        })
    }

    fn require(
        &self,
        expected: ReclassifyPhase,
        action: &'static str,
    ) -> Result<(), ReclassifyError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ReclassifyError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }
}
