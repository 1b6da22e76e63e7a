//! Title normalization.
//!
//! A title is reduced to a grouping key by an ordered list of regex
//! substitutions. Order is significant: the explicit `S01.E04.` prefix must be
//! consumed before the generic code and subtitle rules see the title, and the
//! subtitle cut must run before separator cleanup.

use regex::Regex;
use std::sync::LazyLock;

use crate::cluster::Strictness;

/// Keys shorter than this are not series evidence.
pub const MIN_KEY_CHARS: usize = 2;

/// Upper bound for re-applying a rule whose matches can overlap.
const MAX_PASSES: usize = 8;

/// One named step of the normalization pipeline.
#[derive(Debug)]
pub struct SubstitutionRule {
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
    /// Re-apply until stable; needed when adjacent matches share a separator.
    repeat: bool,
}

impl SubstitutionRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            replacement,
            repeat: false,
        }
    }

    fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Apply this rule alone.
    pub fn apply(&self, input: &str) -> String {
        let mut out = self.pattern.replace_all(input, self.replacement).into_owned();
        if self.repeat {
            for _ in 0..MAX_PASSES {
                let next = self.pattern.replace_all(&out, self.replacement).into_owned();
                if next == out {
                    break;
                }
                out = next;
            }
        }
        out
    }
}

// "(^|[^a-z0-9])" stands in for a word boundary that also accepts '_'.
static PIPELINE: LazyLock<Vec<SubstitutionRule>> = LazyLock::new(|| {
    vec![
        SubstitutionRule::new("leading_code", r"(?i)^\s*S\d{1,3}\.E\d{1,4}\.?", ""),
        SubstitutionRule::new(
            "sxxexx",
            r"(?i)(^|[^a-z0-9])S\d{1,3}[ ._-]?E\d{1,4}",
            "${1} ",
        ),
        SubstitutionRule::new(
            "season_episode",
            r"(?i)(^|[^a-z0-9])Season[ ._-]*\d{1,3}[ ._-]*Episode[ ._-]*\d{1,4}",
            "${1} ",
        ),
        SubstitutionRule::new("season_only", r"(?i)(^|[^a-z0-9])Season[ ._-]*\d{1,3}", "${1} "),
        SubstitutionRule::new(
            "episode_number",
            r"(?i)(^|[^a-z0-9])(?:Episode|Ep)\.?[ ._-]*\d{1,4}",
            "${1} ",
        ),
        SubstitutionRule::new("trailing_episode", r"(?i)(^|[^a-z0-9])Episode[ ._-]*$", "${1}"),
        SubstitutionRule::new("subtitle", r"(?:\s-\s|:).*$", ""),
        SubstitutionRule::new(
            "quality",
            r"(?i)(^|[^a-z0-9])(?:2160p|1080p|720p|576p|480p|360p|4k|uhd|hdrip|hdr|x264|x265|h\.?264|h\.?265|hevc|web-?dl|webrip|blu-?ray|brrip|bdrip|dvdrip|hdtv)(?:[^a-z0-9]|$)",
            " ",
        )
        .repeating(),
        SubstitutionRule::new("paren_year", r"\(\s*(?:19|20)\d{2}\s*\)", " "),
        SubstitutionRule::new("empty_brackets", r"[\(\[]\s*[\)\]]", " "),
        SubstitutionRule::new("underscores", r"_", " "),
        SubstitutionRule::new("dot_separators", r"(?i)([a-z0-9])\.([a-z0-9])", "${1} ${2}")
            .repeating(),
        SubstitutionRule::new("repeated_dots", r"\.{2,}", "."),
        SubstitutionRule::new("repeated_dashes", r"-{2,}", "-"),
        SubstitutionRule::new("whitespace", r"\s+", " "),
        SubstitutionRule::new("edge_separators", r"^[\s.\-]+|[\s.\-]+$", ""),
    ]
});

// Inferred grouping only: "Hostage 2" joins "Hostage".
static TRAILING_NUMBER: LazyLock<SubstitutionRule> =
    LazyLock::new(|| SubstitutionRule::new("trailing_number", r"\s+\d{1,4}$", ""));

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// The ordered pipeline shared by both strictness levels.
pub fn pipeline() -> &'static [SubstitutionRule] {
    &PIPELINE
}

/// Look up a single rule by name, including `trailing_number`.
pub fn rule(name: &str) -> Option<&'static SubstitutionRule> {
    if name == TRAILING_NUMBER.name {
        return Some(&TRAILING_NUMBER);
    }
    PIPELINE.iter().find(|r| r.name == name)
}

/// Run the pipeline without lowercasing. Used for derived display titles.
pub fn clean_title(title: &str, strictness: Strictness) -> String {
    let mut out = PIPELINE
        .iter()
        .fold(title.to_string(), |acc, rule| rule.apply(&acc));
    if strictness == Strictness::Inferred {
        out = TRAILING_NUMBER.apply(&out);
    }
    out.trim().to_string()
}

/// Canonical comparison key for a title, possibly empty.
pub fn normalize_title(title: &str, strictness: Strictness) -> String {
    clean_title(title, strictness).to_lowercase()
}

/// Grouping key for a title, or `None` when the title is not series evidence.
pub fn canonical_key(title: &str, strictness: Strictness) -> Option<String> {
    let key = normalize_title(title, strictness);
    if key.chars().count() < MIN_KEY_CHARS {
        None
    } else {
        Some(key)
    }
}

/// Key for an explicit series key already stored on an item.
///
/// Only case and whitespace are folded, so keys written by reclassification
/// map back to themselves.
pub fn explicit_key(raw: &str) -> Option<String> {
    let key = RE_WHITESPACE.replace_all(raw.trim(), " ").to_lowercase();
    if key.is_empty() { None } else { Some(key) }
}
