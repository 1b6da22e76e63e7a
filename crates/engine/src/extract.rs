use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Which pattern family produced an episode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    SeasonEpisodeCode,
    SeasonEpisodeWords,
    EpisodeOnly,
}

/// Season/episode pair parsed from a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedEpisode {
    pub season: u32,
    pub episode: u32,
    pub family: PatternFamily,
}

// S01E02, s1e3, S01.E04, S1 E2
static RE_SXXEXX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])S(\d{1,3})[ ._-]?E(\d{1,4})").unwrap()
});

// "Season X Episode Y"
static RE_SEASON_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])Season[ ._-]*(\d{1,3})[ ._-]*Episode[ ._-]*(\d{1,4})").unwrap()
});

// "Ep 3", "Episode 12", "EP.04"
static RE_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])(?:Episode|Ep)\.?[ ._-]*(\d{1,4})").unwrap()
});

/// Parse season/episode numbers from a raw title.
///
/// Families are tried in priority order and the first match wins. `None`
/// means the caller should fall back to ordinal numbering.
pub fn extract_episode(title: &str) -> Option<ParsedEpisode> {
    try_two_numbers(&RE_SXXEXX, title, PatternFamily::SeasonEpisodeCode)
        .or_else(|| try_two_numbers(&RE_SEASON_EPISODE, title, PatternFamily::SeasonEpisodeWords))
        .or_else(|| try_episode_only(title))
}

/// True when any pattern family matches the title.
pub fn has_episode_marker(title: &str) -> bool {
    extract_episode(title).is_some()
}

fn try_two_numbers(re: &Regex, title: &str, family: PatternFamily) -> Option<ParsedEpisode> {
    let caps = re.captures(title)?;
    let season: u32 = caps[1].parse().ok()?;
    let episode: u32 = caps[2].parse().ok()?;
    Some(ParsedEpisode {
        season,
        episode,
        family,
    })
}

fn try_episode_only(title: &str) -> Option<ParsedEpisode> {
    let caps = RE_EPISODE.captures(title)?;
    let episode: u32 = caps[1].parse().ok()?;
    Some(ParsedEpisode {
        season: 1,
        episode,
        family: PatternFamily::EpisodeOnly,
    })
}
