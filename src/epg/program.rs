//! Canonical program record handed to persistence and XMLTV export

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A single normalized TV program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    /// Upstream channel ID
    pub channel: String,
    pub progid: Option<String>,
    pub start: DateTime<Local>,
    pub stop: DateTime<Local>,
    /// Whole minutes of the upstream duration
    #[serde(rename = "length")]
    pub length_minutes: u64,
    pub title: String,
    pub subtitle: Option<String>,
    pub entity_type: Option<String>,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(rename = "short_desc")]
    pub short_description: String,
    pub video_quality: Option<String>,
    pub cc: bool,
    #[serde(rename = "live")]
    pub is_live: bool,
    pub finale: bool,
    pub premiere: bool,
    /// `YYYYMMDD`
    pub air_date: Option<String>,
    /// `YYYY/MM/DD`
    #[serde(rename = "formatted_date")]
    pub formatted_air_date: Option<String>,
    pub icon: Option<String>,
    pub rating: Option<String>,
    pub is_new: bool,
    pub genres: Option<Vec<String>>,
    pub directors: Option<Vec<String>>,
    pub actors: Option<Vec<String>>,
    pub season: Option<i64>,
    pub episode: Option<i64>,
    /// e.g. "S02E05"
    #[serde(rename = "se_common")]
    pub season_episode_label: Option<String>,
    /// Zero-based xmltv_ns form, e.g. "1.4.0/1"
    #[serde(rename = "se_xmltv_ns")]
    pub season_episode_ns_label: Option<String>,
    pub se_progid: Option<String>,
}

/// Episode numbering labels derived from a resolved season/episode pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeLabels {
    pub common: Option<String>,
    pub xmltv_ns: Option<String>,
    pub progid: Option<String>,
}

impl EpisodeLabels {
    pub fn derive(season: Option<i64>, episode: Option<i64>) -> Self {
        match (season, episode) {
            (Some(s), Some(e)) => Self {
                common: Some(format!("S{:02}E{:02}", s, e)),
                xmltv_ns: Some(format!("{}.{}.0/1", s.saturating_sub(1), e.saturating_sub(1))),
                progid: None,
            },
            (Some(s), None) => Self {
                common: Some(format!("S{:02}E{:02}", s, 0)),
                xmltv_ns: Some(format!("{}.0.0/1", s.saturating_sub(1))),
                progid: Some(String::new()),
            },
            // An episode without a season carries no label
            (None, _) => Self::default(),
        }
    }
}

/// Build the subtitle from the resolved numbering and the episode name.
/// A nameless episode has no subtitle at all, not a bare prefix.
pub fn subtitle(season: Option<i64>, episode: Option<i64>, name: Option<&str>) -> Option<String> {
    let name = name?;
    let prefix = match (season, episode) {
        (Some(s), e) => format!("S{:02}E{:02} ", s, e.unwrap_or(0)),
        (None, Some(e)) => format!("E{:02} ", e),
        (None, None) => String::new(),
    };
    Some(prefix + name)
}
