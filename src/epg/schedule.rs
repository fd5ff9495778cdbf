//! Upstream schedule document
//!
//! Shapes of the channel/timeline JSON returned by the schedule endpoint.
//! Every field the upstream may omit is an `Option`, so a document is
//! validated once here and the normalizer only inspects fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A channel and its timeline for one fetch window
#[derive(Debug, Clone, Deserialize)]
pub struct RawChannel {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub timelines: Vec<RawEpisode>,
}

/// One scheduled airing on a channel timeline
#[derive(Debug, Clone, Deserialize)]
pub struct RawEpisode {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub title: String,
    /// Only checked for presence; `Some(None)` when present but null
    #[serde(default, deserialize_with = "present")]
    pub genre: Option<Option<serde_json::Value>>,
    #[serde(default)]
    pub genres: Option<String>,
    pub episode: EpisodeDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeDetail {
    /// Milliseconds; zero marks a filler entry
    pub duration: u64,
    /// `None` when the key is absent, `Some(None)` when present but null
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub live_broadcast: Option<bool>,
    #[serde(default)]
    pub first_aired: Option<DateTime<Utc>>,
    #[serde(default)]
    pub season: Option<i64>,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub poster: Option<ImageRef>,
    #[serde(default)]
    pub featured_image: Option<ImageRef>,
    #[serde(default)]
    pub thumbnail: Option<ImageRef>,
    #[serde(default)]
    pub series: Option<SeriesRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRef {
    #[serde(default)]
    pub featured_image: Option<ImageRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub path: Option<String>,
}

/// Marks a key as present even when its value is null
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse a schedule document (a JSON array of channels)
pub fn parse_schedule(json: &str) -> Result<Vec<RawChannel>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_channel() {
        let json = r#"[{
            "_id": "5ad8d3a31b95267e225e4e09",
            "timelines": [{
                "start": "2024-01-15T12:00:00.000Z",
                "stop": "2024-01-15T12:30:00.000Z",
                "title": "Pilot",
                "episode": {"duration": 1800000}
            }]
        }]"#;

        let channels = parse_schedule(json).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "5ad8d3a31b95267e225e4e09");

        let entry = &channels[0].timelines[0];
        assert_eq!(entry.title, "Pilot");
        assert_eq!(entry.episode.duration, 1_800_000);
        assert!(entry.episode.description.is_none());
        assert!(entry.episode.series.is_none());
    }

    #[test]
    fn test_description_presence() {
        let parse = |episode: &str| -> EpisodeDetail { serde_json::from_str(episode).unwrap() };

        assert_eq!(parse(r#"{"duration": 1}"#).description, None);
        assert_eq!(parse(r#"{"duration": 1, "description": null}"#).description, Some(None));
        assert_eq!(
            parse(r#"{"duration": 1, "description": "x"}"#).description,
            Some(Some("x".to_string()))
        );
    }

    #[test]
    fn test_missing_timelines_is_empty() {
        let channels = parse_schedule(r#"[{"_id": "a"}]"#).unwrap();
        assert!(channels[0].timelines.is_empty());
    }

    #[test]
    fn test_mandatory_fields() {
        // bad instant
        assert!(parse_schedule(
            r#"[{"_id": "a", "timelines": [{"start": "yesterday", "stop": "2024-01-15T12:30:00Z",
                "title": "t", "episode": {"duration": 1}}]}]"#
        )
        .is_err());
        // no stop
        assert!(parse_schedule(
            r#"[{"_id": "a", "timelines": [{"start": "2024-01-15T12:00:00Z",
                "title": "t", "episode": {"duration": 1}}]}]"#
        )
        .is_err());
        // not an array
        assert!(parse_schedule(r#"{"error": "rate limited"}"#).is_err());
    }
}
