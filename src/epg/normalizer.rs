//! Timeline entry -> ProgramRecord conversion

use chrono::Local;

use super::program::{subtitle, EpisodeLabels, ProgramRecord};
use super::schedule::{EpisodeDetail, ImageRef, RawChannel, RawEpisode};
use crate::config::IconField;

/// Placeholder for programs without a description key
const NO_DESCRIPTION: &str = "Unavailable";
/// Placeholder for programs whose description is null or empty
const EMPTY_DESCRIPTION: &str = "Unavailable None";

/// Per-instance normalization settings
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub episode_adjustment: i64,
    pub icon_field: IconField,
}

/// Result of normalizing one timeline entry
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Program(Box<ProgramRecord>),
    /// Zero-duration filler
    Skip,
}

impl Normalized {
    pub fn into_program(self) -> Option<ProgramRecord> {
        match self {
            Normalized::Program(p) => Some(*p),
            Normalized::Skip => None,
        }
    }
}

pub fn normalize(channel: &RawChannel, entry: &RawEpisode, options: &NormalizeOptions) -> Normalized {
    let ep = &entry.episode;
    if ep.duration == 0 {
        return Normalized::Skip;
    }

    let description = describe(ep);
    let live = ep.live_broadcast.unwrap_or(false);
    let (season, episode) = resolve_numbering(ep, options.episode_adjustment);
    let labels = EpisodeLabels::derive(season, episode);

    Normalized::Program(Box::new(ProgramRecord {
        channel: channel.id.clone(),
        progid: None,
        start: entry.start.with_timezone(&Local),
        stop: entry.stop.with_timezone(&Local),
        length_minutes: ep.duration / 60_000,
        title: entry.title.clone(),
        subtitle: subtitle(season, episode, ep.name.as_deref()),
        entity_type: None,
        short_description: description.clone(),
        description,
        video_quality: None,
        cc: false,
        is_live: live,
        finale: false,
        premiere: false,
        air_date: ep.first_aired.map(|d| d.format("%Y%m%d").to_string()),
        formatted_air_date: ep.first_aired.map(|d| d.format("%Y/%m/%d").to_string()),
        icon: select_icon(ep, options.icon_field),
        rating: ep.rating.clone(),
        is_new: live,
        genres: split_genres(entry),
        directors: None,
        actors: None,
        season,
        episode,
        season_episode_label: labels.common,
        season_episode_ns_label: labels.xmltv_ns,
        se_progid: labels.progid,
    }))
}

fn describe(ep: &EpisodeDetail) -> String {
    match &ep.description {
        None => NO_DESCRIPTION.to_string(),
        Some(None) => EMPTY_DESCRIPTION.to_string(),
        Some(Some(text)) if text.is_empty() => EMPTY_DESCRIPTION.to_string(),
        Some(Some(text)) => text.clone(),
    }
}

/// Season 1 episode 1 is the upstream default and carries no information.
/// An adjusted number that overflows is treated as unnumbered.
fn resolve_numbering(ep: &EpisodeDetail, adjustment: i64) -> (Option<i64>, Option<i64>) {
    match (ep.season, ep.number) {
        (Some(1), Some(1)) => (None, None),
        (Some(season), Some(number)) => match number.checked_add(adjustment) {
            Some(episode) => (Some(season), Some(episode)),
            None => (None, None),
        },
        _ => (None, None),
    }
}

/// The guard looks at `genre` while the value comes from `genres`.
fn split_genres(entry: &RawEpisode) -> Option<Vec<String>> {
    entry.genre.as_ref()?;
    let genres = entry.genres.as_deref()?;
    Some(genres.split(" and ").map(|g| g.trim().to_string()).collect())
}

type IconRule = fn(&EpisodeDetail, IconField) -> Option<&ImageRef>;

/// Icon sources in precedence order
const ICON_RULES: [IconRule; 4] = [
    preferred_series_image,
    preferred_episode_image,
    series_featured_image,
    episode_poster,
];

fn preferred_series_image(ep: &EpisodeDetail, pref: IconField) -> Option<&ImageRef> {
    if pref != IconField::FeaturedImage {
        return None;
    }
    ep.series.as_ref()?.featured_image.as_ref()
}

fn preferred_episode_image(ep: &EpisodeDetail, pref: IconField) -> Option<&ImageRef> {
    match pref {
        IconField::FeaturedImage => ep.featured_image.as_ref(),
        IconField::Poster => ep.poster.as_ref(),
        IconField::Thumbnail => ep.thumbnail.as_ref(),
    }
}

fn series_featured_image(ep: &EpisodeDetail, _: IconField) -> Option<&ImageRef> {
    ep.series.as_ref()?.featured_image.as_ref()
}

fn episode_poster(ep: &EpisodeDetail, _: IconField) -> Option<&ImageRef> {
    ep.poster.as_ref()
}

/// First matching image wins, even when it carries no path.
pub fn select_icon(ep: &EpisodeDetail, pref: IconField) -> Option<String> {
    ICON_RULES
        .iter()
        .find_map(|rule| rule(ep, pref))
        .and_then(|image| image.path.clone())
}

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod tests;
