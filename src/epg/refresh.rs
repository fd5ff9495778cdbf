//! Refresh throttling and the fetch -> normalize -> save cycle

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info, info_span, Span};

use super::normalizer::{normalize, NormalizeOptions};
use super::program::ProgramRecord;
use super::schedule::RawChannel;
use super::window::{plan, FetchWindow};
use crate::config::AppConfig;
use crate::error::Result;

/// Retrieves the raw schedule for one window
pub trait ScheduleSource {
    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawChannel>>;
}

/// Persisted program lists and their refresh timestamps
pub trait ProgramStore {
    fn get_last_refresh(&self, source: &str, instance: &str, as_of: NaiveDate) -> Option<DateTime<Utc>>;
    fn delete_stale_programs(&mut self, source: &str, instance: &str) -> Result<()>;
    /// Replace the stored programs for `day`
    fn save_programs(
        &mut self,
        source: &str,
        instance: &str,
        day: NaiveDate,
        programs: Vec<ProgramRecord>,
    ) -> Result<()>;
    /// All stored programs for an instance, ordered by day
    fn programs(&self, source: &str, instance: &str) -> Vec<ProgramRecord>;
}

/// A refresh is allowed when none happened yet or the last one is older
/// than `min_interval_secs`. An interval reaching past the representable
/// range is never due (or always due when negative).
pub fn should_refresh(last_refresh: Option<DateTime<Utc>>, min_interval_secs: i64, now: DateTime<Utc>) -> bool {
    let Some(last) = last_refresh else {
        return true;
    };
    match Duration::try_seconds(min_interval_secs).and_then(|d| now.checked_sub_signed(d)) {
        Some(cutoff) => last < cutoff,
        None => min_interval_secs < 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    NotDue,
    Disabled,
    /// Saved program count per day
    Refreshed(Vec<(NaiveDate, usize)>),
}

/// Drives refresh cycles for one source
pub struct Refresher<S, P> {
    config: AppConfig,
    source: S,
    store: P,
    span: Span,
}

impl<S: ScheduleSource, P: ProgramStore> Refresher<S, P> {
    pub fn new(config: AppConfig, source: S, store: P) -> Self {
        let span = info_span!("epg_refresh", source = %config.source_name);
        Self { config, source, store, span }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn refresh(&mut self, instance: &str) -> Result<RefreshOutcome> {
        self.refresh_at(instance, Utc::now())
    }

    pub fn refresh_at(&mut self, instance: &str, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        let span = self.span.clone();
        let _entered = span.enter();

        let settings = self.config.instance(instance)?.clone();
        let name = self.config.source_name.clone();

        let last = self.store.get_last_refresh(&name, instance, now.date_naive());
        if !should_refresh(last, self.config.epg_min_refresh_rate, now) {
            debug!("EPG still new for {} {}, not refreshing", name, instance);
            return Ok(RefreshOutcome::NotDue);
        }
        if !settings.epg_enabled {
            debug!("EPG collection not enabled for {} {}", name, instance);
            return Ok(RefreshOutcome::Disabled);
        }

        self.store.delete_stale_programs(&name, instance)?;

        // Every window must succeed before anything is saved
        let mut documents = Vec::new();
        for window in plan(now) {
            debug!("Fetching {} {} .. {}", instance, window.query_start(), window.query_stop());
            documents.push((window.day, self.source.fetch(&window)?));
        }

        let options = NormalizeOptions {
            episode_adjustment: settings.epg_episode_adjustment,
            icon_field: self.config.program_thumbnail,
        };

        let mut saved = Vec::with_capacity(documents.len());
        for (day, channels) in documents {
            let programs = day_programs(&channels, &options);
            let count = programs.len();
            self.store.save_programs(&name, instance, day, programs)?;
            debug!("Refreshing EPG data for {}:{} day {}", name, instance, day);
            saved.push((day, count));
        }

        info!(
            "Refreshed {} {}: {} programs over {} day(s)",
            name,
            instance,
            saved.iter().map(|(_, n)| n).sum::<usize>(),
            saved.len()
        );
        Ok(RefreshOutcome::Refreshed(saved))
    }
}

fn day_programs(channels: &[RawChannel], options: &NormalizeOptions) -> Vec<ProgramRecord> {
    channels
        .iter()
        .flat_map(|ch| ch.timelines.iter().map(move |entry| (ch, entry)))
        .filter_map(|(ch, entry)| normalize(ch, entry, options).into_program())
        .collect()
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
