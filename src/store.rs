//! JSON-file program store

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::epg::{ProgramRecord, ProgramStore};
use crate::error::{EpgError, Result};

/// Days before yesterday are stale
const KEEP_DAYS: i64 = 1;

/// Programs saved for one (source, instance, day)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEntry {
    pub source: String,
    pub instance: String,
    pub day: NaiveDate,
    pub last_update: DateTime<Utc>,
    pub programs: Vec<ProgramRecord>,
}

impl DayEntry {
    fn is_for(&self, source: &str, instance: &str) -> bool {
        self.source == source && self.instance == instance
    }
}

/// In-memory store, also the serialized form of `JsonStore`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pub days: Vec<DayEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn delete_before(&mut self, source: &str, instance: &str, cutoff: NaiveDate) -> usize {
        let before = self.days.len();
        self.days.retain(|d| !(d.is_for(source, instance) && d.day < cutoff));
        before - self.days.len()
    }
}

impl ProgramStore for MemoryStore {
    fn get_last_refresh(&self, source: &str, instance: &str, as_of: NaiveDate) -> Option<DateTime<Utc>> {
        self.days
            .iter()
            .find(|d| d.is_for(source, instance) && d.day == as_of)
            .map(|d| d.last_update)
    }

    fn delete_stale_programs(&mut self, source: &str, instance: &str) -> Result<()> {
        let cutoff = Utc::now().date_naive() - Duration::days(KEEP_DAYS);
        let removed = self.delete_before(source, instance, cutoff);
        if removed > 0 {
            debug!("Deleted {} stale day(s) for {} {}", removed, source, instance);
        }
        Ok(())
    }

    fn save_programs(
        &mut self,
        source: &str,
        instance: &str,
        day: NaiveDate,
        programs: Vec<ProgramRecord>,
    ) -> Result<()> {
        self.days.retain(|d| !(d.is_for(source, instance) && d.day == day));
        self.days.push(DayEntry {
            source: source.to_string(),
            instance: instance.to_string(),
            day,
            last_update: Utc::now(),
            programs,
        });
        self.days.sort_by_key(|d| d.day);
        Ok(())
    }

    fn programs(&self, source: &str, instance: &str) -> Vec<ProgramRecord> {
        self.days
            .iter()
            .filter(|d| d.is_for(source, instance))
            .flat_map(|d| d.programs.iter().cloned())
            .collect()
    }
}

/// `MemoryStore` persisted to a JSON file after every change
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| EpgError::Store(format!("Read {} failed: {}", path.display(), e)))?;
            serde_json::from_str(&content)
                .map_err(|e| EpgError::Store(format!("Corrupt store {}: {}", path.display(), e)))?
        } else {
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.inner)
            .map_err(|e| EpgError::Store(format!("Serialize failed: {}", e)))?;
        fs::write(&self.path, content)
            .map_err(|e| EpgError::Store(format!("Write {} failed: {}", self.path.display(), e)))
    }
}

impl ProgramStore for JsonStore {
    fn get_last_refresh(&self, source: &str, instance: &str, as_of: NaiveDate) -> Option<DateTime<Utc>> {
        self.inner.get_last_refresh(source, instance, as_of)
    }

    fn delete_stale_programs(&mut self, source: &str, instance: &str) -> Result<()> {
        self.inner.delete_stale_programs(source, instance)?;
        self.flush()
    }

    fn save_programs(
        &mut self,
        source: &str,
        instance: &str,
        day: NaiveDate,
        programs: Vec<ProgramRecord>,
    ) -> Result<()> {
        self.inner.save_programs(source, instance, day, programs)?;
        self.flush()
    }

    fn programs(&self, source: &str, instance: &str) -> Vec<ProgramRecord> {
        self.inner.programs(source, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn record(channel: &str) -> ProgramRecord {
        let start = Utc::now().with_timezone(&Local);
        ProgramRecord {
            channel: channel.to_string(),
            progid: None,
            start,
            stop: start + Duration::minutes(30),
            length_minutes: 30,
            title: "News".to_string(),
            subtitle: None,
            entity_type: None,
            description: "Unavailable".to_string(),
            short_description: "Unavailable".to_string(),
            video_quality: None,
            cc: false,
            is_live: false,
            finale: false,
            premiere: false,
            air_date: None,
            formatted_air_date: None,
            icon: None,
            rating: None,
            is_new: false,
            genres: None,
            directors: None,
            actors: None,
            season: None,
            episode: None,
            season_episode_label: None,
            season_episode_ns_label: None,
            se_progid: None,
        }
    }

    #[test]
    fn test_save_replaces_day() {
        let mut store = MemoryStore::new();
        let today = Utc::now().date_naive();
        assert!(store.get_last_refresh("PlutoTV", "default", today).is_none());

        store.save_programs("PlutoTV", "default", today, vec![record("a"), record("b")]).unwrap();
        store.save_programs("PlutoTV", "default", today, vec![record("c")]).unwrap();

        let programs = store.programs("PlutoTV", "default");
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].channel, "c");
        assert!(store.get_last_refresh("PlutoTV", "default", today).is_some());
        assert!(store.get_last_refresh("PlutoTV", "other", today).is_none());
    }

    #[test]
    fn test_delete_stale_keeps_yesterday() {
        let mut store = MemoryStore::new();
        let today = Utc::now().date_naive();
        for offset in 0..4 {
            let day = today - Duration::days(offset);
            store.save_programs("PlutoTV", "default", day, vec![record("a")]).unwrap();
            store.save_programs("PlutoTV", "east", day, vec![record("a")]).unwrap();
        }

        store.delete_stale_programs("PlutoTV", "default").unwrap();

        let days: Vec<_> = store
            .days
            .iter()
            .filter(|d| d.instance == "default")
            .map(|d| d.day)
            .collect();
        assert_eq!(days, vec![today - Duration::days(1), today]);
        assert_eq!(store.days.iter().filter(|d| d.instance == "east").count(), 4);
    }

    #[test]
    fn test_json_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epg.json");
        let today = Utc::now().date_naive();

        let mut store = JsonStore::open(&path).unwrap();
        assert!(store.programs("PlutoTV", "default").is_empty());
        store.save_programs("PlutoTV", "default", today, vec![record("a")]).unwrap();
        assert!(path.exists());

        let reopened = JsonStore::open(&path).unwrap();
        let programs = reopened.programs("PlutoTV", "default");
        assert_eq!(programs, vec![store.programs("PlutoTV", "default")[0].clone()]);
        assert!(reopened.get_last_refresh("PlutoTV", "default", today).is_some());
    }

    #[test]
    fn test_json_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epg.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonStore::open(&path), Err(EpgError::Store(_))));
    }
}
