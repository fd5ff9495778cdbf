//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EpgError, Result};

/// Episode image field preferred for program icons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IconField {
    #[default]
    #[serde(rename = "featuredImage")]
    FeaturedImage,
    #[serde(rename = "poster")]
    Poster,
    #[serde(rename = "thumbnail")]
    Thumbnail,
}

/// Per-instance EPG settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    #[serde(default = "default_true")]
    pub epg_enabled: bool,
    /// Added to every upstream episode number
    #[serde(default)]
    pub epg_episode_adjustment: i64,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            epg_enabled: true,
            epg_episode_adjustment: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_source_name")]
    pub source_name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    // Minimum seconds between two refreshes of the same instance
    #[serde(default = "default_min_refresh_rate")]
    pub epg_min_refresh_rate: i64,
    #[serde(default)]
    pub program_thumbnail: IconField,
    #[serde(default)]
    pub store_path: Option<String>,
    #[serde(default = "default_instances")]
    pub instances: BTreeMap<String, InstanceConfig>,
}

fn default_source_name() -> String { "PlutoTV".to_string() }
fn default_base_url() -> String { "https://api.pluto.tv/v2/channels".to_string() }
fn default_user_agent() -> String { "PlutoTvEpg/0.1".to_string() }
fn default_connect_timeout() -> u64 { 30 }
fn default_read_timeout() -> u64 { 120 }
fn default_min_refresh_rate() -> i64 { 4 * 3600 }
fn default_true() -> bool { true }
fn default_instances() -> BTreeMap<String, InstanceConfig> {
    let mut instances = BTreeMap::new();
    instances.insert("default".to_string(), InstanceConfig::default());
    instances
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_name: default_source_name(),
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            connect_timeout_secs: 30,
            read_timeout_secs: 120,
            epg_min_refresh_rate: 4 * 3600,
            program_thumbnail: IconField::FeaturedImage,
            store_path: None,
            instances: default_instances(),
        }
    }
}

impl AppConfig {
    fn app_dir(base: Option<PathBuf>) -> PathBuf {
        let mut path = base.unwrap_or_else(|| PathBuf::from("."));
        path.push("plutotv_epg");
        fs::create_dir_all(&path).ok();
        path
    }

    pub fn config_path() -> PathBuf {
        let mut path = Self::app_dir(dirs::config_dir());
        path.push("config.json");
        path
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(config) = serde_json::from_str(&content) {
                    return config;
                }
            }
        }

        Self::default()
    }

    /// Load from an explicit path. Unlike `load`, failures are reported.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_err = |reason: String| EpgError::Config {
            path: path.display().to_string(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| config_err(e.to_string()))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path();
        let config_err = |reason: String| EpgError::Config {
            path: path.display().to_string(),
            reason,
        };
        let content = serde_json::to_string_pretty(self).map_err(|e| config_err(e.to_string()))?;
        fs::write(&path, content).map_err(|e| config_err(e.to_string()))?;
        Ok(path)
    }

    pub fn instance(&self, name: &str) -> Result<&InstanceConfig> {
        self.instances.get(name).ok_or_else(|| {
            EpgError::ConfigMissing(format!(
                "no [{}] instance configured for {}",
                name, self.source_name
            ))
        })
    }

    pub fn store_path(&self) -> PathBuf {
        match &self.store_path {
            Some(p) => PathBuf::from(p),
            None => {
                let mut path = Self::app_dir(dirs::data_dir());
                path.push("epg.json");
                path
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config: AppConfig = serde_json::from_str(r#"{"epg_min_refresh_rate": 600}"#).unwrap();
        assert_eq!(config.epg_min_refresh_rate, 600);
        assert_eq!(config.source_name, "PlutoTV");
        assert_eq!(config.program_thumbnail, IconField::FeaturedImage);
        assert!(config.instances.contains_key("default"));
    }

    #[test]
    fn test_instance_section() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "program_thumbnail": "poster",
                "instances": {"east": {"epg_enabled": false, "epg_episode_adjustment": -1}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.program_thumbnail, IconField::Poster);

        let east = config.instance("east").unwrap();
        assert!(!east.epg_enabled);
        assert_eq!(east.epg_episode_adjustment, -1);

        assert!(matches!(config.instance("default"), Err(EpgError::ConfigMissing(_))));
    }

    #[test]
    fn test_load_from_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(matches!(AppConfig::load_from(&path), Err(EpgError::Config { .. })));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(EpgError::Config { .. })));

        fs::write(&path, r#"{"source_name": "Test"}"#).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().source_name, "Test");
    }
}
