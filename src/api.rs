//! Pluto TV schedule API client

use std::time::Duration;

use crate::config::AppConfig;
use crate::epg::schedule::{parse_schedule, RawChannel};
use crate::epg::{FetchWindow, ScheduleSource};
use crate::error::{EpgError, Result};

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds
    pub read_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ClientConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            connect_timeout_secs: config.connect_timeout_secs,
            read_timeout_secs: config.read_timeout_secs,
        }
    }
}

pub struct PlutoClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl PlutoClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.read_timeout_secs)))
            .timeout_connect(Some(Duration::from_secs(config.connect_timeout_secs)))
            .max_idle_connections(2)
            .max_idle_connections_per_host(2)
            .build()
            .new_agent();
        Self { agent, config }
    }

    pub fn schedule_url(&self, window: &FetchWindow) -> String {
        format!(
            "{}?start={}&stop={}",
            self.config.base_url,
            window.query_start(),
            window.query_stop()
        )
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", &self.config.user_agent)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| EpgError::Fetch(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EpgError::Fetch(format!("HTTP error: {}", status)));
        }

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| EpgError::Fetch(format!("Read failed: {}", e)))
    }
}

impl ScheduleSource for PlutoClient {
    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawChannel>> {
        let url = self.schedule_url(window);
        tracing::debug!("GET {}", url);
        let body = self.get_text(&url)?;
        Ok(parse_schedule(&body)?)
    }
}
