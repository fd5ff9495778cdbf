//! Error types for schedule ingestion

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EpgError {
    /// Transport failure or non-2xx response from the schedule endpoint
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Malformed schedule document or missing mandatory field
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Invalid configuration {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EpgError>;
