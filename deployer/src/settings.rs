//! Settings file management

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::errors::DeployError;
use crate::logs::LogLevel;

/// Settings read from an optional JSON file. Command line flags take precedence.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs
    #[serde(default)]
    pub json_logs: bool,

    /// Marathon connection
    #[serde(default)]
    pub marathon: MarathonSettings,

    /// Depth of the raw and decoded event queues
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Seconds to wait before resubmitting a job locked by another deployment
    #[serde(default = "default_conflict_retry_secs")]
    pub conflict_retry_secs: u64,

    /// Timeout for regular API requests, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Give up tracking after this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_queue_capacity() -> usize {
    64
}

fn default_conflict_retry_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            marathon: MarathonSettings::default(),
            queue_capacity: default_queue_capacity(),
            conflict_retry_secs: default_conflict_retry_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            timeout_secs: None,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, DeployError> {
        let data = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Marathon connection settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarathonSettings {
    /// Marathon base URL
    #[serde(default)]
    pub url: Option<String>,

    /// Username for basic auth
    #[serde(default)]
    pub user: Option<String>,

    /// Password for basic auth
    #[serde(default)]
    pub password: Option<SecretString>,
}
