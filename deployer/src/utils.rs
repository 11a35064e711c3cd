//! Utility functions

use std::future::Future;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Version information for the tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Fractional seconds, for display
pub fn duration_secs(duration: TimeDelta) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

/// Wait for a signal listener. A listener that fails to install logs a
/// warning and never resolves.
pub async fn await_signal<F>(listener: F, name: &str)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = listener.await {
        warn!("Unable to listen for {}: {}", name, e);
        std::future::pending::<()>().await;
    }
}
