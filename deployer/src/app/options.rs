//! Application configuration options

use std::time::Duration;

use crate::events::bus;
use crate::http::client::Credentials;
use crate::http::deployments::SubmitOptions;
use crate::http::events;
use crate::settings::Settings;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Marathon base URL. Required; there is no default.
    pub marathon_url: Option<String>,

    /// Basic auth credentials, if Marathon requires them
    pub credentials: Option<Credentials>,

    /// Timeout for regular API requests
    pub request_timeout: Duration,

    /// Give up tracking after this long. `None` waits for the event stream.
    pub tracking_timeout: Option<Duration>,

    /// Job submission options
    pub submit: SubmitOptions,

    /// Raw event source options
    pub event_source: events::Options,

    /// Event bus options
    pub event_bus: bus::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            marathon_url: None,
            credentials: None,
            request_timeout: Duration::from_secs(30),
            tracking_timeout: None,
            submit: SubmitOptions::default(),
            event_source: events::Options::default(),
            event_bus: bus::Options::default(),
        }
    }
}

impl AppOptions {
    /// Options described by a settings file
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        Self {
            marathon_url: settings.marathon.url.clone(),
            credentials: Credentials::from_parts(
                settings.marathon.user.clone(),
                settings.marathon.password.clone(),
            ),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            tracking_timeout: settings.timeout_secs.map(Duration::from_secs),
            submit: SubmitOptions {
                conflict_retry_delay: Duration::from_secs(settings.conflict_retry_secs),
                ..defaults.submit
            },
            event_source: events::Options {
                capacity: settings.queue_capacity,
            },
            event_bus: bus::Options {
                capacity: settings.queue_capacity,
            },
        }
    }
}
