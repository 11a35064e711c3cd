//! Error types for the deployment tool

use thiserror::Error;

/// Main error type for submitting and following a deployment
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Unexpected response from Marathon. HTTP status: {status}, message: {body}")]
    UnexpectedStatus { status: reqwest::StatusCode, body: String },

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("No deployment ID detected in response")]
    MissingDeploymentId,

    #[error("Gave up tracking deployment {deployment_id} after {timeout:?}")]
    TrackingTimedOut {
        deployment_id: String,
        timeout: std::time::Duration,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
