//! Marathon job definitions

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// An app or group definition as submitted to Marathon.
///
/// Kept as raw JSON: the tool only looks at `id` and at whether the
/// definition describes a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(serde_json::Map<String, serde_json::Value>);

impl Job {
    /// Parse and validate a job definition
    pub fn from_slice(data: &[u8]) -> Result<Self, DeployError> {
        let job: Job = serde_json::from_slice(data)?;
        match job.0.get("id") {
            Some(serde_json::Value::String(id)) if !id.is_empty() => Ok(job),
            Some(_) => Err(DeployError::InvalidJob("id must be a non-empty string".to_string())),
            None => Err(DeployError::InvalidJob("missing id".to_string())),
        }
    }

    /// Whether this job describes a group rather than a single app
    pub fn is_group(&self) -> bool {
        self.0.contains_key("groups") || self.0.contains_key("apps")
    }

    /// Absolute Marathon path of the job
    pub fn id(&self) -> String {
        let id = self.0.get("id").and_then(|v| v.as_str()).unwrap_or_default();
        if id.starts_with('/') {
            id.to_string()
        } else {
            format!("/{}", id)
        }
    }

    /// Body to send to Marathon
    pub fn to_vec(&self) -> Result<Vec<u8>, DeployError> {
        Ok(serde_json::to_vec(self)?)
    }
}
