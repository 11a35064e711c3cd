//! Job submission

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::DeployError;
use crate::http::client::{unexpected_status, MarathonClient};
use crate::models::job::Job;

pub const APP_PATH: &str = "/v2/apps";
pub const GROUP_PATH: &str = "/v2/groups";

/// Submission options
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Override a deployment already holding the job
    pub force: bool,

    /// Wait between attempts while another deployment holds the job
    pub conflict_retry_delay: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            force: false,
            conflict_retry_delay: Duration::from_secs(30),
        }
    }
}

/// Submits a job and returns the id of the deployment it started
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, job: &Job, options: &SubmitOptions) -> Result<String, DeployError>;
}

/// Marathon answers app and group changes with different shapes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    #[serde(default)]
    pub deployment_id: Option<String>,

    #[serde(default)]
    pub deployments: Vec<DeploymentRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentRef {
    pub id: String,
}

impl SubmitResponse {
    pub fn into_deployment_id(self) -> Option<String> {
        self.deployment_id
            .filter(|id| !id.is_empty())
            .or_else(|| self.deployments.into_iter().next().map(|d| d.id))
    }
}

#[async_trait]
impl JobSubmitter for MarathonClient {
    async fn submit(&self, job: &Job, options: &SubmitOptions) -> Result<String, DeployError> {
        let collection = if job.is_group() { GROUP_PATH } else { APP_PATH };
        let job_id = job.id();

        // Existing job means update, missing job means create
        let existing = self.url(&format!("{}{}", collection, job_id));
        let response = self.api_request(Method::GET, existing.clone()).send().await?;
        let (method, mut target) = match response.status() {
            StatusCode::OK => {
                info!(job_id = %job_id, "Existing job found, updating");
                (Method::PUT, existing)
            }
            StatusCode::NOT_FOUND => {
                info!(job_id = %job_id, "Creating new job");
                (Method::POST, self.url(collection))
            }
            _ => return Err(unexpected_status(response).await),
        };

        if method == Method::PUT && options.force {
            target.query_pairs_mut().append_pair("force", "true");
        }

        let body = job.to_vec()?;
        let response = loop {
            let response = self
                .api_request(method.clone(), target.clone())
                .body(body.clone())
                .send()
                .await?;

            if response.status() == StatusCode::CONFLICT && !options.force {
                warn!(
                    job_id = %job_id,
                    "Job is locked by another deployment, retrying in {:?}",
                    options.conflict_retry_delay
                );
                tokio::time::sleep(options.conflict_retry_delay).await;
                continue;
            }
            break response;
        };

        if !response.status().is_success() {
            return Err(unexpected_status(response).await);
        }

        let parsed: SubmitResponse = response.json().await?;
        let deployment_id = parsed
            .into_deployment_id()
            .ok_or(DeployError::MissingDeploymentId)?;

        info!(job_id = %job_id, deployment_id = %deployment_id, "Job submitted");
        Ok(deployment_id)
    }
}
