//! Submit a job and follow its deployment

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::errors::DeployError;
use crate::events::bus;
use crate::events::types::RawEvent;
use crate::http::client::MarathonClient;
use crate::http::deployments::JobSubmitter;
use crate::models::job::Job;
use crate::tracker::{track_deployment, Verdict};

/// Deploy `job` to Marathon and wait for the deployment's verdict
pub async fn run(options: &AppOptions, job: &Job) -> Result<Verdict, DeployError> {
    let marathon_url = options
        .marathon_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| DeployError::ConfigError("Marathon URL (-m) is required".to_string()))?;

    let client = MarathonClient::new(
        marathon_url,
        options.credentials.clone(),
        options.request_timeout,
    )?;
    info!("Using Marathon at {}", client.base_url());

    // Subscribe first so no event of the new deployment is missed
    let (raw_events, source_handle) = client.subscribe_events(&options.event_source).await?;

    let result = track_submission(&client, job, options, raw_events).await;

    source_handle.abort();
    result
}

/// Submit `job` through `submitter` and track the deployment it starts
/// against `raw_events`.
///
/// The deadline in `options.tracking_timeout` is raced against the tracker
/// here; the tracker itself only stops on a terminal event or a closed stream.
pub async fn track_submission<S>(
    submitter: &S,
    job: &Job,
    options: &AppOptions,
    raw_events: mpsc::Receiver<RawEvent>,
) -> Result<Verdict, DeployError>
where
    S: JobSubmitter + ?Sized,
{
    let (events, bus_handle) = bus::spawn(&options.event_bus, raw_events);

    let deployment_id = match submitter.submit(job, &options.submit).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to submit job {}: {}", job.id(), e);
            bus_handle.abort();
            return Err(e);
        }
    };

    let result = match options.tracking_timeout {
        Some(timeout) => {
            let tracked =
                tokio::time::timeout(timeout, track_deployment(&deployment_id, events)).await;
            tracked.map_err(|_| DeployError::TrackingTimedOut {
                deployment_id,
                timeout,
            })
        }
        None => Ok(track_deployment(&deployment_id, events).await),
    };

    bus_handle.abort();
    result
}
