//! Submission plus tracking, against a scripted submitter

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mdeploy::app::options::AppOptions;
use mdeploy::app::run::{run, track_submission};
use mdeploy::errors::DeployError;
use mdeploy::events::RawEvent;
use mdeploy::http::deployments::{JobSubmitter, SubmitOptions};
use mdeploy::models::job::Job;
use mdeploy::tracker::Verdict;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

use crate::fixtures::*;

struct ScriptedSubmitter {
    deployment_id: Option<&'static str>,
    calls: AtomicUsize,
}

impl ScriptedSubmitter {
    fn accepting(deployment_id: &'static str) -> Self {
        Self {
            deployment_id: Some(deployment_id),
            calls: AtomicUsize::new(0),
        }
    }

    fn rejecting() -> Self {
        Self {
            deployment_id: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JobSubmitter for ScriptedSubmitter {
    async fn submit(&self, _job: &Job, _options: &SubmitOptions) -> Result<String, DeployError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.deployment_id
            .map(str::to_string)
            .ok_or(DeployError::MissingDeploymentId)
    }
}

fn job() -> Job {
    assert_ok!(Job::from_slice(br#"{"id":"/my-app","instances":2}"#))
}

async fn stream(raws: Vec<RawEvent>) -> (mpsc::Sender<RawEvent>, mpsc::Receiver<RawEvent>) {
    let (tx, rx) = mpsc::channel(raws.len().max(1));
    for raw in raws {
        tx.send(raw).await.unwrap();
    }
    (tx, rx)
}

#[tokio::test]
async fn test_submission_is_tracked_to_success() {
    let submitter = ScriptedSubmitter::accepting(DEPLOYMENT_ID);
    let (tx, rx) = stream(vec![
        deployment_info(DEPLOYMENT_ID, APP, T0),
        malformed(),
        unhandled(),
        step_success(DEPLOYMENT_ID, APP),
        deployment_success(DEPLOYMENT_ID, T1),
    ])
    .await;

    let verdict = assert_ok!(track_submission(&submitter, &job(), &AppOptions::default(), rx).await);
    assert!(verdict.is_success());
    assert_eq!(verdict.duration().unwrap().num_milliseconds(), 92_500);
    assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
    drop(tx);
}

#[tokio::test]
async fn test_tracking_follows_the_submitted_deployment_only() {
    let submitter = ScriptedSubmitter::accepting(DEPLOYMENT_ID);
    let (tx, rx) = stream(vec![
        deployment_info(OTHER_DEPLOYMENT_ID, OTHER_APP, T0),
        deployment_failed(OTHER_DEPLOYMENT_ID, T_MID),
        deployment_info(DEPLOYMENT_ID, APP, T0),
        step_failure(DEPLOYMENT_ID, APP, "ScaleApplication"),
        deployment_failed(DEPLOYMENT_ID, T1),
    ])
    .await;

    let verdict = assert_ok!(track_submission(&submitter, &job(), &AppOptions::default(), rx).await);
    match verdict {
        Verdict::Failed { failures, .. } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(
                failures.to_string(),
                "Failure reason(s):\nApplication: /my-app\nAction: ScaleApplication"
            );
        }
        other => panic!("expected failure, got {:?}", other),
    }
    drop(tx);
}

#[tokio::test]
async fn test_closed_stream_is_reported_as_exhausted() {
    let submitter = ScriptedSubmitter::accepting(DEPLOYMENT_ID);
    let (tx, rx) = stream(vec![deployment_info(DEPLOYMENT_ID, APP, T0)]).await;
    drop(tx);

    let verdict = assert_ok!(track_submission(&submitter, &job(), &AppOptions::default(), rx).await);
    assert_eq!(verdict, Verdict::StreamExhausted);
}

#[tokio::test]
async fn test_submission_error_is_returned() {
    let submitter = ScriptedSubmitter::rejecting();
    let (_tx, rx) = stream(Vec::new()).await;

    let err = assert_err!(track_submission(&submitter, &job(), &AppOptions::default(), rx).await);
    assert!(matches!(err, DeployError::MissingDeploymentId));
}

#[tokio::test]
async fn test_tracking_timeout() {
    let submitter = ScriptedSubmitter::accepting(DEPLOYMENT_ID);
    // Stream stays open without a terminal event
    let (_tx, rx) = stream(vec![deployment_info(DEPLOYMENT_ID, APP, T0)]).await;

    let options = AppOptions {
        tracking_timeout: Some(Duration::from_millis(50)),
        ..AppOptions::default()
    };

    let err = assert_err!(track_submission(&submitter, &job(), &options, rx).await);
    match err {
        DeployError::TrackingTimedOut {
            deployment_id,
            timeout,
        } => {
            assert_eq!(deployment_id, DEPLOYMENT_ID);
            assert_eq!(timeout, Duration::from_millis(50));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_marathon_url_is_a_setup_error() {
    let options = AppOptions::default();
    assert!(options.marathon_url.is_none());

    let err = assert_err!(run(&options, &job()).await);
    match err {
        DeployError::ConfigError(message) => {
            assert_eq!(message, "Marathon URL (-m) is required")
        }
        other => panic!("expected config error, got {:?}", other),
    }

    let blank = AppOptions {
        marathon_url: Some("  ".to_string()),
        ..AppOptions::default()
    };
    assert!(matches!(
        run(&blank, &job()).await,
        Err(DeployError::ConfigError(_))
    ));
}
