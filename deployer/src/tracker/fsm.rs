//! Finite state machine following one deployment through the event stream

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::types::{Event, EventPayload};
use crate::tracker::record::{DeploymentRecord, Outcome, Verdict, HEALTH_CHECK_ACTION};

/// Tracker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No `deployment_info` seen for the deployment yet
    AwaitingPlan,

    /// Plan captured, collecting step and health results
    Tracking,

    /// `deployment_success` seen
    Succeeded,

    /// `deployment_failed` seen
    Failed,
}

impl TrackerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackerState::Succeeded | TrackerState::Failed)
    }
}

/// Deployment tracker FSM
#[derive(Debug, Clone)]
pub struct DeploymentTracker {
    state: TrackerState,
    record: DeploymentRecord,
}

impl DeploymentTracker {
    /// Create a tracker for `deployment_id`, waiting for its plan
    pub fn new(deployment_id: impl Into<String>) -> Self {
        Self {
            state: TrackerState::AwaitingPlan,
            record: DeploymentRecord::new(deployment_id),
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn record(&self) -> &DeploymentRecord {
        &self.record
    }

    /// Process an event. Returns the verdict when the event ends the deployment.
    ///
    /// Events correlated to another deployment, or to apps outside the plan,
    /// leave the tracker untouched. Once terminal, every event is ignored.
    pub fn process(&mut self, event: &Event) -> Option<Verdict> {
        if self.state.is_terminal() {
            return None;
        }

        match &event.payload {
            // Plan and start time
            EventPayload::DeploymentInfo(status) if status.plan.id == self.record.id() => {
                debug!(
                    deployment_id = %status.plan.id,
                    steps = status.plan.steps.len(),
                    "Deployment plan received"
                );
                self.record.capture_plan(event.timestamp, status.plan.clone());
                self.state = TrackerState::Tracking;
            }

            // Terminal events may arrive before any plan
            EventPayload::DeploymentSuccess(result) if result.id == self.record.id() => {
                let duration = self.record.close(event.timestamp, Outcome::Succeeded);
                self.state = TrackerState::Succeeded;
                return Some(Verdict::Succeeded {
                    duration,
                    failures: self.record.failures().clone(),
                });
            }
            EventPayload::DeploymentFailed(result) if result.id == self.record.id() => {
                let duration = self.record.close(event.timestamp, Outcome::Failed);
                self.state = TrackerState::Failed;
                return Some(Verdict::Failed {
                    duration,
                    failures: self.record.failures().clone(),
                });
            }

            _ if self.state == TrackerState::AwaitingPlan => {}

            EventPayload::DeploymentStepSuccess(status) if status.plan.id == self.record.id() => {
                for action in status.current_actions() {
                    debug!("{} {} Succeeded", action.app, action.action_type);
                }
            }
            EventPayload::DeploymentStepFailure(status) if status.plan.id == self.record.id() => {
                // One entry per failed step, attributed to its first action
                match status.current_actions().first() {
                    Some(action) => {
                        self.record
                            .record_failure(action.app.clone(), action.action_type.clone());
                        debug!("{} {} Failed", action.app, action.action_type);
                    }
                    None => {
                        warn!(deployment_id = %status.plan.id, "Step failure without actions");
                    }
                }
            }

            // Per-app events, filtered to the apps in the plan
            EventPayload::AddHealthCheck(e) if self.record.plan_includes(&e.app_id) => {
                debug!("Healthcheck added for {}", e.app_id);
            }
            EventPayload::FailedHealthCheck(e) if self.record.plan_includes(&e.app_id) => {
                self.record
                    .record_failure(e.app_id.clone(), HEALTH_CHECK_ACTION);
                debug!("Healthcheck failed for {}", e.app_id);
            }
            EventPayload::HealthStatusChanged(e) if self.record.plan_includes(&e.app_id) => {
                debug!("Healthcheck status for {} changed to {}", e.app_id, e.alive);
            }
            EventPayload::StatusUpdate(e) if self.record.plan_includes(&e.app_id) => {
                debug!(
                    status = %e.task_status,
                    "{} running on host {}", e.app_id, e.host
                );
            }

            _ => {}
        }

        None
    }
}

/// Follow deployment `deployment_id` until it succeeds, fails, or `events` closes.
pub async fn track_deployment(deployment_id: &str, mut events: mpsc::Receiver<Event>) -> Verdict {
    info!(deployment_id, "Tracking deployment");

    let mut tracker = DeploymentTracker::new(deployment_id);
    while let Some(event) = events.recv().await {
        if let Some(verdict) = tracker.process(&event) {
            return verdict;
        }
    }

    warn!(
        deployment_id,
        state = ?tracker.state(),
        "Event stream ended before the deployment finished"
    );
    Verdict::StreamExhausted
}
