//! What the tracker knows about the deployment it follows

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::events::types::{AppId, DeploymentPlan};

/// Action recorded for a failed health check
pub const HEALTH_CHECK_ACTION: &str = "HealthCheck";

/// One observed failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub app: AppId,
    pub action: String,
}

/// Failures in the order they were observed. Append only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLog(Vec<Failure>);

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, app: impl Into<AppId>, action: impl Into<String>) {
        self.0.push(Failure {
            app: app.into(),
            action: action.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Failure> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Failure] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a FailureLog {
    type Item = &'a Failure;
    type IntoIter = std::slice::Iter<'a, Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FailureLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failure reason(s):")?;
        for failure in &self.0 {
            write!(
                f,
                "\nApplication: {}\nAction: {}",
                failure.app, failure.action
            )?;
        }
        Ok(())
    }
}

/// Outcome of the tracked deployment as far as the record knows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

/// State accumulated for a single deployment
#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    id: String,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    plan: Option<DeploymentPlan>,
    failures: FailureLog,
    outcome: Outcome,
}

impl DeploymentRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start: None,
            end: None,
            plan: None,
            failures: FailureLog::new(),
            outcome: Outcome::Pending,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn plan(&self) -> Option<&DeploymentPlan> {
        self.plan.as_ref()
    }

    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Whether `app_id` is targeted by the captured plan
    pub fn plan_includes(&self, app_id: &str) -> bool {
        self.plan
            .as_ref()
            .is_some_and(|plan| plan.includes_app(app_id))
    }

    /// Last write wins: a repeated `deployment_info` replaces both values.
    pub(crate) fn capture_plan(&mut self, at: DateTime<Utc>, plan: DeploymentPlan) {
        self.start = Some(at);
        self.plan = Some(plan);
    }

    pub(crate) fn record_failure(&mut self, app: impl Into<AppId>, action: impl Into<String>) {
        self.failures.push(app, action);
    }

    /// Close the record and return its duration. Without a captured start the
    /// deployment is reported as taking no time.
    pub(crate) fn close(&mut self, at: DateTime<Utc>, outcome: Outcome) -> TimeDelta {
        self.end = Some(at);
        self.outcome = outcome;
        let start = *self.start.get_or_insert(at);
        at - start
    }
}

/// Result of tracking a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The deployment completed. `failures` holds anything that went wrong on
    /// the way, for information only.
    Succeeded {
        duration: TimeDelta,
        failures: FailureLog,
    },

    /// The deployment failed; `failures` is the reason set.
    Failed {
        duration: TimeDelta,
        failures: FailureLog,
    },

    /// The event stream ended before the deployment finished
    StreamExhausted,
}

impl Verdict {
    pub fn duration(&self) -> Option<TimeDelta> {
        match self {
            Verdict::Succeeded { duration, .. } | Verdict::Failed { duration, .. } => {
                Some(*duration)
            }
            Verdict::StreamExhausted => None,
        }
    }

    pub fn failures(&self) -> Option<&FailureLog> {
        match self {
            Verdict::Succeeded { failures, .. } | Verdict::Failed { failures, .. } => {
                Some(failures)
            }
            Verdict::StreamExhausted => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Succeeded { .. })
    }
}
