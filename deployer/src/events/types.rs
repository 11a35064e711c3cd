//! Marathon event payloads
//!
//! Only the fields the tool cares about are modelled; everything else in a
//! payload is accepted and ignored.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Marathon path identifier, e.g. `/product-a/backend/my-app`
pub type AppId = String;

/// An event as read off the wire, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Event name tag (`event:` line). May carry trailing line terminators.
    pub name: String,

    /// JSON payload (`data:` lines)
    pub payload: Vec<u8>,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// Every event kind the decoder recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ApiPost,
    AddHealthCheck,
    FailedHealthCheck,
    HealthStatusChanged,
    GroupChangeSuccess,
    GroupChangeFailed,
    DeploymentInfo,
    DeploymentStepSuccess,
    DeploymentStepFailure,
    DeploymentSuccess,
    DeploymentFailed,
    StatusUpdate,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::ApiPost,
        EventKind::AddHealthCheck,
        EventKind::FailedHealthCheck,
        EventKind::HealthStatusChanged,
        EventKind::GroupChangeSuccess,
        EventKind::GroupChangeFailed,
        EventKind::DeploymentInfo,
        EventKind::DeploymentStepSuccess,
        EventKind::DeploymentStepFailure,
        EventKind::DeploymentSuccess,
        EventKind::DeploymentFailed,
        EventKind::StatusUpdate,
    ];

    /// Name tag used on the event stream
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ApiPost => "api_post_event",
            EventKind::AddHealthCheck => "add_health_check_event",
            EventKind::FailedHealthCheck => "failed_health_check_event",
            EventKind::HealthStatusChanged => "health_status_changed_event",
            EventKind::GroupChangeSuccess => "group_change_success",
            EventKind::GroupChangeFailed => "group_change_failed",
            EventKind::DeploymentInfo => "deployment_info",
            EventKind::DeploymentStepSuccess => "deployment_step_success",
            EventKind::DeploymentStepFailure => "deployment_step_failure",
            EventKind::DeploymentSuccess => "deployment_success",
            EventKind::DeploymentFailed => "deployment_failed",
            EventKind::StatusUpdate => "status_update_event",
        }
    }

    /// Look up a name tag. `None` for kinds the tool does not handle.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// `eventType` as sent by Marathon
    pub event_type: String,

    /// Marathon-issued timestamp
    pub timestamp: DateTime<Utc>,

    pub payload: EventPayload,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// Variant-specific event body
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    ApiPost(ApiPostEvent),
    AddHealthCheck(AddHealthCheck),
    FailedHealthCheck(FailedHealthCheck),
    HealthStatusChanged(HealthStatusChanged),
    GroupChangeSuccess(GroupChangeSuccess),
    GroupChangeFailed(GroupChangeFailed),
    DeploymentInfo(DeploymentStatus),
    DeploymentStepSuccess(DeploymentStatus),
    DeploymentStepFailure(DeploymentStatus),
    DeploymentSuccess(DeploymentResult),
    DeploymentFailed(DeploymentResult),
    StatusUpdate(StatusUpdate),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::ApiPost(_) => EventKind::ApiPost,
            EventPayload::AddHealthCheck(_) => EventKind::AddHealthCheck,
            EventPayload::FailedHealthCheck(_) => EventKind::FailedHealthCheck,
            EventPayload::HealthStatusChanged(_) => EventKind::HealthStatusChanged,
            EventPayload::GroupChangeSuccess(_) => EventKind::GroupChangeSuccess,
            EventPayload::GroupChangeFailed(_) => EventKind::GroupChangeFailed,
            EventPayload::DeploymentInfo(_) => EventKind::DeploymentInfo,
            EventPayload::DeploymentStepSuccess(_) => EventKind::DeploymentStepSuccess,
            EventPayload::DeploymentStepFailure(_) => EventKind::DeploymentStepFailure,
            EventPayload::DeploymentSuccess(_) => EventKind::DeploymentSuccess,
            EventPayload::DeploymentFailed(_) => EventKind::DeploymentFailed,
            EventPayload::StatusUpdate(_) => EventKind::StatusUpdate,
        }
    }
}

// ================================ API EVENTS =================================== //

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPostEvent {
    #[serde(default)]
    pub client_ip: String,

    pub uri: String,

    #[serde(default)]
    pub app_definition: serde_json::Value,
}

// ============================= HEALTH CHECK EVENTS ============================= //

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddHealthCheck {
    pub app_id: AppId,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub health_check: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedHealthCheck {
    pub app_id: AppId,

    #[serde(default)]
    pub task_id: String,

    #[serde(default)]
    pub health_check: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatusChanged {
    pub app_id: AppId,

    #[serde(default)]
    pub task_id: String,

    #[serde(default)]
    pub version: Option<String>,

    pub alive: bool,
}

// ================================ GROUP EVENTS ================================= //

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChangeSuccess {
    pub group_id: AppId,

    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChangeFailed {
    pub group_id: AppId,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub reason: String,
}

// ============================== DEPLOYMENT EVENTS ============================== //

/// One step of a deployment plan
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Action {
    /// Operation, e.g. `ScaleApplication`. Older Marathon versions call it `action`.
    #[serde(rename = "type", alias = "action")]
    pub action_type: String,

    pub app: AppId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeploymentPlan {
    pub id: String,

    #[serde(default, deserialize_with = "flatten_plan_steps")]
    pub steps: Vec<Action>,

    #[serde(default)]
    pub version: Option<String>,
}

impl DeploymentPlan {
    /// Whether any step of the plan targets `app_id`
    pub fn includes_app(&self, app_id: &str) -> bool {
        self.steps.iter().any(|action| action.app == app_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeploymentStep {
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Body shared by `deployment_info` and the step events
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub plan: DeploymentPlan,

    #[serde(default)]
    pub current_step: Option<DeploymentStep>,
}

impl DeploymentStatus {
    /// Actions of the step this event reports on
    pub fn current_actions(&self) -> &[Action] {
        self.current_step
            .as_ref()
            .map(|step| step.actions.as_slice())
            .unwrap_or_default()
    }
}

/// Body of `deployment_success` and `deployment_failed`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeploymentResult {
    pub id: String,
}

// ================================ TASK EVENTS ================================== //

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub app_id: AppId,

    pub host: String,

    pub task_status: String,

    #[serde(default)]
    pub ports: Vec<u16>,

    #[serde(default)]
    pub slave_id: Option<String>,

    #[serde(default)]
    pub task_id: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub version: Option<String>,
}

/// Plan steps are either single actions or, on newer Marathon, groups of
/// actions run in parallel. Groups are flattened in order.
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanStep {
    Single(Action),
    Group { actions: Vec<Action> },
}

fn flatten_plan_steps<'de, D>(deserializer: D) -> Result<Vec<Action>, D::Error>
where
    D: Deserializer<'de>,
{
    let steps = Vec::<PlanStep>::deserialize(deserializer)?;
    Ok(steps
        .into_iter()
        .flat_map(|step| match step {
            PlanStep::Single(action) => vec![action],
            PlanStep::Group { actions } => actions,
        })
        .collect())
}
