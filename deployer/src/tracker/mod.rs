//! Deployment tracking

pub mod fsm;
pub mod record;

pub use fsm::{track_deployment, DeploymentTracker, TrackerState};
pub use record::{DeploymentRecord, Failure, FailureLog, Outcome, Verdict};
