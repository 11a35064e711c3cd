//! Event decoding
//!
//! Turns a [`RawEvent`] into a typed [`Event`] by looking up its name tag in
//! the [`EventKind`] table and deserializing the payload for that kind.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::events::types::{Event, EventKind, EventPayload, RawEvent};

/// Why a raw event could not be decoded
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Marathon emits many kinds the tool does not care about. Not a protocol error.
    #[error("Unhandled event: {0}")]
    UnhandledEventKind(String),

    #[error("Malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: EventKind,
        source: serde_json::Error,
    },
}

/// Fields every Marathon event carries, wrapped around the kind-specific body
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "eventType", default)]
    event_type: Option<String>,

    timestamp: DateTime<Utc>,

    #[serde(flatten)]
    body: T,
}

/// Decode a raw event
pub fn decode(raw: &RawEvent) -> Result<Event, DecodeError> {
    let name = raw.name.trim();
    let kind = EventKind::from_name(name)
        .ok_or_else(|| DecodeError::UnhandledEventKind(name.to_string()))?;

    let payload = raw.payload.as_slice();
    match kind {
        EventKind::ApiPost => parse(kind, payload, EventPayload::ApiPost),
        EventKind::AddHealthCheck => parse(kind, payload, EventPayload::AddHealthCheck),
        EventKind::FailedHealthCheck => parse(kind, payload, EventPayload::FailedHealthCheck),
        EventKind::HealthStatusChanged => {
            parse(kind, payload, EventPayload::HealthStatusChanged)
        }
        EventKind::GroupChangeSuccess => parse(kind, payload, EventPayload::GroupChangeSuccess),
        EventKind::GroupChangeFailed => parse(kind, payload, EventPayload::GroupChangeFailed),
        EventKind::DeploymentInfo => parse(kind, payload, EventPayload::DeploymentInfo),
        EventKind::DeploymentStepSuccess => {
            parse(kind, payload, EventPayload::DeploymentStepSuccess)
        }
        EventKind::DeploymentStepFailure => {
            parse(kind, payload, EventPayload::DeploymentStepFailure)
        }
        EventKind::DeploymentSuccess => parse(kind, payload, EventPayload::DeploymentSuccess),
        EventKind::DeploymentFailed => parse(kind, payload, EventPayload::DeploymentFailed),
        EventKind::StatusUpdate => parse(kind, payload, EventPayload::StatusUpdate),
    }
}

fn parse<T, F>(kind: EventKind, payload: &[u8], wrap: F) -> Result<Event, DecodeError>
where
    T: DeserializeOwned,
    F: FnOnce(T) -> EventPayload,
{
    let envelope: Envelope<T> = serde_json::from_slice(payload)
        .map_err(|source| DecodeError::MalformedPayload { kind, source })?;

    Ok(Event {
        event_type: envelope
            .event_type
            .unwrap_or_else(|| kind.as_str().to_string()),
        timestamp: envelope.timestamp,
        payload: wrap(envelope.body),
    })
}
