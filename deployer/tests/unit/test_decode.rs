//! Decoder unit tests

use chrono::{DateTime, Utc};
use mdeploy::events::{decode, DecodeError, EventKind, EventPayload, RawEvent};

use crate::fixtures::*;

fn documented(name: &str, payload: &str) -> EventPayload {
    let event = decode(&RawEvent::new(name, payload)).unwrap();
    assert_eq!(event.event_type, name);
    assert_eq!(
        event.timestamp,
        "2014-03-01T23:29:30.158Z".parse::<DateTime<Utc>>().unwrap()
    );
    event.payload
}

#[test]
fn test_api_post_event() {
    match documented("api_post_event", API_POST_EVENT) {
        EventPayload::ApiPost(e) => {
            assert_eq!(e.client_ip, "0:0:0:0:0:0:0:1");
            assert_eq!(e.uri, "/v2/apps/my-app");
            assert_eq!(e.app_definition["id"], "/my-app");
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_status_update_event() {
    match documented("status_update_event", STATUS_UPDATE_EVENT) {
        EventPayload::StatusUpdate(e) => {
            assert_eq!(e.app_id, "/my-app");
            assert_eq!(e.host, "slave-1234.acme.org");
            assert_eq!(e.task_status, "TASK_RUNNING");
            assert_eq!(e.ports, vec![31372]);
            assert_eq!(
                e.slave_id.as_deref(),
                Some("20140909-054127-177048842-5050-1494-0")
            );
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_add_health_check_event() {
    match documented("add_health_check_event", ADD_HEALTH_CHECK_EVENT) {
        EventPayload::AddHealthCheck(e) => {
            assert_eq!(e.app_id, "/my-app");
            assert_eq!(e.health_check["path"], "/health");
            assert!(e.version.is_none());
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_failed_health_check_event() {
    match documented("failed_health_check_event", FAILED_HEALTH_CHECK_EVENT) {
        EventPayload::FailedHealthCheck(e) => {
            assert_eq!(e.app_id, "/my-app");
            assert_eq!(e.task_id, "my-app_0-1396592784349");
            assert_eq!(e.health_check["maxConsecutiveFailures"], 3);
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_health_status_changed_event() {
    match documented("health_status_changed_event", HEALTH_STATUS_CHANGED_EVENT) {
        EventPayload::HealthStatusChanged(e) => {
            assert_eq!(e.app_id, "/my-app");
            assert_eq!(e.task_id, "my-app_0-1396592784349");
            assert_eq!(e.version.as_deref(), Some("2014-04-04T06:26:23.051Z"));
            assert!(e.alive);
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_group_change_events() {
    match documented("group_change_success", GROUP_CHANGE_SUCCESS) {
        EventPayload::GroupChangeSuccess(e) => {
            assert_eq!(e.group_id, "/product-a/backend");
            assert_eq!(e.version, "2014-04-04T06:26:23.051Z");
        }
        other => panic!("unexpected payload {:?}", other),
    }

    match documented("group_change_failed", GROUP_CHANGE_FAILED) {
        EventPayload::GroupChangeFailed(e) => {
            assert_eq!(e.group_id, "/product-a/backend");
            assert_eq!(e.reason, "Conflicting resources");
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_deployment_terminal_events() {
    match documented("deployment_success", DEPLOYMENT_SUCCESS) {
        EventPayload::DeploymentSuccess(e) => assert_eq!(e.id, DEPLOYMENT_ID),
        other => panic!("unexpected payload {:?}", other),
    }

    match documented("deployment_failed", DEPLOYMENT_FAILED) {
        EventPayload::DeploymentFailed(e) => assert_eq!(e.id, DEPLOYMENT_ID),
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_deployment_info_event() {
    match documented("deployment_info", DEPLOYMENT_INFO) {
        EventPayload::DeploymentInfo(status) => {
            assert_eq!(status.plan.id, DEPLOYMENT_ID);
            assert_eq!(status.plan.steps.len(), 1);
            assert_eq!(status.plan.steps[0].action_type, "ScaleApplication");
            assert_eq!(status.plan.steps[0].app, "/my-app");
            assert_eq!(status.current_actions().len(), 1);
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_deployment_step_events() {
    for name in ["deployment_step_success", "deployment_step_failure"] {
        let event = decode(&RawEvent::new(name, deployment_step_payload(name))).unwrap();
        assert_eq!(event.kind().as_str(), name);

        let status = match event.payload {
            EventPayload::DeploymentStepSuccess(status)
            | EventPayload::DeploymentStepFailure(status) => status,
            other => panic!("unexpected payload {:?}", other),
        };
        assert_eq!(status.plan.id, DEPLOYMENT_ID);
        assert_eq!(status.current_actions()[0].action_type, "ScaleApplication");
        assert_eq!(status.current_actions()[0].app, "/my-app");
    }
}

#[test]
fn test_remove_health_check_event_is_unhandled() {
    let result = decode(&unhandled());
    assert!(matches!(result, Err(DecodeError::UnhandledEventKind(name)) if name == "remove_health_check_event"));
}

#[test]
fn test_wrong_shape_is_malformed() {
    // A health check event without an app id
    let raw = RawEvent::new(
        "failed_health_check_event",
        r#"{"eventType":"failed_health_check_event","timestamp":"2014-03-01T23:29:30.158Z"}"#,
    );
    match decode(&raw) {
        Err(DecodeError::MalformedPayload { kind, .. }) => {
            assert_eq!(kind, EventKind::FailedHealthCheck)
        }
        other => panic!("expected malformed payload, got {:?}", other),
    }
}

#[test]
fn test_every_kind_decodes_its_documented_payload() {
    let payloads = [
        ("api_post_event", API_POST_EVENT.to_string()),
        ("status_update_event", STATUS_UPDATE_EVENT.to_string()),
        ("add_health_check_event", ADD_HEALTH_CHECK_EVENT.to_string()),
        ("failed_health_check_event", FAILED_HEALTH_CHECK_EVENT.to_string()),
        ("health_status_changed_event", HEALTH_STATUS_CHANGED_EVENT.to_string()),
        ("group_change_success", GROUP_CHANGE_SUCCESS.to_string()),
        ("group_change_failed", GROUP_CHANGE_FAILED.to_string()),
        ("deployment_success", DEPLOYMENT_SUCCESS.to_string()),
        ("deployment_failed", DEPLOYMENT_FAILED.to_string()),
        ("deployment_info", DEPLOYMENT_INFO.to_string()),
        ("deployment_step_success", deployment_step_payload("deployment_step_success")),
        ("deployment_step_failure", deployment_step_payload("deployment_step_failure")),
    ];
    assert_eq!(payloads.len(), EventKind::ALL.len());

    for (name, payload) in payloads {
        let event = decode(&RawEvent::new(format!("{}\n", name), payload)).unwrap();
        assert_eq!(event.kind(), EventKind::from_name(name).unwrap());
    }
}
