//! Lifecycle controller against the in-memory provider

mod common;

use common::FakeProvider;
use opsdeck_cloud::{
    CloudError, InstanceStatus, LifecycleAction, LifecycleController, Outcome, ResourceKind,
    ResourceRef,
};
use std::sync::Arc;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_missing_instance_is_not_found_without_side_effects() {
    let fake = Arc::new(FakeProvider::new());
    let controller = LifecycleController::new(fake.clone());

    for action in LifecycleAction::ALL {
        let outcome = assert_ok!(controller.apply(action, "missing").await);
        assert_eq!(outcome, Outcome::NotFound(ResourceRef::instance("missing")));
    }

    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_stop_delete_then_start_reports_not_found() {
    let fake = Arc::new(FakeProvider::new().with_server("i-1", "web", InstanceStatus::Active));
    let controller = LifecycleController::new(fake.clone());

    assert_eq!(controller.stop("i-1").await.unwrap(), Outcome::Done(()));
    assert_eq!(controller.delete("i-1").await.unwrap(), Outcome::Done(()));
    assert!(!fake.server_exists("i-1"));

    match controller.start("i-1").await.unwrap() {
        Outcome::NotFound(target) => {
            assert_eq!(target.kind, ResourceKind::Instance);
            assert_eq!(target.id, "i-1");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }

    assert_eq!(
        fake.calls(),
        vec!["stop_server:i-1".to_string(), "delete_server:i-1".to_string()]
    );
}

#[tokio::test]
async fn test_reboot_is_soft() {
    let fake = Arc::new(FakeProvider::new().with_server("i-1", "web", InstanceStatus::Active));
    let controller = LifecycleController::new(fake.clone());

    assert!(controller.reboot("i-1").await.unwrap().is_done());
    assert_eq!(fake.calls_to("soft_reboot_server"), vec!["soft_reboot_server:i-1"]);
}

#[tokio::test]
async fn test_instance_gone_before_request_is_not_found() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_server("i-1", "web", InstanceStatus::Active)
            .failing_not_found("stop_server", "server"),
    );
    let controller = LifecycleController::new(fake.clone());

    let outcome = assert_ok!(controller.stop("i-1").await);
    assert_eq!(outcome, Outcome::NotFound(ResourceRef::instance("i-1")));
    assert_eq!(fake.calls(), vec!["stop_server:i-1".to_string()]);
}

#[tokio::test]
async fn test_provider_failure_is_upstream_error() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_server("i-1", "web", InstanceStatus::Active)
            .failing("stop_server", "conflict: task_state powering-off"),
    );
    let controller = LifecycleController::new(fake.clone());

    match controller.stop("i-1").await {
        Err(CloudError::Upstream {
            operation,
            resource_id,
            source,
        }) => {
            assert_eq!(operation, "stop_server");
            assert_eq!(resource_id, "i-1");
            assert!(source.to_string().contains("powering-off"));
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_failure_is_upstream_error() {
    let fake = Arc::new(FakeProvider::new().failing("get_server", "service unavailable"));
    let controller = LifecycleController::new(fake.clone());

    let err = controller.start("i-1").await.unwrap_err();
    assert!(matches!(err, CloudError::Upstream { .. }));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_apply_all_keeps_going_past_missing() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_server("i-1", "web", InstanceStatus::Active)
            .with_server("i-2", "db", InstanceStatus::Active),
    );
    let controller = LifecycleController::new(fake.clone());

    let report = controller
        .apply_all(LifecycleAction::Stop, ["i-1", "gone", "i-2"])
        .await;

    assert!(report.is_success());
    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].instance_id, "gone");
    assert_eq!(
        fake.calls_to("stop_server"),
        vec!["stop_server:i-1", "stop_server:i-2"]
    );
}

#[tokio::test]
async fn test_apply_all_records_failures() {
    let fake = Arc::new(
        FakeProvider::new()
            .with_server("i-1", "web", InstanceStatus::Shutoff)
            .failing("start_server", "quota exceeded"),
    );
    let controller = LifecycleController::new(fake.clone());

    let report = controller
        .apply_all(LifecycleAction::Start, vec!["i-1".to_string()])
        .await;

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].error.as_deref().unwrap_or_default().contains("quota exceeded"));
    assert_eq!(report.summary().to_string(), "0 requested, 0 not found, 1 failed");
}
