//! Subscription lifecycle integration tests
//!
//! Subscribe and delete against the mock E2 node, including rejections,
//! timeouts, persistence and delete on shutdown.

use integration_tests::{
    control_intent, init_test_logging, report_intent, test_config, MockE2NodeConfig,
    MockE2NodeEvent, MockReply, TestXapp, TEST_RAN_FUNCTION,
};
use ricxapp_e2ap::procedures::{Cause, ControlAckRequest};
use ricxapp_xapp::{
    IntentOutcome, JsonFileStore, StateError, SubscriptionState, SubscriptionStore, XappError,
};

/// Test a subscription the node admits
#[tokio::test]
async fn test_subscribe_admitted() {
    init_test_logging();
    let t = TestXapp::start();

    let outcome = t
        .xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .expect("subscribe");
    assert_eq!(
        outcome,
        IntentOutcome::Subscribed {
            admitted: vec![1],
            not_admitted: vec![],
        }
    );

    let id = t.subscription_id(TEST_RAN_FUNCTION);
    let sub = t.xapp.subscription(&id).expect("subscription entry");
    assert_eq!(sub.state, SubscriptionState::Active);
    assert_eq!(sub.admitted, vec![1]);
    assert!(sub.outstanding.is_none());
    assert_eq!(t.xapp.pending_transactions(), 0);

    match t.node.next_event().await {
        Some(MockE2NodeEvent::SubscriptionRequest {
            request_id,
            ran_function_id,
            action_ids,
        }) => {
            assert_eq!(request_id.requestor_id, 123);
            assert_eq!(ran_function_id, TEST_RAN_FUNCTION);
            assert_eq!(action_ids, vec![1]);
        }
        other => panic!("Expected subscription request, got {other:?}"),
    }

    t.shutdown().await;
}

/// Test a subscription the node rejects
#[tokio::test]
async fn test_subscribe_rejected() {
    init_test_logging();
    let node_config = MockE2NodeConfig {
        subscription: MockReply::Reject(Cause::RAN_FUNCTION_ID_INVALID),
        ..MockE2NodeConfig::default()
    };
    let t = TestXapp::with_config(test_config(), node_config, None);

    let outcome = t
        .xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    assert_eq!(outcome, IntentOutcome::SubscriptionRejected(Cause::RAN_FUNCTION_ID_INVALID));
    assert!(!outcome.is_success());

    let sub = t.xapp.subscription(&t.subscription_id(TEST_RAN_FUNCTION)).unwrap();
    assert_eq!(sub.state, SubscriptionState::Failed);
    assert!(sub.failure_reason.is_some());

    t.shutdown().await;
}

/// Test a subscription the node never answers
#[tokio::test]
async fn test_subscribe_times_out() {
    init_test_logging();
    let node_config = MockE2NodeConfig {
        subscription: MockReply::Silent,
        ..MockE2NodeConfig::default()
    };
    let t = TestXapp::with_config(test_config(), node_config, None);

    let outcome = t
        .xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    assert_eq!(outcome, IntentOutcome::TimedOut);
    assert_eq!(
        t.xapp.subscription_state(&t.subscription_id(TEST_RAN_FUNCTION)),
        Some(SubscriptionState::Failed)
    );
    assert_eq!(t.xapp.pending_transactions(), 0);

    t.shutdown().await;
}

/// Test a second subscribe while the first is active
#[tokio::test]
async fn test_duplicate_subscribe_conflicts() {
    init_test_logging();
    let t = TestXapp::start();

    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    let err = t
        .xapp
        .subscribe(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap_err();
    assert!(matches!(err, XappError::State(StateError::Conflict(_))));

    t.shutdown().await;
}

/// Test resubscribing after the node rejected the first attempt
#[tokio::test]
async fn test_failed_subscription_can_be_retried() {
    init_test_logging();
    let node_config = MockE2NodeConfig {
        subscription: MockReply::Reject(Cause::RIC_REQUEST_UNSPECIFIED),
        ..MockE2NodeConfig::default()
    };
    let t = TestXapp::with_config(test_config(), node_config, None);

    let first = t
        .xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    assert!(!first.is_success());

    t.node.set_subscription_reply(MockReply::Accept);
    let second = t
        .xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    assert!(second.is_success());
    assert_eq!(
        t.xapp.subscription_state(&t.subscription_id(TEST_RAN_FUNCTION)),
        Some(SubscriptionState::Active)
    );

    t.shutdown().await;
}

/// Test deleting an active subscription
#[tokio::test]
async fn test_delete_active_subscription() {
    init_test_logging();
    let t = TestXapp::start();
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    let outcome = t.xapp.delete_and_wait(&id).await.unwrap();
    assert_eq!(outcome, IntentOutcome::Deleted);
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Deleted));

    assert!(matches!(
        t.node.next_event().await,
        Some(MockE2NodeEvent::SubscriptionRequest { .. })
    ));
    match t.node.next_event().await {
        Some(MockE2NodeEvent::DeleteRequest {
            request_id,
            ran_function_id,
        }) => {
            assert_eq!(request_id.requestor_id, 123);
            assert_eq!(ran_function_id, TEST_RAN_FUNCTION);
        }
        other => panic!("Expected delete request, got {other:?}"),
    }

    // Deleted is terminal
    let err = t.xapp.delete(&id).await.unwrap_err();
    assert!(matches!(err, XappError::State(StateError::Conflict(_))));

    t.shutdown().await;
}

/// Test that a delete names the subscription by its original RIC request id
#[tokio::test]
async fn test_delete_carries_subscription_request_id() {
    init_test_logging();
    let t = TestXapp::start();
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    // A second subscription the delete must leave alone
    t.xapp.subscribe_and_wait(report_intent(3)).await.unwrap();
    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    let subscribed = match t.node.next_event().await {
        Some(MockE2NodeEvent::SubscriptionRequest { .. }) => match t.node.next_event().await {
            Some(MockE2NodeEvent::SubscriptionRequest { request_id, .. }) => request_id,
            other => panic!("Expected subscription request, got {other:?}"),
        },
        other => panic!("Expected subscription request, got {other:?}"),
    };
    assert!(t.node.has_subscription(subscribed, TEST_RAN_FUNCTION));

    let outcome = t
        .xapp
        .control_and_wait(control_intent(id.clone(), ControlAckRequest::Ack))
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(t.xapp.delete_and_wait(&id).await.unwrap(), IntentOutcome::Deleted);

    let mut addressed = Vec::new();
    while let Some(event) = t.node.try_next_event().await {
        match event {
            MockE2NodeEvent::ControlRequest { request_id, .. }
            | MockE2NodeEvent::DeleteRequest { request_id, .. } => addressed.push(request_id),
            other => panic!("Unexpected event {other:?}"),
        }
    }
    assert_eq!(addressed, vec![subscribed, subscribed]);
    assert!(!t.node.has_subscription(subscribed, TEST_RAN_FUNCTION));
    assert_eq!(t.node.subscription_count(), 1);

    t.shutdown().await;
}

/// Test a delete for a subscription the node no longer holds
#[tokio::test]
async fn test_delete_unknown_to_node_rejected() {
    init_test_logging();
    let t = TestXapp::start();
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    t.node.forget_subscriptions();

    let outcome = t.xapp.delete_and_wait(&id).await.unwrap();
    assert_eq!(outcome, IntentOutcome::DeleteRejected(Cause::REQUEST_ID_UNKNOWN));
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Failed));

    t.shutdown().await;
}

/// Test an unanswered delete counting as deleted
#[tokio::test]
async fn test_delete_timeout_counts_as_deleted() {
    init_test_logging();
    let node_config = MockE2NodeConfig {
        delete: MockReply::Silent,
        ..MockE2NodeConfig::default()
    };
    let t = TestXapp::with_config(test_config(), node_config, None);
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    let outcome = t.xapp.delete_and_wait(&id).await.unwrap();
    assert_eq!(outcome, IntentOutcome::TimedOut);
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Deleted));

    t.shutdown().await;
}

/// Test an unanswered delete failing the subscription when timeouts are not success
#[tokio::test]
async fn test_delete_timeout_fails_when_strict() {
    init_test_logging();
    let mut config = test_config();
    config.subscription.delete_timeout_as_success = false;
    let node_config = MockE2NodeConfig {
        delete: MockReply::Silent,
        ..MockE2NodeConfig::default()
    };
    let t = TestXapp::with_config(config, node_config, None);
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    assert_eq!(t.xapp.delete_and_wait(&id).await.unwrap(), IntentOutcome::TimedOut);
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Failed));

    t.shutdown().await;
}

/// Test a delete the node rejects
#[tokio::test]
async fn test_delete_rejected() {
    init_test_logging();
    let node_config = MockE2NodeConfig {
        delete: MockReply::Reject(Cause::REQUEST_ID_UNKNOWN),
        ..MockE2NodeConfig::default()
    };
    let t = TestXapp::with_config(test_config(), node_config, None);
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    let outcome = t.xapp.delete_and_wait(&id).await.unwrap();
    assert_eq!(outcome, IntentOutcome::DeleteRejected(Cause::REQUEST_ID_UNKNOWN));
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Failed));

    t.shutdown().await;
}

/// Test that active subscriptions survive a restart through the store
#[tokio::test]
async fn test_subscriptions_restored_from_store() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscriptions.json");

    let store: Box<dyn SubscriptionStore> = Box::new(JsonFileStore::open(&path).unwrap());
    let first = TestXapp::with_config(test_config(), MockE2NodeConfig::default(), Some(store));
    first
        .xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    assert!(!first.xapp.is_store_degraded());
    let request_id = first
        .xapp
        .subscription(&first.subscription_id(TEST_RAN_FUNCTION))
        .unwrap()
        .request_id;
    first.shutdown().await;

    assert_eq!(JsonFileStore::open(&path).unwrap().load_all().unwrap().len(), 1);

    let store: Box<dyn SubscriptionStore> = Box::new(JsonFileStore::open(&path).unwrap());
    let second = TestXapp::with_config(test_config(), MockE2NodeConfig::default(), Some(store));
    assert_eq!(second.xapp.restore().unwrap(), 1);
    let id = second.subscription_id(TEST_RAN_FUNCTION);
    assert_eq!(second.xapp.subscription_state(&id), Some(SubscriptionState::Active));
    assert_eq!(second.xapp.subscription(&id).unwrap().request_id, request_id);

    // The E2 node still holds what the first instance subscribed to
    second.node.admit(request_id, TEST_RAN_FUNCTION);
    assert_eq!(second.xapp.delete_and_wait(&id).await.unwrap(), IntentOutcome::Deleted);
    assert_eq!(second.node.subscription_count(), 0);
    second.shutdown().await;
    assert!(JsonFileStore::open(&path).unwrap().load_all().unwrap().is_empty());
}

/// Test that shutdown deletes active subscriptions
#[tokio::test]
async fn test_shutdown_deletes_active_subscriptions() {
    init_test_logging();
    let mut config = test_config();
    config.subscription.delete_on_shutdown = true;
    let TestXapp { xapp, node, .. } =
        TestXapp::with_config(config, MockE2NodeConfig::default(), None);

    xapp.subscribe_and_wait(report_intent(1)).await.unwrap();
    xapp.subscribe_and_wait(report_intent(2)).await.unwrap();
    xapp.shutdown().await.expect("shutdown");

    let mut deleted = Vec::new();
    while let Some(event) = node.try_next_event().await {
        if let MockE2NodeEvent::DeleteRequest { ran_function_id, .. } = event {
            deleted.push(ran_function_id);
        }
    }
    deleted.sort_unstable();
    assert_eq!(deleted, vec![1, 2]);
    node.stop();
}
