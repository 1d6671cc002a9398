//! Control and reset integration tests
//!
//! RIC control requests on active subscriptions and E2 node resets.

use bytes::Bytes;
use integration_tests::{
    control_intent, init_test_logging, report_intent, test_config, test_node, MockE2NodeConfig,
    MockE2NodeEvent, MockReply, TestXapp, TEST_RAN_FUNCTION,
};
use ricxapp_e2ap::procedures::{Cause, ControlAckRequest};
use ricxapp_xapp::{IntentOutcome, StateError, SubscriptionState, XappError};

/// Starts an xApp with one active subscription and drains the node's events.
async fn with_active_subscription(node_config: MockE2NodeConfig) -> TestXapp {
    let t = TestXapp::with_config(test_config(), node_config, None);
    let outcome = t
        .xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .expect("subscribe");
    assert!(outcome.is_success(), "subscription not admitted: {outcome:?}");
    while t.node.try_next_event().await.is_some() {}
    t
}

/// Test an acknowledged control request
#[tokio::test]
async fn test_control_acknowledged() {
    init_test_logging();
    let t = with_active_subscription(MockE2NodeConfig::default()).await;
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    let outcome = t
        .xapp
        .control_and_wait(control_intent(id.clone(), ControlAckRequest::Ack))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        IntentOutcome::ControlAcknowledged {
            outcome: Some(Bytes::from_static(b"done")),
        }
    );
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Active));

    match t.node.next_event().await {
        Some(MockE2NodeEvent::ControlRequest {
            ran_function_id,
            ack_request,
            ..
        }) => {
            assert_eq!(ran_function_id, TEST_RAN_FUNCTION);
            assert_eq!(ack_request, Some(ControlAckRequest::Ack));
        }
        other => panic!("Expected control request, got {other:?}"),
    }

    t.shutdown().await;
}

/// Test a control request the node fails
#[tokio::test]
async fn test_control_rejected() {
    init_test_logging();
    let t = with_active_subscription(MockE2NodeConfig {
        control: MockReply::Reject(Cause::CONTROL_FAILED_TO_EXECUTE),
        ..MockE2NodeConfig::default()
    })
    .await;
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    let outcome = t
        .xapp
        .control_and_wait(control_intent(id.clone(), ControlAckRequest::Ack))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        IntentOutcome::ControlRejected {
            cause: Cause::CONTROL_FAILED_TO_EXECUTE,
            outcome: None,
        }
    );
    // A failed control leaves the subscription in place
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Active));

    t.shutdown().await;
}

/// Test a control request that asks for no acknowledgement
#[tokio::test]
async fn test_control_without_ack_completes_on_send() {
    init_test_logging();
    let t = with_active_subscription(MockE2NodeConfig::default()).await;
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    let outcome = t
        .xapp
        .control_and_wait(control_intent(id.clone(), ControlAckRequest::NoAck))
        .await
        .unwrap();
    assert_eq!(outcome, IntentOutcome::ControlAcknowledged { outcome: None });
    assert_eq!(t.xapp.pending_transactions(), 0);
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Active));

    assert!(matches!(
        t.node.next_event().await,
        Some(MockE2NodeEvent::ControlRequest {
            ack_request: Some(ControlAckRequest::NoAck),
            ..
        })
    ));

    t.shutdown().await;
}

/// Test a control request the node never answers
#[tokio::test]
async fn test_control_times_out() {
    init_test_logging();
    let t = with_active_subscription(MockE2NodeConfig {
        control: MockReply::Silent,
        ..MockE2NodeConfig::default()
    })
    .await;
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    let outcome = t
        .xapp
        .control_and_wait(control_intent(id.clone(), ControlAckRequest::Ack))
        .await
        .unwrap();
    assert_eq!(outcome, IntentOutcome::TimedOut);
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Active));
    assert_eq!(t.xapp.pending_transactions(), 0);

    t.shutdown().await;
}

/// Test control on a subscription that does not exist
#[tokio::test]
async fn test_control_unknown_subscription() {
    init_test_logging();
    let t = TestXapp::start();

    let err = t
        .xapp
        .control(control_intent(t.subscription_id(42), ControlAckRequest::Ack))
        .await
        .unwrap_err();
    assert!(matches!(err, XappError::State(StateError::UnknownSubscription(_))));
    assert!(t.node.try_next_event().await.is_none());

    t.shutdown().await;
}

/// Test that a reset deletes the node's subscriptions
#[tokio::test]
async fn test_reset_deletes_node_subscriptions() {
    init_test_logging();
    let t = with_active_subscription(MockE2NodeConfig::default()).await;
    t.xapp.subscribe_and_wait(report_intent(3)).await.unwrap();
    while t.node.try_next_event().await.is_some() {}

    let outcome = t
        .xapp
        .reset_and_wait(test_node(), Cause::OM_INTERVENTION)
        .await
        .unwrap();
    assert_eq!(outcome, IntentOutcome::ResetCompleted);

    for ran_function_id in [TEST_RAN_FUNCTION, 3] {
        assert_eq!(
            t.xapp.subscription_state(&t.subscription_id(ran_function_id)),
            Some(SubscriptionState::Deleted)
        );
    }

    match t.node.next_event().await {
        Some(MockE2NodeEvent::ResetRequest { cause, .. }) => {
            assert_eq!(cause, Cause::OM_INTERVENTION);
        }
        other => panic!("Expected reset request, got {other:?}"),
    }

    t.shutdown().await;
}

/// Test that a reset cancels a transaction still waiting on the node
#[tokio::test]
async fn test_reset_cancels_outstanding_delete() {
    init_test_logging();
    let t = with_active_subscription(MockE2NodeConfig {
        delete: MockReply::Silent,
        ..MockE2NodeConfig::default()
    })
    .await;
    let id = t.subscription_id(TEST_RAN_FUNCTION);

    t.xapp.delete(&id).await.unwrap();
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::DeleteRequested));

    let outcome = t
        .xapp
        .reset_and_wait(test_node(), Cause::MISC_UNSPECIFIED)
        .await
        .unwrap();
    assert_eq!(outcome, IntentOutcome::ResetCompleted);
    assert_eq!(t.xapp.subscription_state(&id), Some(SubscriptionState::Deleted));
    assert_eq!(t.xapp.pending_transactions(), 0);

    t.shutdown().await;
}

/// Test an unanswered reset still clearing the node's subscriptions
#[tokio::test]
async fn test_reset_timeout_deletes_subscriptions() {
    init_test_logging();
    let t = with_active_subscription(MockE2NodeConfig {
        reset: MockReply::Silent,
        ..MockE2NodeConfig::default()
    })
    .await;

    let outcome = t
        .xapp
        .reset_and_wait(test_node(), Cause::OM_INTERVENTION)
        .await
        .unwrap();
    assert_eq!(outcome, IntentOutcome::TimedOut);
    assert_eq!(
        t.xapp.subscription_state(&t.subscription_id(TEST_RAN_FUNCTION)),
        Some(SubscriptionState::Deleted)
    );

    t.shutdown().await;
}
