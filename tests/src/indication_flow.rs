//! Indication flow integration tests
//!
//! Indications from the mock E2 node through the dispatcher and the
//! indication queue to the sink, plus RMR health checks.

use std::time::Duration;

use bytes::Bytes;
use integration_tests::{
    assert_quiet, init_test_logging, recv_within, report_intent, wait_for_condition,
    MockE2NodeEvent, TestXapp, DEFAULT_POLL_INTERVAL, DEFAULT_TEST_TIMEOUT, TEST_RAN_FUNCTION,
};
use ricxapp_e2ap::procedures::RicIndicationType;
use ricxapp_e2ap::MessageType;
use ricxapp_rmr::RmrMessage;
use ricxapp_xapp::HEALTH_CHECK_OK;

const QUIET: Duration = Duration::from_millis(150);

/// Test an indication reaching the sink
#[tokio::test]
async fn test_indication_delivered_to_sink() {
    init_test_logging();
    let mut t = TestXapp::start();
    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();

    t.node
        .emit_indication(t.indication_request_id(), TEST_RAN_FUNCTION, 1, 7)
        .await
        .unwrap();

    let event = recv_within(&mut t.indications).await.expect("indication event");
    let id = t.subscription_id(TEST_RAN_FUNCTION);
    assert_eq!(event.subscription, id);
    assert_eq!(event.action_id, 1);
    assert_eq!(event.sequence_number, Some(7));
    assert_eq!(event.indication_type, RicIndicationType::Report);
    assert_eq!(event.message, Bytes::from(7u16.to_be_bytes().to_vec()));

    let xapp = &t.xapp;
    wait_for_condition(
        || async {
            xapp.subscription(&id)
                .is_some_and(|sub| sub.indications_delivered == 1)
        },
        DEFAULT_TEST_TIMEOUT,
        DEFAULT_POLL_INTERVAL,
    )
    .await
    .expect("indication counted on the subscription");

    t.xapp.flush_indications().await.unwrap();
    let stats = t.xapp.indication_stats();
    assert_eq!(stats.received, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.dropped_inactive, 0);

    t.shutdown().await;
}

/// Test that indications keep their arrival order
#[tokio::test]
async fn test_indications_in_order() {
    init_test_logging();
    let mut t = TestXapp::start();
    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();

    for seq in 0..10u16 {
        t.node
            .emit_indication(t.indication_request_id(), TEST_RAN_FUNCTION, 1, seq)
            .await
            .unwrap();
    }

    for seq in 0..10u16 {
        let event = recv_within(&mut t.indications).await.unwrap();
        assert_eq!(event.sequence_number, Some(seq));
    }

    t.shutdown().await;
}

/// Test an indication for a subscription the xApp never made
#[tokio::test]
async fn test_indication_for_unknown_subscription_dropped() {
    init_test_logging();
    let mut t = TestXapp::start();

    t.node
        .emit_indication(t.indication_request_id(), 99, 1, 0)
        .await
        .unwrap();

    let xapp = &t.xapp;
    wait_for_condition(
        || async { xapp.indication_stats().dropped_inactive == 1 },
        DEFAULT_TEST_TIMEOUT,
        DEFAULT_POLL_INTERVAL,
    )
    .await
    .expect("indication dropped");
    assert_quiet(&mut t.indications, QUIET).await;

    t.shutdown().await;
}

/// Test that a deleted subscription receives nothing
#[tokio::test]
async fn test_indication_after_delete_dropped() {
    init_test_logging();
    let mut t = TestXapp::start();
    let id = t.subscription_id(TEST_RAN_FUNCTION);
    t.xapp
        .subscribe_and_wait(report_intent(TEST_RAN_FUNCTION))
        .await
        .unwrap();
    assert!(t.xapp.delete_and_wait(&id).await.unwrap().is_success());

    t.node
        .emit_indication(t.indication_request_id(), TEST_RAN_FUNCTION, 1, 1)
        .await
        .unwrap();

    let xapp = &t.xapp;
    wait_for_condition(
        || async { xapp.indication_stats().dropped_inactive == 1 },
        DEFAULT_TEST_TIMEOUT,
        DEFAULT_POLL_INTERVAL,
    )
    .await
    .expect("indication dropped");
    assert_quiet(&mut t.indications, QUIET).await;
    assert_eq!(t.xapp.subscription(&id).unwrap().indications_delivered, 0);

    t.shutdown().await;
}

/// Test an indication frame that does not decode
#[tokio::test]
async fn test_undecodable_indication_counted() {
    init_test_logging();
    let mut t = TestXapp::start();

    t.node
        .send_raw(
            RmrMessage::new(MessageType::Indication.as_i32(), vec![0xff, 0xff, 0xff])
                .with_meid(t.node.node().clone()),
        )
        .await
        .unwrap();

    let xapp = &t.xapp;
    wait_for_condition(
        || async { xapp.indication_stats().decode_failures == 1 },
        DEFAULT_TEST_TIMEOUT,
        DEFAULT_POLL_INTERVAL,
    )
    .await
    .expect("decode failure counted");
    assert_quiet(&mut t.indications, QUIET).await;

    t.shutdown().await;
}

/// Test the RMR health check answer
#[tokio::test]
async fn test_health_check_answered() {
    init_test_logging();
    let t = TestXapp::start();

    t.node.send_health_check(42).await.unwrap();

    match t.node.next_event().await {
        Some(MockE2NodeEvent::HealthCheckResponse {
            transaction_id,
            payload,
        }) => {
            assert_eq!(transaction_id, Some(42));
            assert_eq!(payload.as_ref(), HEALTH_CHECK_OK);
        }
        other => panic!("Expected health check response, got {other:?}"),
    }

    t.shutdown().await;
}
