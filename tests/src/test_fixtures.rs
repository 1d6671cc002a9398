//! Test fixtures and configuration helpers
//!
//! Builds an xApp wired to a [`MockE2Node`] over an in-process RMR pair,
//! with timers short enough for tests.

use std::sync::Arc;

use bytes::Bytes;
use ricxapp_common::{E2NodeId, RicRequestId, XappConfig};
use ricxapp_e2ap::procedures::{ControlAckRequest, RicAction};
use ricxapp_rmr::InProcRmr;
use ricxapp_xapp::{
    ChannelSink, ControlIntent, IndicationEvent, SubscribeIntent, SubscriptionId,
    SubscriptionStore, Xapp,
};
use tokio::sync::mpsc;

use crate::mock_e2node::{MockE2Node, MockE2NodeConfig};

/// E2 node every fixture talks to
pub const TEST_NODE: &str = "gnb_001_001_00000001";

/// RAN function used by [`report_intent`] when none is given
pub const TEST_RAN_FUNCTION: u16 = 2;

/// Capacity of the sink channel
pub const TEST_SINK_CAPACITY: usize = 64;

/// Identity of the mock E2 node.
pub fn test_node() -> E2NodeId {
    E2NodeId::new(TEST_NODE).expect("valid node id")
}

/// xApp configuration with short timers and no delete on shutdown.
pub fn test_config() -> XappConfig {
    let mut config = XappConfig::default();
    config.xapp_name = "ricxapp-test".to_string();
    config.rmr.send_attempts = 2;
    config.rmr.retry_interval_ms = 10;
    config.subscription.response_timeout_ms = 300;
    config.subscription.delete_timeout_ms = 300;
    config.subscription.control_timeout_ms = 300;
    config.subscription.sweep_interval_ms = 20;
    config.subscription.delete_on_shutdown = false;
    config.indication.queue_capacity = 16;
    config
}

/// Report subscription with one action on the test node.
pub fn report_intent(ran_function_id: u16) -> SubscribeIntent {
    SubscribeIntent {
        e2_node: test_node(),
        ran_function_id,
        event_trigger: Bytes::from_static(&[0x08, 0x03, 0xe8]),
        actions: vec![RicAction::report(1).with_definition(vec![0x01, 0x02])],
    }
}

/// Acknowledged control request on `subscription`.
pub fn control_intent(
    subscription: SubscriptionId,
    ack_request: ControlAckRequest,
) -> ControlIntent {
    ControlIntent {
        subscription,
        header: Bytes::from_static(&[0xc0]),
        message: Bytes::from_static(&[0x01, 0x00]),
        call_process_id: None,
        ack_request: Some(ack_request),
    }
}

/// An xApp, the mock E2 node it talks to and the sink's receiver
pub struct TestXapp {
    pub xapp: Xapp,
    pub node: MockE2Node,
    pub indications: mpsc::Receiver<IndicationEvent>,
}

impl TestXapp {
    /// Starts with [`test_config`] against a node that accepts everything.
    pub fn start() -> Self {
        Self::with_config(test_config(), MockE2NodeConfig::default(), None)
    }

    /// Starts with explicit configuration, node answers and store.
    pub fn with_config(
        config: XappConfig,
        node_config: MockE2NodeConfig,
        store: Option<Box<dyn SubscriptionStore>>,
    ) -> Self {
        let (xapp_end, node_end) = InProcRmr::pair();
        let (sink, indications) = ChannelSink::channel(TEST_SINK_CAPACITY);
        let xapp = Xapp::start(config, Arc::new(xapp_end), Arc::new(sink), store);
        let node = MockE2Node::with_config(test_node(), node_end, node_config);
        Self {
            xapp,
            node,
            indications,
        }
    }

    /// Identity of a subscription this xApp makes on the test node.
    pub fn subscription_id(&self, ran_function_id: u16) -> SubscriptionId {
        SubscriptionId::new(
            self.xapp.config().subscription.requestor_id,
            ran_function_id,
            test_node(),
        )
    }

    /// RIC request id the node puts on indications. Only the requestor
    /// id takes part in matching.
    pub fn indication_request_id(&self) -> RicRequestId {
        RicRequestId::new(self.xapp.config().subscription.requestor_id, 0)
    }

    /// Shuts the xApp down and stops the node.
    pub async fn shutdown(self) {
        self.xapp.shutdown().await.expect("xApp shutdown");
        self.node.stop();
    }
}
