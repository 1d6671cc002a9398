//! Mock E2 node for integration testing
//!
//! Sits on the far end of an in-process RMR pair and answers the requests
//! the xApp sends: subscription, subscription delete, control and reset.
//! How each procedure is answered is configurable and can change while the
//! node runs. Every request seen is reported as a [`MockE2NodeEvent`].
//!
//! Like a real E2 node, the mock keeps the subscriptions it admitted, keyed
//! by RIC request id and RAN function id. Deletes and controls naming a
//! subscription it does not hold fail with `REQUEST_ID_UNKNOWN`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use ricxapp_common::{E2NodeId, RicRequestId};
use ricxapp_e2ap::procedures::{
    Cause, ControlAckRequest, ControlAcknowledge, ControlFailure, Indication, ResetResponse,
    RicIndicationType, SubscriptionDeleteFailure, SubscriptionDeleteResponse,
    SubscriptionFailure, SubscriptionResponse,
};
use ricxapp_e2ap::{CodecError, E2apCodec, E2apPdu, MessageType};
use ricxapp_rmr::{InProcRmr, RmrMessage, RmrTransport, TransportError};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::test_utils::DEFAULT_TEST_TIMEOUT;

/// Mock E2 node errors
#[derive(Debug, Error)]
pub enum MockE2NodeError {
    #[error("E2AP encoding error: {0}")]
    Codec(#[from] CodecError),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// How the node answers one kind of request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockReply {
    /// Answer with the successful outcome
    Accept,
    /// Answer with the unsuccessful outcome carrying this cause
    Reject(Cause),
    /// Never answer
    Silent,
}

/// Per-procedure answers of the mock node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockE2NodeConfig {
    pub subscription: MockReply,
    pub delete: MockReply,
    pub control: MockReply,
    pub reset: MockReply,
}

impl Default for MockE2NodeConfig {
    fn default() -> Self {
        Self {
            subscription: MockReply::Accept,
            delete: MockReply::Accept,
            control: MockReply::Accept,
            reset: MockReply::Accept,
        }
    }
}

/// Events emitted by the mock E2 node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockE2NodeEvent {
    /// RIC Subscription Request received
    SubscriptionRequest {
        request_id: RicRequestId,
        ran_function_id: u16,
        action_ids: Vec<u8>,
    },
    /// RIC Subscription Delete Request received
    DeleteRequest {
        request_id: RicRequestId,
        ran_function_id: u16,
    },
    /// RIC Control Request received
    ControlRequest {
        request_id: RicRequestId,
        ran_function_id: u16,
        ack_request: Option<ControlAckRequest>,
    },
    /// Reset Request received
    ResetRequest { transaction_id: u8, cause: Cause },
    /// Health check answer from the xApp
    HealthCheckResponse {
        transaction_id: Option<u16>,
        payload: Bytes,
    },
    /// Anything else
    Unexpected { mtype: i32 },
}

/// Subscriptions admitted by the node
type Admitted = Arc<Mutex<HashSet<(RicRequestId, u16)>>>;

/// Mock E2 node for integration testing
pub struct MockE2Node {
    node: E2NodeId,
    transport: InProcRmr,
    codec: Arc<E2apCodec>,
    config: Arc<Mutex<MockE2NodeConfig>>,
    admitted: Admitted,
    event_rx: AsyncMutex<mpsc::Receiver<MockE2NodeEvent>>,
    task: JoinHandle<()>,
}

impl MockE2Node {
    /// Starts a node that accepts every request.
    pub fn start(node: E2NodeId, transport: InProcRmr) -> Self {
        Self::with_config(node, transport, MockE2NodeConfig::default())
    }

    /// Starts a node answering as `config` says.
    pub fn with_config(node: E2NodeId, transport: InProcRmr, config: MockE2NodeConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(100);
        let codec = Arc::new(E2apCodec::new());
        let config = Arc::new(Mutex::new(config));
        let admitted = Admitted::default();

        let responder = Responder {
            node: node.clone(),
            transport: transport.clone(),
            codec: Arc::clone(&codec),
            config: Arc::clone(&config),
            admitted: Arc::clone(&admitted),
            event_tx,
        };
        let task = tokio::spawn(responder.run());

        Self {
            node,
            transport,
            codec,
            config,
            admitted,
            event_rx: AsyncMutex::new(event_rx),
            task,
        }
    }

    /// Identity of the node.
    pub fn node(&self) -> &E2NodeId {
        &self.node
    }

    /// Changes how subscription requests are answered.
    pub fn set_subscription_reply(&self, reply: MockReply) {
        self.update(|config| config.subscription = reply);
    }

    /// Changes how subscription delete requests are answered.
    pub fn set_delete_reply(&self, reply: MockReply) {
        self.update(|config| config.delete = reply);
    }

    /// Changes how control requests are answered.
    pub fn set_control_reply(&self, reply: MockReply) {
        self.update(|config| config.control = reply);
    }

    /// Changes how reset requests are answered.
    pub fn set_reset_reply(&self, reply: MockReply) {
        self.update(|config| config.reset = reply);
    }

    fn update(&self, f: impl FnOnce(&mut MockE2NodeConfig)) {
        f(&mut self.config.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// True while the node holds the subscription.
    pub fn has_subscription(&self, request_id: RicRequestId, ran_function_id: u16) -> bool {
        self.admitted().contains(&(request_id, ran_function_id))
    }

    /// Number of subscriptions the node holds.
    pub fn subscription_count(&self) -> usize {
        self.admitted().len()
    }

    /// Adds a subscription as if the node had admitted it earlier.
    pub fn admit(&self, request_id: RicRequestId, ran_function_id: u16) {
        self.admitted().insert((request_id, ran_function_id));
    }

    /// Drops every subscription the node holds.
    pub fn forget_subscriptions(&self) {
        self.admitted().clear();
    }

    fn admitted(&self) -> MutexGuard<'_, HashSet<(RicRequestId, u16)>> {
        self.admitted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Next event, or `None` if nothing arrives within [`DEFAULT_TEST_TIMEOUT`].
    pub async fn next_event(&self) -> Option<MockE2NodeEvent> {
        let mut rx = self.event_rx.lock().await;
        tokio::time::timeout(DEFAULT_TEST_TIMEOUT, rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next event if one is already queued.
    pub async fn try_next_event(&self) -> Option<MockE2NodeEvent> {
        self.event_rx.lock().await.try_recv().ok()
    }

    /// Sends a report indication for the subscription `request_id` names.
    pub async fn emit_indication(
        &self,
        request_id: RicRequestId,
        ran_function_id: u16,
        action_id: u8,
        sequence_number: u16,
    ) -> Result<(), MockE2NodeError> {
        let indication = Indication {
            request_id,
            ran_function_id,
            action_id,
            sequence_number: Some(sequence_number),
            indication_type: RicIndicationType::Report,
            header: Bytes::from_static(&[0x0a, 0x0b]),
            message: Bytes::from(sequence_number.to_be_bytes().to_vec()),
            call_process_id: None,
        };
        let encoded = self.codec.encode(&E2apPdu::from(indication))?;
        self.send_raw(
            RmrMessage::new(MessageType::Indication.as_i32(), encoded.into_bytes())
                .with_meid(self.node.clone()),
        )
        .await
    }

    /// Sends an RMR health check to the xApp.
    pub async fn send_health_check(&self, transaction_id: u16) -> Result<(), MockE2NodeError> {
        self.send_raw(
            RmrMessage::new(MessageType::HealthCheckRequest.as_i32(), Bytes::new())
                .with_transaction_id(transaction_id),
        )
        .await
    }

    /// Sends an arbitrary frame to the xApp.
    pub async fn send_raw(&self, message: RmrMessage) -> Result<(), MockE2NodeError> {
        self.transport.send(message).await?;
        Ok(())
    }

    /// Stops answering and closes the node's end of the transport.
    pub fn stop(self) {
        self.transport.close();
        self.task.abort();
    }
}

/// Receive loop of the mock node
struct Responder {
    node: E2NodeId,
    transport: InProcRmr,
    codec: Arc<E2apCodec>,
    config: Arc<Mutex<MockE2NodeConfig>>,
    admitted: Admitted,
    event_tx: mpsc::Sender<MockE2NodeEvent>,
}

impl Responder {
    async fn run(self) {
        while let Some(frame) = self.transport.recv().await {
            if let Err(e) = self.handle(frame).await {
                warn!("Mock E2 node failed to answer: {}", e);
            }
        }
        debug!("Mock E2 node {} stopped", self.node);
    }

    async fn handle(&self, frame: RmrMessage) -> Result<(), MockE2NodeError> {
        if frame.mtype == MessageType::HealthCheckResponse.as_i32() {
            self.emit(MockE2NodeEvent::HealthCheckResponse {
                transaction_id: frame.transaction_id,
                payload: frame.payload,
            })
            .await;
            return Ok(());
        }

        let pdu = match self.codec.decode(&frame.payload) {
            Ok(pdu) => pdu,
            Err(e) => {
                warn!(mtype = frame.mtype, "Mock E2 node got undecodable frame: {}", e);
                self.emit(MockE2NodeEvent::Unexpected { mtype: frame.mtype }).await;
                return Ok(());
            }
        };

        let config = *self.config.lock().unwrap_or_else(PoisonError::into_inner);
        let answer = match pdu {
            E2apPdu::SubscriptionRequest(request) => {
                self.emit(MockE2NodeEvent::SubscriptionRequest {
                    request_id: request.request_id,
                    ran_function_id: request.ran_function_id,
                    action_ids: request.actions.iter().map(|a| a.id).collect(),
                })
                .await;
                match config.subscription {
                    MockReply::Accept => {
                        self.admitted().insert((request.request_id, request.ran_function_id));
                        Some(E2apPdu::from(SubscriptionResponse {
                            request_id: request.request_id,
                            ran_function_id: request.ran_function_id,
                            admitted: request.actions.iter().map(|a| a.id).collect(),
                            not_admitted: Vec::new(),
                        }))
                    }
                    MockReply::Reject(cause) => Some(E2apPdu::from(SubscriptionFailure {
                        request_id: request.request_id,
                        ran_function_id: request.ran_function_id,
                        cause,
                        not_admitted: Vec::new(),
                    })),
                    MockReply::Silent => None,
                }
            }
            E2apPdu::SubscriptionDeleteRequest(request) => {
                self.emit(MockE2NodeEvent::DeleteRequest {
                    request_id: request.request_id,
                    ran_function_id: request.ran_function_id,
                })
                .await;
                let key = (request.request_id, request.ran_function_id);
                let reply = match config.delete {
                    MockReply::Accept if !self.admitted().contains(&key) => {
                        MockReply::Reject(Cause::REQUEST_ID_UNKNOWN)
                    }
                    reply => reply,
                };
                match reply {
                    MockReply::Accept => {
                        self.admitted().remove(&key);
                        Some(E2apPdu::from(SubscriptionDeleteResponse {
                            request_id: request.request_id,
                            ran_function_id: request.ran_function_id,
                        }))
                    }
                    MockReply::Reject(cause) => Some(E2apPdu::from(SubscriptionDeleteFailure {
                        request_id: request.request_id,
                        ran_function_id: request.ran_function_id,
                        cause,
                    })),
                    MockReply::Silent => None,
                }
            }
            E2apPdu::ControlRequest(request) => {
                self.emit(MockE2NodeEvent::ControlRequest {
                    request_id: request.request_id,
                    ran_function_id: request.ran_function_id,
                    ack_request: request.ack_request,
                })
                .await;
                let known = self
                    .admitted()
                    .contains(&(request.request_id, request.ran_function_id));
                let reply = match config.control {
                    MockReply::Accept if !known => MockReply::Reject(Cause::REQUEST_ID_UNKNOWN),
                    reply => reply,
                };
                if !request.expects_response() {
                    None
                } else {
                    match reply {
                        MockReply::Accept => Some(E2apPdu::from(ControlAcknowledge {
                            request_id: request.request_id,
                            ran_function_id: request.ran_function_id,
                            call_process_id: request.call_process_id,
                            outcome: Some(Bytes::from_static(b"done")),
                        })),
                        MockReply::Reject(cause) => Some(E2apPdu::from(ControlFailure {
                            request_id: request.request_id,
                            ran_function_id: request.ran_function_id,
                            call_process_id: request.call_process_id,
                            cause,
                            outcome: None,
                        })),
                        MockReply::Silent => None,
                    }
                }
            }
            E2apPdu::ResetRequest(request) => {
                self.emit(MockE2NodeEvent::ResetRequest {
                    transaction_id: request.transaction_id,
                    cause: request.cause,
                })
                .await;
                self.admitted().clear();
                match config.reset {
                    MockReply::Accept | MockReply::Reject(_) => Some(E2apPdu::from(ResetResponse {
                        transaction_id: request.transaction_id,
                    })),
                    MockReply::Silent => None,
                }
            }
            _ => {
                self.emit(MockE2NodeEvent::Unexpected { mtype: frame.mtype }).await;
                None
            }
        };

        let Some(answer) = answer else {
            return Ok(());
        };
        let mtype = answer.message_type();
        let encoded = self.codec.encode(&answer)?;
        let mut reply = RmrMessage::new(mtype.as_i32(), encoded.into_bytes())
            .with_meid(self.node.clone())
            .with_sub_id(frame.sub_id);
        if let Some(xid) = frame.transaction_id {
            reply = reply.with_transaction_id(xid);
        }
        self.transport.send(reply).await?;
        Ok(())
    }

    fn admitted(&self) -> MutexGuard<'_, HashSet<(RicRequestId, u16)>> {
        self.admitted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn emit(&self, event: MockE2NodeEvent) {
        let _ = self.event_tx.send(event).await;
    }
}
