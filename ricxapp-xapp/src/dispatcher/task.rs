//! Dispatcher task
//!
//! Single receive path of the xApp. Selects over task messages, inbound RMR
//! frames and the sweep timer, and routes each frame by its message type:
//! responses go to the subscription manager, indications to the indication
//! processor, health checks are answered directly.

use std::sync::Arc;
use std::time::Duration;

use ricxapp_common::logging::{format_hex_dump, log_rmr_message, Direction};
use ricxapp_e2ap::{E2apCodec, E2apPdu, MessageType};
use ricxapp_rmr::{RmrMessage, RmrTransport};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::shared::{lock_core, SharedCore};
use crate::indication::{indication_subscription, IndicationProcessor};
use crate::tasks::{DispatcherMessage, Task, TaskMessage};

/// Health check reply payload
pub const HEALTH_CHECK_OK: &[u8] = b"OK";

/// Dispatcher task
pub struct DispatcherTask {
    core: SharedCore,
    transport: Arc<dyn RmrTransport>,
    codec: Arc<E2apCodec>,
    indications: IndicationProcessor,
    max_message_size: usize,
    sweep_interval: Duration,
}

impl DispatcherTask {
    /// Creates the dispatcher.
    pub fn new(
        core: SharedCore,
        transport: Arc<dyn RmrTransport>,
        codec: Arc<E2apCodec>,
        indications: IndicationProcessor,
        max_message_size: usize,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            core,
            transport,
            codec,
            indications,
            max_message_size,
            sweep_interval,
        }
    }

    /// Routes one inbound frame.
    pub async fn handle_frame(&self, msg: RmrMessage) {
        if msg.payload.len() > self.max_message_size {
            warn!(
                mtype = msg.mtype,
                "Discarding {}-byte frame, limit is {}",
                msg.payload.len(),
                self.max_message_size
            );
            return;
        }

        let Some(mtype) = MessageType::from_i32(msg.mtype) else {
            warn!(mtype = msg.mtype, "Discarding frame of unknown message type");
            return;
        };
        log_rmr_message(Direction::Rx, &mtype.to_string(), &msg.payload);

        match mtype {
            MessageType::HealthCheckRequest => self.handle_health_check(&msg).await,
            MessageType::Indication => self.handle_indication(&msg),
            mtype if mtype.is_response() => self.handle_response(mtype, &msg),
            mtype => {
                warn!(mtype = msg.mtype, "Discarding {}, the xApp only initiates requests", mtype);
            }
        }
    }

    async fn handle_health_check(&self, msg: &RmrMessage) {
        let mut reply = RmrMessage::new(MessageType::HealthCheckResponse.as_i32(), HEALTH_CHECK_OK);
        if let Some(xid) = msg.transaction_id {
            reply = reply.with_transaction_id(xid);
        }
        if let Err(e) = self.transport.reply(msg, reply).await {
            warn!("Health check reply failed: {}", e);
        } else {
            debug!("Answered health check");
        }
    }

    fn handle_response(&self, mtype: MessageType, msg: &RmrMessage) {
        let decoded = self.codec.decode(&msg.payload);
        let now = Instant::now();
        let mut core = lock_core(&self.core);

        let completions = match decoded {
            Ok(pdu) => {
                let Some(e2_node) = msg.meid.as_ref() else {
                    warn!(mtype = msg.mtype, "Discarding {} without an E2 node", pdu.name());
                    return;
                };
                match core.manager.handle_response(pdu, e2_node, now) {
                    Ok(completions) => completions,
                    Err(e) => {
                        warn!(e2_node = %e2_node, "Discarding {}: {}", mtype, e);
                        return;
                    }
                }
            }
            Err(e) => {
                trace!("Undecodable {}:\n{}", mtype, format_hex_dump(&msg.payload));
                let Some(xid) = msg.transaction_id else {
                    warn!(mtype = msg.mtype, "Discarding undecodable {}: {}", mtype, e);
                    return;
                };
                warn!(mtype = msg.mtype, txn = xid, "Undecodable {}: {}", mtype, e);
                match core.manager.fail_transaction(xid, msg.meid.as_ref(), mtype, now) {
                    Ok(completions) => completions,
                    Err(e) => {
                        warn!(txn = xid, "Discarding undecodable {}: {}", mtype, e);
                        return;
                    }
                }
            }
        };
        core.complete(completions);
    }

    fn handle_indication(&self, msg: &RmrMessage) {
        let indication = match self.codec.decode(&msg.payload) {
            Ok(E2apPdu::Indication(indication)) => indication,
            Ok(other) => {
                self.indications.record_decode_failure();
                warn!("Indication frame carried {}", other.name());
                return;
            }
            Err(e) => {
                self.indications.record_decode_failure();
                warn!(mtype = msg.mtype, "Undecodable indication: {}", e);
                trace!("Undecodable indication:\n{}", format_hex_dump(&msg.payload));
                return;
            }
        };
        let Some(e2_node) = msg.meid.as_ref() else {
            self.indications.record_decode_failure();
            warn!("Discarding indication without an E2 node");
            return;
        };

        let subscription = indication_subscription(&indication, e2_node);
        let mut core = lock_core(&self.core);
        let disposition = self
            .indications
            .on_indication(&core.manager, indication, e2_node, Instant::now());
        if disposition.is_enqueued() {
            core.manager.record_indication(&subscription);
        }
    }

    /// Expires overdue transactions and wakes their waiters.
    pub fn sweep(&self) {
        let mut core = lock_core(&self.core);
        let completions = core.manager.tick(Instant::now());
        core.complete(completions);
    }
}

#[async_trait::async_trait]
impl Task for DispatcherTask {
    type Message = DispatcherMessage;

    async fn run(&mut self, mut rx: mpsc::Receiver<TaskMessage<DispatcherMessage>>) {
        info!("Dispatcher task started");
        let transport = Arc::clone(&self.transport);
        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(TaskMessage::Message(DispatcherMessage::Inbound(frame))) => {
                            self.handle_frame(frame).await;
                        }
                        Some(TaskMessage::Message(DispatcherMessage::Sweep)) => {
                            self.sweep();
                        }
                        Some(TaskMessage::Shutdown) | None => {
                            info!("Dispatcher task shutting down");
                            break;
                        }
                    }
                }

                frame = transport.recv() => {
                    match frame {
                        Some(frame) => self.handle_frame(frame).await,
                        None => {
                            error!("RMR transport closed, dispatcher stopping");
                            break;
                        }
                    }
                }

                _ = sweep.tick() => {
                    self.sweep();
                }
            }
        }

        // Callers still waiting observe a closed channel
        lock_core(&self.core).clear_waiters();
        info!("Dispatcher task stopped");
    }
}
