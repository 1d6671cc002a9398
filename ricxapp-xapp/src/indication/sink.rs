//! Indication sinks
//!
//! The application receives indications through an [`IndicationSink`].
//! Delivery happens on the indication task, never on the receive path.

use async_trait::async_trait;
use bytes::Bytes;
use ricxapp_e2ap::procedures::RicIndicationType;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::subscription::SubscriptionId;

/// Indication accepted for an active subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicationEvent {
    /// Subscription the indication belongs to
    pub subscription: SubscriptionId,
    /// RIC action id that produced it
    pub action_id: u8,
    /// Indication sequence number
    pub sequence_number: Option<u16>,
    /// Report or insert
    pub indication_type: RicIndicationType,
    /// E2SM indication header
    pub header: Bytes,
    /// E2SM indication message
    pub message: Bytes,
    /// Call process id
    pub call_process_id: Option<Bytes>,
    /// Time the indication was accepted
    pub received_at: Instant,
}

/// Consumer of indication events
#[async_trait]
pub trait IndicationSink: Send + Sync {
    /// Delivers one event. Called in arrival order.
    async fn deliver(&self, event: IndicationEvent);
}

/// Sink forwarding events into an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<IndicationEvent>,
}

impl ChannelSink {
    /// Wraps a sender.
    pub fn new(tx: mpsc::Sender<IndicationEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sink and the receiver for its events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<IndicationEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl IndicationSink for ChannelSink {
    async fn deliver(&self, event: IndicationEvent) {
        if self.tx.send(event).await.is_err() {
            warn!("Indication receiver dropped, discarding event");
        }
    }
}

/// Sink that logs every event
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

#[async_trait]
impl IndicationSink for LoggingSink {
    async fn deliver(&self, event: IndicationEvent) {
        info!(
            subscription = %event.subscription,
            action = event.action_id,
            sn = ?event.sequence_number,
            "RIC indication ({}): header {} bytes, message {} bytes",
            event.indication_type,
            event.header.len(),
            event.message.len()
        );
    }
}
