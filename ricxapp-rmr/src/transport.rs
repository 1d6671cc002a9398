//! Transport abstraction
//!
//! The xApp core talks to the routed-messaging layer only through
//! [`RmrTransport`]. Delivery is unreliable: no ordering across destinations
//! and no exactly-once guarantee.

use async_trait::async_trait;
use thiserror::Error;

use crate::message::RmrMessage;

/// Send failure reported by a transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No route, or the transport is closed
    #[error("destination unreachable: {0}")]
    Unreachable(String),

    /// The send did not complete in time
    #[error("send timed out: {0}")]
    Timeout(String),

    /// Temporary failure (buffer full, socket error)
    #[error("transient send failure: {0}")]
    Transient(String),
}

impl TransportError {
    /// True for failures worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout(_) | TransportError::Transient(_))
    }
}

/// Routed messaging transport
#[async_trait]
pub trait RmrTransport: Send + Sync {
    /// Routes a message by its type (and MEID) and sends it.
    async fn send(&self, message: RmrMessage) -> Result<(), TransportError>;

    /// Returns a response to the sender of `request`.
    ///
    /// Transports that do not track senders route the response normally.
    async fn reply(
        &self,
        request: &RmrMessage,
        response: RmrMessage,
    ) -> Result<(), TransportError> {
        let _ = request;
        self.send(response).await
    }

    /// Waits for the next inbound message; `None` once the transport is closed.
    async fn recv(&self) -> Option<RmrMessage>;
}
