//! Error types of the xApp core

use ricxapp_e2ap::CodecError;
use ricxapp_rmr::TransportError;
use thiserror::Error;

/// Subscription and transaction state errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// No subscription with this identity
    #[error("unknown subscription: {0}")]
    UnknownSubscription(String),

    /// The intent conflicts with the current state or a pending transaction
    #[error("conflict: {0}")]
    Conflict(String),

    /// No pending transaction matches a response
    #[error("unknown transaction {0}")]
    UnknownTransaction(u16),
}

/// Subscription store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store file I/O error
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization error
    #[error("store record error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error returned to xApp callers
#[derive(Debug, Error)]
pub enum XappError {
    /// The request could not be encoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The request could not be sent
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The intent was rejected by the subscription state machine
    #[error(transparent)]
    State(#[from] StateError),

    /// The subscription store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The xApp shut down before the outcome was known
    #[error("xApp is shut down")]
    Closed,
}
