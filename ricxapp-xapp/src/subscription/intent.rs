//! Application intents and their outcomes

use bytes::Bytes;
use ricxapp_common::E2NodeId;
use ricxapp_e2ap::procedures::{ActionNotAdmitted, Cause, ControlAckRequest, RicAction};
use ricxapp_rmr::RmrMessage;
use tokio::time::Instant;

use super::state::SubscriptionId;
use super::tracker::{RequestKind, TransactionId, TransactionOwner};

/// Request to subscribe to a RAN function on an E2 node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeIntent {
    /// Target E2 node
    pub e2_node: E2NodeId,
    /// RAN function id
    pub ran_function_id: u16,
    /// E2SM event trigger definition
    pub event_trigger: Bytes,
    /// Requested actions
    pub actions: Vec<RicAction>,
}

/// Control action on an existing subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlIntent {
    /// Subscription the control applies to
    pub subscription: SubscriptionId,
    /// E2SM control header
    pub header: Bytes,
    /// E2SM control message
    pub message: Bytes,
    /// Optional call process id
    pub call_process_id: Option<Bytes>,
    /// Acknowledgement request; `NoAck` completes once the request is sent
    pub ack_request: Option<ControlAckRequest>,
}

/// How a transaction ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// Subscription admitted
    Subscribed {
        /// Admitted action ids
        admitted: Vec<u8>,
        /// Rejected actions
        not_admitted: Vec<ActionNotAdmitted>,
    },
    /// Subscription rejected by the E2 node
    SubscriptionRejected(Cause),
    /// Subscription deleted
    Deleted,
    /// Delete rejected by the E2 node
    DeleteRejected(Cause),
    /// Control acknowledged (or sent, for `NoAck` requests)
    ControlAcknowledged {
        /// E2SM control outcome
        outcome: Option<Bytes>,
    },
    /// Control rejected
    ControlRejected {
        /// Failure cause
        cause: Cause,
        /// E2SM control outcome
        outcome: Option<Bytes>,
    },
    /// Reset acknowledged by the E2 node
    ResetCompleted,
    /// No response before the deadline
    TimedOut,
    /// The request could not be sent
    SendFailed(String),
    /// A response arrived but could not be decoded
    UndecodableResponse,
    /// The transaction was dropped because its E2 node was reset
    Cancelled,
}

impl IntentOutcome {
    /// True for outcomes where the E2 node accepted the request.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            IntentOutcome::Subscribed { .. }
                | IntentOutcome::Deleted
                | IntentOutcome::ControlAcknowledged { .. }
                | IntentOutcome::ResetCompleted
        )
    }
}

/// A finished transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Transaction id
    pub transaction: TransactionId,
    /// Owner of the transaction
    pub owner: TransactionOwner,
    /// Request kind
    pub kind: RequestKind,
    /// Outcome
    pub outcome: IntentOutcome,
}

/// Request ready to be handed to the dispatcher
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Transaction tracking the request
    pub transaction: TransactionId,
    /// Owner of the transaction
    pub owner: TransactionOwner,
    /// Request kind
    pub kind: RequestKind,
    /// RMR message carrying the encoded PDU
    pub message: RmrMessage,
    /// Response deadline; send retries stop short of it
    pub deadline: Instant,
    /// False for requests that complete on send (control without ack)
    pub expects_response: bool,
}
