//! Subscription identity, lifecycle state and table entry

use std::fmt;

use bytes::Bytes;
use ricxapp_common::{E2NodeId, RicRequestId};
use ricxapp_e2ap::procedures::{ActionNotAdmitted, RicAction};
use tokio::time::Instant;

use super::tracker::TransactionId;

/// Identity of a subscription: (requestor id, RAN function id, E2 node)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId {
    /// RIC requestor id of the owning xApp
    pub requestor_id: u16,
    /// RAN function id on the E2 node
    pub ran_function_id: u16,
    /// E2 node the subscription lives on
    pub e2_node: E2NodeId,
}

impl SubscriptionId {
    /// Creates a subscription identity.
    pub fn new(requestor_id: u16, ran_function_id: u16, e2_node: E2NodeId) -> Self {
        Self {
            requestor_id,
            ran_function_id,
            e2_node,
        }
    }
}

/// Formats as `node/requestor/function`, the key used by the store.
impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.e2_node, self.requestor_id, self.ran_function_id)
    }
}

/// Subscription lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    /// Subscription request sent, waiting for the E2 node
    Requested,
    /// Subscription admitted by the E2 node
    Active,
    /// Control request outstanding on an active subscription
    ModifyRequested,
    /// Delete request sent
    DeleteRequested,
    /// Deleted (terminal)
    Deleted,
    /// Rejected, timed out or undeliverable (terminal)
    Failed,
}

impl SubscriptionState {
    /// True for `Deleted` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, SubscriptionState::Deleted | SubscriptionState::Failed)
    }

    /// True when indications for the subscription are forwarded to the sink.
    pub fn accepts_indications(self) -> bool {
        matches!(self, SubscriptionState::Active | SubscriptionState::ModifyRequested)
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionState::Requested => write!(f, "Requested"),
            SubscriptionState::Active => write!(f, "Active"),
            SubscriptionState::ModifyRequested => write!(f, "ModifyRequested"),
            SubscriptionState::DeleteRequested => write!(f, "DeleteRequested"),
            SubscriptionState::Deleted => write!(f, "Deleted"),
            SubscriptionState::Failed => write!(f, "Failed"),
        }
    }
}

/// Subscription table entry
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Identity
    pub id: SubscriptionId,
    /// RIC request id the subscription was created with; deletes and
    /// controls address the subscription by it
    pub request_id: RicRequestId,
    /// Event trigger definition
    pub event_trigger: Bytes,
    /// Requested actions
    pub actions: Vec<RicAction>,
    /// Current state
    pub state: SubscriptionState,
    /// Creation time
    pub created_at: Instant,
    /// Time of the last state transition
    pub last_transition: Instant,
    /// Outstanding transaction, if any
    pub outstanding: Option<TransactionId>,
    /// Admitted action ids from the last successful response
    pub admitted: Vec<u8>,
    /// Rejected actions from the last successful response
    pub not_admitted: Vec<ActionNotAdmitted>,
    /// Why the subscription failed
    pub failure_reason: Option<String>,
    /// Indications forwarded to the sink
    pub indications_delivered: u64,
}

impl Subscription {
    /// Creates an entry in `Requested` with `transaction` outstanding.
    pub fn requested(
        id: SubscriptionId,
        request_id: RicRequestId,
        event_trigger: Bytes,
        actions: Vec<RicAction>,
        transaction: TransactionId,
        now: Instant,
    ) -> Self {
        Self {
            id,
            request_id,
            event_trigger,
            actions,
            state: SubscriptionState::Requested,
            created_at: now,
            last_transition: now,
            outstanding: Some(transaction),
            admitted: Vec::new(),
            not_admitted: Vec::new(),
            failure_reason: None,
            indications_delivered: 0,
        }
    }

    /// Moves to `state`, stamping the transition time.
    pub(crate) fn transition(&mut self, state: SubscriptionState, now: Instant) {
        self.state = state;
        self.last_transition = now;
    }
}
