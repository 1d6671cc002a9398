//! Transaction tracker
//!
//! Correlates outbound requests with their asynchronous responses. Every
//! request gets a 16-bit transaction id that travels as the RIC instance id
//! (low byte as the E2AP transaction id for Reset) and in the RMR
//! transaction header. Each owner has at most one pending transaction.
//!
//! Ids start at 1, increase monotonically and wrap from 65535 back to 1,
//! skipping ids that are still pending. Zero is never handed out.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use ricxapp_common::E2NodeId;
use ricxapp_e2ap::{CodecError, EncodedPdu, MessageType};
use tokio::time::Instant;

use super::state::SubscriptionId;
use crate::error::{StateError, XappError};

/// Transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u16);

impl TransactionId {
    /// Raw id value.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Low byte, carried as the E2AP TransactionID of node-level procedures.
    pub const fn low_byte(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    fn following(self) -> Self {
        if self.0 == u16::MAX {
            TransactionId(1)
        } else {
            TransactionId(self.0 + 1)
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of request a transaction tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// RIC Subscription
    Subscribe,
    /// RIC Subscription Delete
    Delete,
    /// RIC Control
    Control,
    /// Reset
    Reset,
}

impl RequestKind {
    /// The request kind a response message type answers.
    pub fn answered_by(mtype: MessageType) -> Option<Self> {
        match mtype {
            MessageType::SubscriptionResponse | MessageType::SubscriptionFailure => {
                Some(RequestKind::Subscribe)
            }
            MessageType::SubscriptionDeleteResponse | MessageType::SubscriptionDeleteFailure => {
                Some(RequestKind::Delete)
            }
            MessageType::ControlAck | MessageType::ControlFailure => Some(RequestKind::Control),
            MessageType::ResetResponse => Some(RequestKind::Reset),
            _ => None,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Subscribe => write!(f, "subscribe"),
            RequestKind::Delete => write!(f, "delete"),
            RequestKind::Control => write!(f, "control"),
            RequestKind::Reset => write!(f, "reset"),
        }
    }
}

/// What a transaction belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionOwner {
    /// A subscription (subscribe, delete, control)
    Subscription(SubscriptionId),
    /// An E2 node (node-wide procedures such as Reset)
    Node(E2NodeId),
}

impl TransactionOwner {
    /// E2 node the transaction talks to.
    pub fn e2_node(&self) -> &E2NodeId {
        match self {
            TransactionOwner::Subscription(id) => &id.e2_node,
            TransactionOwner::Node(node) => node,
        }
    }
}

impl fmt::Display for TransactionOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOwner::Subscription(id) => write!(f, "{id}"),
            TransactionOwner::Node(node) => write!(f, "{node}"),
        }
    }
}

/// Pending request
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Transaction id
    pub id: TransactionId,
    /// Owner
    pub owner: TransactionOwner,
    /// Request kind
    pub kind: RequestKind,
    /// Encoded request
    pub request: EncodedPdu,
    /// Response deadline
    pub deadline: Instant,
    /// Send retries spent on the request
    pub retry_count: u32,
}

/// Transaction removed by [`TransactionTracker::tick`]
#[derive(Debug, Clone)]
pub struct ExpiredTransaction {
    /// The expired transaction
    pub transaction: Transaction,
    /// How far past its deadline the sweep found it
    pub overdue: Duration,
}

/// Result of matching a response against the pending set
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The response matched; the transaction is no longer pending
    Matched(Transaction),
    /// No pending transaction matches (late, duplicate or foreign response)
    UnknownTransaction,
}

/// Pending transaction table with id allocation and expiry
#[derive(Debug)]
pub struct TransactionTracker {
    pending: HashMap<TransactionId, Transaction>,
    by_owner: HashMap<TransactionOwner, TransactionId>,
    next_id: TransactionId,
}

impl Default for TransactionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionTracker {
    /// Creates an empty tracker whose first id is 1.
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            by_owner: HashMap::new(),
            next_id: TransactionId(1),
        }
    }

    /// Registers an already encoded request.
    pub fn begin(
        &mut self,
        owner: TransactionOwner,
        kind: RequestKind,
        request: EncodedPdu,
        timeout: Duration,
        now: Instant,
    ) -> Result<TransactionId, StateError> {
        let id = self.allocate(&owner)?;
        self.insert(id, owner, kind, request, now + timeout);
        Ok(id)
    }

    /// Registers a request whose encoding embeds its own transaction id.
    ///
    /// `build` receives the id the transaction will get. Nothing is
    /// registered and no id is consumed when it fails.
    pub fn begin_with<F>(
        &mut self,
        owner: TransactionOwner,
        kind: RequestKind,
        timeout: Duration,
        now: Instant,
        build: F,
    ) -> Result<TransactionId, XappError>
    where
        F: FnOnce(TransactionId) -> Result<EncodedPdu, CodecError>,
    {
        let id = self.allocate(&owner)?;
        let request = build(id)?;
        self.insert(id, owner, kind, request, now + timeout);
        Ok(id)
    }

    fn allocate(&self, owner: &TransactionOwner) -> Result<TransactionId, StateError> {
        if let Some(pending) = self.by_owner.get(owner) {
            return Err(StateError::Conflict(format!(
                "{owner} already has transaction {pending} pending"
            )));
        }
        let mut candidate = self.next_id;
        for _ in 0..u16::MAX {
            if !self.pending.contains_key(&candidate) {
                return Ok(candidate);
            }
            candidate = candidate.following();
        }
        Err(StateError::Conflict("all transaction ids are pending".to_string()))
    }

    fn insert(
        &mut self,
        id: TransactionId,
        owner: TransactionOwner,
        kind: RequestKind,
        request: EncodedPdu,
        deadline: Instant,
    ) {
        self.next_id = id.following();
        self.by_owner.insert(owner.clone(), id);
        self.pending.insert(
            id,
            Transaction {
                id,
                owner,
                kind,
                request,
                deadline,
                retry_count: 0,
            },
        );
    }

    /// Matches a response. Id, owner and kind must all agree with a pending
    /// entry; on a mismatch the entry stays pending.
    pub fn resolve(
        &mut self,
        id: TransactionId,
        owner: &TransactionOwner,
        kind: RequestKind,
    ) -> Resolution {
        match self.pending.get(&id) {
            Some(txn) if txn.owner == *owner && txn.kind == kind => {}
            _ => return Resolution::UnknownTransaction,
        }
        match self.remove(id) {
            Some(txn) => Resolution::Matched(txn),
            None => Resolution::UnknownTransaction,
        }
    }

    /// Removes and returns every transaction due at or before `now`, earliest deadline first.
    pub fn tick(&mut self, now: Instant) -> Vec<ExpiredTransaction> {
        let mut due: Vec<(Instant, TransactionId)> = self
            .pending
            .values()
            .filter(|txn| txn.deadline <= now)
            .map(|txn| (txn.deadline, txn.id))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id)| self.remove(id))
            .map(|transaction| ExpiredTransaction {
                overdue: now.saturating_duration_since(transaction.deadline),
                transaction,
            })
            .collect()
    }

    /// Removes a transaction.
    pub fn cancel(&mut self, id: TransactionId) -> Option<Transaction> {
        self.remove(id)
    }

    /// Removes the pending transaction of an owner.
    pub fn cancel_owner(&mut self, owner: &TransactionOwner) -> Option<Transaction> {
        let id = *self.by_owner.get(owner)?;
        self.remove(id)
    }

    /// Counts one send retry against a transaction. Returns false if it is not pending.
    pub fn record_retry(&mut self, id: TransactionId) -> bool {
        match self.pending.get_mut(&id) {
            Some(txn) => {
                txn.retry_count += 1;
                true
            }
            None => false,
        }
    }

    /// Pending transaction of an owner.
    pub fn pending_for(&self, owner: &TransactionOwner) -> Option<&Transaction> {
        self.by_owner.get(owner).and_then(|id| self.pending.get(id))
    }

    /// Pending transaction by id.
    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.pending.get(&id)
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        let txn = self.pending.remove(&id)?;
        self.by_owner.remove(&txn.owner);
        Some(txn)
    }
}
