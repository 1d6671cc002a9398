//! Subscription state machine
//!
//! Owns the subscription table and the transaction tracker. Intents encode
//! their request and register a transaction before anything is sent;
//! responses, expiries and send failures drive the transitions below.
//!
//! ```text
//!                 response                 delete            response / timeout*
//!  Requested ──────────────► Active ─────────────► DeleteRequested ─────────► Deleted
//!     │                      │   ▲                      │
//!     │ failure / timeout    │   │ ack / failure /      │ failure / timeout**
//!     ▼                      ▼   │ timeout              ▼
//!   Failed             ModifyRequested                Failed
//!
//!  *  timeout counts as success while delete_timeout_as_success is set
//!  ** otherwise
//! ```
//!
//! A reset of an E2 node (response or timeout) moves every non-terminal
//! subscription on that node to `Deleted`. All methods take the current
//! time so the machine can be driven deterministically.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use ricxapp_common::{E2NodeId, RicRequestId, SubscriptionConfig};
use ricxapp_e2ap::procedures::{
    Cause, ControlAckRequest, ControlRequest, ResetRequest, SubscriptionDeleteRequest,
    SubscriptionRequest,
};
use ricxapp_e2ap::{E2apCodec, E2apPdu, MessageType};
use ricxapp_rmr::RmrMessage;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::intent::{Completion, ControlIntent, IntentOutcome, OutboundRequest, SubscribeIntent};
use super::state::{Subscription, SubscriptionId, SubscriptionState};
use super::store::{SubscriptionRecord, SubscriptionStore};
use super::tracker::{
    RequestKind, Resolution, Transaction, TransactionId, TransactionOwner, TransactionTracker,
};
use crate::error::{StateError, StoreError, XappError};

/// Subscription table, transaction tracker and lifecycle rules
pub struct SubscriptionManager {
    config: SubscriptionConfig,
    codec: Arc<E2apCodec>,
    table: HashMap<SubscriptionId, Subscription>,
    tracker: TransactionTracker,
    /// Control transactions that complete once sent
    unacknowledged: HashSet<TransactionId>,
    store: Option<Box<dyn SubscriptionStore>>,
    store_degraded: bool,
}

impl SubscriptionManager {
    /// Creates a manager without persistence.
    pub fn new(config: SubscriptionConfig, codec: Arc<E2apCodec>) -> Self {
        Self {
            config,
            codec,
            table: HashMap::new(),
            tracker: TransactionTracker::new(),
            unacknowledged: HashSet::new(),
            store: None,
            store_degraded: false,
        }
    }

    /// Attaches a subscription store.
    pub fn with_store(mut self, store: Box<dyn SubscriptionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// RIC requestor id used for new subscriptions.
    pub fn requestor_id(&self) -> u16 {
        self.config.requestor_id
    }

    // ========================================================================
    // Intents
    // ========================================================================

    /// Starts a subscription: encodes the request and registers its transaction.
    pub fn begin_subscribe(
        &mut self,
        intent: SubscribeIntent,
        now: Instant,
    ) -> Result<OutboundRequest, XappError> {
        let id = SubscriptionId::new(
            self.config.requestor_id,
            intent.ran_function_id,
            intent.e2_node.clone(),
        );
        if let Some(existing) = self.table.get(&id) {
            if !existing.state.is_terminal() {
                let reason = format!("subscription {id} is {}", existing.state);
                return Err(StateError::Conflict(reason).into());
            }
        }

        let owner = TransactionOwner::Subscription(id.clone());
        let codec = Arc::clone(&self.codec);
        let txn = self.tracker.begin_with(
            owner.clone(),
            RequestKind::Subscribe,
            self.config.response_timeout(),
            now,
            |txn| {
                codec.encode(&E2apPdu::from(SubscriptionRequest {
                    request_id: RicRequestId::new(id.requestor_id, txn.value()),
                    ran_function_id: intent.ran_function_id,
                    event_trigger: intent.event_trigger.clone(),
                    actions: intent.actions.clone(),
                }))
            },
        )?;

        info!(subscription = %id, txn = %txn, "Subscription requested");
        let request_id = RicRequestId::new(id.requestor_id, txn.value());
        self.table.insert(
            id.clone(),
            Subscription::requested(id, request_id, intent.event_trigger, intent.actions, txn, now),
        );
        Ok(self.outbound(
            txn,
            owner,
            RequestKind::Subscribe,
            MessageType::SubscriptionRequest,
            true,
            now,
        ))
    }

    /// Starts deleting an active subscription.
    ///
    /// The request carries the RIC request id of the original subscription
    /// request, which is how the E2 node finds the subscription.
    pub fn begin_delete(
        &mut self,
        id: &SubscriptionId,
        now: Instant,
    ) -> Result<OutboundRequest, XappError> {
        let request_id = self.check_idle(id)?.request_id;

        let owner = TransactionOwner::Subscription(id.clone());
        let codec = Arc::clone(&self.codec);
        let txn = self.tracker.begin_with(
            owner.clone(),
            RequestKind::Delete,
            self.config.delete_timeout(),
            now,
            |_| {
                codec.encode(&E2apPdu::from(SubscriptionDeleteRequest {
                    request_id,
                    ran_function_id: id.ran_function_id,
                }))
            },
        )?;

        self.mark_outstanding(id, txn, SubscriptionState::DeleteRequested, now);
        info!(subscription = %id, txn = %txn, "Subscription delete requested");
        Ok(self.outbound(
            txn,
            owner,
            RequestKind::Delete,
            MessageType::SubscriptionDeleteRequest,
            true,
            now,
        ))
    }

    /// Starts a control request on an active subscription.
    pub fn begin_control(
        &mut self,
        intent: ControlIntent,
        now: Instant,
    ) -> Result<OutboundRequest, XappError> {
        let id = intent.subscription.clone();
        let request_id = self.check_idle(&id)?.request_id;

        let expects_response = !matches!(intent.ack_request, Some(ControlAckRequest::NoAck));
        let owner = TransactionOwner::Subscription(id.clone());
        let codec = Arc::clone(&self.codec);
        let txn = self.tracker.begin_with(
            owner.clone(),
            RequestKind::Control,
            self.config.control_timeout(),
            now,
            |_| {
                codec.encode(&E2apPdu::from(ControlRequest {
                    request_id,
                    ran_function_id: id.ran_function_id,
                    call_process_id: intent.call_process_id.clone(),
                    header: intent.header.clone(),
                    message: intent.message.clone(),
                    ack_request: intent.ack_request,
                }))
            },
        )?;

        if !expects_response {
            self.unacknowledged.insert(txn);
        }
        self.mark_outstanding(&id, txn, SubscriptionState::ModifyRequested, now);
        info!(subscription = %id, txn = %txn, "Control requested");
        Ok(self.outbound(
            txn,
            owner,
            RequestKind::Control,
            MessageType::ControlRequest,
            expects_response,
            now,
        ))
    }

    /// Starts a reset of an E2 node.
    pub fn begin_reset(
        &mut self,
        e2_node: E2NodeId,
        cause: Cause,
        now: Instant,
    ) -> Result<OutboundRequest, XappError> {
        let owner = TransactionOwner::Node(e2_node.clone());
        let codec = Arc::clone(&self.codec);
        let txn = self.tracker.begin_with(
            owner.clone(),
            RequestKind::Reset,
            self.config.control_timeout(),
            now,
            |txn| {
                codec.encode(&E2apPdu::from(ResetRequest {
                    transaction_id: txn.low_byte(),
                    cause,
                }))
            },
        )?;

        info!(e2_node = %e2_node, txn = %txn, cause = %cause, "Reset requested");
        Ok(self.outbound(
            txn,
            owner,
            RequestKind::Reset,
            MessageType::ResetRequest,
            true,
            now,
        ))
    }

    /// Completes a request that expects no response once it has been sent.
    pub fn on_request_sent(&mut self, txn: TransactionId, now: Instant) -> Vec<Completion> {
        if !self.unacknowledged.remove(&txn) {
            return Vec::new();
        }
        match self.tracker.cancel(txn) {
            Some(transaction) => {
                self.finish(transaction, IntentOutcome::ControlAcknowledged { outcome: None }, now)
            }
            None => Vec::new(),
        }
    }

    /// Counts send retries spent on a transaction.
    pub fn record_retries(&mut self, txn: TransactionId, retries: u32) {
        for _ in 0..retries {
            if !self.tracker.record_retry(txn) {
                break;
            }
        }
    }

    /// Fails a transaction whose request could not be sent.
    pub fn abort_transaction(
        &mut self,
        txn: TransactionId,
        reason: String,
        now: Instant,
    ) -> Vec<Completion> {
        self.unacknowledged.remove(&txn);
        match self.tracker.cancel(txn) {
            Some(transaction) => self.finish(transaction, IntentOutcome::SendFailed(reason), now),
            None => Vec::new(),
        }
    }

    // ========================================================================
    // Responses and timers
    // ========================================================================

    /// Applies a decoded response received from `e2_node`.
    pub fn handle_response(
        &mut self,
        pdu: E2apPdu,
        e2_node: &E2NodeId,
        now: Instant,
    ) -> Result<Vec<Completion>, StateError> {
        let (txn, outcome) = match pdu {
            E2apPdu::SubscriptionResponse(m) => (
                self.resolve(m.request_id, m.ran_function_id, e2_node, RequestKind::Subscribe)?,
                IntentOutcome::Subscribed {
                    admitted: m.admitted,
                    not_admitted: m.not_admitted,
                },
            ),
            E2apPdu::SubscriptionFailure(m) => (
                self.resolve(m.request_id, m.ran_function_id, e2_node, RequestKind::Subscribe)?,
                IntentOutcome::SubscriptionRejected(m.cause),
            ),
            E2apPdu::SubscriptionDeleteResponse(m) => (
                self.resolve(m.request_id, m.ran_function_id, e2_node, RequestKind::Delete)?,
                IntentOutcome::Deleted,
            ),
            E2apPdu::SubscriptionDeleteFailure(m) => (
                self.resolve(m.request_id, m.ran_function_id, e2_node, RequestKind::Delete)?,
                IntentOutcome::DeleteRejected(m.cause),
            ),
            E2apPdu::ControlAcknowledge(m) => (
                self.resolve(m.request_id, m.ran_function_id, e2_node, RequestKind::Control)?,
                IntentOutcome::ControlAcknowledged { outcome: m.outcome },
            ),
            E2apPdu::ControlFailure(m) => (
                self.resolve(m.request_id, m.ran_function_id, e2_node, RequestKind::Control)?,
                IntentOutcome::ControlRejected {
                    cause: m.cause,
                    outcome: m.outcome,
                },
            ),
            E2apPdu::ResetResponse(m) => {
                let owner = TransactionOwner::Node(e2_node.clone());
                let id = match self.tracker.pending_for(&owner) {
                    Some(txn)
                        if txn.kind == RequestKind::Reset
                            && txn.id.low_byte() == m.transaction_id =>
                    {
                        txn.id
                    }
                    _ => {
                        return Err(StateError::UnknownTransaction(u16::from(m.transaction_id)))
                    }
                };
                match self.tracker.resolve(id, &owner, RequestKind::Reset) {
                    Resolution::Matched(txn) => (txn, IntentOutcome::ResetCompleted),
                    Resolution::UnknownTransaction => {
                        return Err(StateError::UnknownTransaction(id.value()))
                    }
                }
            }
            other => {
                warn!("{} is not a response, ignoring", other.name());
                return Ok(Vec::new());
            }
        };
        Ok(self.finish(txn, outcome, now))
    }

    /// Fails the transaction named by the RMR header of an undecodable response.
    pub fn fail_transaction(
        &mut self,
        transaction_id: u16,
        e2_node: Option<&E2NodeId>,
        mtype: MessageType,
        now: Instant,
    ) -> Result<Vec<Completion>, StateError> {
        let unknown = StateError::UnknownTransaction(transaction_id);
        let kind = RequestKind::answered_by(mtype).ok_or_else(|| unknown.clone())?;
        let id = TransactionId(transaction_id);
        let owner = match self.tracker.get(id) {
            Some(txn)
                if txn.kind == kind && e2_node.map_or(true, |node| txn.owner.e2_node() == node) =>
            {
                txn.owner.clone()
            }
            _ => return Err(unknown),
        };
        match self.tracker.resolve(id, &owner, kind) {
            Resolution::Matched(txn) => {
                Ok(self.finish(txn, IntentOutcome::UndecodableResponse, now))
            }
            Resolution::UnknownTransaction => Err(unknown),
        }
    }

    /// Expires overdue transactions and purges terminal entries past retention.
    pub fn tick(&mut self, now: Instant) -> Vec<Completion> {
        let mut completions = Vec::new();
        for expired in self.tracker.tick(now) {
            let txn = expired.transaction;
            self.unacknowledged.remove(&txn.id);
            warn!(owner = %txn.owner, txn = %txn.id, "{} request timed out", txn.kind);
            completions.extend(self.finish(txn, IntentOutcome::TimedOut, now));
        }

        let retention = self.config.terminal_retention();
        let before = self.table.len();
        self.table.retain(|_, sub| {
            !(sub.state.is_terminal()
                && now.saturating_duration_since(sub.last_transition) >= retention)
        });
        let purged = before - self.table.len();
        if purged > 0 {
            debug!("Purged {} terminal subscription(s)", purged);
        }
        completions
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current state of a subscription.
    pub fn state(&self, id: &SubscriptionId) -> Option<SubscriptionState> {
        self.table.get(id).map(|sub| sub.state)
    }

    /// Subscription entry.
    pub fn get(&self, id: &SubscriptionId) -> Option<&Subscription> {
        self.table.get(id)
    }

    /// All subscription entries, including retained terminal ones.
    pub fn subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.table.values()
    }

    /// Active subscriptions with no transaction outstanding.
    pub fn idle_active_subscriptions(&self) -> Vec<SubscriptionId> {
        let mut ids: Vec<_> = self
            .table
            .values()
            .filter(|sub| sub.state == SubscriptionState::Active && sub.outstanding.is_none())
            .map(|sub| sub.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Pending transactions.
    pub fn tracker(&self) -> &TransactionTracker {
        &self.tracker
    }

    /// True once a store failure switched the manager to memory-only mode.
    pub fn is_store_degraded(&self) -> bool {
        self.store_degraded
    }

    /// Counts an indication forwarded for a subscription.
    pub fn record_indication(&mut self, id: &SubscriptionId) {
        if let Some(sub) = self.table.get_mut(id) {
            sub.indications_delivered += 1;
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Reloads persisted subscriptions as `Active`. Returns how many were restored.
    pub fn restore(&mut self, now: Instant) -> Result<usize, StoreError> {
        let records = match &self.store {
            Some(store) => store.load_all()?,
            None => return Ok(0),
        };

        let mut restored = 0;
        for record in records {
            let id = record.subscription_id();
            if self.table.get(&id).is_some_and(|sub| !sub.state.is_terminal()) {
                continue;
            }
            let mut sub = Subscription::requested(
                id.clone(),
                record.request_id(),
                record.event_trigger.clone().into(),
                record.ric_actions(),
                TransactionId(0),
                now,
            );
            sub.outstanding = None;
            sub.state = SubscriptionState::Active;
            sub.admitted = record.admitted;
            self.table.insert(id, sub);
            restored += 1;
        }
        if restored > 0 {
            info!("Restored {} subscription(s) from store", restored);
        }
        Ok(restored)
    }

    fn persist(&mut self, record: SubscriptionRecord) {
        if self.store_degraded {
            return;
        }
        if let Some(store) = self.store.as_mut() {
            if let Err(e) = store.save(&record) {
                warn!("Subscription store failed ({}), continuing in memory only", e);
                self.store_degraded = true;
            }
        }
    }

    fn unpersist(&mut self, key: &str) {
        if self.store_degraded {
            return;
        }
        if let Some(store) = self.store.as_mut() {
            if let Err(e) = store.remove(key) {
                warn!("Subscription store failed ({}), continuing in memory only", e);
                self.store_degraded = true;
            }
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn check_idle(&self, id: &SubscriptionId) -> Result<&Subscription, StateError> {
        let sub = self
            .table
            .get(id)
            .ok_or_else(|| StateError::UnknownSubscription(id.to_string()))?;
        if sub.state.is_terminal() {
            return Err(StateError::Conflict(format!("subscription {id} is {}", sub.state)));
        }
        if let Some(txn) = sub.outstanding {
            return Err(StateError::Conflict(format!(
                "subscription {id} has transaction {txn} outstanding"
            )));
        }
        Ok(sub)
    }

    fn mark_outstanding(
        &mut self,
        id: &SubscriptionId,
        txn: TransactionId,
        state: SubscriptionState,
        now: Instant,
    ) {
        if let Some(sub) = self.table.get_mut(id) {
            sub.outstanding = Some(txn);
            sub.transition(state, now);
        }
    }

    fn outbound(
        &self,
        txn: TransactionId,
        owner: TransactionOwner,
        kind: RequestKind,
        mtype: MessageType,
        expects_response: bool,
        now: Instant,
    ) -> OutboundRequest {
        let (payload, deadline) = match self.tracker.get(txn) {
            Some(pending) => (pending.request.bytes(), pending.deadline),
            None => (Bytes::new(), now),
        };
        let message = RmrMessage::new(mtype.as_i32(), payload)
            .with_meid(owner.e2_node().clone())
            .with_transaction_id(txn.value());
        OutboundRequest {
            transaction: txn,
            owner,
            kind,
            message,
            deadline,
            expects_response,
        }
    }

    /// Matches a response to the pending transaction of the subscription it
    /// names. The RIC request id must be the one the subscription was created with.
    fn resolve(
        &mut self,
        request_id: RicRequestId,
        ran_function_id: u16,
        e2_node: &E2NodeId,
        kind: RequestKind,
    ) -> Result<Transaction, StateError> {
        let unknown = StateError::UnknownTransaction(request_id.instance_id);
        let id = SubscriptionId::new(request_id.requestor_id, ran_function_id, e2_node.clone());
        if self.table.get(&id).map(|sub| sub.request_id) != Some(request_id) {
            return Err(unknown);
        }

        // At most one transaction is pending per subscription
        let owner = TransactionOwner::Subscription(id);
        let pending = match self.tracker.pending_for(&owner) {
            Some(txn) => txn.id,
            None => return Err(unknown),
        };
        match self.tracker.resolve(pending, &owner, kind) {
            Resolution::Matched(txn) => {
                self.unacknowledged.remove(&txn.id);
                Ok(txn)
            }
            Resolution::UnknownTransaction => Err(unknown),
        }
    }

    /// State a subscription moves to when a transaction of `kind` ends with `outcome`.
    fn next_state(&self, kind: RequestKind, outcome: &IntentOutcome) -> SubscriptionState {
        match (kind, outcome) {
            (RequestKind::Subscribe, IntentOutcome::Subscribed { .. }) => SubscriptionState::Active,
            (RequestKind::Subscribe, _) => SubscriptionState::Failed,
            (RequestKind::Delete, IntentOutcome::Deleted | IntentOutcome::Cancelled) => {
                SubscriptionState::Deleted
            }
            (RequestKind::Delete, IntentOutcome::TimedOut)
                if self.config.delete_timeout_as_success =>
            {
                SubscriptionState::Deleted
            }
            (RequestKind::Delete, IntentOutcome::SendFailed(_)) => SubscriptionState::Active,
            (RequestKind::Delete, _) => SubscriptionState::Failed,
            (RequestKind::Control | RequestKind::Reset, _) => SubscriptionState::Active,
        }
    }

    fn finish(
        &mut self,
        txn: Transaction,
        outcome: IntentOutcome,
        now: Instant,
    ) -> Vec<Completion> {
        let mut completions = Vec::new();
        match &txn.owner {
            TransactionOwner::Subscription(id) => {
                let next = self.next_state(txn.kind, &outcome);
                self.apply(id, txn.id, next, &outcome, now);
            }
            TransactionOwner::Node(node) => {
                if matches!(outcome, IntentOutcome::ResetCompleted | IntentOutcome::TimedOut) {
                    completions = self.reset_node(node, now);
                }
            }
        }

        if outcome.is_success() {
            info!(owner = %txn.owner, txn = %txn.id, "{} completed: {:?}", txn.kind, outcome);
        } else {
            warn!(owner = %txn.owner, txn = %txn.id, "{} did not succeed: {:?}", txn.kind, outcome);
        }
        completions.insert(
            0,
            Completion {
                transaction: txn.id,
                owner: txn.owner,
                kind: txn.kind,
                outcome,
            },
        );
        completions
    }

    fn apply(
        &mut self,
        id: &SubscriptionId,
        txn: TransactionId,
        next: SubscriptionState,
        outcome: &IntentOutcome,
        now: Instant,
    ) {
        let record = {
            let Some(sub) = self.table.get_mut(id) else {
                return;
            };
            if sub.outstanding != Some(txn) {
                return;
            }
            sub.outstanding = None;
            sub.transition(next, now);
            if let IntentOutcome::Subscribed { admitted, not_admitted } = outcome {
                sub.admitted = admitted.clone();
                sub.not_admitted = not_admitted.clone();
            }
            if next == SubscriptionState::Failed {
                sub.failure_reason = Some(failure_reason(outcome));
            }
            info!(subscription = %id, "Subscription is {}", next);
            SubscriptionRecord::from(&*sub)
        };

        if next == SubscriptionState::Active {
            self.persist(record);
        } else if next.is_terminal() {
            self.unpersist(&id.to_string());
        }
    }

    /// Moves every non-terminal subscription of a node to `Deleted`.
    fn reset_node(&mut self, node: &E2NodeId, now: Instant) -> Vec<Completion> {
        let ids: Vec<SubscriptionId> = self
            .table
            .values()
            .filter(|sub| &sub.id.e2_node == node && !sub.state.is_terminal())
            .map(|sub| sub.id.clone())
            .collect();

        let mut completions = Vec::new();
        for id in ids {
            let outstanding = self.table.get_mut(&id).and_then(|sub| {
                sub.transition(SubscriptionState::Deleted, now);
                sub.outstanding.take()
            });
            if let Some(txn) = outstanding.and_then(|txn| self.tracker.cancel(txn)) {
                self.unacknowledged.remove(&txn.id);
                completions.push(Completion {
                    transaction: txn.id,
                    owner: txn.owner,
                    kind: txn.kind,
                    outcome: IntentOutcome::Cancelled,
                });
            }
            self.unpersist(&id.to_string());
        }
        info!(e2_node = %node, "E2 node reset, its subscriptions are deleted");
        completions
    }
}

fn failure_reason(outcome: &IntentOutcome) -> String {
    match outcome {
        IntentOutcome::SubscriptionRejected(cause) => format!("rejected by E2 node ({cause})"),
        IntentOutcome::DeleteRejected(cause) => format!("delete rejected by E2 node ({cause})"),
        IntentOutcome::TimedOut => "no response before deadline".to_string(),
        IntentOutcome::SendFailed(reason) => format!("send failed: {reason}"),
        IntentOutcome::UndecodableResponse => "undecodable response".to_string(),
        other => format!("{other:?}"),
    }
}
