//! Shared subscription core
//!
//! The subscription manager plus the waiters of application callers, behind
//! one mutex shared by the [`crate::Xapp`] handle and the dispatcher task.
//! The lock is only held for table updates, never across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use crate::subscription::{Completion, IntentOutcome, SubscriptionManager, TransactionId};

/// Shared handle to the core
pub type SharedCore = Arc<Mutex<XappCore>>;

/// Subscription manager and completion waiters
pub struct XappCore {
    /// Subscription state machine
    pub manager: SubscriptionManager,
    waiters: HashMap<TransactionId, oneshot::Sender<IntentOutcome>>,
}

impl XappCore {
    /// Wraps a manager.
    pub fn new(manager: SubscriptionManager) -> Self {
        Self {
            manager,
            waiters: HashMap::new(),
        }
    }

    /// Wraps a manager into a shared handle.
    pub fn shared(manager: SubscriptionManager) -> SharedCore {
        Arc::new(Mutex::new(Self::new(manager)))
    }

    /// Registers a waiter for a transaction's outcome.
    pub fn register_waiter(&mut self, txn: TransactionId) -> oneshot::Receiver<IntentOutcome> {
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(txn, tx);
        rx
    }

    /// Hands finished transactions to their waiters.
    pub fn complete(&mut self, completions: Vec<Completion>) {
        for completion in completions {
            if let Some(waiter) = self.waiters.remove(&completion.transaction) {
                if waiter.send(completion.outcome).is_err() {
                    debug!(txn = %completion.transaction, "Waiter gone before completion");
                }
            }
        }
    }

    /// Number of callers waiting for an outcome.
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Drops all waiters; their receivers observe a closed channel.
    pub fn clear_waiters(&mut self) {
        self.waiters.clear();
    }
}

/// Locks the core, recovering the guard from a poisoned mutex.
pub fn lock_core(core: &SharedCore) -> MutexGuard<'_, XappCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}
