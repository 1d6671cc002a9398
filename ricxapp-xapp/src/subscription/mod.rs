//! Subscription lifecycle
//!
//! - `tracker`: transaction ids, pending requests and deadlines
//! - `state`: subscription identity and lifecycle states
//! - `intent`: what the application asks for and how it ends
//! - `manager`: the state machine tying requests, responses and timers together
//! - `store`: best-effort persistence of active subscriptions

pub mod intent;
pub mod manager;
pub mod state;
pub mod store;
pub mod tracker;

pub use intent::{Completion, ControlIntent, IntentOutcome, OutboundRequest, SubscribeIntent};
pub use manager::SubscriptionManager;
pub use state::{Subscription, SubscriptionId, SubscriptionState};
pub use store::{ActionRecord, JsonFileStore, MemoryStore, SubscriptionRecord, SubscriptionStore};
pub use tracker::{
    ExpiredTransaction, RequestKind, Resolution, Transaction, TransactionId, TransactionOwner,
    TransactionTracker,
};
