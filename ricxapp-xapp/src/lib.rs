//! ricxapp-xapp - E2 message-plane core of a near-RT RIC xApp
//!
//! This crate ties the E2AP codec and the RMR transport together into an
//! xApp that manages RIC subscriptions on E2 nodes:
//!
//! - Transaction tracking with deadlines and response correlation
//! - Subscription state machine (subscribe, delete, control, reset)
//! - RMR message dispatch with health check handling
//! - Indication filtering and delivery through a bounded queue
//! - Best-effort subscription persistence
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          xApp                            │
//! │                                                          │
//! │   Xapp handle ──intents──► XappCore ◄──responses──┐      │
//! │        │               (subscriptions,            │      │
//! │        │                transactions,        Dispatcher  │
//! │        │                waiters)               Task      │
//! │        │                                          │      │
//! │        │                  IndicationQueue ◄───────┤      │
//! │        │                        │                 │      │
//! │        │                  Indication Task         │      │
//! │        │                        │                 │      │
//! └────────┼────────────────────────┼─────────────────┼──────┘
//!          ▼                        ▼                 │
//!      RMR send               IndicationSink       RMR recv
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ricxapp_rmr::UdpRmrEndpoint;
//! use ricxapp_xapp::{load_and_validate_xapp_config, LoggingSink, Xapp};
//!
//! let config = load_and_validate_xapp_config("config/xapp.yaml")?;
//! let transport = UdpRmrEndpoint::bind(&config.rmr).await?;
//! let xapp = Xapp::start(config, Arc::new(transport), Arc::new(LoggingSink), None);
//! // xapp.subscribe(intent).await?;
//! xapp.shutdown().await?;
//! ```

pub mod app;
pub mod dispatcher;
pub mod error;
pub mod indication;
pub mod shared;
pub mod subscription;
pub mod tasks;
pub mod xapp;

pub use app::{
    load_and_validate_xapp_config, load_xapp_config, load_xapp_config_from_str, startup_intent,
    validate_xapp_config, ConfigError, ConfigValidationError,
};
pub use dispatcher::{DispatcherTask, RequestSender, HEALTH_CHECK_OK};
pub use error::{StateError, StoreError, XappError};
pub use indication::{
    ChannelSink, IndicationDisposition, IndicationEvent, IndicationProcessor, IndicationSink,
    IndicationStats, LoggingSink,
};
pub use subscription::{
    Completion, ControlIntent, IntentOutcome, JsonFileStore, MemoryStore, RequestKind,
    SubscribeIntent, Subscription, SubscriptionId, SubscriptionManager, SubscriptionRecord,
    SubscriptionState, SubscriptionStore, TransactionId, TransactionOwner, TransactionTracker,
};
pub use xapp::Xapp;

// Re-export task framework types
pub use tasks::{
    DispatcherMessage, IndicationMessage, Task, TaskError, TaskHandle, TaskHandles, TaskId,
    TaskManager, TaskMessage, TaskState, DEFAULT_CHANNEL_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT_MS,
};
