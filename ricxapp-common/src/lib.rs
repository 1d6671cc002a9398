//! Common types and utilities for ricxapp
//!
//! This crate provides shared types, configuration structures, and utilities
//! used across all ricxapp crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod transport;
pub mod types;

pub use config::{
    ActionConfig, CodecConfig, IndicationConfig, RmrConfig, RouteConfig, StartupSubscription,
    StoreConfig, SubscriptionConfig, XappConfig,
};
pub use error::Error;
pub use logging::{
    format_hex_dump, init_logging, init_logging_with_filter, log_e2ap_message,
    log_protocol_message, log_rmr_message, Direction, HexDump, LogLevel,
};
pub use transport::UdpTransport;
pub use types::*;
