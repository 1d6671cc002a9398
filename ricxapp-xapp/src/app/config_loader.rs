//! Configuration Loading for the xApp
//!
//! Wraps [`XappConfig`] from `ricxapp-common` with loading helpers and the
//! validation the xApp needs before it starts: positive timeouts and
//! capacities, well-formed E2 node names, RAN function ids and action lists
//! of the startup subscriptions, and parseable hex fields.
//!
//! # Example
//!
//! ```rust,ignore
//! use ricxapp_xapp::app::load_and_validate_xapp_config;
//!
//! let config = load_and_validate_xapp_config("config/xapp.yaml")?;
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use ricxapp_common::config::{StartupSubscription, XappConfig};
use ricxapp_common::E2NodeId;
use ricxapp_e2ap::procedures::{RicAction, RicActionType, MAX_RAN_FUNCTION_ID, MAX_RIC_ACTIONS};
use thiserror::Error;

use crate::subscription::SubscribeIntent;

/// Smallest accepted encode scratch buffer
pub const MIN_ENCODE_BUFFER_SIZE: usize = 64;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ConfigValidationError),
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Invalid RMR settings
    #[error("Invalid RMR configuration: {0}")]
    InvalidRmr(String),

    /// Zero timeout or interval
    #[error("Invalid timer: {0}")]
    InvalidTimer(String),

    /// Invalid queue or buffer sizing
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Invalid E2 node name
    #[error("Invalid E2 node: {0}")]
    InvalidE2Node(String),

    /// Invalid startup subscription
    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),

    /// Invalid hex field
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

/// Loads an xApp configuration from a YAML file.
pub fn load_xapp_config<P: AsRef<Path>>(path: P) -> Result<XappConfig, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    load_xapp_config_from_str(&contents)
}

/// Loads an xApp configuration from a YAML string.
pub fn load_xapp_config_from_str(yaml: &str) -> Result<XappConfig, ConfigError> {
    let config: XappConfig =
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    Ok(config)
}

/// Validates an xApp configuration.
///
/// # Validation Rules
///
/// - `rmr.send_attempts` and `rmr.max_message_size` must be non-zero
/// - every subscription timeout and interval must be non-zero
/// - the send retry budget, `(send_attempts - 1) * retry_interval_ms`,
///   must stay below the shortest transaction timeout
/// - `indication.queue_capacity` must be non-zero
/// - `codec.encode_buffer_size` must be at least [`MIN_ENCODE_BUFFER_SIZE`]
/// - startup subscriptions need a valid E2 node name, a RAN function id
///   up to 4095, 1 to 16 actions with distinct ids, and valid hex fields
pub fn validate_xapp_config(config: &XappConfig) -> Result<(), ConfigValidationError> {
    if config.rmr.send_attempts == 0 {
        return Err(ConfigValidationError::InvalidRmr(
            "send_attempts must be at least 1".to_string(),
        ));
    }
    if config.rmr.max_message_size == 0 {
        return Err(ConfigValidationError::InvalidRmr(
            "max_message_size must be non-zero".to_string(),
        ));
    }

    let sub = &config.subscription;
    for (name, value) in [
        ("response_timeout_ms", sub.response_timeout_ms),
        ("delete_timeout_ms", sub.delete_timeout_ms),
        ("control_timeout_ms", sub.control_timeout_ms),
        ("sweep_interval_ms", sub.sweep_interval_ms),
        ("rmr.retry_interval_ms", config.rmr.retry_interval_ms),
    ] {
        if value == 0 {
            return Err(ConfigValidationError::InvalidTimer(format!("{name} must be non-zero")));
        }
    }

    let retry_budget = config
        .rmr
        .retry_interval_ms
        .saturating_mul(u64::from(config.rmr.send_attempts - 1));
    let shortest_timeout = sub
        .response_timeout_ms
        .min(sub.delete_timeout_ms)
        .min(sub.control_timeout_ms);
    if retry_budget >= shortest_timeout {
        return Err(ConfigValidationError::InvalidTimer(format!(
            "send retry budget {retry_budget} ms is not below timeout {shortest_timeout} ms"
        )));
    }

    if config.indication.queue_capacity == 0 {
        return Err(ConfigValidationError::InvalidCapacity(
            "indication.queue_capacity must be non-zero".to_string(),
        ));
    }
    if config.codec.encode_buffer_size < MIN_ENCODE_BUFFER_SIZE {
        return Err(ConfigValidationError::InvalidCapacity(format!(
            "codec.encode_buffer_size {} is below {MIN_ENCODE_BUFFER_SIZE}",
            config.codec.encode_buffer_size
        )));
    }

    for startup in &config.startup_subscriptions {
        startup_intent(startup)?;
    }
    Ok(())
}

/// Converts a configured startup subscription into a subscribe intent.
pub fn startup_intent(
    startup: &StartupSubscription,
) -> Result<SubscribeIntent, ConfigValidationError> {
    let e2_node = E2NodeId::new(startup.e2_node.clone())
        .map_err(|e| ConfigValidationError::InvalidE2Node(e.to_string()))?;

    if startup.ran_function_id > MAX_RAN_FUNCTION_ID {
        return Err(ConfigValidationError::InvalidSubscription(format!(
            "{}: RAN function id {} exceeds {MAX_RAN_FUNCTION_ID}",
            startup.e2_node, startup.ran_function_id
        )));
    }
    if startup.actions.is_empty() || startup.actions.len() > MAX_RIC_ACTIONS {
        return Err(ConfigValidationError::InvalidSubscription(format!(
            "{}: {} actions, allowed 1..={MAX_RIC_ACTIONS}",
            startup.e2_node,
            startup.actions.len()
        )));
    }

    let event_trigger = startup
        .event_trigger_bytes()
        .map_err(|e| ConfigValidationError::InvalidHex(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut actions = Vec::with_capacity(startup.actions.len());
    for action in &startup.actions {
        if !seen.insert(action.id) {
            return Err(ConfigValidationError::InvalidSubscription(format!(
                "{}: duplicate action id {}",
                startup.e2_node, action.id
            )));
        }
        let action_type = RicActionType::from_str(&action.action_type)
            .map_err(ConfigValidationError::InvalidSubscription)?;
        let mut ric_action = RicAction::new(action.id, action_type);
        if let Some(definition) = action
            .definition_bytes()
            .map_err(|e| ConfigValidationError::InvalidHex(e.to_string()))?
        {
            ric_action = ric_action.with_definition(definition);
        }
        actions.push(ric_action);
    }

    Ok(SubscribeIntent {
        e2_node,
        ran_function_id: startup.ran_function_id,
        event_trigger: Bytes::from(event_trigger),
        actions,
    })
}

/// Loads and validates an xApp configuration in one step.
pub fn load_and_validate_xapp_config<P: AsRef<Path>>(path: P) -> Result<XappConfig, ConfigError> {
    let config = load_xapp_config(path)?;
    validate_xapp_config(&config)?;
    Ok(config)
}
