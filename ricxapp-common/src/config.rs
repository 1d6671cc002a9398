//! Configuration structures for the xApp
//!
//! Every section carries serde defaults so a minimal YAML file (or an empty
//! document) yields a runnable configuration.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Static route: every message with `message_type` goes to `endpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// RMR message type
    pub message_type: i32,
    /// Destination endpoint
    pub endpoint: SocketAddr,
}

/// Routed messaging (RMR) configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RmrConfig {
    /// Address the RMR endpoint binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Static route table
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    /// Endpoint used when no route matches
    #[serde(default)]
    pub default_route: Option<SocketAddr>,
    /// Largest frame accepted on receive
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Send attempts before a transient failure is surfaced
    #[serde(default = "default_send_attempts")]
    pub send_attempts: u32,
    /// Delay between send attempts
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

impl RmrConfig {
    /// Delay between send attempts.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for RmrConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            routes: Vec::new(),
            default_route: None,
            max_message_size: default_max_message_size(),
            send_attempts: default_send_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

/// Subscription lifecycle timing and policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// RIC requestor id used in every RIC request id
    #[serde(default = "default_requestor_id")]
    pub requestor_id: u16,
    /// Subscribe transaction timeout
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Delete transaction timeout
    #[serde(default = "default_response_timeout_ms")]
    pub delete_timeout_ms: u64,
    /// Control and reset transaction timeout
    #[serde(default = "default_control_timeout_ms")]
    pub control_timeout_ms: u64,
    /// Treat an unanswered delete as completed
    #[serde(default = "default_true")]
    pub delete_timeout_as_success: bool,
    /// Period of the expiry sweep
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// How long Deleted/Failed entries remain queryable
    #[serde(default = "default_terminal_retention_ms")]
    pub terminal_retention_ms: u64,
    /// Delete active subscriptions on shutdown
    #[serde(default = "default_true")]
    pub delete_on_shutdown: bool,
}

impl SubscriptionConfig {
    /// Subscribe transaction timeout.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Delete transaction timeout.
    pub fn delete_timeout(&self) -> Duration {
        Duration::from_millis(self.delete_timeout_ms)
    }

    /// Control and reset transaction timeout.
    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    /// Period of the expiry sweep.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Retention of terminal entries.
    pub fn terminal_retention(&self) -> Duration {
        Duration::from_millis(self.terminal_retention_ms)
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            requestor_id: default_requestor_id(),
            response_timeout_ms: default_response_timeout_ms(),
            delete_timeout_ms: default_response_timeout_ms(),
            control_timeout_ms: default_control_timeout_ms(),
            delete_timeout_as_success: true,
            sweep_interval_ms: default_sweep_interval_ms(),
            terminal_retention_ms: default_terminal_retention_ms(),
            delete_on_shutdown: true,
        }
    }
}

/// Indication hand-off queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicationConfig {
    /// Capacity of the drop-oldest queue between receive path and sink
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for IndicationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Codec buffer sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Scratch buffer handed to the PDU engine on encode
    #[serde(default = "default_encode_buffer_size")]
    pub encode_buffer_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            encode_buffer_size: default_encode_buffer_size(),
        }
    }
}

/// Subscription persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding persisted subscription records
    pub path: PathBuf,
}

/// One action of a startup subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// RIC action id
    pub id: u8,
    /// `report`, `insert` or `policy`
    #[serde(default = "default_action_type")]
    pub action_type: String,
    /// Hex-encoded action definition
    #[serde(default)]
    pub definition: Option<String>,
}

impl ActionConfig {
    /// Decodes the hex action definition, if any.
    pub fn definition_bytes(&self) -> Result<Option<Vec<u8>>, Error> {
        self.definition
            .as_deref()
            .map(|hex_str| decode_hex_field("definition", hex_str))
            .transpose()
    }
}

/// Subscription issued when the xApp starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupSubscription {
    /// Target E2 node (RMR MEID)
    pub e2_node: String,
    /// RAN function id (0..=4095)
    pub ran_function_id: u16,
    /// Hex-encoded event trigger definition
    #[serde(default)]
    pub event_trigger: String,
    /// Requested actions
    pub actions: Vec<ActionConfig>,
}

impl StartupSubscription {
    /// Decodes the hex event trigger definition.
    pub fn event_trigger_bytes(&self) -> Result<Vec<u8>, Error> {
        decode_hex_field("event_trigger", &self.event_trigger)
    }
}

/// Complete xApp configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XappConfig {
    /// xApp name used in logs
    #[serde(default = "default_xapp_name")]
    pub xapp_name: String,
    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Routed messaging settings
    #[serde(default)]
    pub rmr: RmrConfig,
    /// Subscription lifecycle settings
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    /// Indication queue settings
    #[serde(default)]
    pub indication: IndicationConfig,
    /// Codec settings
    #[serde(default)]
    pub codec: CodecConfig,
    /// Optional persistence
    #[serde(default)]
    pub store: Option<StoreConfig>,
    /// Subscriptions issued at startup
    #[serde(default)]
    pub startup_subscriptions: Vec<StartupSubscription>,
}

impl Default for XappConfig {
    fn default() -> Self {
        Self {
            xapp_name: default_xapp_name(),
            log_level: default_log_level(),
            rmr: RmrConfig::default(),
            subscription: SubscriptionConfig::default(),
            indication: IndicationConfig::default(),
            codec: CodecConfig::default(),
            store: None,
            startup_subscriptions: Vec::new(),
        }
    }
}

impl XappConfig {
    /// Parses an xApp configuration from a YAML string.
    ///
    /// # Example
    ///
    /// ```
    /// use ricxapp_common::config::XappConfig;
    ///
    /// let yaml = r#"
    /// xapp_name: kpimon
    /// rmr:
    ///   listen_addr: 127.0.0.1:4560
    ///   send_attempts: 3
    /// "#;
    /// let config = XappConfig::from_yaml(yaml).unwrap();
    /// assert_eq!(config.rmr.send_attempts, 3);
    /// assert_eq!(config.subscription.response_timeout_ms, 10_000);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads an xApp configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serializes the configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn decode_hex_field(field: &str, value: &str) -> Result<Vec<u8>, Error> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| Error::Config(format!("{field}: invalid hex '{value}': {e}")))
}

fn default_xapp_name() -> String {
    "hwxapp".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 4560))
}

fn default_max_message_size() -> usize {
    65536
}

fn default_send_attempts() -> u32 {
    10
}

fn default_retry_interval_ms() -> u64 {
    100
}

fn default_requestor_id() -> u16 {
    123
}

fn default_response_timeout_ms() -> u64 {
    10_000
}

fn default_control_timeout_ms() -> u64 {
    5_000
}

fn default_sweep_interval_ms() -> u64 {
    100
}

fn default_terminal_retention_ms() -> u64 {
    60_000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_encode_buffer_size() -> usize {
    4096
}

fn default_action_type() -> String {
    "report".to_string()
}

fn default_true() -> bool {
    true
}
