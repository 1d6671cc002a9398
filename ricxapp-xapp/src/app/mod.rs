//! xApp application layer
//!
//! Configuration loading and validation for the `ricxapp` binary.

mod config_loader;

pub use config_loader::{
    load_and_validate_xapp_config, load_xapp_config, load_xapp_config_from_str, startup_intent,
    validate_xapp_config, ConfigError, ConfigValidationError, MIN_ENCODE_BUFFER_SIZE,
};
