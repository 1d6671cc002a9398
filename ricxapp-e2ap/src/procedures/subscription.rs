//! RIC Subscription procedure
//!
//! The xApp sends a RIC Subscription Request naming a RAN function, an event
//! trigger and a list of actions. The E2 node answers with a RIC Subscription
//! Response listing admitted and not-admitted actions, or a RIC Subscription
//! Failure carrying a cause.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use ricxapp_common::RicRequestId;
use serde::{Deserialize, Serialize};

use super::cause::Cause;
use crate::codec::CodecError;

/// Largest RAN function id (RANfunctionID ::= INTEGER (0..4095))
pub const MAX_RAN_FUNCTION_ID: u16 = 4095;

/// Maximum number of actions per subscription (maxofRICactionID)
pub const MAX_RIC_ACTIONS: usize = 16;

/// Largest RICtimeToWait enumeration index (w60s)
pub const MAX_TIME_TO_WAIT: u8 = 17;

/// RIC action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RicActionType {
    /// Report action
    Report = 0,
    /// Insert action
    Insert = 1,
    /// Policy action
    Policy = 2,
}

impl RicActionType {
    /// Converts from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RicActionType::Report),
            1 => Some(RicActionType::Insert),
            2 => Some(RicActionType::Policy),
            _ => None,
        }
    }
}

impl fmt::Display for RicActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RicActionType::Report => write!(f, "report"),
            RicActionType::Insert => write!(f, "insert"),
            RicActionType::Policy => write!(f, "policy"),
        }
    }
}

impl FromStr for RicActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" => Ok(RicActionType::Report),
            "insert" => Ok(RicActionType::Insert),
            "policy" => Ok(RicActionType::Policy),
            _ => Err(format!("unknown RIC action type: {s}")),
        }
    }
}

/// RIC subsequent action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SubsequentActionType {
    /// Continue with the next action
    Continue = 0,
    /// Wait before the next action
    Wait = 1,
}

impl SubsequentActionType {
    /// Converts from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SubsequentActionType::Continue),
            1 => Some(SubsequentActionType::Wait),
            _ => None,
        }
    }
}

/// RIC subsequent action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubsequentAction {
    /// Subsequent action type
    pub action_type: SubsequentActionType,
    /// RICtimeToWait enumeration index (0 = zero .. 17 = w60s)
    pub time_to_wait: u8,
}

/// One requested RIC action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RicAction {
    /// RIC action id
    pub id: u8,
    /// Action type
    pub action_type: RicActionType,
    /// Service-model specific action definition
    pub definition: Option<Bytes>,
    /// Optional subsequent action
    pub subsequent_action: Option<SubsequentAction>,
}

impl RicAction {
    /// Creates an action of the given type without definition.
    pub fn new(id: u8, action_type: RicActionType) -> Self {
        Self {
            id,
            action_type,
            definition: None,
            subsequent_action: None,
        }
    }

    /// Creates a report action without definition.
    pub fn report(id: u8) -> Self {
        Self::new(id, RicActionType::Report)
    }

    /// Attaches an action definition.
    pub fn with_definition(mut self, definition: impl Into<Bytes>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// Attaches a subsequent action.
    pub fn with_subsequent_action(mut self, subsequent: SubsequentAction) -> Self {
        self.subsequent_action = Some(subsequent);
        self
    }
}

/// Action rejected by the E2 node, with its cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionNotAdmitted {
    /// RIC action id
    pub action_id: u8,
    /// Rejection cause
    pub cause: Cause,
}

/// RIC Subscription Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    /// RIC request id
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
    /// RIC event trigger definition (E2SM encoded)
    pub event_trigger: Bytes,
    /// Requested actions
    pub actions: Vec<RicAction>,
}

/// RIC Subscription Response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResponse {
    /// RIC request id (echoed)
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
    /// Admitted action ids
    pub admitted: Vec<u8>,
    /// Not admitted actions
    pub not_admitted: Vec<ActionNotAdmitted>,
}

/// RIC Subscription Failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFailure {
    /// RIC request id (echoed)
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
    /// Failure cause
    pub cause: Cause,
    /// Per-action rejections, if reported
    pub not_admitted: Vec<ActionNotAdmitted>,
}

/// Checks a RAN function id against its range.
pub fn validate_ran_function_id(ran_function_id: u16) -> Result<(), CodecError> {
    if ran_function_id > MAX_RAN_FUNCTION_ID {
        return Err(CodecError::malformed(format!(
            "RAN function id {ran_function_id} exceeds {MAX_RAN_FUNCTION_ID}"
        )));
    }
    Ok(())
}

fn validate_not_admitted(list: &[ActionNotAdmitted]) -> Result<(), CodecError> {
    if list.len() > MAX_RIC_ACTIONS {
        return Err(CodecError::malformed(format!(
            "{} not-admitted actions exceed {MAX_RIC_ACTIONS}",
            list.len()
        )));
    }
    list.iter().try_for_each(|item| item.cause.validate())
}

impl SubscriptionRequest {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)?;
        if self.actions.is_empty() || self.actions.len() > MAX_RIC_ACTIONS {
            return Err(CodecError::malformed(format!(
                "subscription carries {} actions, allowed 1..={MAX_RIC_ACTIONS}",
                self.actions.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.actions.len());
        for action in &self.actions {
            if !seen.insert(action.id) {
                return Err(CodecError::malformed(format!(
                    "duplicate RIC action id {}",
                    action.id
                )));
            }
            if let Some(subsequent) = action.subsequent_action {
                if subsequent.time_to_wait > MAX_TIME_TO_WAIT {
                    return Err(CodecError::malformed(format!(
                        "action {}: time-to-wait index {} exceeds {MAX_TIME_TO_WAIT}",
                        action.id, subsequent.time_to_wait
                    )));
                }
            }
        }
        Ok(())
    }
}

impl SubscriptionResponse {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)?;
        if self.admitted.is_empty() || self.admitted.len() > MAX_RIC_ACTIONS {
            return Err(CodecError::malformed(format!(
                "{} admitted actions, allowed 1..={MAX_RIC_ACTIONS}",
                self.admitted.len()
            )));
        }
        validate_not_admitted(&self.not_admitted)
    }
}

impl SubscriptionFailure {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)?;
        self.cause.validate()?;
        validate_not_admitted(&self.not_admitted)
    }
}
