//! RIC Control procedure
//!
//! A control request carries an E2SM control header and message. The E2 node
//! answers with a RIC Control Acknowledge or RIC Control Failure when the
//! request asks for it.

use bytes::Bytes;
use ricxapp_common::RicRequestId;

use super::cause::Cause;
use super::subscription::validate_ran_function_id;
use crate::codec::CodecError;

/// RICcontrolAckRequest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ControlAckRequest {
    /// No acknowledgement expected
    NoAck = 0,
    /// Acknowledge on success and failure
    #[default]
    Ack = 1,
    /// Report failures only
    NAck = 2,
}

impl ControlAckRequest {
    /// Converts from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ControlAckRequest::NoAck),
            1 => Some(ControlAckRequest::Ack),
            2 => Some(ControlAckRequest::NAck),
            _ => None,
        }
    }
}

/// RIC Control Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    /// RIC request id
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
    /// Optional call process id
    pub call_process_id: Option<Bytes>,
    /// E2SM control header
    pub header: Bytes,
    /// E2SM control message
    pub message: Bytes,
    /// Acknowledgement mode, if given
    pub ack_request: Option<ControlAckRequest>,
}

impl ControlRequest {
    /// True when the E2 node will answer this request.
    pub fn expects_response(&self) -> bool {
        !matches!(self.ack_request, Some(ControlAckRequest::NoAck))
    }

    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)
    }
}

/// RIC Control Acknowledge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlAcknowledge {
    /// RIC request id (echoed)
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
    /// Call process id (echoed)
    pub call_process_id: Option<Bytes>,
    /// E2SM control outcome
    pub outcome: Option<Bytes>,
}

impl ControlAcknowledge {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)
    }
}

/// RIC Control Failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFailure {
    /// RIC request id (echoed)
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
    /// Call process id (echoed)
    pub call_process_id: Option<Bytes>,
    /// Failure cause
    pub cause: Cause,
    /// E2SM control outcome
    pub outcome: Option<Bytes>,
}

impl ControlFailure {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)?;
        self.cause.validate()
    }
}
