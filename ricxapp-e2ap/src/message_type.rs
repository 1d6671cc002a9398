//! RMR message types used on the E2 message plane
//!
//! Each E2AP PDU kind travels with a fixed RMR message type; the receiver
//! demultiplexes on this tag before decoding anything.

use std::fmt;

/// RMR message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageType {
    /// RIC_HEALTH_CHECK_REQ
    HealthCheckRequest = 100,
    /// RIC_HEALTH_CHECK_RESP
    HealthCheckResponse = 101,
    /// RIC_E2_RESET_REQ
    ResetRequest = 12004,
    /// RIC_E2_RESET_RESP
    ResetResponse = 12005,
    /// RIC_SUB_REQ
    SubscriptionRequest = 12010,
    /// RIC_SUB_RESP
    SubscriptionResponse = 12011,
    /// RIC_SUB_FAILURE
    SubscriptionFailure = 12012,
    /// RIC_SUB_DEL_REQ
    SubscriptionDeleteRequest = 12020,
    /// RIC_SUB_DEL_RESP
    SubscriptionDeleteResponse = 12021,
    /// RIC_SUB_DEL_FAILURE
    SubscriptionDeleteFailure = 12022,
    /// RIC_CONTROL_REQ
    ControlRequest = 12040,
    /// RIC_CONTROL_ACK
    ControlAck = 12041,
    /// RIC_CONTROL_FAILURE
    ControlFailure = 12042,
    /// RIC_INDICATION
    Indication = 12050,
}

impl MessageType {
    /// Looks up a message type by its RMR tag.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            100 => Some(MessageType::HealthCheckRequest),
            101 => Some(MessageType::HealthCheckResponse),
            12004 => Some(MessageType::ResetRequest),
            12005 => Some(MessageType::ResetResponse),
            12010 => Some(MessageType::SubscriptionRequest),
            12011 => Some(MessageType::SubscriptionResponse),
            12012 => Some(MessageType::SubscriptionFailure),
            12020 => Some(MessageType::SubscriptionDeleteRequest),
            12021 => Some(MessageType::SubscriptionDeleteResponse),
            12022 => Some(MessageType::SubscriptionDeleteFailure),
            12040 => Some(MessageType::ControlRequest),
            12041 => Some(MessageType::ControlAck),
            12042 => Some(MessageType::ControlFailure),
            12050 => Some(MessageType::Indication),
            _ => None,
        }
    }

    /// The RMR tag.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Responses to a request this xApp initiated.
    pub fn is_response(self) -> bool {
        matches!(
            self,
            MessageType::SubscriptionResponse
                | MessageType::SubscriptionFailure
                | MessageType::SubscriptionDeleteResponse
                | MessageType::SubscriptionDeleteFailure
                | MessageType::ControlAck
                | MessageType::ControlFailure
                | MessageType::ResetResponse
        )
    }

    /// Requests the xApp originates (never accepted inbound).
    pub fn is_request(self) -> bool {
        matches!(
            self,
            MessageType::SubscriptionRequest
                | MessageType::SubscriptionDeleteRequest
                | MessageType::ControlRequest
                | MessageType::ResetRequest
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::HealthCheckRequest => "RIC_HEALTH_CHECK_REQ",
            MessageType::HealthCheckResponse => "RIC_HEALTH_CHECK_RESP",
            MessageType::ResetRequest => "RIC_E2_RESET_REQ",
            MessageType::ResetResponse => "RIC_E2_RESET_RESP",
            MessageType::SubscriptionRequest => "RIC_SUB_REQ",
            MessageType::SubscriptionResponse => "RIC_SUB_RESP",
            MessageType::SubscriptionFailure => "RIC_SUB_FAILURE",
            MessageType::SubscriptionDeleteRequest => "RIC_SUB_DEL_REQ",
            MessageType::SubscriptionDeleteResponse => "RIC_SUB_DEL_RESP",
            MessageType::SubscriptionDeleteFailure => "RIC_SUB_DEL_FAILURE",
            MessageType::ControlRequest => "RIC_CONTROL_REQ",
            MessageType::ControlAck => "RIC_CONTROL_ACK",
            MessageType::ControlFailure => "RIC_CONTROL_FAILURE",
            MessageType::Indication => "RIC_INDICATION",
        };
        f.write_str(name)
    }
}
