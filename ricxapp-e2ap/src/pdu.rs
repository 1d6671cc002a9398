//! E2AP PDU
//!
//! A single tagged variant covers every PDU kind the xApp exchanges. The
//! dispatcher matches on it instead of routing through per-message handlers.

use std::fmt;

use ricxapp_common::RicRequestId;

use crate::codec::CodecError;
use crate::message_type::MessageType;
use crate::procedures::*;

/// E2AP procedure code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProcedureCode {
    /// Reset
    Reset = 3,
    /// RIC control
    RicControl = 4,
    /// RIC indication
    RicIndication = 5,
    /// RIC subscription
    RicSubscription = 8,
    /// RIC subscription delete
    RicSubscriptionDelete = 9,
}

impl ProcedureCode {
    /// Converts from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            3 => Some(ProcedureCode::Reset),
            4 => Some(ProcedureCode::RicControl),
            5 => Some(ProcedureCode::RicIndication),
            8 => Some(ProcedureCode::RicSubscription),
            9 => Some(ProcedureCode::RicSubscriptionDelete),
            _ => None,
        }
    }
}

/// E2AP-PDU CHOICE alternative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageClass {
    /// initiatingMessage
    InitiatingMessage = 0,
    /// successfulOutcome
    SuccessfulOutcome = 1,
    /// unsuccessfulOutcome
    UnsuccessfulOutcome = 2,
}

impl MessageClass {
    /// Converts from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MessageClass::InitiatingMessage),
            1 => Some(MessageClass::SuccessfulOutcome),
            2 => Some(MessageClass::UnsuccessfulOutcome),
            _ => None,
        }
    }
}

/// E2AP criticality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Criticality {
    /// reject
    Reject = 0,
    /// ignore
    Ignore = 1,
    /// notify
    Notify = 2,
}

impl Criticality {
    /// Converts from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Criticality::Reject),
            1 => Some(Criticality::Ignore),
            2 => Some(Criticality::Notify),
            _ => None,
        }
    }
}

/// Every E2AP PDU kind handled by the xApp
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum E2apPdu {
    /// RIC Subscription Request
    SubscriptionRequest(SubscriptionRequest),
    /// RIC Subscription Response
    SubscriptionResponse(SubscriptionResponse),
    /// RIC Subscription Failure
    SubscriptionFailure(SubscriptionFailure),
    /// RIC Subscription Delete Request
    SubscriptionDeleteRequest(SubscriptionDeleteRequest),
    /// RIC Subscription Delete Response
    SubscriptionDeleteResponse(SubscriptionDeleteResponse),
    /// RIC Subscription Delete Failure
    SubscriptionDeleteFailure(SubscriptionDeleteFailure),
    /// RIC Control Request
    ControlRequest(ControlRequest),
    /// RIC Control Acknowledge
    ControlAcknowledge(ControlAcknowledge),
    /// RIC Control Failure
    ControlFailure(ControlFailure),
    /// RIC Indication
    Indication(Indication),
    /// Reset Request
    ResetRequest(ResetRequest),
    /// Reset Response
    ResetResponse(ResetResponse),
}

impl E2apPdu {
    /// Procedure code of the PDU.
    pub fn procedure_code(&self) -> ProcedureCode {
        match self {
            E2apPdu::SubscriptionRequest(_)
            | E2apPdu::SubscriptionResponse(_)
            | E2apPdu::SubscriptionFailure(_) => ProcedureCode::RicSubscription,
            E2apPdu::SubscriptionDeleteRequest(_)
            | E2apPdu::SubscriptionDeleteResponse(_)
            | E2apPdu::SubscriptionDeleteFailure(_) => ProcedureCode::RicSubscriptionDelete,
            E2apPdu::ControlRequest(_)
            | E2apPdu::ControlAcknowledge(_)
            | E2apPdu::ControlFailure(_) => ProcedureCode::RicControl,
            E2apPdu::Indication(_) => ProcedureCode::RicIndication,
            E2apPdu::ResetRequest(_) | E2apPdu::ResetResponse(_) => ProcedureCode::Reset,
        }
    }

    /// Message class of the PDU.
    pub fn message_class(&self) -> MessageClass {
        match self {
            E2apPdu::SubscriptionRequest(_)
            | E2apPdu::SubscriptionDeleteRequest(_)
            | E2apPdu::ControlRequest(_)
            | E2apPdu::Indication(_)
            | E2apPdu::ResetRequest(_) => MessageClass::InitiatingMessage,
            E2apPdu::SubscriptionResponse(_)
            | E2apPdu::SubscriptionDeleteResponse(_)
            | E2apPdu::ControlAcknowledge(_)
            | E2apPdu::ResetResponse(_) => MessageClass::SuccessfulOutcome,
            E2apPdu::SubscriptionFailure(_)
            | E2apPdu::SubscriptionDeleteFailure(_)
            | E2apPdu::ControlFailure(_) => MessageClass::UnsuccessfulOutcome,
        }
    }

    /// Criticality of the procedure as carried in the PDU header.
    pub fn criticality(&self) -> Criticality {
        match self.procedure_code() {
            ProcedureCode::RicIndication => Criticality::Ignore,
            _ => Criticality::Reject,
        }
    }

    /// RMR message type the PDU travels with.
    pub fn message_type(&self) -> MessageType {
        match self {
            E2apPdu::SubscriptionRequest(_) => MessageType::SubscriptionRequest,
            E2apPdu::SubscriptionResponse(_) => MessageType::SubscriptionResponse,
            E2apPdu::SubscriptionFailure(_) => MessageType::SubscriptionFailure,
            E2apPdu::SubscriptionDeleteRequest(_) => MessageType::SubscriptionDeleteRequest,
            E2apPdu::SubscriptionDeleteResponse(_) => MessageType::SubscriptionDeleteResponse,
            E2apPdu::SubscriptionDeleteFailure(_) => MessageType::SubscriptionDeleteFailure,
            E2apPdu::ControlRequest(_) => MessageType::ControlRequest,
            E2apPdu::ControlAcknowledge(_) => MessageType::ControlAck,
            E2apPdu::ControlFailure(_) => MessageType::ControlFailure,
            E2apPdu::Indication(_) => MessageType::Indication,
            E2apPdu::ResetRequest(_) => MessageType::ResetRequest,
            E2apPdu::ResetResponse(_) => MessageType::ResetResponse,
        }
    }

    /// E2AP message name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            E2apPdu::SubscriptionRequest(_) => "RICsubscriptionRequest",
            E2apPdu::SubscriptionResponse(_) => "RICsubscriptionResponse",
            E2apPdu::SubscriptionFailure(_) => "RICsubscriptionFailure",
            E2apPdu::SubscriptionDeleteRequest(_) => "RICsubscriptionDeleteRequest",
            E2apPdu::SubscriptionDeleteResponse(_) => "RICsubscriptionDeleteResponse",
            E2apPdu::SubscriptionDeleteFailure(_) => "RICsubscriptionDeleteFailure",
            E2apPdu::ControlRequest(_) => "RICcontrolRequest",
            E2apPdu::ControlAcknowledge(_) => "RICcontrolAcknowledge",
            E2apPdu::ControlFailure(_) => "RICcontrolFailure",
            E2apPdu::Indication(_) => "RICindication",
            E2apPdu::ResetRequest(_) => "ResetRequest",
            E2apPdu::ResetResponse(_) => "ResetResponse",
        }
    }

    /// RIC request id, for the PDU kinds that carry one.
    pub fn request_id(&self) -> Option<RicRequestId> {
        match self {
            E2apPdu::SubscriptionRequest(m) => Some(m.request_id),
            E2apPdu::SubscriptionResponse(m) => Some(m.request_id),
            E2apPdu::SubscriptionFailure(m) => Some(m.request_id),
            E2apPdu::SubscriptionDeleteRequest(m) => Some(m.request_id),
            E2apPdu::SubscriptionDeleteResponse(m) => Some(m.request_id),
            E2apPdu::SubscriptionDeleteFailure(m) => Some(m.request_id),
            E2apPdu::ControlRequest(m) => Some(m.request_id),
            E2apPdu::ControlAcknowledge(m) => Some(m.request_id),
            E2apPdu::ControlFailure(m) => Some(m.request_id),
            E2apPdu::Indication(m) => Some(m.request_id),
            E2apPdu::ResetRequest(_) | E2apPdu::ResetResponse(_) => None,
        }
    }

    /// RAN function id, for the PDU kinds that carry one.
    pub fn ran_function_id(&self) -> Option<u16> {
        match self {
            E2apPdu::SubscriptionRequest(m) => Some(m.ran_function_id),
            E2apPdu::SubscriptionResponse(m) => Some(m.ran_function_id),
            E2apPdu::SubscriptionFailure(m) => Some(m.ran_function_id),
            E2apPdu::SubscriptionDeleteRequest(m) => Some(m.ran_function_id),
            E2apPdu::SubscriptionDeleteResponse(m) => Some(m.ran_function_id),
            E2apPdu::SubscriptionDeleteFailure(m) => Some(m.ran_function_id),
            E2apPdu::ControlRequest(m) => Some(m.ran_function_id),
            E2apPdu::ControlAcknowledge(m) => Some(m.ran_function_id),
            E2apPdu::ControlFailure(m) => Some(m.ran_function_id),
            E2apPdu::Indication(m) => Some(m.ran_function_id),
            E2apPdu::ResetRequest(_) | E2apPdu::ResetResponse(_) => None,
        }
    }

    /// Checks every field against its protocol range.
    pub fn validate(&self) -> Result<(), CodecError> {
        match self {
            E2apPdu::SubscriptionRequest(m) => m.validate(),
            E2apPdu::SubscriptionResponse(m) => m.validate(),
            E2apPdu::SubscriptionFailure(m) => m.validate(),
            E2apPdu::SubscriptionDeleteRequest(m) => m.validate(),
            E2apPdu::SubscriptionDeleteResponse(m) => m.validate(),
            E2apPdu::SubscriptionDeleteFailure(m) => m.validate(),
            E2apPdu::ControlRequest(m) => m.validate(),
            E2apPdu::ControlAcknowledge(m) => m.validate(),
            E2apPdu::ControlFailure(m) => m.validate(),
            E2apPdu::Indication(m) => m.validate(),
            E2apPdu::ResetRequest(m) => m.validate(),
            E2apPdu::ResetResponse(_) => Ok(()),
        }
    }
}

impl fmt::Display for E2apPdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! impl_from_message {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for E2apPdu {
                fn from(message: $variant) -> Self {
                    E2apPdu::$variant(message)
                }
            }
        )*
    };
}

impl_from_message!(
    SubscriptionRequest,
    SubscriptionResponse,
    SubscriptionFailure,
    SubscriptionDeleteRequest,
    SubscriptionDeleteResponse,
    SubscriptionDeleteFailure,
    ControlRequest,
    ControlAcknowledge,
    ControlFailure,
    Indication,
    ResetRequest,
    ResetResponse,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdu_classification() {
        let rsp: E2apPdu = ResetResponse { transaction_id: 4 }.into();
        assert_eq!(rsp.procedure_code(), ProcedureCode::Reset);
        assert_eq!(rsp.message_class(), MessageClass::SuccessfulOutcome);
        assert_eq!(rsp.message_type(), MessageType::ResetResponse);
        assert_eq!(rsp.request_id(), None);

        let del: E2apPdu = SubscriptionDeleteFailure {
            request_id: RicRequestId::new(1, 2),
            ran_function_id: 3,
            cause: Cause::MISC_UNSPECIFIED,
        }
        .into();
        assert_eq!(del.message_class(), MessageClass::UnsuccessfulOutcome);
        assert_eq!(del.request_id(), Some(RicRequestId::new(1, 2)));
        assert_eq!(del.ran_function_id(), Some(3));
        assert_eq!(del.to_string(), "RICsubscriptionDeleteFailure");
    }
}
