//! RIC Indication procedure

use std::fmt;

use bytes::Bytes;
use ricxapp_common::RicRequestId;

use super::subscription::validate_ran_function_id;
use crate::codec::CodecError;

/// RIC indication type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RicIndicationType {
    /// Report indication
    Report = 0,
    /// Insert indication
    Insert = 1,
}

impl RicIndicationType {
    /// Converts from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RicIndicationType::Report),
            1 => Some(RicIndicationType::Insert),
            _ => None,
        }
    }
}

impl fmt::Display for RicIndicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RicIndicationType::Report => write!(f, "report"),
            RicIndicationType::Insert => write!(f, "insert"),
        }
    }
}

/// RIC Indication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indication {
    /// RIC request id of the subscription
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
    /// RIC action id that produced the indication
    pub action_id: u8,
    /// Indication sequence number
    pub sequence_number: Option<u16>,
    /// Indication type
    pub indication_type: RicIndicationType,
    /// E2SM indication header
    pub header: Bytes,
    /// E2SM indication message
    pub message: Bytes,
    /// Call process id (insert indications)
    pub call_process_id: Option<Bytes>,
}

impl Indication {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)
    }
}
