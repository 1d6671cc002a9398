//! E2AP Cause
//!
//! The Cause IE is a CHOICE over six groups, each an enumeration. Values are
//! kept numeric so that causes added by later E2AP versions still decode
//! as long as they fit the group's range.

use std::fmt;

use crate::codec::CodecError;

/// Cause group (the CHOICE alternative of the Cause IE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CauseGroup {
    /// CauseRICrequest
    RicRequest = 0,
    /// CauseRICservice
    RicService = 1,
    /// CauseE2node
    E2Node = 2,
    /// CauseTransport
    Transport = 3,
    /// CauseProtocol
    Protocol = 4,
    /// CauseMisc
    Misc = 5,
}

impl CauseGroup {
    /// Converts from the wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CauseGroup::RicRequest),
            1 => Some(CauseGroup::RicService),
            2 => Some(CauseGroup::E2Node),
            3 => Some(CauseGroup::Transport),
            4 => Some(CauseGroup::Protocol),
            5 => Some(CauseGroup::Misc),
            _ => None,
        }
    }

    /// Largest enumerated value defined for the group.
    pub fn max_value(self) -> u8 {
        match self {
            CauseGroup::RicRequest => 13,
            CauseGroup::RicService => 2,
            CauseGroup::E2Node => 0,
            CauseGroup::Transport => 1,
            CauseGroup::Protocol => 6,
            CauseGroup::Misc => 3,
        }
    }
}

impl fmt::Display for CauseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CauseGroup::RicRequest => "ricRequest",
            CauseGroup::RicService => "ricService",
            CauseGroup::E2Node => "e2Node",
            CauseGroup::Transport => "transport",
            CauseGroup::Protocol => "protocol",
            CauseGroup::Misc => "misc",
        };
        f.write_str(name)
    }
}

/// E2AP Cause value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cause {
    /// Cause group
    pub group: CauseGroup,
    /// Enumerated value within the group
    pub value: u8,
}

impl Cause {
    /// ricRequest: ran-function-id-invalid
    pub const RAN_FUNCTION_ID_INVALID: Cause = Cause::new(CauseGroup::RicRequest, 0);
    /// ricRequest: action-not-supported
    pub const ACTION_NOT_SUPPORTED: Cause = Cause::new(CauseGroup::RicRequest, 1);
    /// ricRequest: excessive-actions
    pub const EXCESSIVE_ACTIONS: Cause = Cause::new(CauseGroup::RicRequest, 2);
    /// ricRequest: request-id-unknown
    pub const REQUEST_ID_UNKNOWN: Cause = Cause::new(CauseGroup::RicRequest, 6);
    /// ricRequest: control-message-invalid
    pub const CONTROL_MESSAGE_INVALID: Cause = Cause::new(CauseGroup::RicRequest, 8);
    /// ricRequest: control-failed-to-execute
    pub const CONTROL_FAILED_TO_EXECUTE: Cause = Cause::new(CauseGroup::RicRequest, 11);
    /// ricRequest: unspecified
    pub const RIC_REQUEST_UNSPECIFIED: Cause = Cause::new(CauseGroup::RicRequest, 13);
    /// ricService: ran-function-not-supported
    pub const RAN_FUNCTION_NOT_SUPPORTED: Cause = Cause::new(CauseGroup::RicService, 0);
    /// misc: om-intervention
    pub const OM_INTERVENTION: Cause = Cause::new(CauseGroup::Misc, 2);
    /// misc: unspecified
    pub const MISC_UNSPECIFIED: Cause = Cause::new(CauseGroup::Misc, 3);

    /// Creates a cause without range checking.
    pub const fn new(group: CauseGroup, value: u8) -> Self {
        Self { group, value }
    }

    /// Decodes a cause from its (group, value) wire pair.
    pub fn from_wire(group: u8, value: u8) -> Result<Self, CodecError> {
        let group = CauseGroup::from_u8(group)
            .ok_or_else(|| CodecError::malformed(format!("unknown cause group {group}")))?;
        let cause = Cause::new(group, value);
        cause.validate()?;
        Ok(cause)
    }

    /// Checks the value against the group's enumeration.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.value > self.group.max_value() {
            return Err(CodecError::malformed(format!(
                "cause value {} out of range for group {} (max {})",
                self.value,
                self.group,
                self.group.max_value()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.value)
    }
}
