//! Reset procedure (RIC initiated)

use super::cause::Cause;
use crate::codec::CodecError;

/// Reset Request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetRequest {
    /// E2AP transaction id
    pub transaction_id: u8,
    /// Reset cause
    pub cause: Cause,
}

impl ResetRequest {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        self.cause.validate()
    }
}

/// Reset Response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetResponse {
    /// E2AP transaction id (echoed)
    pub transaction_id: u8,
}
