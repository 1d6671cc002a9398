//! RIC Subscription Delete procedure

use ricxapp_common::RicRequestId;

use super::cause::Cause;
use super::subscription::validate_ran_function_id;
use crate::codec::CodecError;

/// RIC Subscription Delete Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDeleteRequest {
    /// RIC request id of the request being sent
    pub request_id: RicRequestId,
    /// RAN function id of the subscription
    pub ran_function_id: u16,
}

/// RIC Subscription Delete Response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDeleteResponse {
    /// RIC request id (echoed)
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
}

/// RIC Subscription Delete Failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDeleteFailure {
    /// RIC request id (echoed)
    pub request_id: RicRequestId,
    /// RAN function id
    pub ran_function_id: u16,
    /// Failure cause
    pub cause: Cause,
}

impl SubscriptionDeleteRequest {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)
    }
}

impl SubscriptionDeleteResponse {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)
    }
}

impl SubscriptionDeleteFailure {
    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_ran_function_id(self.ran_function_id)?;
        self.cause.validate()
    }
}
