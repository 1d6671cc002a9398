//! E2AP procedure messages
//!
//! Each module holds the message structures of one elementary procedure
//! together with their range validation. All of them convert into
//! [`crate::E2apPdu`], which is what the codec encodes and decodes.

pub mod cause;
pub mod control;
pub mod indication;
pub mod reset;
pub mod subscription;
pub mod subscription_delete;

pub use cause::{Cause, CauseGroup};
pub use control::{ControlAckRequest, ControlAcknowledge, ControlFailure, ControlRequest};
pub use indication::{Indication, RicIndicationType};
pub use reset::{ResetRequest, ResetResponse};
pub use subscription::{
    validate_ran_function_id, ActionNotAdmitted, RicAction, RicActionType, SubscriptionFailure,
    SubscriptionRequest, SubscriptionResponse, SubsequentAction, SubsequentActionType,
    MAX_RAN_FUNCTION_ID, MAX_RIC_ACTIONS, MAX_TIME_TO_WAIT,
};
pub use subscription_delete::{
    SubscriptionDeleteFailure, SubscriptionDeleteRequest, SubscriptionDeleteResponse,
};
