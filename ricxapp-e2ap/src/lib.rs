//! E2AP (E2 Application Protocol) library
//!
//! PDU model and codec adapter for the RIC side of the E2 interface.
//!
//! # Modules
//!
//! - `codec` - Codec adapter owning buffer sizing around a [`PduEngine`]
//! - `wire` - Reference PDU engine (protocol-IE container encoding)
//! - `pdu` - The tagged [`E2apPdu`] covering every handled PDU kind
//! - `procedures` - Message structures and range checks per procedure
//! - `message_type` - RMR message types carrying each PDU kind
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use ricxapp_common::RicRequestId;
//! use ricxapp_e2ap::procedures::{RicAction, SubscriptionRequest};
//! use ricxapp_e2ap::{E2apCodec, E2apPdu, MessageType};
//!
//! let codec = E2apCodec::new();
//! let request = E2apPdu::from(SubscriptionRequest {
//!     request_id: RicRequestId::new(123, 1),
//!     ran_function_id: 2,
//!     event_trigger: Bytes::from_static(&[0x10]),
//!     actions: vec![RicAction::report(1)],
//! });
//! let encoded = codec.encode(&request).unwrap();
//! assert_eq!(request.message_type(), MessageType::SubscriptionRequest);
//! assert_eq!(codec.decode(encoded.as_bytes()).unwrap(), request);
//! ```

pub mod codec;
pub mod message_type;
pub mod pdu;
pub mod procedures;
pub mod wire;

pub use codec::{
    decode_e2ap_pdu, encode_e2ap_pdu, CodecError, CodecErrorKind, E2apCodec, EncodedPdu,
    PduEngine, ASN_BUFF_MAX_SIZE, ERR_BUF_SIZE, MAX_DECODE_SIZE,
};
pub use message_type::MessageType;
pub use pdu::{Criticality, E2apPdu, MessageClass, ProcedureCode};
pub use wire::WireEngine;
