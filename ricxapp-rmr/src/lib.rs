//! Routed messaging (RMR) transport
//!
//! Message model, frame codec, static routing and two transports: a UDP
//! endpoint for deployment and an in-process pair for simulation and tests.
//!
//! # Example
//!
//! ```ignore
//! use ricxapp_rmr::{InProcRmr, RmrMessage, RmrTransport};
//!
//! let (xapp, e2term) = InProcRmr::pair();
//! xapp.send(RmrMessage::new(12010, payload)).await?;
//! let request = e2term.recv().await;
//! ```

pub mod memory;
pub mod message;
pub mod routing;
pub mod transport;
pub mod udp;

pub use memory::InProcRmr;
pub use message::{decode_frame, encode_frame, FrameError, RmrMessage, RMR_VOID_SUBID};
pub use routing::RouteTable;
pub use transport::{RmrTransport, TransportError};
pub use udp::UdpRmrEndpoint;
