//! Message dispatcher
//!
//! - `sender`: outbound sends with bounded retry
//! - `task`: the receive loop demultiplexing inbound frames

pub mod sender;
pub mod task;

pub use sender::RequestSender;
pub use task::{DispatcherTask, HEALTH_CHECK_OK};
