//! UDP RMR endpoint
//!
//! Sends each message as one frame to the endpoint its route table names
//! and receives frames on the bound socket. Undecodable datagrams are
//! logged and skipped.

use std::net::SocketAddr;

use async_trait::async_trait;
use ricxapp_common::logging::{log_rmr_message, Direction};
use ricxapp_common::{RmrConfig, UdpTransport};
use tracing::{debug, warn};

use crate::message::{decode_frame, encode_frame, RmrMessage};
use crate::routing::RouteTable;
use crate::transport::{RmrTransport, TransportError};

/// RMR endpoint over a UDP socket
pub struct UdpRmrEndpoint {
    socket: UdpTransport,
    routes: RouteTable,
    max_message_size: usize,
}

impl UdpRmrEndpoint {
    /// Binds the endpoint described by the configuration.
    pub async fn bind(config: &RmrConfig) -> Result<Self, ricxapp_common::Error> {
        Self::bind_with_routes(
            config.listen_addr,
            RouteTable::from_config(config),
            config.max_message_size,
        )
        .await
    }

    /// Binds to `addr` with an explicit route table.
    pub async fn bind_with_routes(
        addr: SocketAddr,
        routes: RouteTable,
        max_message_size: usize,
    ) -> Result<Self, ricxapp_common::Error> {
        let socket = UdpTransport::bind_with_limit(addr, max_message_size).await?;
        debug!("RMR endpoint bound to {}", socket.local_addr()?);
        Ok(Self {
            socket,
            routes,
            max_message_size,
        })
    }

    /// Local address of the endpoint.
    pub fn local_addr(&self) -> Result<SocketAddr, ricxapp_common::Error> {
        self.socket.local_addr()
    }

    async fn send_to(&self, message: &RmrMessage, dest: SocketAddr) -> Result<(), TransportError> {
        let frame = encode_frame(message).map_err(|e| TransportError::Unreachable(e.to_string()))?;
        if frame.len() > self.max_message_size {
            return Err(TransportError::Unreachable(format!(
                "{}-byte frame exceeds max message size {}",
                frame.len(),
                self.max_message_size
            )));
        }
        log_rmr_message(Direction::Tx, &message.mtype.to_string(), &frame);
        self.socket
            .send_to(&frame, dest)
            .await
            .map_err(|e| TransportError::Transient(e.to_string()))
    }
}

#[async_trait]
impl RmrTransport for UdpRmrEndpoint {
    async fn send(&self, message: RmrMessage) -> Result<(), TransportError> {
        let dest = self.routes.lookup(message.mtype).ok_or_else(|| {
            TransportError::Unreachable(format!("no route for message type {}", message.mtype))
        })?;
        self.send_to(&message, dest).await
    }

    async fn reply(
        &self,
        request: &RmrMessage,
        response: RmrMessage,
    ) -> Result<(), TransportError> {
        match request.source {
            Some(source) => self.send_to(&response, source).await,
            None => self.send(response).await,
        }
    }

    async fn recv(&self) -> Option<RmrMessage> {
        loop {
            match self.socket.recv_from().await {
                Ok((data, source)) => match decode_frame(&data) {
                    Ok(mut message) => {
                        log_rmr_message(Direction::Rx, &message.mtype.to_string(), &data);
                        message.source = Some(source);
                        return Some(message);
                    }
                    Err(e) => {
                        warn!("Discarding {}-byte datagram from {}: {}", data.len(), source, e)
                    }
                },
                // ICMP errors from earlier sends surface here; the socket stays usable
                Err(e) => warn!("RMR receive error: {}", e),
            }
        }
    }
}
