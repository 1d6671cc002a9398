//! UDP socket wrapper used by the RMR endpoint

use std::net::SocketAddr;
use tokio::net::UdpSocket;

use crate::Error;

/// Largest payload a UDP datagram can carry.
pub const MAX_UDP_DATAGRAM: usize = 65507;

/// Async UDP socket with a bounded receive size.
///
/// # Example
///
/// ```ignore
/// use ricxapp_common::UdpTransport;
///
/// async fn example() -> Result<(), ricxapp_common::Error> {
///     let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await?;
///     transport.send_to(b"frame", "127.0.0.1:4560".parse().unwrap()).await?;
///     let (data, src) = transport.recv_from().await?;
///     Ok(())
/// }
/// ```
pub struct UdpTransport {
    socket: UdpSocket,
    max_datagram: usize,
}

impl UdpTransport {
    /// Binds a UDP socket. Use port 0 for automatic port assignment.
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        Self::bind_with_limit(addr, MAX_UDP_DATAGRAM).await
    }

    /// Binds a UDP socket that truncates received datagrams to `max_datagram` bytes.
    pub async fn bind_with_limit(addr: SocketAddr, max_datagram: usize) -> Result<Self, Error> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            max_datagram: max_datagram.clamp(1, MAX_UDP_DATAGRAM),
        })
    }

    /// Sends one datagram to `addr`.
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<(), Error> {
        self.socket.send_to(data, addr).await?;
        Ok(())
    }

    /// Receives one datagram and its source address.
    pub async fn recv_from(&self) -> Result<(Vec<u8>, SocketAddr), Error> {
        let mut buf = vec![0u8; self.max_datagram];
        let (len, addr) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok((buf, addr))
    }

    /// Returns the local address this socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }
}
