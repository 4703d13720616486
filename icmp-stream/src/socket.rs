//! Async datagram socket carrying encoded frames.
//!
//! [`Socket`] is a thin wrapper around `tokio::net::UdpSocket` that speaks
//! [`Frame`] instead of raw bytes, one frame per datagram.  UDP stands in for
//! the ICMP echo envelope here; the frame bytes are identical either way.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::UdpSocket;

use crate::frame::{Frame, FrameError};

/// Largest datagram we are prepared to receive.
const MAX_DATAGRAM: usize = 65_535;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The datagram arrived but is not a valid frame.
    #[error("frame decode error: {0}")]
    Frame(#[from] FrameError),
}

/// An async, frame-oriented UDP socket.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (after the OS picked a port).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind to `local_addr`; port 0 lets the OS choose.
    pub async fn bind(local_addr: SocketAddr) -> Result<Self, SocketError> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }

    /// Encode `frame` and send it as one datagram to `dest`.
    pub async fn send_to(&self, frame: &Frame, dest: SocketAddr) -> Result<(), SocketError> {
        let bytes = frame.encode()?;
        self.inner.send_to(&bytes, dest).await?;
        Ok(())
    }

    /// Receive the next datagram and decode it.
    ///
    /// A datagram that fails to decode comes back as [`SocketError::Frame`];
    /// the socket itself stays usable.  Cancel-safe.
    pub async fn recv_from(&self) -> Result<(Frame, SocketAddr), SocketError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, addr) = self.inner.recv_from(&mut buf).await?;
        let frame = Frame::decode(&buf[..n])?;
        Ok((frame, addr))
    }
}
