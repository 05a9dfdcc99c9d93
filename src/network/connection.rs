use crate::messages::WireProtocolError;
use std::net::SocketAddr;
use std::task::Poll;
use std::time::Duration;
use thiserror::Error;
use tokio::io::ReadBuf;
use tokio::net::TcpStream;
use tracing::trace;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to connect to relay at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("Invalid color assignment from relay: {0:?}")]
    InvalidColor(String),

    #[error("Not connected to relay")]
    NotConnected,

    #[error("Wire protocol error: {0}")]
    Wire(#[from] WireProtocolError),
}

/// A peer accepted by the relay that has not been paired yet
#[derive(Debug)]
pub struct WaitingPeer {
    pub stream: TcpStream,
    pub addr: SocketAddr,
}

impl WaitingPeer {
    pub fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        Self { stream, addr }
    }

    /// Non-blocking liveness probe.
    ///
    /// Peeks one byte without consuming it: no data yet or buffered data means
    /// the peer is still there, end of stream or a socket error means it left.
    pub async fn is_alive(&self) -> bool {
        let mut byte = [0u8; 1];
        let alive = std::future::poll_fn(|cx| {
            let mut buf = ReadBuf::new(&mut byte);
            match self.stream.poll_peek(cx, &mut buf) {
                Poll::Pending => Poll::Ready(true),
                Poll::Ready(Ok(0)) => Poll::Ready(false),
                Poll::Ready(Ok(_)) => Poll::Ready(true),
                Poll::Ready(Err(_)) => Poll::Ready(false),
            }
        })
        .await;
        trace!(peer = %self.addr, alive, "Probed waiting peer");
        alive
    }
}
