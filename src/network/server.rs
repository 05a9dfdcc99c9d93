use crate::messages::wire::{FramedMessage, WireConfig, WireProtocolError};
use crate::network::connection::WaitingPeer;
use anyhow::{Context, Result};
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, instrument, warn};

/// Move relay: pairs connecting clients two at a time, tells each its color
/// and forwards frames between the two until either side leaves.
pub struct RelayServer {
    listener: TcpListener,
    wire_config: WireConfig,
}

impl RelayServer {
    pub async fn bind(addr: &str, wire_config: WireConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind relay to address: {}", addr))?;

        info!("Relay bound to address: {}", addr);
        debug!(
            "Wire config - max_message_size: {}, write_timeout: {:?}",
            wire_config.max_message_size, wire_config.write_timeout
        );

        Ok(Self {
            listener,
            wire_config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read relay local address")
    }

    /// Serve until the process exits
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes; running sessions are aborted on exit
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!("Starting relay on address: {:?}", self.listener.local_addr()?);
        tokio::pin!(shutdown);

        let mut waiting: VecDeque<WaitingPeer> = VecDeque::new();
        let mut sessions: HashMap<usize, JoinHandle<()>> = HashMap::new();
        let mut session_counter = 0usize;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(active = sessions.len(), "Relay shutting down");
                    for (_, handle) in sessions.drain() {
                        handle.abort();
                    }
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            info!("Accepted connection from {}", peer_addr);
                            waiting.push_back(WaitingPeer::new(stream, peer_addr));
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            continue;
                        }
                    }

                    while let Some((first, second)) = Self::next_live_pair(&mut waiting).await {
                        session_counter += 1;
                        let session_id = session_counter;
                        let wire_config = self.wire_config.clone();

                        let handle = task::spawn(async move {
                            if let Err(e) = Self::run_session(first, second, wire_config, session_id).await {
                                warn!("Session {} ended with error: {}", session_id, e);
                            }
                        });
                        sessions.insert(session_id, handle);
                    }

                    sessions.retain(|id, handle| {
                        if handle.is_finished() {
                            debug!("Cleaning up finished session {}", id);
                            false
                        } else {
                            true
                        }
                    });
                }
            }
        }
    }

    /// Pop the first two queued peers whose sockets are still open.
    /// Dead peers are dropped; a live peer whose partner turned out dead goes
    /// back to the front of the queue.
    async fn next_live_pair(waiting: &mut VecDeque<WaitingPeer>) -> Option<(WaitingPeer, WaitingPeer)> {
        while waiting.len() >= 2 {
            let first = waiting.pop_front()?;
            let second = waiting.pop_front()?;

            match (first.is_alive().await, second.is_alive().await) {
                (true, true) => return Some((first, second)),
                (true, false) => {
                    info!("Waiting peer {} disconnected before pairing", second.addr);
                    waiting.push_front(first);
                }
                (false, true) => {
                    info!("Waiting peer {} disconnected before pairing", first.addr);
                    waiting.push_front(second);
                }
                (false, false) => {
                    info!(
                        "Waiting peers {} and {} disconnected before pairing",
                        first.addr, second.addr
                    );
                }
            }
        }
        None
    }

    #[instrument(skip(first, second, wire_config), fields(session_id = session_id))]
    async fn run_session(
        first: WaitingPeer,
        second: WaitingPeer,
        wire_config: WireConfig,
        session_id: usize,
    ) -> Result<(), WireProtocolError> {
        let first_is_white = rand::thread_rng().gen_bool(0.5);
        let (mut white, mut black) = if first_is_white {
            (first, second)
        } else {
            (second, first)
        };
        info!("Pairing {} (white) with {} (black)", white.addr, black.addr);

        let framed = FramedMessage::new(wire_config);
        framed.write_text(&mut white.stream, "white").await?;
        framed.write_text(&mut black.stream, "black").await?;

        let (mut white_reader, mut white_writer) = white.stream.into_split();
        let (mut black_reader, mut black_writer) = black.stream.into_split();

        let result = tokio::select! {
            r = Self::forward(&framed, &mut white_reader, &mut black_writer) => r,
            r = Self::forward(&framed, &mut black_reader, &mut white_writer) => r,
        };

        match result {
            Err(e) if e.is_disconnect() => {
                info!("Session {} ended: peer disconnected", session_id);
                Ok(())
            }
            Err(e) => Err(e),
            Ok(()) => Ok(()),
        }
        // Both sockets close as the halves drop here
    }

    async fn forward(
        framed: &FramedMessage,
        reader: &mut OwnedReadHalf,
        writer: &mut OwnedWriteHalf,
    ) -> Result<(), WireProtocolError> {
        loop {
            let frame = framed.read_frame(reader).await?;
            debug!(len = frame.len(), "Forwarding frame");
            framed
                .write_frame_with_timeout(writer, &frame, framed.config().write_timeout)
                .await?;
        }
    }
}
