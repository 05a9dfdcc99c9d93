use crate::chess::Color;
use crate::messages::types::RelayMessage;
use crate::messages::wire::{FramedMessage, WireConfig};
use crate::network::connection::RelayError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct RelayClientConfig {
    pub connect_timeout: Duration,
    /// How long to wait for the color assignment, i.e. for an opponent
    pub assignment_timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub wire: WireConfig,
}

impl Default for RelayClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            assignment_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wire: WireConfig::default(),
        }
    }
}

type MoveQueue = Arc<Mutex<VecDeque<String>>>;

fn lock_queue(queue: &Mutex<VecDeque<String>>) -> MutexGuard<'_, VecDeque<String>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A game's link to the move relay.
///
/// Incoming frames are drained by a background task: the reset keyword raises
/// a flag and drops the moves queued before it, everything else queues as a
/// move in arrival order.
pub struct RelayClient {
    color: Color,
    writer: OwnedWriteHalf,
    framed: FramedMessage,
    incoming: MoveQueue,
    reset_requested: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    receiver: JoinHandle<()>,
    poll_interval: Duration,
}

impl RelayClient {
    /// Connect and wait for the relay to pair us and assign a color
    #[instrument(skip(config))]
    pub async fn connect(addr: &str, config: RelayClientConfig) -> Result<Self, RelayError> {
        let stream = match tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(RelayError::Connect {
                    addr: addr.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(RelayError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout: config.connect_timeout,
                })
            }
        };
        info!("Connected to relay at {}, waiting for an opponent", addr);

        let framed = FramedMessage::new(config.wire.clone());
        let (mut reader, writer) = stream.into_split();

        let assignment = match config.assignment_timeout {
            Some(timeout) => framed.read_frame_with_timeout(&mut reader, timeout).await?,
            None => framed.read_frame(&mut reader).await?,
        };
        let assignment = String::from_utf8_lossy(&assignment).into_owned();
        let color = match RelayMessage::from_assignment(&assignment) {
            Some(RelayMessage::Color(color)) => color,
            _ => return Err(RelayError::InvalidColor(assignment)),
        };
        info!("Relay assigned color {}", color);

        let incoming: MoveQueue = Arc::new(Mutex::new(VecDeque::new()));
        let reset_requested = Arc::new(AtomicBool::new(false));
        let connected = Arc::new(AtomicBool::new(true));

        let receiver = tokio::spawn(Self::receive_loop(
            reader,
            framed.clone(),
            Arc::clone(&incoming),
            Arc::clone(&reset_requested),
            Arc::clone(&connected),
        ));

        Ok(Self {
            color,
            writer,
            framed,
            incoming,
            reset_requested,
            connected,
            receiver,
            poll_interval: config.poll_interval,
        })
    }

    async fn receive_loop(
        mut reader: OwnedReadHalf,
        framed: FramedMessage,
        incoming: MoveQueue,
        reset_requested: Arc<AtomicBool>,
        connected: Arc<AtomicBool>,
    ) {
        loop {
            match framed.read_text(&mut reader).await {
                Ok(payload) => match RelayMessage::from_forwarded(&payload) {
                    RelayMessage::Reset => {
                        info!("Opponent requested a reset");
                        lock_queue(&incoming).clear();
                        reset_requested.store(true, Ordering::SeqCst);
                    }
                    message => {
                        debug!("Received {}", message);
                        lock_queue(&incoming).push_back(message.payload().to_string());
                    }
                },
                Err(e) => {
                    if e.is_disconnect() {
                        info!("Relay connection closed");
                    } else {
                        warn!("Relay connection failed: {}", e);
                    }
                    connected.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&mut self, message: RelayMessage) -> Result<(), RelayError> {
        if !self.is_connected() {
            return Err(RelayError::NotConnected);
        }
        let timeout = self.framed.config().write_timeout;
        if let Err(e) = self
            .framed
            .write_frame_with_timeout(&mut self.writer, message.payload().as_bytes(), timeout)
            .await
        {
            warn!("Failed to send {}: {}", message, e);
            self.connected.store(false, Ordering::SeqCst);
            return Err(e.into());
        }
        debug!("Sent {}", message);
        Ok(())
    }

    /// Send a move in from-to notation to the opponent
    pub async fn send_move(&mut self, notation: &str) -> Result<(), RelayError> {
        self.send(RelayMessage::Move(notation.to_string())).await
    }

    pub async fn send_reset(&mut self) -> Result<(), RelayError> {
        self.send(RelayMessage::Reset).await
    }

    /// Oldest received move, if any
    pub fn try_take_move(&self) -> Option<String> {
        lock_queue(&self.incoming).pop_front()
    }

    /// Drop every move still queued from the opponent
    pub fn clear_moves(&self) {
        let mut queue = lock_queue(&self.incoming);
        if !queue.is_empty() {
            debug!("Discarding {} queued move(s)", queue.len());
            queue.clear();
        }
    }

    /// Wait for the next move, polling at the configured interval.
    /// Returns `None` once the connection is gone and nothing is queued.
    pub async fn take_next_move(&self) -> Option<String> {
        loop {
            if let Some(notation) = self.try_take_move() {
                return Some(notation);
            }
            if !self.is_connected() {
                return None;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Consume the reset flag raised by the opponent
    pub fn take_reset(&self) -> bool {
        self.reset_requested.swap(false, Ordering::SeqCst)
    }

    pub async fn close(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
        self.receiver.abort();
        if let Err(e) = self.writer.shutdown().await {
            debug!("Error shutting down relay socket: {}", e);
        }
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        self.receiver.abort();
    }
}
