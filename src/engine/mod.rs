pub mod client;
pub mod remote;
pub mod uci;

pub use client::EngineClient;
pub use remote::RemoteEngine;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::debug;

pub const MAX_SKILL_LEVEL: u8 = 20;
pub const DEFAULT_SEARCH_DEPTH: u8 = 10;
pub const DEFAULT_SKILL_LEVEL: u8 = 10;
pub const DEFAULT_REMOTE_URL: &str = "https://stockfish.online/api/s/v2.php";
pub const DEFAULT_MIN_LATENCY: Duration = Duration::from_secs(1);
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine closed its output")]
    Closed,

    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Remote engine request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine executable, looked up on PATH when not a path
    pub program: String,
    pub args: Vec<String>,
    pub search_depth: u8,
    /// 0-20; larger values are clamped
    pub skill_level: u8,
    pub use_remote: bool,
    pub remote_url: String,
    /// Replies are held back until at least this much time has passed
    pub min_latency: Duration,
    /// Bound on the handshake and on each search
    pub response_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "stockfish".to_string(),
            args: Vec::new(),
            search_depth: DEFAULT_SEARCH_DEPTH,
            skill_level: DEFAULT_SKILL_LEVEL,
            use_remote: false,
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            min_latency: DEFAULT_MIN_LATENCY,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

/// Engine handle shared between the game loop and in-flight requests
pub type SharedEngine = Arc<tokio::sync::Mutex<EngineClient>>;

pub fn shared(engine: EngineClient) -> SharedEngine {
    Arc::new(tokio::sync::Mutex::new(engine))
}

/// An engine request running in the background.
///
/// The game loop polls it once per tick instead of blocking on the engine.
/// Dropping it discards the answer; the request itself runs to completion so
/// the engine's output stays in step with its input.
#[derive(Debug)]
pub struct PendingMove {
    receiver: oneshot::Receiver<Option<String>>,
}

impl PendingMove {
    pub fn spawn(engine: SharedEngine, position: String) -> Self {
        let (sender, receiver) = oneshot::channel();
        tokio::spawn(async move {
            let best = engine.lock().await.request_move(&position).await;
            if sender.send(best).is_err() {
                debug!("Engine answer discarded");
            }
        });
        Self { receiver }
    }

    /// `None` while the request is running, then the engine's answer
    pub fn poll(&mut self) -> Option<Option<String>> {
        match self.receiver.try_recv() {
            Ok(best) => Some(best),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(None),
        }
    }

    /// Wait for the answer
    pub async fn wait(self) -> Option<String> {
        self.receiver.await.unwrap_or(None)
    }
}
