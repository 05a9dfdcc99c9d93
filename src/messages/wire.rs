use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, instrument, trace, warn};

// Wire protocol constants
pub const LENGTH_PREFIX_SIZE: usize = 4; // u32 big-endian
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64KB; relay payloads are a few bytes
pub const MIN_MESSAGE_SIZE: usize = 1;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Limits and timeouts for framed reads and writes
#[derive(Debug, Clone)]
pub struct WireConfig {
    pub max_message_size: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl WireConfig {
    /// Create a WireConfig with a single timeout for both read and write operations
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            read_timeout: timeout,
            write_timeout: timeout,
        }
    }

    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            ..Self::default()
        }
    }
}

#[derive(Error, Debug)]
pub enum WireProtocolError {
    #[error("Message too large: {size} bytes exceeds maximum of {max_size} bytes")]
    MessageTooLarge { size: usize, max_size: usize },

    #[error("Message too small: {size} bytes is below minimum of {min_size} bytes")]
    MessageTooSmall { size: usize, min_size: usize },

    #[error("Read operation timed out after {timeout:?}")]
    ReadTimeout { timeout: Duration },

    #[error("Write operation timed out after {timeout:?}")]
    WriteTimeout { timeout: Duration },

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Unexpected end of file while reading {operation}")]
    UnexpectedEof { operation: String },

    #[error("Payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireProtocolError {
    /// Whether the error means the peer went away rather than misbehaved
    pub fn is_disconnect(&self) -> bool {
        match self {
            WireProtocolError::ConnectionClosed | WireProtocolError::UnexpectedEof { .. } => true,
            WireProtocolError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Length-prefixed frame codec: a 4-byte big-endian payload length followed
/// by exactly that many payload bytes.
#[derive(Debug, Clone, Default)]
pub struct FramedMessage {
    config: WireConfig,
}

impl FramedMessage {
    pub fn new(config: WireConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    fn validate_length(&self, size: usize) -> Result<(), WireProtocolError> {
        if size < MIN_MESSAGE_SIZE {
            warn!(size, "Frame below minimum size");
            return Err(WireProtocolError::MessageTooSmall {
                size,
                min_size: MIN_MESSAGE_SIZE,
            });
        }
        if size > self.config.max_message_size {
            error!(
                size,
                max_size = self.config.max_message_size,
                "Frame exceeds maximum allowed size"
            );
            return Err(WireProtocolError::MessageTooLarge {
                size,
                max_size: self.config.max_message_size,
            });
        }
        Ok(())
    }

    /// Build the bytes of one frame without writing them
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, WireProtocolError> {
        self.validate_length(payload.len())?;
        let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(payload);
        Ok(frame)
    }

    #[instrument(level = "trace", skip(self, writer, payload), fields(len = payload.len()))]
    pub async fn write_frame(
        &self,
        writer: &mut (impl AsyncWrite + Unpin),
        payload: &[u8],
    ) -> Result<(), WireProtocolError> {
        // Prefix and payload go out in one write so a frame is never split
        // between two concurrent writers
        let frame = self.encode(payload)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        trace!("Frame written");
        Ok(())
    }

    /// Read one frame. A clean end of stream before any prefix byte is
    /// reported as [`WireProtocolError::ConnectionClosed`].
    #[instrument(level = "trace", skip(self, reader))]
    pub async fn read_frame(
        &self,
        reader: &mut (impl AsyncRead + Unpin),
    ) -> Result<Vec<u8>, WireProtocolError> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        let mut filled = 0;
        while filled < LENGTH_PREFIX_SIZE {
            let n = reader.read(&mut prefix[filled..]).await?;
            if n == 0 {
                return Err(if filled == 0 {
                    WireProtocolError::ConnectionClosed
                } else {
                    WireProtocolError::UnexpectedEof {
                        operation: "length prefix".to_string(),
                    }
                });
            }
            filled += n;
        }

        let length = u32::from_be_bytes(prefix) as usize;
        self.validate_length(length)?;

        let mut payload = vec![0u8; length];
        reader.read_exact(&mut payload).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                WireProtocolError::UnexpectedEof {
                    operation: format!("{} byte payload", length),
                }
            } else {
                WireProtocolError::Io(e)
            }
        })?;

        debug!(length, "Frame read");
        Ok(payload)
    }

    pub async fn read_frame_with_timeout(
        &self,
        reader: &mut (impl AsyncRead + Unpin),
        timeout: Duration,
    ) -> Result<Vec<u8>, WireProtocolError> {
        match tokio::time::timeout(timeout, self.read_frame(reader)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?timeout, "Read operation timed out");
                Err(WireProtocolError::ReadTimeout { timeout })
            }
        }
    }

    pub async fn write_frame_with_timeout(
        &self,
        writer: &mut (impl AsyncWrite + Unpin),
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), WireProtocolError> {
        match tokio::time::timeout(timeout, self.write_frame(writer, payload)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?timeout, "Write operation timed out");
                Err(WireProtocolError::WriteTimeout { timeout })
            }
        }
    }

    /// Read one frame and decode it as UTF-8 text
    pub async fn read_text(
        &self,
        reader: &mut (impl AsyncRead + Unpin),
    ) -> Result<String, WireProtocolError> {
        let bytes = self.read_frame(reader).await?;
        Ok(String::from_utf8(bytes)?)
    }

    pub async fn write_text(
        &self,
        writer: &mut (impl AsyncWrite + Unpin),
        text: &str,
    ) -> Result<(), WireProtocolError> {
        self.write_frame_with_timeout(writer, text.as_bytes(), self.config.write_timeout)
            .await
    }
}
