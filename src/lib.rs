pub mod chess;
pub mod cli;
pub mod engine;
pub mod game;
pub mod messages;
pub mod network;

// Re-export key types for easy testing
pub use chess::{Board, ChessError, Color, Move, MoveOutcome, PieceType, Square};
pub use engine::{EngineClient, EngineConfig, PendingMove};
pub use game::{GameSession, OpponentMode};
pub use messages::{FramedMessage, RelayMessage, WireConfig};
pub use network::{RelayClient, RelayClientConfig, RelayServer};
