use thiserror::Error;

/// Errors from parsing notation and applying moves
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid piece type: {0}")]
    InvalidPieceType(String),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    /// Malformed move notation, or a suffix the move cannot carry
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid position string: {0}")]
    InvalidFen(String),

    /// Well-formed but not playable in the current position
    #[error("Illegal move: {0}")]
    IllegalMove(String),
}
