// Re-export all public items
pub use self::board::{Board, GameEnd, MoveOutcome, PieceId};
pub use self::error::ChessError;
pub use self::fen::{
    apply_move_to_position, decode_position, decrement_turn_field, encode_position,
    patch_piece_at, CastlingRights, DecodedPosition, START_POSITION,
};
pub use self::moves::Move;
pub use self::piece::{Color, Piece, PieceType};
pub use self::rules::Validation;
pub use self::square::Square;

// Define submodules
mod board;
mod error;
pub mod fen;
mod moves;
mod piece;
mod rules;
mod square;
