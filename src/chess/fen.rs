//! Position-string codec.
//!
//! The position string is the six-field FEN-like form
//! `placement side castling en-passant halfmove fullmove`. Boards are decoded
//! from it, and every applied move is appended to it through
//! [`apply_move_to_position`] so the wire form never has to be regenerated
//! from scratch.

use super::error::ChessError;
use super::moves::Move;
use super::piece::{piece_char, piece_from_char, Color, PieceType};
use super::square::Square;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{error, trace};

/// Position string of the standard starting position
pub const START_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Piece placement indexed as `placement[rank][file]`, rank 0 = rank 1
pub type Placement = [[Option<(PieceType, Color)>; 8]; 8];

/// Castling rights for both players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    /// All four rights available
    pub fn new() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    /// Parse the castling field (e.g., "KQkq", "Kq", "-")
    pub fn from_fen(field: &str) -> Result<Self, ChessError> {
        if field == "-" {
            return Ok(Self::none());
        }

        let mut rights = Self::none();
        let mut seen = HashSet::new();
        let mut last_index = -1i32;
        let order = ['K', 'Q', 'k', 'q'];

        for c in field.chars() {
            let index = order.iter().position(|&x| x == c).ok_or_else(|| {
                ChessError::InvalidFen(format!(
                    "Invalid castling rights character '{c}' (valid: K, Q, k, q, or - for none)"
                ))
            })? as i32;

            if !seen.insert(c) {
                return Err(ChessError::InvalidFen(format!(
                    "Duplicate character '{c}' in castling rights '{field}'"
                )));
            }
            if index < last_index {
                return Err(ChessError::InvalidFen(format!(
                    "Castling rights '{field}' not in conventional order (expected order: KQkq)"
                )));
            }
            last_index = index;

            match c {
                'K' => rights.white_kingside = true,
                'Q' => rights.white_queenside = true,
                'k' => rights.black_kingside = true,
                _ => rights.black_queenside = true,
            }
        }

        Ok(rights)
    }

    pub fn to_fen(&self) -> String {
        let mut result = String::new();

        if self.white_kingside {
            result.push('K');
        }
        if self.white_queenside {
            result.push('Q');
        }
        if self.black_kingside {
            result.push('k');
        }
        if self.black_queenside {
            result.push('q');
        }

        if result.is_empty() {
            "-".to_string()
        } else {
            result
        }
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    pub fn any(&self, color: Color) -> bool {
        self.kingside(color) || self.queenside(color)
    }

    /// Remove castling rights for a color (when its king moves)
    pub fn remove_all_for_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Strip whatever right depends on a piece standing on `square`.
    /// Applied to both ends of every move, so a king or rook that leaves its
    /// home square (or is captured there) loses the right for good.
    pub fn remove_for_square(&mut self, square: Square) {
        match (square.file, square.rank) {
            (4, 0) => self.remove_all_for_color(Color::White),
            (4, 7) => self.remove_all_for_color(Color::Black),
            (0, 0) => self.white_queenside = false, // a1 rook
            (7, 0) => self.white_kingside = false,  // h1 rook
            (0, 7) => self.black_queenside = false, // a8 rook
            (7, 7) => self.black_kingside = false,  // h8 rook
            _ => {}
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully decoded position string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPosition {
    pub placement: Placement,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl DecodedPosition {
    pub fn piece_at(&self, square: Square) -> Option<(PieceType, Color)> {
        self.placement[square.rank as usize][square.file as usize]
    }

    pub fn set_piece(&mut self, square: Square, piece: Option<(PieceType, Color)>) {
        self.placement[square.rank as usize][square.file as usize] = piece;
    }
}

/// Decode a position string, validating every field
pub fn decode_position(fen: &str) -> Result<DecodedPosition, ChessError> {
    let fen = fen.trim();
    if fen.is_empty() {
        return Err(ChessError::InvalidFen(
            "Position string cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = fen.split_whitespace().collect();
    let [placement_field, side_field, castling_field, en_passant_field, halfmove_field, fullmove_field] =
        parts.as_slice()
    else {
        return Err(ChessError::InvalidFen(format!(
            "Position string must have exactly 6 fields (placement side castling en_passant halfmove fullmove), found {}",
            parts.len()
        )));
    };

    let placement = decode_placement(placement_field)?;

    let side_to_move = match *side_field {
        "w" => Color::White,
        "b" => Color::Black,
        _ => {
            return Err(ChessError::InvalidFen(format!(
                "Invalid active color '{side_field}' (must be 'w' for White or 'b' for Black)"
            )))
        }
    };

    let castling_rights = CastlingRights::from_fen(castling_field)?;

    let en_passant = if *en_passant_field == "-" {
        None
    } else {
        let square = en_passant_field.parse::<Square>().map_err(|e| {
            ChessError::InvalidFen(format!(
                "Invalid en passant target '{en_passant_field}': {e}"
            ))
        })?;
        if square.rank != 2 && square.rank != 5 {
            return Err(ChessError::InvalidFen(format!(
                "Invalid en passant target '{en_passant_field}' (en passant squares must be on rank 3 or 6)"
            )));
        }
        Some(square)
    };

    let halfmove_clock = halfmove_field.parse::<u16>().map_err(|e| {
        ChessError::InvalidFen(format!(
            "Invalid halfmove clock '{halfmove_field}' (must be a non-negative integer): {e}"
        ))
    })?;

    let fullmove_number = fullmove_field.parse::<u16>().map_err(|e| {
        ChessError::InvalidFen(format!(
            "Invalid fullmove number '{fullmove_field}' (must be a positive integer): {e}"
        ))
    })?;
    if fullmove_number == 0 {
        return Err(ChessError::InvalidFen(
            "Fullmove number must be at least 1".to_string(),
        ));
    }

    Ok(DecodedPosition {
        placement,
        side_to_move,
        castling_rights,
        en_passant,
        halfmove_clock,
        fullmove_number,
    })
}

fn decode_placement(field: &str) -> Result<Placement, ChessError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::InvalidFen(format!(
            "Piece placement must have exactly 8 ranks separated by '/', found {}",
            ranks.len()
        )));
    }

    let mut placement: Placement = [[None; 8]; 8];

    // Ranks are listed from rank 8 down to rank 1
    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - rank_idx;
        let rank_number = 8 - rank_idx;
        let mut file = 0usize;

        for c in rank_str.chars() {
            if let Some(empty) = c.to_digit(10) {
                let empty = empty as usize;
                if empty == 0 || file + empty > 8 {
                    return Err(ChessError::InvalidFen(format!(
                        "Empty square count '{c}' in rank {rank_number} would exceed 8 squares"
                    )));
                }
                file += empty;
            } else {
                if file >= 8 {
                    return Err(ChessError::InvalidFen(format!(
                        "Rank {rank_number} has more than 8 squares (found '{c}')"
                    )));
                }
                let piece = piece_from_char(c).map_err(|_| {
                    ChessError::InvalidFen(format!(
                        "Invalid piece character '{c}' in rank {rank_number} (valid pieces: KQRBNPkqrbnp)"
                    ))
                })?;
                placement[board_rank][file] = Some(piece);
                file += 1;
            }
        }

        if file != 8 {
            return Err(ChessError::InvalidFen(format!(
                "Rank {rank_number} must represent exactly 8 squares, found {file}"
            )));
        }
    }

    Ok(placement)
}

/// Encode a decoded position back into its string form
pub fn encode_position(position: &DecodedPosition) -> String {
    let en_passant = position
        .en_passant
        .map(|sq| sq.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} {} {} {} {}",
        encode_placement(&position.placement),
        position.side_to_move.fen_char(),
        position.castling_rights.to_fen(),
        en_passant,
        position.halfmove_clock,
        position.fullmove_number
    )
}

/// Placement field with run-length digits for empty squares
pub fn encode_placement(placement: &Placement) -> String {
    let mut ranks = Vec::with_capacity(8);

    for rank in placement.iter().rev() {
        let mut rank_string = String::new();
        let mut empty_count = 0;

        for square in rank.iter() {
            match square {
                Some((piece_type, color)) => {
                    if empty_count > 0 {
                        rank_string.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    rank_string.push(piece_char(*piece_type, *color));
                }
                None => empty_count += 1,
            }
        }

        if empty_count > 0 {
            rank_string.push_str(&empty_count.to_string());
        }

        ranks.push(rank_string);
    }

    ranks.join("/")
}

/// Append a move's effect to a position string.
///
/// Moves the piece, relocates the rook for a king castling pattern, updates
/// the halfmove clock and fullmove number, flips the side to move and strips
/// castling rights touched by the move. The move is not checked for legality.
/// Malformed input is logged and returned unchanged.
pub fn apply_move_to_position(position: &str, mv: &Move) -> String {
    match try_apply_move(position, mv) {
        Ok(next) => {
            trace!(mv = %mv, position = %next, "Appended move to position");
            next
        }
        Err(e) => {
            error!(error = %e, mv = %mv, position, "Failed to append move to position string");
            position.to_string()
        }
    }
}

fn try_apply_move(position: &str, mv: &Move) -> Result<String, ChessError> {
    let mut decoded = decode_position(position)?;

    let moving = decoded.piece_at(mv.from).ok_or_else(|| {
        ChessError::InvalidMove(format!("No piece at {} in position string", mv.from))
    })?;
    let captured = decoded.piece_at(mv.to);

    decoded.set_piece(mv.to, Some(moving));
    decoded.set_piece(mv.from, None);

    let (piece_type, color) = moving;
    let home = color.home_rank();
    if piece_type == PieceType::King
        && mv.from == Square::new_unchecked(4, home)
        && mv.to.rank == home
    {
        let rook_hop = match mv.to.file {
            6 => Some((7, 5)),
            2 => Some((0, 3)),
            _ => None,
        };
        if let Some((rook_from, rook_to)) = rook_hop {
            decoded.set_piece(Square::new_unchecked(rook_to, home), Some((PieceType::Rook, color)));
            decoded.set_piece(Square::new_unchecked(rook_from, home), None);
        }
    }

    if piece_type == PieceType::Pawn || captured.is_some() {
        decoded.halfmove_clock = 0;
    } else {
        decoded.halfmove_clock = decoded.halfmove_clock.saturating_add(1);
    }

    if decoded.side_to_move == Color::Black {
        decoded.fullmove_number = decoded.fullmove_number.saturating_add(1);
    }
    decoded.side_to_move = decoded.side_to_move.opposite();

    decoded.castling_rights.remove_for_square(mv.from);
    decoded.castling_rights.remove_for_square(mv.to);
    decoded.en_passant = None;

    Ok(encode_position(&decoded))
}

/// Rewrite the piece on one square, leaving every other field untouched.
/// Malformed input is logged and returned unchanged.
pub fn patch_piece_at(position: &str, square: Square, piece_type: PieceType, color: Color) -> String {
    match decode_position(position) {
        Ok(mut decoded) => {
            decoded.set_piece(square, Some((piece_type, color)));
            encode_position(&decoded)
        }
        Err(e) => {
            error!(error = %e, square = %square, position, "Failed to patch piece in position string");
            position.to_string()
        }
    }
}

/// Undo the turn bookkeeping of one quiet half-move: flip the side to move
/// back, step the fullmove number back when black is to move again and step
/// the halfmove clock back. Used when a castling rook hop has been appended as
/// its own half-move so the castle as a whole counts as a single turn.
/// Malformed input is logged and returned unchanged.
pub fn decrement_turn_field(position: &str) -> String {
    match decode_position(position) {
        Ok(mut decoded) => {
            decoded.side_to_move = decoded.side_to_move.opposite();
            if decoded.side_to_move == Color::Black && decoded.fullmove_number > 1 {
                decoded.fullmove_number -= 1;
            }
            decoded.halfmove_clock = decoded.halfmove_clock.saturating_sub(1);
            encode_position(&decoded)
        }
        Err(e) => {
            error!(error = %e, position, "Failed to decrement turn field of position string");
            position.to_string()
        }
    }
}
