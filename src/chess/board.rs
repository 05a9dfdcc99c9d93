use super::fen::{
    apply_move_to_position, decode_position, decrement_turn_field, encode_placement,
    patch_piece_at, CastlingRights, Placement, START_POSITION,
};
use super::moves::Move;
use super::rules::{castling_rook_squares, Validation};
use super::{ChessError, Color, Piece, PieceType, Square};
use std::fmt;
use tracing::{debug, error, instrument, trace};

/// Stable handle for a piece in the board's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId(usize);

/// What happened when a move was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub mv: Move,
    /// The moving piece after the move (promoted type, has_moved set)
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promoted: Option<PieceType>,
    pub castled: bool,
    /// Whether the opponent's king is in check after the move
    pub gives_check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    Checkmate { winner: Color },
    Stalemate,
}

/// Board state: a piece arena, an 8x8 grid of arena handles, game flags and
/// the position string kept in step with every applied move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pieces: Vec<Option<Piece>>,
    squares: [[Option<PieceId>; 8]; 8], // [rank][file]
    side_to_move: Color,
    castling_rights: CastlingRights,
    halfmove_clock: u16,
    fullmove_number: u16,
    in_check: [bool; 2],
    position: String,
}

impl Board {
    /// Standard starting position
    pub fn new() -> Self {
        match Self::from_fen(START_POSITION) {
            Ok(board) => board,
            Err(e) => unreachable!("start position must decode: {e}"),
        }
    }

    /// Build a board from a position string.
    ///
    /// `has_moved` is derived from the castling field: a king on its home
    /// square is unmoved while its side keeps any castling right, and a corner
    /// rook is unmoved while the matching right is present.
    /// A position where the side not on move is in check is rejected.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let decoded = decode_position(fen)?;

        for color in [Color::White, Color::Black] {
            let kings = decoded
                .placement
                .iter()
                .flatten()
                .filter(|p| **p == Some((PieceType::King, color)))
                .count();
            if kings != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "Expected exactly one {} king, found {}",
                    color, kings
                )));
            }
        }

        let rights = decoded.castling_rights;
        let mut pieces = Vec::with_capacity(32);
        let mut squares = [[None; 8]; 8];

        for square in Square::all() {
            let Some((piece_type, color)) = decoded.piece_at(square) else {
                continue;
            };
            let home = color.home_rank();
            let has_moved = match piece_type {
                PieceType::King => !(square == Square::new_unchecked(4, home) && rights.any(color)),
                PieceType::Rook if square == Square::new_unchecked(0, home) => {
                    !rights.queenside(color)
                }
                PieceType::Rook if square == Square::new_unchecked(7, home) => {
                    !rights.kingside(color)
                }
                PieceType::Rook => true,
                _ => false,
            };
            let id = PieceId(pieces.len());
            pieces.push(Some(Piece {
                piece_type,
                color,
                has_moved,
            }));
            squares[square.rank as usize][square.file as usize] = Some(id);
        }

        let mut board = Self {
            pieces,
            squares,
            side_to_move: decoded.side_to_move,
            castling_rights: rights,
            halfmove_clock: decoded.halfmove_clock,
            fullmove_number: decoded.fullmove_number,
            in_check: [false; 2],
            position: String::new(),
        };
        board.position = board.to_fen();
        board.is_in_check(Color::White);
        board.is_in_check(Color::Black);
        let waiting = board.side_to_move.opposite();
        if board.in_check(waiting) {
            return Err(ChessError::InvalidFen(format!(
                "{} is in check but it is {}'s turn",
                waiting, board.side_to_move
            )));
        }
        Ok(board)
    }

    /// Return to the standard starting position
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> &CastlingRights {
        &self.castling_rights
    }

    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// The position string maintained alongside the board
    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn piece_id_at(&self, square: Square) -> Option<PieceId> {
        self.squares[square.rank as usize][square.file as usize]
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.0).and_then(|p| p.as_ref())
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.piece_id_at(square).and_then(|id| self.piece(id)).copied()
    }

    /// Pieces currently on the board with their squares
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.piece_type == PieceType::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    /// Cached check flag as of the last recomputation
    pub fn in_check(&self, color: Color) -> bool {
        self.in_check[color.index()]
    }

    /// Recompute whether `color`'s king is attacked and refresh the cached flag
    pub fn is_in_check(&mut self, color: Color) -> bool {
        let attacked = self.king_attacked(color);
        self.in_check[color.index()] = attacked;
        attacked
    }

    /// Render the position string from the grid and game fields
    pub fn to_fen(&self) -> String {
        let mut placement: Placement = [[None; 8]; 8];
        for (square, piece) in self.pieces() {
            placement[square.rank as usize][square.file as usize] =
                Some((piece.piece_type, piece.color));
        }
        format!(
            "{} {} {} - {} {}",
            encode_placement(&placement),
            self.side_to_move.fen_char(),
            self.castling_rights.to_fen(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    fn slot(&mut self, square: Square) -> &mut Option<PieceId> {
        &mut self.squares[square.rank as usize][square.file as usize]
    }

    fn relocate(&mut self, from: Square, to: Square) {
        let id = self.slot(from).take();
        *self.slot(to) = id;
    }

    fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(id.0).and_then(|p| p.as_mut())
    }

    /// Parse and apply a move given in from-to notation
    pub fn apply_notation(&mut self, notation: &str) -> Result<MoveOutcome, ChessError> {
        let mv: Move = notation.parse().map_err(|e| {
            debug!(notation, error = %e, "Rejected move notation");
            e
        })?;
        self.apply_move(&mv)
    }

    /// Validate and apply a move for the side to move.
    ///
    /// On any error the board is left exactly as it was.
    #[instrument(level = "debug", skip(self, mv), fields(mv = %mv))]
    pub fn apply_move(&mut self, mv: &Move) -> Result<MoveOutcome, ChessError> {
        self.check_move(mv, Validation::STRICT).map_err(|e| {
            debug!(reason = %e, "Rejected move");
            e
        })?;

        let from_id = self
            .piece_id_at(mv.from)
            .ok_or_else(|| ChessError::IllegalMove(format!("No piece at {}", mv.from)))?;
        let mover = *self
            .piece(from_id)
            .ok_or_else(|| ChessError::IllegalMove(format!("No piece at {}", mv.from)))?;
        let captured_id = self.piece_id_at(mv.to);

        let reaches_last_rank =
            mover.piece_type == PieceType::Pawn && mv.to.rank == mover.color.promotion_rank();
        if mv.promotion.is_some() && !reaches_last_rank {
            debug!("Promotion suffix on a non-promoting move");
            return Err(ChessError::InvalidMove(format!(
                "{} does not promote a pawn",
                mv
            )));
        }

        let rook_hop = if mover.piece_type == PieceType::King && mv.from.file.abs_diff(mv.to.file) == 2 {
            castling_rook_squares(mv, mover.color)
        } else {
            None
        };

        // Tentative relocation so the king-safety test sees the new placement
        self.relocate(mv.from, mv.to);
        if let Some((rook_from, rook_to)) = rook_hop {
            self.relocate(rook_from, rook_to);
        }

        if self.king_attacked(mover.color) {
            if let Some((rook_from, rook_to)) = rook_hop {
                self.relocate(rook_to, rook_from);
            }
            *self.slot(mv.from) = Some(from_id);
            *self.slot(mv.to) = captured_id;
            debug!(color = %mover.color, "Move would leave own king in check");
            return Err(ChessError::IllegalMove(format!(
                "{} leaves the {} king in check",
                mv, mover.color
            )));
        }

        let captured = captured_id.and_then(|id| self.pieces[id.0].take());

        if let Some((rook_from, rook_to)) = rook_hop {
            if let Some(rook) = self.piece_id_at(rook_to).and_then(|id| self.piece_mut(id)) {
                rook.has_moved = true;
            }
            // The rook hop is recorded as its own half-move, then the turn is handed back
            let hop = Move::new_unchecked(rook_from, rook_to, None);
            self.position = apply_move_to_position(&self.position, &hop);
            self.position = decrement_turn_field(&self.position);
        }

        let base = Move::new_unchecked(mv.from, mv.to, None);
        self.position = apply_move_to_position(&self.position, &base);

        let promoted = if reaches_last_rank {
            let promote_to = mv.promotion.unwrap_or(PieceType::Queen);
            self.position = patch_piece_at(&self.position, mv.to, promote_to, mover.color);
            Some(promote_to)
        } else {
            None
        };

        let mut piece = mover;
        piece.has_moved = true;
        if let Some(promote_to) = promoted {
            piece.piece_type = promote_to;
        }
        if let Some(slot) = self.piece_mut(from_id) {
            *slot = piece;
        }

        self.sync_from_position();

        let opponent = mover.color.opposite();
        let gives_check = self.is_in_check(opponent);
        self.is_in_check(mover.color);

        trace!(position = %self.position, "Move applied");

        Ok(MoveOutcome {
            mv: *mv,
            piece,
            captured,
            promoted,
            castled: rook_hop.is_some(),
            gives_check,
        })
    }

    /// Refresh the game fields from the position string
    fn sync_from_position(&mut self) {
        match decode_position(&self.position) {
            Ok(decoded) => {
                self.side_to_move = decoded.side_to_move;
                self.castling_rights = decoded.castling_rights;
                self.halfmove_clock = decoded.halfmove_clock;
                self.fullmove_number = decoded.fullmove_number;
            }
            Err(e) => {
                error!(position = %self.position, error = %e, "Position string out of step with board");
            }
        }
    }

    /// Probe whether `mv` is playable for whichever side owns the moving
    /// piece without exposing that side's king. The board is restored
    /// before returning.
    pub fn test_move(&mut self, mv: &Move) -> bool {
        if self.check_move(mv, Validation::PROBE).is_err() {
            return false;
        }
        let Some(mover) = self.piece_at(mv.from) else {
            return false;
        };

        let from_id = self.piece_id_at(mv.from);
        let captured_id = self.piece_id_at(mv.to);
        self.relocate(mv.from, mv.to);

        let safe = !self.king_attacked(mover.color);

        *self.slot(mv.from) = from_id;
        *self.slot(mv.to) = captured_id;
        safe
    }

    /// All moves `color` can make without leaving its king attacked.
    /// Promotion moves are listed once, without a suffix.
    pub fn legal_moves(&mut self, color: Color) -> Vec<Move> {
        let origins: Vec<Square> = self
            .pieces()
            .filter(|(_, p)| p.color == color)
            .map(|(sq, _)| sq)
            .collect();

        let mut moves = Vec::new();
        for from in origins {
            for to in Square::all() {
                let mv = Move::new_unchecked(from, to, None);
                if self.test_move(&mv) {
                    moves.push(mv);
                }
            }
        }
        moves
    }

    /// True when `color` has no move that leaves its king safe.
    /// Stalemate also reports true here; see [`Board::outcome`].
    pub fn is_checkmated(&mut self, color: Color) -> bool {
        let origins: Vec<Square> = self
            .pieces()
            .filter(|(_, p)| p.color == color)
            .map(|(sq, _)| sq)
            .collect();

        for from in origins {
            for to in Square::all() {
                if self.test_move(&Move::new_unchecked(from, to, None)) {
                    return false;
                }
            }
        }
        true
    }

    /// Game result for the side to move, if the game is over
    pub fn outcome(&mut self) -> Option<GameEnd> {
        let side = self.side_to_move;
        if !self.is_checkmated(side) {
            return None;
        }
        if self.king_attacked(side) {
            Some(GameEnd::Checkmate {
                winner: side.opposite(),
            })
        } else {
            Some(GameEnd::Stalemate)
        }
    }

    /// Text diagram from white's side, rank 8 at the top
    pub fn to_ascii(&self) -> String {
        let mut result = String::from("  a b c d e f g h\n");

        for rank in (0..8u8).rev() {
            result.push_str(&format!("{} ", rank + 1));
            let row: Vec<String> = (0..8u8)
                .map(|file| match self.piece_at(Square::new_unchecked(file, rank)) {
                    Some(piece) => piece.to_string(),
                    None => ".".to_string(),
                })
                .collect();
            result.push_str(&row.join(" "));
            result.push_str(&format!(" {}\n", rank + 1));
        }

        result.push_str("  a b c d e f g h");
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii())
    }
}
