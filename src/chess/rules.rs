//! Move legality: per-piece validators, attack detection and castling.
//!
//! Everything here is read-only with respect to the board. Validators report
//! the reason for a rejection as a [`ChessError`]; whether that reason is
//! logged is decided by the [`Validation`] mode.

use super::board::Board;
use super::error::ChessError;
use super::moves::Move;
use super::piece::{Color, Piece, PieceType};
use super::square::Square;
use tracing::{debug, error};

/// How strictly a candidate move is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    /// Accept pieces of the side not on move
    pub ignore_turn: bool,
    /// Consider castling for two-square king moves
    pub castling: bool,
    /// Suppress diagnostic logging of rejections
    pub silent: bool,
}

impl Validation {
    /// A move requested by a player or the engine
    pub const STRICT: Validation = Validation {
        ignore_turn: false,
        castling: true,
        silent: false,
    };

    /// Exploratory probe used by checkmate search
    pub const PROBE: Validation = Validation {
        ignore_turn: true,
        castling: true,
        silent: true,
    };

    /// Attack detection; castling never captures so it is left out
    pub const ATTACK: Validation = Validation {
        ignore_turn: true,
        castling: false,
        silent: true,
    };
}

impl Default for Validation {
    fn default() -> Self {
        Self::STRICT
    }
}

impl Board {
    /// Whether the side to move may play `mv` by piece movement rules
    pub fn is_legal_move(&self, mv: &Move) -> bool {
        self.is_legal_move_with(mv, Validation::STRICT)
    }

    pub fn is_legal_move_with(&self, mv: &Move, mode: Validation) -> bool {
        match self.check_move(mv, mode) {
            Ok(()) => true,
            Err(e) => {
                if !mode.silent {
                    debug!(mv = %mv, reason = %e, "Rejected move");
                }
                false
            }
        }
    }

    /// Validate a move by piece movement rules, returning the rejection reason.
    /// Does not look at whether the mover's own king ends up in check.
    pub fn check_move(&self, mv: &Move, mode: Validation) -> Result<(), ChessError> {
        if mv.from == mv.to {
            return Err(ChessError::IllegalMove(format!(
                "Source and destination are both {}",
                mv.from
            )));
        }

        let piece = self.piece_at(mv.from).ok_or_else(|| {
            ChessError::IllegalMove(format!("No piece at source square {}", mv.from))
        })?;

        if !mode.ignore_turn && piece.color != self.side_to_move() {
            return Err(ChessError::IllegalMove(format!(
                "It is {}'s turn, cannot move a {} piece",
                self.side_to_move(),
                piece.color
            )));
        }

        // Attack detection still reaches the king square
        if !mode.ignore_turn {
            if let Some(target) = self.piece_at(mv.to) {
                if target.piece_type == PieceType::King {
                    return Err(ChessError::IllegalMove(format!(
                        "Cannot capture the king on {}",
                        mv.to
                    )));
                }
            }
        }

        match piece.piece_type {
            PieceType::Pawn => self.check_pawn_move(mv, &piece),
            PieceType::Knight => self.check_knight_move(mv, &piece),
            PieceType::Bishop => self.check_bishop_move(mv, &piece),
            PieceType::Rook => self.check_rook_move(mv, &piece),
            PieceType::Queen => self.check_queen_move(mv, &piece),
            PieceType::King => self.check_king_move(mv, &piece, mode),
        }
    }

    fn ensure_not_friendly(&self, mv: &Move, piece: &Piece) -> Result<(), ChessError> {
        match self.piece_at(mv.to) {
            Some(target) if target.color == piece.color => Err(ChessError::IllegalMove(
                format!("Destination {} occupied by friendly piece", mv.to),
            )),
            _ => Ok(()),
        }
    }

    fn ensure_path_clear(&self, mv: &Move) -> Result<(), ChessError> {
        match mv.from.between(&mv.to).into_iter().find(|sq| self.piece_at(*sq).is_some()) {
            Some(blocker) => Err(ChessError::IllegalMove(format!(
                "Path from {} to {} blocked at {}",
                mv.from, mv.to, blocker
            ))),
            None => Ok(()),
        }
    }

    fn check_pawn_move(&self, mv: &Move, piece: &Piece) -> Result<(), ChessError> {
        let direction = piece.color.forward();
        let (df, dr) = mv.from.delta_to(&mv.to);
        let target = self.piece_at(mv.to);

        // One square forward
        if df == 0 && dr == direction && target.is_none() {
            return Ok(());
        }

        // Two squares forward from the home rank
        if df == 0 && dr == 2 * direction && mv.from.rank == piece.color.pawn_rank() {
            let skipped = mv.from.offset(0, direction);
            let skipped_empty = skipped.map_or(false, |sq| self.piece_at(sq).is_none());
            if skipped_empty && target.is_none() {
                return Ok(());
            }
        }

        // Diagonal capture
        if df.abs() == 1 && dr == direction {
            if let Some(victim) = target {
                if victim.color != piece.color {
                    return Ok(());
                }
            }
        }

        Err(ChessError::IllegalMove(format!(
            "Pawn cannot move from {} to {}",
            mv.from, mv.to
        )))
    }

    fn check_knight_move(&self, mv: &Move, piece: &Piece) -> Result<(), ChessError> {
        self.ensure_not_friendly(mv, piece)?;
        let (df, dr) = mv.from.delta_to(&mv.to);
        match (df.abs(), dr.abs()) {
            (1, 2) | (2, 1) => Ok(()),
            _ => Err(ChessError::IllegalMove(format!(
                "Knight cannot move from {} to {}",
                mv.from, mv.to
            ))),
        }
    }

    fn check_bishop_move(&self, mv: &Move, piece: &Piece) -> Result<(), ChessError> {
        let (df, dr) = mv.from.delta_to(&mv.to);
        if df.abs() != dr.abs() {
            return Err(ChessError::IllegalMove(
                "Bishop can only move diagonally".to_string(),
            ));
        }
        self.ensure_path_clear(mv)?;
        self.ensure_not_friendly(mv, piece)
    }

    fn check_rook_move(&self, mv: &Move, piece: &Piece) -> Result<(), ChessError> {
        let (df, dr) = mv.from.delta_to(&mv.to);
        if df != 0 && dr != 0 {
            return Err(ChessError::IllegalMove(
                "Rook can only move in a straight line".to_string(),
            ));
        }
        self.ensure_path_clear(mv)?;
        self.ensure_not_friendly(mv, piece)
    }

    fn check_queen_move(&self, mv: &Move, piece: &Piece) -> Result<(), ChessError> {
        self.check_rook_move(mv, piece)
            .or_else(|_| self.check_bishop_move(mv, piece))
            .map_err(|_| {
                ChessError::IllegalMove(format!(
                    "Queen cannot move from {} to {}",
                    mv.from, mv.to
                ))
            })
    }

    fn check_king_move(&self, mv: &Move, piece: &Piece, mode: Validation) -> Result<(), ChessError> {
        self.ensure_not_friendly(mv, piece)?;

        if mv.from.chebyshev_distance(&mv.to) == 1 {
            return Ok(());
        }

        if mode.castling {
            return self.check_castling(mv, piece);
        }

        Err(ChessError::IllegalMove(format!(
            "King cannot move from {} to {}",
            mv.from, mv.to
        )))
    }

    fn check_castling(&self, mv: &Move, king: &Piece) -> Result<(), ChessError> {
        let reject = |reason: &str| Err(ChessError::IllegalMove(format!("Cannot castle {}: {}", mv, reason)));

        let Some((rook_from, _)) = castling_rook_squares(mv, king.color) else {
            return reject("not a castling move");
        };

        if king.has_moved {
            return reject("king has already moved");
        }
        if self.in_check(king.color) {
            return reject("king is in check");
        }

        match self.piece_at(rook_from) {
            Some(rook)
                if rook.piece_type == PieceType::Rook
                    && rook.color == king.color
                    && !rook.has_moved => {}
            _ => return reject("rook is missing or has moved"),
        }

        if mv.from.between(&rook_from).iter().any(|sq| self.piece_at(*sq).is_some()) {
            return reject("squares between king and rook are occupied");
        }

        let opponent = king.color.opposite();
        let king_path = std::iter::once(mv.from)
            .chain(mv.from.between(&mv.to))
            .chain(std::iter::once(mv.to));
        for square in king_path {
            if self.is_square_attacked_by(square, opponent) {
                return reject(&format!("{} is attacked", square));
            }
        }

        Ok(())
    }

    /// Whether any `by` piece could move onto `square`, ignoring turn order
    /// and whether the move would expose its own king. Pawns attack their
    /// diagonals whether or not the square is occupied.
    pub fn is_square_attacked_by(&self, square: Square, by: Color) -> bool {
        Square::all().any(|origin| match self.piece_at(origin) {
            Some(piece) if piece.color == by => {
                if piece.piece_type == PieceType::Pawn {
                    let (df, dr) = origin.delta_to(&square);
                    df.abs() == 1 && dr == by.forward()
                } else {
                    self.check_move(&Move::new_unchecked(origin, square, None), Validation::ATTACK)
                        .is_ok()
                }
            }
            _ => false,
        })
    }

    /// Side-effect free check test: whether `color`'s king is attacked
    pub fn king_attacked(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king) => self.is_square_attacked_by(king, color.opposite()),
            None => {
                error!(color = %color, "Could not find king on the board");
                false
            }
        }
    }
}

/// Rook source and destination for a castling king move, if `mv` has the
/// castling shape for `color` (king from its e-file home square two files
/// sideways along the home rank).
pub fn castling_rook_squares(mv: &Move, color: Color) -> Option<(Square, Square)> {
    let home = color.home_rank();
    if mv.from != Square::new_unchecked(4, home) || mv.to.rank != home {
        return None;
    }
    match mv.to.file {
        6 => Some((Square::new_unchecked(7, home), Square::new_unchecked(5, home))),
        2 => Some((Square::new_unchecked(0, home), Square::new_unchecked(3, home))),
        _ => None,
    }
}
