use super::error::ChessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Opposite color
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Lowercase name used on the relay wire ("white" / "black")
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    /// Side-to-move field of the position string
    pub fn fen_char(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    /// Rank (0-based) the back-rank pieces start on
    pub fn home_rank(&self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank (0-based) the pawns start on
    pub fn pawn_rank(&self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Rank a pawn of this color promotes on
    pub fn promotion_rank(&self) -> u8 {
        self.opposite().home_rank()
    }

    /// Direction pawns advance in
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

impl FromStr for Color {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            _ => Err(ChessError::InvalidColor(format!(
                "Expected 'white' or 'black', got '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Uppercase piece letter as used in the position string
    pub fn letter(&self) -> char {
        match self {
            PieceType::Pawn => 'P',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }

    /// Piece types a pawn may promote to, keyed by the move suffix character
    pub fn from_promotion_char(c: char) -> Result<PieceType, ChessError> {
        match c.to_ascii_lowercase() {
            'q' => Ok(PieceType::Queen),
            'r' => Ok(PieceType::Rook),
            'b' => Ok(PieceType::Bishop),
            'n' => Ok(PieceType::Knight),
            _ => Err(ChessError::InvalidPieceType(format!(
                "Promotion must be one of q, r, b, n, got '{}'",
                c
            ))),
        }
    }

    /// Lowercase suffix character for promotion moves
    pub fn promotion_char(&self) -> char {
        self.letter().to_ascii_lowercase()
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceType::Pawn => "pawn",
            PieceType::Knight => "knight",
            PieceType::Bishop => "bishop",
            PieceType::Rook => "rook",
            PieceType::Queen => "queen",
            PieceType::King => "king",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PieceType {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "P" | "PAWN" => Ok(PieceType::Pawn),
            "N" | "KNIGHT" => Ok(PieceType::Knight),
            "B" | "BISHOP" => Ok(PieceType::Bishop),
            "R" | "ROOK" => Ok(PieceType::Rook),
            "Q" | "QUEEN" => Ok(PieceType::Queen),
            "K" | "KING" => Ok(PieceType::King),
            _ => Err(ChessError::InvalidPieceType(format!(
                "Expected one of: P, N, B, R, Q, K, got '{}'",
                s
            ))),
        }
    }
}

/// A piece living in the board's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
    pub has_moved: bool,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        Self {
            piece_type,
            color,
            has_moved: false,
        }
    }

    /// Position-string character: uppercase for white, lowercase for black
    pub fn fen_char(&self) -> char {
        piece_char(self.piece_type, self.color)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen_char())
    }
}

pub fn piece_char(piece_type: PieceType, color: Color) -> char {
    match color {
        Color::White => piece_type.letter(),
        Color::Black => piece_type.letter().to_ascii_lowercase(),
    }
}

pub fn piece_from_char(c: char) -> Result<(PieceType, Color), ChessError> {
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let piece_type = match c.to_ascii_uppercase() {
        'P' => PieceType::Pawn,
        'N' => PieceType::Knight,
        'B' => PieceType::Bishop,
        'R' => PieceType::Rook,
        'Q' => PieceType::Queen,
        'K' => PieceType::King,
        _ => {
            return Err(ChessError::InvalidFen(format!(
                "Invalid piece character '{c}'"
            )))
        }
    };
    Ok((piece_type, color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing_accepts_wire_names() {
        assert_eq!("white".parse::<Color>().unwrap(), Color::White);
        assert_eq!("BLACK".parse::<Color>().unwrap(), Color::Black);
        assert!("green".parse::<Color>().is_err());
    }

    #[test]
    fn test_piece_char_case_follows_color() {
        assert_eq!(piece_char(PieceType::Knight, Color::White), 'N');
        assert_eq!(piece_char(PieceType::Knight, Color::Black), 'n');
        assert_eq!(piece_from_char('q').unwrap(), (PieceType::Queen, Color::Black));
        assert!(piece_from_char('x').is_err());
    }

    #[test]
    fn test_promotion_chars() {
        assert_eq!(PieceType::from_promotion_char('n').unwrap(), PieceType::Knight);
        assert_eq!(PieceType::from_promotion_char('Q').unwrap(), PieceType::Queen);
        assert!(PieceType::from_promotion_char('k').is_err());
        assert!(PieceType::from_promotion_char('p').is_err());
    }
}
