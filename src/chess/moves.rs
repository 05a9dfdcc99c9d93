use super::error::ChessError;
use super::piece::PieceType;
use super::square::Square;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A move in from-to notation ("e2e4"), optionally with a promotion suffix ("e7e8n")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl Move {
    /// Create a new move with validation
    pub fn new(from: Square, to: Square, promotion: Option<PieceType>) -> Result<Self, ChessError> {
        if from == to {
            return Err(ChessError::InvalidMove(
                "Source and destination squares cannot be the same".to_string(),
            ));
        }

        if let Some(piece_type) = promotion {
            if matches!(piece_type, PieceType::King | PieceType::Pawn) {
                return Err(ChessError::InvalidMove(
                    "Cannot promote to King or Pawn".to_string(),
                ));
            }
        }

        Ok(Self {
            from,
            to,
            promotion,
        })
    }

    /// Create a move without validation (used by move generation)
    pub const fn new_unchecked(from: Square, to: Square, promotion: Option<PieceType>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// The four-character from-to part, without promotion suffix
    pub fn base_notation(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.promotion_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
            return Err(ChessError::InvalidMove(format!(
                "Invalid move format '{s}'. Expected 'e2e4' or 'e7e8q' for promotion."
            )));
        }

        let from = s[0..2].parse::<Square>()?;
        let to = s[2..4].parse::<Square>()?;
        let promotion = match s[4..].chars().next() {
            Some(c) => Some(PieceType::from_promotion_char(c)?),
            None => None,
        };

        Self::new(from, to, promotion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_and_promotion() {
        let mv: Move = "e2e4".parse().unwrap();
        assert_eq!(mv.from.to_string(), "e2");
        assert_eq!(mv.to.to_string(), "e4");
        assert!(!mv.is_promotion());

        let mv: Move = "a7a8n".parse().unwrap();
        assert_eq!(mv.promotion, Some(PieceType::Knight));
        assert_eq!(mv.to_string(), "a7a8n");
        assert_eq!(mv.base_notation(), "a7a8");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "e2", "e2e", "e2e4e5", "z2e4", "e9e4", "e2e4k", "e2e2", "é2e4"] {
            assert!(bad.parse::<Move>().is_err(), "'{}' should be rejected", bad);
        }
    }
}
