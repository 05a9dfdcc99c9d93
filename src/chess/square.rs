use super::error::ChessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub file: u8, // 0-7 corresponding to a-h
    pub rank: u8, // 0-7 corresponding to 1-8
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Result<Self, ChessError> {
        if file > 7 {
            return Err(ChessError::InvalidSquare(format!(
                "File must be 0-7, got {}",
                file
            )));
        }
        if rank > 7 {
            return Err(ChessError::InvalidSquare(format!(
                "Rank must be 0-7, got {}",
                rank
            )));
        }

        Ok(Self { file, rank })
    }

    /// Create a square without validation (for internal use when bounds are guaranteed)
    pub const fn new_unchecked(file: u8, rank: u8) -> Self {
        Self { file, rank }
    }

    /// Create a square from file and rank characters
    pub fn from_chars(file: char, rank: char) -> Result<Self, ChessError> {
        if !('a'..='h').contains(&file) {
            return Err(ChessError::InvalidSquare(format!(
                "Invalid file '{}'. Must be a-h.",
                file
            )));
        }

        if !('1'..='8').contains(&rank) {
            return Err(ChessError::InvalidSquare(format!(
                "Invalid rank '{}'. Must be 1-8.",
                rank
            )));
        }

        Ok(Square {
            file: file as u8 - b'a',
            rank: rank as u8 - b'1',
        })
    }

    pub fn file_char(&self) -> char {
        (self.file + b'a') as char
    }

    pub fn rank_char(&self) -> char {
        (self.rank + b'1') as char
    }

    /// Square shifted by a (file, rank) delta, or None when it leaves the board
    pub fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Square> {
        let file = self.file as i8 + file_delta;
        let rank = self.rank as i8 + rank_delta;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::new_unchecked(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Signed (file, rank) displacement from `self` to `other`
    pub fn delta_to(&self, other: &Square) -> (i8, i8) {
        (
            other.file as i8 - self.file as i8,
            other.rank as i8 - self.rank as i8,
        )
    }

    /// Chebyshev (king-move) distance
    pub fn chebyshev_distance(&self, other: &Square) -> u8 {
        self.file.abs_diff(other.file).max(self.rank.abs_diff(other.rank))
    }

    /// Squares strictly between two squares on a shared rank, file or diagonal.
    /// Empty when the squares are adjacent or not aligned.
    pub fn between(&self, other: &Square) -> Vec<Square> {
        let (df, dr) = self.delta_to(other);
        let aligned = df == 0 || dr == 0 || df.abs() == dr.abs();
        if !aligned || (df == 0 && dr == 0) {
            return Vec::new();
        }

        let step = (df.signum(), dr.signum());
        let mut squares = Vec::new();
        let mut current = *self;
        while let Some(next) = current.offset(step.0, step.1) {
            if next == *other {
                break;
            }
            squares.push(next);
            current = next;
        }
        squares
    }

    /// All 64 squares, rank 1 first
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8).flat_map(|rank| (0..8).map(move |file| Square { file, rank }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => Self::from_chars(file, rank),
            _ => Err(ChessError::InvalidSquare(format!(
                "Square must be exactly 2 characters (e.g., 'e4'), got '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_notation() {
        let sq: Square = "e4".parse().unwrap();
        assert_eq!(sq, Square::new_unchecked(4, 3));
        assert_eq!(sq.to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("e".parse::<Square>().is_err());
        assert!("E4".parse::<Square>().is_err());
    }

    #[test]
    fn test_between_on_lines_and_diagonals() {
        let a1: Square = "a1".parse().unwrap();
        let a4: Square = "a4".parse().unwrap();
        let d4: Square = "d4".parse().unwrap();
        let b3: Square = "b3".parse().unwrap();

        let names: Vec<String> = a1.between(&a4).iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["a2", "a3"]);

        let names: Vec<String> = a1.between(&d4).iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["b2", "c3"]);

        assert!(a1.between(&b3).is_empty());
    }

    #[test]
    fn test_offset_stays_on_board() {
        let h8: Square = "h8".parse().unwrap();
        assert_eq!(h8.offset(1, 0), None);
        assert_eq!(h8.offset(-1, -2), Some("g6".parse().unwrap()));
    }
}
