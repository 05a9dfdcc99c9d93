use crate::chess::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload of the reset control frame
pub const RESET_PAYLOAD: &str = "reset";

/// A relay frame payload as seen by a game client.
///
/// The server never decodes payloads; it only writes the color assignment
/// and forwards frames verbatim between the two peers of a session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// First frame of a session: the color this peer plays
    Color(Color),
    /// Reset the game on both sides
    Reset,
    /// A move in from-to notation, e.g. "e2e4" or "e7e8q"
    Move(String),
}

impl RelayMessage {
    /// Decode a forwarded payload. Anything other than the reset keyword is a move.
    pub fn from_forwarded(payload: &str) -> Self {
        if payload == RESET_PAYLOAD {
            RelayMessage::Reset
        } else {
            RelayMessage::Move(payload.to_string())
        }
    }

    /// Decode the color-assignment frame
    pub fn from_assignment(payload: &str) -> Option<Self> {
        match payload {
            "white" => Some(RelayMessage::Color(Color::White)),
            "black" => Some(RelayMessage::Color(Color::Black)),
            _ => None,
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            RelayMessage::Color(color) => color.as_str(),
            RelayMessage::Reset => RESET_PAYLOAD,
            RelayMessage::Move(notation) => notation,
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            RelayMessage::Color(_) => "Color",
            RelayMessage::Reset => "Reset",
            RelayMessage::Move(_) => "Move",
        }
    }
}

impl fmt::Display for RelayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.message_type(), self.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_payloads() {
        assert_eq!(RelayMessage::from_forwarded("reset"), RelayMessage::Reset);
        assert_eq!(
            RelayMessage::from_forwarded("e2e4"),
            RelayMessage::Move("e2e4".to_string())
        );
    }

    #[test]
    fn test_assignment_payloads() {
        assert_eq!(
            RelayMessage::from_assignment("black"),
            Some(RelayMessage::Color(Color::Black))
        );
        assert_eq!(RelayMessage::from_assignment("White"), None);
        assert_eq!(RelayMessage::Color(Color::White).payload(), "white");
    }
}
