//! Narrow interfaces to the presentation layer (audio, pointer, input).

use crate::chess::{MoveOutcome, Square};
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    Start,
    Move,
    Illegal,
    Castle,
    Capture,
    Check,
    Checkmate,
}

impl fmt::Display for SoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SoundEvent::Start => "start",
            SoundEvent::Move => "move",
            SoundEvent::Illegal => "illegal",
            SoundEvent::Castle => "castle",
            SoundEvent::Capture => "capture",
            SoundEvent::Check => "check",
            SoundEvent::Checkmate => "checkmate",
        };
        write!(f, "{}", name)
    }
}

impl MoveOutcome {
    /// The sound that announces this move
    pub fn sound_event(&self) -> SoundEvent {
        if self.gives_check {
            SoundEvent::Check
        } else if self.castled {
            SoundEvent::Castle
        } else if self.captured.is_some() {
            SoundEvent::Capture
        } else {
            SoundEvent::Move
        }
    }
}

pub trait SoundSink: Send {
    fn play(&mut self, event: SoundEvent);
}

/// Discards every sound
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSound;

impl SoundSink for NullSound {
    fn play(&mut self, event: SoundEvent) {
        trace!(%event, "Sound suppressed");
    }
}

/// Resolves what the player is pointing at
pub trait BoardPointer {
    fn pointed_square(&self) -> Option<Square>;
}

impl BoardPointer for Option<Square> {
    fn pointed_square(&self) -> Option<Square> {
        *self
    }
}

impl BoardPointer for Square {
    fn pointed_square(&self) -> Option<Square> {
        Some(*self)
    }
}

/// Edge-triggered input: each press is delivered once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Click,
    StartGame,
    Reset,
}
