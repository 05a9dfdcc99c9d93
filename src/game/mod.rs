pub mod collaborators;
pub mod session;

pub use collaborators::{BoardPointer, InputEvent, NullSound, SoundEvent, SoundSink};
pub use session::{GameSession, OpponentMode, DEFAULT_AUTO_RESET};
