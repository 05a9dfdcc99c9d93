pub mod app;
pub mod commands;
pub mod display;

pub use app::{apply_play_flags, parse_prompt, App, Config, PlayOptions, PromptCommand};
pub use commands::{Cli, Commands};
pub use display::{display_board, render_board, render_status, supports_unicode, TerminalSound};
