use crate::chess::Square;
use crate::cli::commands::Commands;
use crate::cli::display::{display_board, supports_unicode, TerminalSound};
use crate::engine::{self, EngineClient, EngineConfig};
use crate::game::{GameSession, InputEvent, OpponentMode};
use crate::messages::WireConfig;
use crate::network::{RelayClient, RelayClientConfig, RelayServer};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relay the `play --multiplayer` client connects to
    pub relay_addr: String,
    /// Address the `relay` command listens on
    pub bind_addr: String,
    /// Engine executable
    pub engine_path: String,
    pub search_depth: u8,
    pub skill_level: u8,
    pub use_remote: bool,
    pub remote_url: String,
    pub min_engine_latency_ms: u64,
    pub engine_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// Window width hint for graphical front ends; the terminal ignores it
    pub window_width: u32,
    pub auto_reset_secs: u64,
    pub unicode_board: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_addr: "127.0.0.1:12345".to_string(),
            bind_addr: "0.0.0.0:12345".to_string(),
            engine_path: "stockfish".to_string(),
            search_depth: engine::DEFAULT_SEARCH_DEPTH,
            skill_level: engine::DEFAULT_SKILL_LEVEL,
            use_remote: false,
            remote_url: engine::DEFAULT_REMOTE_URL.to_string(),
            min_engine_latency_ms: 1000,
            engine_timeout_secs: 30,
            poll_interval_ms: 100,
            window_width: 1024,
            auto_reset_secs: 3,
            unicode_board: supports_unicode(),
        }
    }
}

impl Config {
    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        ProjectDirs::from("dev", "chess3d", "chess3d")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// Get the default config file path
    pub fn default_config_file() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default() -> Result<Self> {
        Self::load_or_create(&Self::default_config_file()?)
    }

    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).context("Failed to parse configuration file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, content).context("Failed to write configuration file")?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            program: self.engine_path.clone(),
            args: Vec::new(),
            search_depth: self.search_depth,
            skill_level: self.skill_level,
            use_remote: self.use_remote,
            remote_url: self.remote_url.clone(),
            min_latency: Duration::from_millis(self.min_engine_latency_ms),
            response_timeout: Duration::from_secs(self.engine_timeout_secs),
        }
    }

    pub fn relay_client_config(&self) -> RelayClientConfig {
        RelayClientConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..RelayClientConfig::default()
        }
    }
}

/// Options of the `play` command after merging flags over the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlayOptions {
    pub multiplayer: bool,
    pub hot_seat: bool,
}

/// Command-line flags take precedence over the configuration file
pub fn apply_play_flags(config: &mut Config, command: &Commands) -> Option<PlayOptions> {
    let Commands::Play {
        depth,
        difficulty,
        remote,
        width,
        multiplayer,
        server,
        engine,
        hot_seat,
    } = command
    else {
        return None;
    };

    if let Some(depth) = depth {
        config.search_depth = *depth;
    }
    if let Some(difficulty) = difficulty {
        config.skill_level = *difficulty;
    }
    if *remote {
        config.use_remote = true;
    }
    if let Some(width) = width {
        config.window_width = *width;
    }
    if let Some(server) = server {
        config.relay_addr = server.clone();
    }
    if let Some(engine) = engine {
        config.engine_path = engine.clone();
    }

    Some(PlayOptions {
        multiplayer: *multiplayer,
        hot_seat: *hot_seat,
    })
}

/// A line typed at the terminal prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    Start,
    Reset,
    Quit,
    Board,
    Moves,
    Help,
    /// Point at a square and click
    Square(Square),
    /// A whole move in from-to notation
    Move(String),
    Unknown(String),
}

pub fn parse_prompt(line: &str) -> PromptCommand {
    let input = line.trim().to_lowercase();
    match input.as_str() {
        "start" | "s" | "" => PromptCommand::Start,
        "reset" | "r" => PromptCommand::Reset,
        "quit" | "exit" | "q" => PromptCommand::Quit,
        "board" | "b" => PromptCommand::Board,
        "moves" | "m" => PromptCommand::Moves,
        "help" | "h" | "?" => PromptCommand::Help,
        _ => match input.len() {
            2 => match input.parse::<Square>() {
                Ok(square) => PromptCommand::Square(square),
                Err(_) => PromptCommand::Unknown(input),
            },
            4 | 5 => PromptCommand::Move(input),
            _ => PromptCommand::Unknown(input),
        },
    }
}

const HELP: &str = "\
Commands:
  <square>        select a piece, or move the selected piece there (e.g. e2, then e4)
  <move>          play a move directly (e2e4, e7e8n for promotion)
  start | s       start the game (Enter also works)
  reset | r       reset the board
  board | b       show the board
  moves | m       list legal moves
  quit  | q       leave";

/// Main application state
pub struct App {
    /// Application configuration
    pub config: Config,
}

impl App {
    /// Create a new App instance with the configuration from disk
    pub fn new() -> Result<Self> {
        let config =
            Config::load_or_create_default().context("Failed to initialize configuration")?;
        Ok(Self { config })
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(mut self, command: Commands) -> Result<()> {
        if let Some(options) = apply_play_flags(&mut self.config, &command) {
            return self.handle_play(options).await;
        }
        match command {
            Commands::Relay { bind } => {
                let bind = bind.unwrap_or_else(|| self.config.bind_addr.clone());
                self.handle_relay(&bind).await
            }
            Commands::Config => self.handle_config(),
            Commands::Play { .. } => Ok(()),
        }
    }

    /// Handle the 'config' command
    pub fn handle_config(&self) -> Result<()> {
        let path = Config::default_config_file()?;
        println!("Configuration file: {}", path.display());
        let content =
            toml::to_string_pretty(&self.config).context("Failed to serialize configuration")?;
        println!("{}", content);
        Ok(())
    }

    /// Handle the 'relay' command, serving until Ctrl-C
    pub async fn handle_relay(&self, bind: &str) -> Result<()> {
        let server = RelayServer::bind(bind, WireConfig::default()).await?;
        info!("Relay listening on {}", server.local_addr()?);
        server
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await
    }

    async fn build_session(&self, options: &PlayOptions) -> GameSession {
        let sound = Box::new(TerminalSound { bell: true });
        let mut session = GameSession::new(sound)
            .with_auto_reset(Duration::from_secs(self.config.auto_reset_secs));

        if !options.hot_seat {
            let client = EngineClient::start(self.config.engine_config()).await;
            if !client.has_local_engine() && !self.config.use_remote {
                warn!(
                    "Engine '{}' is not available; the opponent will not move",
                    self.config.engine_path
                );
            }
            session = session.with_engine(engine::shared(client));
        }

        if options.multiplayer {
            println!("Waiting for an opponent at {} ...", self.config.relay_addr);
            match RelayClient::connect(&self.config.relay_addr, self.config.relay_client_config()).await {
                Ok(relay) => {
                    println!("You are playing as {}.", relay.color());
                    session = session.with_relay(relay);
                }
                Err(e) => {
                    warn!("Multiplayer unavailable: {}", e);
                    println!("Could not join the relay, playing locally instead.");
                }
            }
        }

        if options.hot_seat {
            session = session.hot_seat();
        }
        session
    }

    /// Handle the 'play' command: a terminal front end over a game session
    pub async fn handle_play(&self, options: PlayOptions) -> Result<()> {
        let mut session = self.build_session(&options).await;
        let unicode = self.config.unicode_board;
        let perspective = |s: &GameSession| match s.mode() {
            OpponentMode::HotSeat => s.board().side_to_move(),
            _ => s.local_color(),
        };

        println!("{}", HELP);
        println!("Press Enter to start.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        let mut shown_position = String::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    session.tick().await;
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read from stdin")? else {
                        break;
                    };
                    match parse_prompt(&line) {
                        PromptCommand::Quit => break,
                        PromptCommand::Start => {
                            session.handle_input(InputEvent::StartGame, &None::<Square>).await;
                            shown_position.clear();
                        }
                        PromptCommand::Reset => {
                            session.handle_input(InputEvent::Reset, &None::<Square>).await;
                            println!("Board reset. Press Enter to start.");
                            shown_position.clear();
                        }
                        PromptCommand::Board => {
                            display_board(session.board(), perspective(&session), unicode, session.selected());
                        }
                        PromptCommand::Moves => {
                            let side = session.board().side_to_move();
                            let mut board = session.board().clone();
                            let moves: Vec<String> =
                                board.legal_moves(side).iter().map(|m| m.to_string()).collect();
                            println!("{} legal moves: {}", moves.len(), moves.join(" "));
                        }
                        PromptCommand::Help => println!("{}", HELP),
                        PromptCommand::Square(square) => {
                            if !session.is_running() {
                                println!("Press Enter to start.");
                            }
                            session.handle_input(InputEvent::Click, &square).await;
                            if let Some(selected) = session.selected() {
                                println!("Selected {}", selected);
                            }
                        }
                        PromptCommand::Move(notation) => {
                            if let Err(e) = session.submit_move(&notation).await {
                                println!("{}", e);
                            }
                        }
                        PromptCommand::Unknown(input) => {
                            println!("Unknown command '{}'. Type 'help' for commands.", input);
                        }
                    }
                }
            }

            if session.is_running() && session.board().position() != shown_position {
                shown_position = session.board().position().to_string();
                display_board(session.board(), perspective(&session), unicode, session.selected());
                if let Some(end) = session.game_over() {
                    println!("Game over: {:?}", end);
                } else if session.opponent_thinking() {
                    println!("Opponent is thinking...");
                }
            }
        }

        session.shutdown().await;
        Ok(())
    }
}
