use super::collaborators::{BoardPointer, InputEvent, SoundEvent, SoundSink};
use crate::chess::{Board, ChessError, Color, GameEnd, Move, MoveOutcome, Square};
use crate::engine::{PendingMove, SharedEngine};
use crate::network::RelayClient;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_AUTO_RESET: Duration = Duration::from_secs(3);

/// Who answers the moves of the side the local player does not control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentMode {
    Engine,
    Relay,
    /// Both sides are played locally
    HotSeat,
}

/// One game: the board, the opponent (engine or relay peer) and the
/// collaborators the presentation layer provides.
pub struct GameSession {
    board: Board,
    mode: OpponentMode,
    local_color: Color,
    engine: Option<SharedEngine>,
    relay: Option<RelayClient>,
    sound: Box<dyn SoundSink>,
    running: bool,
    selected: Option<Square>,
    pending: Option<PendingMove>,
    // Position the engine last found no move in; not asked again
    engine_gave_up_on: Option<String>,
    game_over: Option<(GameEnd, Instant)>,
    auto_reset_after: Duration,
}

impl GameSession {
    /// Hot-seat session; attach an engine or relay to get an opponent
    pub fn new(sound: Box<dyn SoundSink>) -> Self {
        Self {
            board: Board::new(),
            mode: OpponentMode::HotSeat,
            local_color: Color::White,
            engine: None,
            relay: None,
            sound,
            running: false,
            selected: None,
            pending: None,
            engine_gave_up_on: None,
            game_over: None,
            auto_reset_after: DEFAULT_AUTO_RESET,
        }
    }

    /// Play white against the engine
    pub fn with_engine(mut self, engine: SharedEngine) -> Self {
        self.engine = Some(engine);
        if self.mode == OpponentMode::HotSeat {
            self.mode = OpponentMode::Engine;
            self.local_color = Color::White;
        }
        self
    }

    /// Play the relay-assigned color against a remote peer
    pub fn with_relay(mut self, relay: RelayClient) -> Self {
        self.local_color = relay.color();
        self.relay = Some(relay);
        self.mode = OpponentMode::Relay;
        self
    }

    /// Keep both sides local even when an engine is attached
    pub fn hot_seat(mut self) -> Self {
        self.mode = OpponentMode::HotSeat;
        self
    }

    pub fn with_auto_reset(mut self, delay: Duration) -> Self {
        self.auto_reset_after = delay;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> OpponentMode {
        self.mode
    }

    pub fn local_color(&self) -> Color {
        self.local_color
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn game_over(&self) -> Option<GameEnd> {
        self.game_over.map(|(end, _)| end)
    }

    /// Whether the opponent's move is currently being computed
    pub fn opponent_thinking(&self) -> bool {
        self.pending.is_some()
    }

    fn controls(&self, color: Color) -> bool {
        match self.mode {
            OpponentMode::HotSeat => true,
            OpponentMode::Engine | OpponentMode::Relay => color == self.local_color,
        }
    }

    pub fn start_game(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        info!(mode = ?self.mode, color = %self.local_color, "Game started");
        self.sound.play(SoundEvent::Start);
    }

    fn reset_local(&mut self) {
        self.board.reset();
        self.running = false;
        self.selected = None;
        self.pending = None;
        self.engine_gave_up_on = None;
        self.game_over = None;
        debug!("Board reset");
    }

    /// Reset the game and ask the relay peer to do the same
    pub async fn reset(&mut self) {
        self.reset_local();
        if let Some(relay) = self.relay.as_mut() {
            // Moves the peer made in the abandoned game
            relay.clear_moves();
            if let Err(e) = relay.send_reset().await {
                warn!("Failed to send reset to opponent: {}", e);
                self.connection_lost();
            }
        }
    }

    pub async fn handle_input(&mut self, event: InputEvent, pointer: &dyn BoardPointer) {
        match event {
            InputEvent::StartGame => self.start_game(),
            InputEvent::Reset => {
                if self.running {
                    self.reset().await;
                    self.sound.play(SoundEvent::Checkmate);
                }
            }
            InputEvent::Click => {
                if self.running {
                    if let Some(square) = pointer.pointed_square() {
                        self.click(square).await;
                    }
                }
            }
        }
    }

    async fn click(&mut self, square: Square) {
        let side = self.board.side_to_move();
        let own_piece = self
            .board
            .piece_at(square)
            .is_some_and(|piece| piece.color == side && self.controls(side));

        if self.selected == Some(square) {
            self.selected = None;
        } else if own_piece {
            self.selected = Some(square);
        } else if let Some(from) = self.selected.take() {
            let mv = Move::new_unchecked(from, square, None);
            if let Err(e) = self.play_local(mv).await {
                debug!("Click move rejected: {}", e);
            }
        }
    }

    /// Play a move for the local player given in from-to notation
    pub async fn submit_move(&mut self, notation: &str) -> Result<MoveOutcome, ChessError> {
        let mv: Move = match notation.parse() {
            Ok(mv) => mv,
            Err(e) => {
                self.sound.play(SoundEvent::Illegal);
                return Err(e);
            }
        };
        self.play_local(mv).await
    }

    #[instrument(level = "debug", skip(self, mv), fields(mv = %mv))]
    async fn play_local(&mut self, mv: Move) -> Result<MoveOutcome, ChessError> {
        if !self.running {
            return Err(ChessError::IllegalMove("Game is not running".to_string()));
        }
        if self.game_over.is_some() {
            return Err(ChessError::IllegalMove("The game is over".to_string()));
        }
        if !self.controls(self.board.side_to_move()) {
            self.sound.play(SoundEvent::Illegal);
            return Err(ChessError::IllegalMove(format!(
                "It is the opponent's turn ({})",
                self.board.side_to_move()
            )));
        }

        let outcome = match self.board.apply_move(&mv) {
            Ok(outcome) => outcome,
            Err(e) => {
                info!("Illegal move {}: {}", mv, e);
                self.sound.play(SoundEvent::Illegal);
                return Err(e);
            }
        };
        self.sound.play(outcome.sound_event());

        if let Some(relay) = self.relay.as_mut() {
            if let Err(e) = relay.send_move(&mv.to_string()).await {
                warn!("Failed to send move to opponent: {}", e);
                self.connection_lost();
            }
        }

        self.after_move();
        Ok(outcome)
    }

    /// Apply a move produced by the engine or the relay peer
    fn play_opponent(&mut self, notation: &str) {
        match self.board.apply_notation(notation) {
            Ok(outcome) => {
                info!("Opponent played {}", notation);
                self.sound.play(outcome.sound_event());
                self.after_move();
            }
            Err(e) => {
                warn!("Opponent move {} rejected: {}", notation, e);
                self.sound.play(SoundEvent::Illegal);
            }
        }
    }

    fn after_move(&mut self) {
        self.selected = None;
        if let Some(end) = self.board.outcome() {
            match end {
                GameEnd::Checkmate { winner } => info!("Checkmate! {} wins!", winner),
                GameEnd::Stalemate => info!("Stalemate"),
            }
            self.sound.play(SoundEvent::Checkmate);
            self.game_over = Some((end, Instant::now()));
        }
    }

    fn connection_lost(&mut self) {
        if self.relay.take().is_none() {
            return;
        }
        self.mode = if self.engine.is_some() {
            OpponentMode::Engine
        } else {
            OpponentMode::HotSeat
        };
        warn!(mode = ?self.mode, "Lost connection to opponent, continuing locally");
    }

    /// Advance the game by one frame: relay events, opponent moves and the
    /// delayed reset after a finished game. Never blocks on the opponent.
    pub async fn tick(&mut self) {
        let relay_state = self
            .relay
            .as_ref()
            .map(|relay| (relay.take_reset(), relay.is_connected()));
        if let Some((reset_requested, connected)) = relay_state {
            if reset_requested {
                info!("Opponent reset the game");
                self.reset_local();
            } else if !connected {
                // Moves that arrived before the disconnect are still played
                let leftover = self.relay.as_ref().and_then(|relay| relay.try_take_move());
                match leftover {
                    Some(notation) => {
                        let opponent_turn = !self.controls(self.board.side_to_move());
                        if self.running && self.game_over.is_none() && opponent_turn {
                            self.play_opponent(&notation);
                        }
                        return;
                    }
                    None => self.connection_lost(),
                }
            }
        }

        if !self.running {
            return;
        }

        if let Some((_, finished_at)) = self.game_over {
            if self.pending.is_none() && finished_at.elapsed() >= self.auto_reset_after {
                self.reset_local();
            }
            return;
        }

        if self.controls(self.board.side_to_move()) {
            return;
        }

        match self.mode {
            OpponentMode::Engine => self.drive_engine(),
            OpponentMode::Relay => {
                let next = self.relay.as_ref().and_then(|relay| relay.try_take_move());
                if let Some(notation) = next {
                    self.play_opponent(&notation);
                }
            }
            OpponentMode::HotSeat => {}
        }
    }

    fn drive_engine(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            let Some(answer) = pending.poll() else {
                return;
            };
            self.pending = None;
            match answer {
                Some(notation) => self.play_opponent(&notation),
                None => {
                    info!("Engine has no move");
                    self.engine_gave_up_on = Some(self.board.position().to_string());
                }
            }
            return;
        }

        if self.engine_gave_up_on.as_deref() == Some(self.board.position()) {
            return;
        }
        if let Some(engine) = &self.engine {
            debug!("Requesting engine move");
            self.pending = Some(PendingMove::spawn(
                engine.clone(),
                self.board.position().to_string(),
            ));
        }
    }

    /// Close the relay link and stop the engine
    pub async fn shutdown(&mut self) {
        if let Some(mut relay) = self.relay.take() {
            relay.close().await;
        }
        if let Some(engine) = self.engine.take() {
            engine.lock().await.shutdown().await;
        }
    }
}
