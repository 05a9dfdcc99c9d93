mod common;

use chess3d::chess::{Board, Color, GameEnd, PieceType, Square};
use chess3d::game::{GameSession, InputEvent, OpponentMode, SoundEvent};
use chess3d::network::{RelayClient, RelayClientConfig};
use common::relay_utils::{TestRelay, IO_TIMEOUT};
use common::sound::RecordingSound;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const NOWHERE: Option<Square> = None;

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn started_hot_seat(sound: &RecordingSound) -> GameSession {
    let mut session = GameSession::new(sound.boxed());
    session.start_game();
    session
}

/// Tick the session until `done` holds or the IO timeout passes
async fn tick_until(session: &mut GameSession, done: impl Fn(&GameSession) -> bool) -> bool {
    let deadline = Instant::now() + IO_TIMEOUT;
    while Instant::now() < deadline {
        session.tick().await;
        if done(session) {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_start_game_plays_start_sound_once() {
    let sound = RecordingSound::new();
    let mut session = GameSession::new(sound.boxed());
    assert!(!session.is_running());

    session.handle_input(InputEvent::StartGame, &NOWHERE).await;
    session.handle_input(InputEvent::StartGame, &NOWHERE).await;

    assert!(session.is_running());
    assert_eq!(sound.events(), vec![SoundEvent::Start]);
}

#[tokio::test]
async fn test_click_select_deselect_and_move() {
    let sound = RecordingSound::new();
    let mut session = started_hot_seat(&sound);

    session.handle_input(InputEvent::Click, &sq("e2")).await;
    assert_eq!(session.selected(), Some(sq("e2")));

    session.handle_input(InputEvent::Click, &sq("e2")).await;
    assert_eq!(session.selected(), None);

    session.handle_input(InputEvent::Click, &sq("g1")).await;
    session.handle_input(InputEvent::Click, &sq("e2")).await;
    assert_eq!(session.selected(), Some(sq("e2")));

    session.handle_input(InputEvent::Click, &sq("e4")).await;
    assert_eq!(session.selected(), None);
    assert_eq!(
        session.board().piece_at(sq("e4")).map(|p| p.piece_type),
        Some(PieceType::Pawn)
    );
    assert_eq!(session.board().side_to_move(), Color::Black);
    assert_eq!(sound.last(), Some(SoundEvent::Move));
}

#[tokio::test]
async fn test_click_outside_board_and_opponent_pieces_ignored() {
    let sound = RecordingSound::new();
    let mut session = started_hot_seat(&sound);

    session.handle_input(InputEvent::Click, &NOWHERE).await;
    session.handle_input(InputEvent::Click, &sq("e7")).await;
    assert_eq!(session.selected(), None);
    assert_eq!(*session.board(), Board::new());
}

#[tokio::test]
async fn test_clicks_ignored_before_start() {
    let sound = RecordingSound::new();
    let mut session = GameSession::new(sound.boxed());

    session.handle_input(InputEvent::Click, &sq("e2")).await;
    assert_eq!(session.selected(), None);
    assert!(session.submit_move("e2e4").await.is_err());
    assert_eq!(*session.board(), Board::new());
    assert!(sound.events().is_empty());
}

#[tokio::test]
async fn test_illegal_moves_play_illegal_sound() {
    let sound = RecordingSound::new();
    let mut session = started_hot_seat(&sound);

    assert!(session.submit_move("e2e5").await.is_err());
    assert_eq!(sound.last(), Some(SoundEvent::Illegal));

    assert!(session.submit_move("nonsense").await.is_err());
    assert_eq!(sound.last(), Some(SoundEvent::Illegal));

    // A rejected click move clears the selection
    session.handle_input(InputEvent::Click, &sq("b1")).await;
    session.handle_input(InputEvent::Click, &sq("b3")).await;
    assert_eq!(session.selected(), None);
    assert_eq!(sound.last(), Some(SoundEvent::Illegal));
    assert_eq!(*session.board(), Board::new());
}

#[tokio::test]
async fn test_capture_and_castle_sounds() {
    let sound = RecordingSound::new();
    let mut session = started_hot_seat(&sound);

    for notation in ["e2e4", "d7d5"] {
        session.submit_move(notation).await.unwrap();
    }
    session.submit_move("e4d5").await.unwrap();
    assert_eq!(sound.last(), Some(SoundEvent::Capture));

    for notation in ["g8f6", "g1f3", "a7a6", "f1e2", "a6a5"] {
        session.submit_move(notation).await.unwrap();
    }
    session.submit_move("e1g1").await.unwrap();
    assert_eq!(sound.last(), Some(SoundEvent::Castle));
}

#[tokio::test]
async fn test_checkmate_ends_game_then_auto_resets() {
    let sound = RecordingSound::new();
    let mut session = started_hot_seat(&sound).with_auto_reset(Duration::ZERO);

    for notation in ["f2f3", "e7e5", "g2g4"] {
        session.submit_move(notation).await.unwrap();
    }
    let outcome = session.submit_move("d8h4").await.unwrap();
    assert!(outcome.gives_check);

    assert_eq!(
        session.game_over(),
        Some(GameEnd::Checkmate {
            winner: Color::Black
        })
    );
    let events = sound.events();
    assert_eq!(
        &events[events.len() - 2..],
        &[SoundEvent::Check, SoundEvent::Checkmate]
    );

    session.tick().await;
    assert_eq!(session.game_over(), None);
    assert!(!session.is_running());
    assert_eq!(*session.board(), Board::new());
}

#[tokio::test]
async fn test_game_over_waits_for_reset_delay() {
    let sound = RecordingSound::new();
    let mut session = started_hot_seat(&sound).with_auto_reset(Duration::from_secs(60));

    for notation in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        session.submit_move(notation).await.unwrap();
    }
    session.tick().await;
    assert!(session.game_over().is_some());
    assert!(session.is_running());

    // Moves are refused once the game is decided
    assert!(session.submit_move("e1f2").await.is_err());
}

#[tokio::test]
async fn test_reset_input_restarts_board() {
    let sound = RecordingSound::new();
    let mut session = started_hot_seat(&sound);
    session.submit_move("e2e4").await.unwrap();

    session.handle_input(InputEvent::Reset, &NOWHERE).await;
    assert!(!session.is_running());
    assert_eq!(*session.board(), Board::new());
    assert_eq!(sound.last(), Some(SoundEvent::Checkmate));
}

#[cfg(unix)]
#[tokio::test]
async fn test_engine_answers_local_move() {
    use chess3d::engine::{shared, EngineClient};
    use common::fake_engine::FakeEngine;

    let fake = FakeEngine::new();
    let engine = shared(EngineClient::start(fake.config("bestmove e7e5 ponder g1f3")).await);
    let sound = RecordingSound::new();
    let mut session = GameSession::new(sound.boxed()).with_engine(engine);
    assert_eq!(session.mode(), OpponentMode::Engine);
    assert_eq!(session.local_color(), Color::White);

    session.start_game();
    session.submit_move("e2e4").await.unwrap();
    // Black belongs to the engine
    assert!(session.submit_move("d7d5").await.is_err());

    assert!(tick_until(&mut session, |s| s.board().side_to_move() == Color::White).await);
    assert!(!session.opponent_thinking());
    assert_eq!(
        session.board().position(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
    );

    session.shutdown().await;
}

async fn relay_pair(relay: &TestRelay) -> (GameSession, GameSession, RecordingSound, RecordingSound) {
    let addr = relay.addr_string();
    let (a, b) = tokio::join!(
        RelayClient::connect(&addr, RelayClientConfig::default()),
        RelayClient::connect(&addr, RelayClientConfig::default())
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    let (white, black) = if a.color() == Color::White { (a, b) } else { (b, a) };

    let white_sound = RecordingSound::new();
    let black_sound = RecordingSound::new();
    let mut white = GameSession::new(white_sound.boxed()).with_relay(white);
    let mut black = GameSession::new(black_sound.boxed()).with_relay(black);
    white.start_game();
    black.start_game();
    (white, black, white_sound, black_sound)
}

#[tokio::test]
async fn test_relay_sessions_exchange_moves() {
    let relay = TestRelay::start().await;
    let (mut white, mut black, _, black_sound) = relay_pair(&relay).await;

    assert_eq!(white.mode(), OpponentMode::Relay);
    assert_eq!(white.local_color(), Color::White);
    assert_eq!(black.local_color(), Color::Black);
    assert!(black.submit_move("e7e5").await.is_err());

    white.submit_move("e2e4").await.unwrap();
    assert!(tick_until(&mut black, |s| s.board().side_to_move() == Color::Black).await);
    assert_eq!(black_sound.last(), Some(SoundEvent::Move));

    black.submit_move("c7c5").await.unwrap();
    assert!(tick_until(&mut white, |s| s.board().side_to_move() == Color::White).await);
    assert_eq!(white.board().position(), black.board().position());

    white.shutdown().await;
    black.shutdown().await;
    relay.stop().await;
}

#[tokio::test]
async fn test_relay_reset_reaches_opponent() {
    let relay = TestRelay::start().await;
    let (mut white, mut black, _, _) = relay_pair(&relay).await;

    white.submit_move("d2d4").await.unwrap();
    assert!(tick_until(&mut black, |s| s.board().side_to_move() == Color::Black).await);

    white.reset().await;
    assert_eq!(*white.board(), Board::new());
    assert!(tick_until(&mut black, |s| !s.is_running()).await);
    assert_eq!(*black.board(), Board::new());

    white.shutdown().await;
    black.shutdown().await;
    relay.stop().await;
}

#[tokio::test]
async fn test_reset_discards_move_in_flight() {
    let relay = TestRelay::start().await;
    let (mut white, mut black, _, _) = relay_pair(&relay).await;

    white.submit_move("e2e4").await.unwrap();
    assert!(tick_until(&mut black, |s| s.board().side_to_move() == Color::Black).await);
    black.submit_move("e7e5").await.unwrap();

    // e7e5 reaches white's queue, but white resets before playing it
    sleep(Duration::from_millis(300)).await;
    white.reset().await;
    assert!(tick_until(&mut black, |s| !s.is_running()).await);

    white.start_game();
    black.start_game();
    white.submit_move("d2d4").await.unwrap();
    assert!(tick_until(&mut black, |s| s.board().side_to_move() == Color::Black).await);

    for _ in 0..10 {
        white.tick().await;
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(white.board().side_to_move(), Color::Black);
    assert_eq!(
        white.board().position(),
        "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1"
    );
    assert_eq!(white.board().position(), black.board().position());

    white.shutdown().await;
    black.shutdown().await;
    relay.stop().await;
}

#[tokio::test]
async fn test_lost_relay_falls_back_to_hot_seat() {
    let relay = TestRelay::start().await;
    let (mut white, mut black, _, _) = relay_pair(&relay).await;

    white.submit_move("e2e4").await.unwrap();
    white.shutdown().await;

    // The move sent before the disconnect is still played
    assert!(tick_until(&mut black, |s| s.mode() == OpponentMode::HotSeat).await);
    assert_eq!(black.board().side_to_move(), Color::Black);

    // Both sides are local now
    black.submit_move("e7e5").await.unwrap();
    black.submit_move("g1f3").await.unwrap();

    relay.stop().await;
}
