use crate::chess::{Board, Color, Piece, PieceType, Square};
use crate::game::{SoundEvent, SoundSink};

fn unicode_symbol(piece: &Piece) -> char {
    match (piece.color, piece.piece_type) {
        (Color::White, PieceType::King) => '♔',
        (Color::White, PieceType::Queen) => '♕',
        (Color::White, PieceType::Rook) => '♖',
        (Color::White, PieceType::Bishop) => '♗',
        (Color::White, PieceType::Knight) => '♘',
        (Color::White, PieceType::Pawn) => '♙',
        (Color::Black, PieceType::King) => '♚',
        (Color::Black, PieceType::Queen) => '♛',
        (Color::Black, PieceType::Rook) => '♜',
        (Color::Black, PieceType::Bishop) => '♝',
        (Color::Black, PieceType::Knight) => '♞',
        (Color::Black, PieceType::Pawn) => '♟',
    }
}

/// Render the board from `perspective`'s side. The selected square, if any,
/// is bracketed.
pub fn render_board(board: &Board, perspective: Color, unicode: bool, selected: Option<Square>) -> String {
    let files: Vec<u8> = match perspective {
        Color::White => (0..8).collect(),
        Color::Black => (0..8).rev().collect(),
    };
    let ranks: Vec<u8> = match perspective {
        Color::White => (0..8).rev().collect(),
        Color::Black => (0..8).collect(),
    };

    let file_labels: String = files
        .iter()
        .map(|f| format!(" {} ", (b'a' + f) as char))
        .collect();

    let mut out = format!("   {}\n", file_labels);
    for &rank in &ranks {
        out.push_str(&format!(" {} ", rank + 1));
        for &file in &files {
            let square = Square::new_unchecked(file, rank);
            let symbol = match board.piece_at(square) {
                Some(piece) if unicode => unicode_symbol(&piece),
                Some(piece) => piece.fen_char(),
                None => '.',
            };
            if selected == Some(square) {
                out.push_str(&format!("[{}]", symbol));
            } else {
                out.push_str(&format!(" {} ", symbol));
            }
        }
        out.push_str(&format!(" {}\n", rank + 1));
    }
    out.push_str(&format!("   {}\n", file_labels));
    out
}

pub fn render_status(board: &Board) -> String {
    let side = board.side_to_move();
    let mut status = format!(
        "To move: {}   Move #: {}",
        side,
        board.fullmove_number()
    );
    if board.in_check(side) {
        status.push_str("   CHECK");
    }
    if board.halfmove_clock() > 0 {
        status.push_str(&format!("   Halfmove clock: {}", board.halfmove_clock()));
    }
    status
}

pub fn display_board(board: &Board, perspective: Color, unicode: bool, selected: Option<Square>) {
    println!();
    print!("{}", render_board(board, perspective, unicode, selected));
    println!("{}", render_status(board));
}

pub fn supports_unicode() -> bool {
    // Simple heuristic: check if TERM contains "xterm" or if we're in a modern terminal
    std::env::var("TERM")
        .map(|term| {
            term.contains("xterm")
                || term.contains("screen")
                || term.contains("tmux")
                || term == "alacritty"
                || term == "kitty"
        })
        .unwrap_or(false)
        || std::env::var("TERM_PROGRAM").is_ok() // macOS Terminal, iTerm2, etc.
}

/// Sound sink for the terminal: announces events as text, ringing the bell
/// for checks and the end of the game
#[derive(Debug, Default)]
pub struct TerminalSound {
    pub bell: bool,
}

impl SoundSink for TerminalSound {
    fn play(&mut self, event: SoundEvent) {
        let bell = if self.bell && matches!(event, SoundEvent::Check | SoundEvent::Checkmate) {
            "\x07"
        } else {
            ""
        };
        match event {
            SoundEvent::Move => {}
            SoundEvent::Illegal => println!("{}Illegal move.", bell),
            other => println!("{}* {} *", bell, other),
        }
    }
}
