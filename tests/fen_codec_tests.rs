use chess3d::chess::{
    apply_move_to_position, decode_position, decrement_turn_field, encode_position, Board, Move,
    START_POSITION,
};

const POSITIONS: &[&str] = &[
    START_POSITION,
    "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
    "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
    "k7/4P3/8/8/8/8/8/4K3 w - - 0 1",
    "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2",
];

#[test]
fn test_board_round_trips_position_strings() {
    for position in POSITIONS {
        let board = Board::from_fen(position).unwrap();
        assert_eq!(board.to_fen(), *position);
        assert_eq!(board.position(), *position);
        assert_eq!(encode_position(&decode_position(position).unwrap()), *position);
    }
}

#[test]
fn test_position_string_tracks_board_through_a_game() {
    let mut board = Board::new();
    let game = [
        "e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1", "f8c5", "d2d3", "e8g8", "c1g5",
        "d7d6",
    ];

    for notation in game {
        board.apply_notation(notation).unwrap();
        assert_eq!(board.to_fen(), board.position(), "diverged after {}", notation);
    }

    assert_eq!(
        board.position(),
        "r1bq1rk1/ppp2ppp/2np1n2/2b1p1B1/2B1P3/3P1N2/PPP2PPP/RN1Q1RK1 w - - 0 7"
    );
}

#[test]
fn test_appending_moves_without_a_board() {
    let mut position = START_POSITION.to_string();
    for notation in ["e2e4", "c7c5", "g1f3"] {
        let mv: Move = notation.parse().unwrap();
        position = apply_move_to_position(&position, &mv);
    }
    assert_eq!(
        position,
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
    );
}

#[test]
fn test_decrement_undoes_turn_bookkeeping_of_quiet_move() {
    let before = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 3 1";
    let mv: Move = "g8f6".parse().unwrap();
    let after = apply_move_to_position(before, &mv);
    assert!(after.ends_with(" w KQkq - 4 2"));

    let rewound = decrement_turn_field(&after);
    assert!(rewound.ends_with(" b KQkq - 3 1"));
    assert_eq!(
        decode_position(&rewound).unwrap().placement,
        decode_position(&after).unwrap().placement
    );
}

#[test]
fn test_malformed_positions_rejected() {
    for bad in [
        "",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
        "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - zero 1",
    ] {
        assert!(decode_position(bad).is_err(), "{:?} should be rejected", bad);
        assert!(Board::from_fen(bad).is_err());
    }
}
