#![cfg(test)]
//! Perft and scenario-seed tests: the canonical cross-check for any
//! move generator, plus a handful of named positions worth pinning
//! down individually (fool's mate, castling-path guards, en passant,
//! under-promotion, threefold repetition).
//!
//! A `lazy_static!` table of FEN positions paired with known perft
//! counts, run through `#[test]`, driving `Position::legal_moves`
//! directly since that is this crate's single ground truth for
//! legality.

use lazy_static::lazy_static;

use crate::{
    engine::{AttemptResult, Engine},
    movegen::MoveKind,
    position::{GameEnd, Position},
    types::{Colour, PieceKind},
};

#[derive(Clone, Copy)]
struct PerftCase {
    fen: &'static str,
    depth: u32,
    nodes: u64,
}

impl PerftCase {
    const fn new(fen: &'static str, depth: u32, nodes: u64) -> Self {
        Self { fen, depth, nodes }
    }
}

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

lazy_static! {
    /// The depth-1..4 perft table from the standard starting
    /// position, cheap enough to run on every `cargo test`.
    static ref PERFT_CASES: Vec<PerftCase> = vec![
        PerftCase::new(START_FEN, 1, 20),
        PerftCase::new(START_FEN, 2, 400),
        PerftCase::new(START_FEN, 3, 8_902),
        PerftCase::new(START_FEN, 4, 197_281),
    ];
}

/// Counts the leaves at `depth` plies below `position`, via
/// `legal_moves` recursion: the same ground truth the search and
/// `game_end` use.
fn perft(position: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let side = position.side_to_move();
    let moves = position.legal_moves(side);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for mv in moves {
        position.apply(mv);
        nodes += perft(position, depth - 1);
        position.undo(mv);
    }
    nodes
}

#[test]
fn perft_matches_known_leaf_counts() {
    for case in PERFT_CASES.iter() {
        let mut position = Position::from_fen(case.fen).expect("valid FEN");
        assert_eq!(
            perft(&mut position, case.depth),
            case.nodes,
            "perft({}) from {}",
            case.depth,
            case.fen
        );
    }
}

#[test]
#[ignore = "4.8M leaves; run explicitly with `cargo test -- --ignored`"]
fn perft_depth_five_from_start() {
    let mut position = Position::from_fen(START_FEN).expect("valid FEN");
    assert_eq!(perft(&mut position, 5), 4_865_609);
}

fn apply_uci(engine: &mut Engine, mv: &str) {
    let bytes = mv.as_bytes();
    let from = mv[0..2].parse().expect("valid square");
    let to = mv[2..4].parse().expect("valid square");
    match engine.attempt_move(from, to) {
        AttemptResult::Valid => {}
        AttemptResult::Promotion => {
            let promo = match bytes.get(4) {
                Some(b'q') => PieceKind::Queen,
                Some(b'r') => PieceKind::Rook,
                Some(b'b') => PieceKind::Bishop,
                Some(b'n') => PieceKind::Knight,
                _ => panic!("{mv} requires a promotion letter"),
            };
            engine.finalize_promotion(promo).expect("the staged promotion is legal");
        }
        AttemptResult::Illegal => panic!("{mv} was expected to be legal"),
    }
}

#[test]
fn fools_mate_is_checkmate_after_the_fourth_move() {
    let mut engine = Engine::new();
    for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        apply_uci(&mut engine, mv);
    }
    assert_eq!(engine.game_end(), GameEnd::Checkmate);
}

#[test]
fn scholars_mate_setup_is_checkmate() {
    let mut engine = Engine::new();
    for mv in ["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6", "h5f7"] {
        apply_uci(&mut engine, mv);
    }
    assert_eq!(engine.game_end(), GameEnd::Checkmate);
}

#[test]
fn castling_blocked_by_a_rook_guarding_the_back_rank() {
    // White king e1, rooks a1/h1; Black rook e8 and king h8, otherwise empty.
    let mut position =
        Position::from_fen("4r2k/8/8/8/8/8/8/R3K2R w KQ - 0 1").expect("valid FEN");
    let legal = position.legal_moves(Colour::White);
    assert!(
        !legal.iter().any(|mv| mv.kind == MoveKind::Castle),
        "the rook on e8 attacks every square the king would pass through or land on"
    );
}

#[test]
fn castling_is_legal_once_the_path_is_unattacked() {
    let mut position = Position::from_fen("7k/8/8/8/8/8/8/R3K2R w KQ - 0 1").expect("valid FEN");
    let legal = position.legal_moves(Colour::White);
    let castles: Vec<_> = legal.iter().filter(|mv| mv.kind == MoveKind::Castle).collect();
    assert_eq!(castles.len(), 2, "both castles are legal with nothing attacking e1/f1/g1/c1/d1");
}

#[test]
fn en_passant_removes_the_skipped_pawn_not_the_destination() {
    // White pawn e5, Black pawn d7, bare kings.
    let start = Position::from_fen("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1").expect("valid FEN");
    let mut engine = Engine::from_position(start);
    apply_uci(&mut engine, "d7d5");

    let mut after_double_push =
        Position::from_fen(&engine.position().to_fen()).expect("to_fen round-trips");
    assert_eq!(after_double_push.side_to_move(), Colour::White);
    let legal_ep: Vec<_> = after_double_push
        .legal_moves(Colour::White)
        .into_iter()
        .filter(|mv| mv.kind == MoveKind::EnPassant)
        .collect();
    assert_eq!(legal_ep.len(), 1, "e5 must have exactly one en-passant capture available");
    assert_eq!(legal_ep[0].to.to_string(), "d6");

    apply_uci(&mut engine, "e5d6");
    assert!(engine.position().piece_at("d5".parse().unwrap()).is_none());
}

#[test]
fn underpromotion_is_generated_alongside_queening() {
    // White pawn e7, Black king d6 (a knight's jump from e8, but on
    // no queen/rook/bishop line from it), Black rook a1, White king
    // h4, White to move.
    let mut position = Position::from_fen("8/4P3/3k4/8/7K/8/8/r7 w - - 0 1").expect("valid FEN");
    let legal = position.legal_moves(Colour::White);
    let promotions: Vec<_> = legal
        .iter()
        .filter(|mv| mv.kind == MoveKind::Promotion && mv.to.to_string() == "e8")
        .collect();
    assert_eq!(promotions.len(), 4, "all four promotion choices must be legal");

    for mv in &promotions {
        let gives_check = {
            position.apply(**mv);
            let check = position.in_check(Colour::Black);
            position.undo(**mv);
            check
        };
        assert_eq!(
            gives_check,
            mv.promo_to == Some(PieceKind::Knight),
            "only promoting to a knight gives check from e8"
        );
    }
}

#[test]
fn repeating_a_line_once_reaches_threefold_repetition() {
    let mut engine = Engine::new();
    for mv in ["b1c3", "b8c6", "c3b1", "c6b8", "b1c3", "b8c6", "c3b1", "c6b8"] {
        apply_uci(&mut engine, mv);
    }
    assert_eq!(engine.game_end(), GameEnd::Repetition);
}
