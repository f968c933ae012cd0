//! A minimal line-oriented host for [`chess_core::engine::Engine`].
//!
//! Reads commands from stdin, one per line, and prints results to
//! stdout. Not a UCI implementation: this is the smallest possible
//! driver exercising the engine's public surface, for manual testing
//! and for scripting games from a shell.
//!
//! Commands:
//! - `new` — start a fresh game.
//! - `move <from> <to> [promo]` — attempt a move, e.g. `move e2 e4`
//!   or `move e7 e8 q`.
//! - `go <depth>` — search and play the engine's own move.
//! - `board` — print the current position.
//! - `end` — print the current game-end status.
//! - `quit` — exit.

use std::io::{self, BufRead, Write};

use chess_core::{engine::Engine, position::GameEnd, types::PieceKind};

/// Parses a single-letter promotion choice (`q`, `r`, `b`, `n`).
fn promo_kind_from_letter(letter: &str) -> Option<PieceKind> {
    match letter {
        "q" => Some(PieceKind::Queen),
        "r" => Some(PieceKind::Rook),
        "b" => Some(PieceKind::Bishop),
        "n" => Some(PieceKind::Knight),
        _ => None,
    }
}

/// Renders a [`GameEnd`] as a short human-readable string.
fn describe_game_end(game_end: GameEnd) -> &'static str {
    match game_end {
        GameEnd::None => "in progress",
        GameEnd::Checkmate => "checkmate",
        GameEnd::Stalemate => "stalemate",
        GameEnd::FiftyMove => "draw (fifty-move rule)",
        GameEnd::Repetition => "draw (repetition)",
    }
}

/// Executes one command line against `engine`. Returns `false` if the
/// caller should stop reading further lines.
fn handle_line(engine: &mut Engine, line: &str) -> bool {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("new") => {
            *engine = Engine::new();
            println!("new game");
        }
        Some("move") => {
            let (Some(from), Some(to)) = (words.next(), words.next()) else {
                println!("usage: move <from> <to> [promo]");
                return true;
            };
            let (Ok(from), Ok(to)) = (from.parse(), to.parse()) else {
                println!("illegal");
                return true;
            };
            match engine.attempt_move(from, to) {
                chess_core::engine::AttemptResult::Valid => println!("ok"),
                chess_core::engine::AttemptResult::Illegal => println!("illegal"),
                chess_core::engine::AttemptResult::Promotion => {
                    let Some(promo) = words.next().and_then(promo_kind_from_letter) else {
                        println!("promotion required: move {from} {to} <q|r|b|n>");
                        return true;
                    };
                    match engine.finalize_promotion(promo) {
                        Ok(()) => println!("ok"),
                        Err(_) => println!("illegal"),
                    }
                }
            }
        }
        Some("go") => {
            let depth: u32 = words.next().and_then(|s| s.parse().ok()).unwrap_or(4);
            match engine.choose_move(depth, true) {
                Some(mv) => println!("bestmove {}{} nodes {}", mv.from, mv.to, engine.nodes()),
                None => println!("no legal move"),
            }
        }
        Some("board") => print!("{}", engine.position()),
        Some("end") => println!("{}", describe_game_end(engine.game_end())),
        Some("quit") => return false,
        Some(other) => println!("unknown command: {other}"),
        None => {}
    }
    true
}

fn main() {
    let stdin = io::stdin();
    let mut engine = Engine::new();
    print!("> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if !handle_line(&mut engine, &line) {
            break;
        }
        print!("> ");
        let _ = io::stdout().flush();
    }
}
