//! Negamax search with alpha-beta pruning, a transposition table,
//! MVV-LVA move ordering, a quiescence extension, and iterative
//! deepening.

use crate::{
    evaluation,
    movegen::{self, Move},
    position::{self, GameEnd, Position},
    transposition_table::{Bound, TranspositionEntry, TranspositionTable},
};

/// A safely negatable stand-in for infinity: large enough to dwarf any
/// real evaluation (including [`evaluation::MATE`]), small enough
/// that negating it never overflows `i32`.
const INFINITY: i32 = i32::MAX / 2;

/// The transposition table's default size, chosen to be generous for
/// a single search without asking the host to configure anything.
const DEFAULT_TT_MIB: usize = 64;

/// Owns the transposition table and node counter across one or more
/// [`Search::choose_move`] calls, so repeated searches on the same
/// engine instance can reuse cached results.
pub struct Search {
    /// The transposition table, reused across successive searches.
    tt: TranspositionTable,
    /// The number of nodes visited by the most recent `choose_move`
    /// call (negamax nodes plus quiescence nodes).
    nodes: u64,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    /// Creates a [`Search`] with a default-sized transposition table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tt_capacity(DEFAULT_TT_MIB)
    }

    /// Creates a [`Search`] with a transposition table sized to hold
    /// roughly `mib` mebibytes of entries.
    #[must_use]
    pub fn with_tt_capacity(mib: usize) -> Self {
        Self {
            tt: TranspositionTable::with_capacity(mib),
            nodes: 0,
        }
    }

    /// Returns the node count from the most recent [`Self::choose_move`]
    /// call.
    #[must_use]
    pub const fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Clears the transposition table, discarding all cached results.
    pub fn clear_tt(&mut self) {
        self.tt.clear();
    }

    /// Chooses a move for the side to move in `position`, searching
    /// to `max_depth`.
    ///
    /// When `iterative_deepening` is set, searches depth `1, 2, …,
    /// max_depth` in turn, keeping the best move found by the deepest
    /// *completed* iteration; a shallower iteration's best move is
    /// kept as a fallback if a deeper one were ever to produce none
    /// (in practice, only the absence of any legal move at all can do
    /// that, and it is the same at every depth).
    ///
    /// Returns `None` only when the side to move has no legal moves.
    pub fn choose_move(&mut self, position: &mut Position, max_depth: u32, iterative_deepening: bool) -> Option<Move> {
        self.nodes = 0;
        let mut best = None;
        if iterative_deepening {
            for depth in 1..=max_depth.max(1) {
                if let Some(mv) = self.search_root(position, depth) {
                    best = Some(mv);
                }
            }
        } else {
            best = self.search_root(position, max_depth.max(1));
        }
        best
    }

    /// Runs one full alpha-beta root call at `depth`, returning the
    /// best move found, or `None` if there is no legal move.
    fn search_root(&mut self, position: &mut Position, depth: u32) -> Option<Move> {
        let side = position.side_to_move();
        let mut pseudo_legal = movegen::generate_pseudo_legal(position, side);
        movegen::ordering::sort_moves(&mut pseudo_legal);

        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut best_move = None;
        let mut best_value = -INFINITY;

        for mv in pseudo_legal {
            position.apply(mv);
            if position.in_check(side) {
                position.undo(mv);
                continue;
            }
            let score = -negamax(position, &mut self.tt, &mut self.nodes, depth.saturating_sub(1), -beta, -alpha, 1);
            position.undo(mv);

            if score > best_value {
                best_value = score;
                best_move = Some(mv);
            }
            if best_value > alpha {
                alpha = best_value;
            }
        }

        best_move
    }
}

/// Negamax with alpha-beta pruning, transposition-table probing and
/// storing, and a draw short-circuit.
fn negamax(
    position: &mut Position,
    tt: &mut TranspositionTable,
    nodes: &mut u64,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
    ply: u32,
) -> i32 {
    *nodes += 1;
    let alpha0 = alpha;
    let beta0 = beta;

    let fingerprint = position.fingerprint();
    if let Some(entry) = tt.probe(fingerprint).copied() {
        if u32::from(entry.depth) >= depth {
            match entry.flag {
                Bound::Exact => return entry.value,
                Bound::Lower => alpha = alpha.max(entry.value),
                Bound::Upper => beta = beta.min(entry.value),
            }
            if alpha >= beta {
                return entry.value;
            }
        }
    }

    if depth == 0 {
        return quiescence(position, nodes, alpha, beta, ply);
    }

    if is_drawn_by_rule(position, fingerprint) {
        return 0;
    }

    let side = position.side_to_move();
    let mut pseudo_legal = movegen::generate_pseudo_legal(position, side);
    if pseudo_legal.is_empty() {
        return evaluation::terminal_value(mate_or_stalemate(position, side), ply);
    }
    movegen::ordering::sort_moves(&mut pseudo_legal);

    let mut best_value = -INFINITY;
    let mut best_move = None;
    let mut legal_count = 0u32;

    for mv in pseudo_legal {
        position.apply(mv);
        if position.in_check(side) {
            position.undo(mv);
            continue;
        }
        legal_count += 1;

        let child_fingerprint = position.fingerprint();
        let score = if is_drawn_by_rule(position, child_fingerprint) {
            0
        } else {
            -negamax(position, tt, nodes, depth - 1, -beta, -alpha, ply + 1)
        };
        position.undo(mv);

        if score > best_value {
            best_value = score;
            best_move = Some(mv);
        }
        if best_value > alpha {
            alpha = best_value;
        }
        if alpha >= beta {
            break;
        }
    }

    if legal_count == 0 {
        return evaluation::terminal_value(mate_or_stalemate(position, side), ply);
    }

    let flag = if best_value <= alpha0 {
        Bound::Upper
    } else if best_value >= beta0 {
        Bound::Lower
    } else {
        Bound::Exact
    };
    if let Some(mv) = best_move {
        tt.store(
            fingerprint,
            TranspositionEntry {
                depth: depth as u8,
                value: best_value,
                flag,
                best_move: Some(mv),
            },
        );
    }

    best_value
}

/// Quiescence search: extends the leaf over tactical replies
/// (captures, en passant, promotions) to avoid the horizon effect.
fn quiescence(position: &mut Position, nodes: &mut u64, mut alpha: i32, beta: i32, ply: u32) -> i32 {
    *nodes += 1;
    let stand_pat = evaluation::static_eval(position);
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let side = position.side_to_move();
    let mut pseudo_legal = movegen::generate_pseudo_legal(position, side);
    movegen::ordering::sort_moves(&mut pseudo_legal);

    for mv in pseudo_legal.iter().copied().filter(Move::is_tactical) {
        position.apply(mv);
        if position.in_check(side) {
            position.undo(mv);
            continue;
        }
        let score = -quiescence(position, nodes, -beta, -alpha, ply + 1);
        position.undo(mv);

        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

/// Returns `true` if the position at `fingerprint` is already drawn by
/// the fifty-move rule or threefold repetition, letting a caller skip
/// a recursive call it already knows would immediately score 0.
fn is_drawn_by_rule(position: &Position, fingerprint: position::Fingerprint) -> bool {
    position.halfmove_clock() >= position::FIFTY_MOVE_PLY_LIMIT
        || position.repetition_count(fingerprint) >= position::REPETITION_LIMIT
}

/// Resolves a no-legal-moves position into `Checkmate` or `Stalemate`.
fn mate_or_stalemate(position: &Position, side: crate::types::Colour) -> GameEnd {
    if position.in_check(side) {
        GameEnd::Checkmate
    } else {
        GameEnd::Stalemate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour;

    #[test]
    fn finds_mate_in_one() {
        // White: king a1, queen h7; Black: king a8 alone. Qh7-a7 is mate.
        let mut position = Position::from_fen("k7/8/8/8/8/8/7Q/K7 w - - 0 1").expect("valid FEN");
        let mut search = Search::new();
        let mv = search.choose_move(&mut position, 3, false).expect("a move exists");
        position.apply(mv);
        assert_eq!(position.game_end(), GameEnd::Checkmate);
    }

    #[test]
    fn returns_none_when_stalemated() {
        // Classic stalemate: Black king a8, White king c7, White queen b6.
        let mut position = Position::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").expect("valid FEN");
        assert_eq!(position.game_end(), GameEnd::Stalemate);
        let mut search = Search::new();
        assert_eq!(search.choose_move(&mut position, 2, false), None);
    }

    #[test]
    fn iterative_deepening_keeps_a_fallback_move() {
        let mut position = Position::new_position();
        let mut search = Search::new();
        let mv = search.choose_move(&mut position, 2, true);
        assert!(mv.is_some());
        assert!(search.nodes() > 0);
        assert_eq!(position.side_to_move(), Colour::White, "search must not mutate the position");
    }
}
