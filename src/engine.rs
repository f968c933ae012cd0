//! The single object a host (a CLI, a GUI, a test harness) drives: a
//! [`Position`] plus a [`Search`], behind a move-by-coordinates surface
//! that never hands the caller a raw [`Move`] to misuse.

use crate::{
    error::MoveError,
    movegen::{Move, MoveKind},
    position::{GameEnd, Position},
    search::Search,
    types::{PieceKind, Square},
};

/// The outcome of [`Engine::attempt_move`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttemptResult {
    /// The move was legal and has been applied.
    Valid,
    /// The move is legal only once a promotion piece is chosen; call
    /// [`Engine::finalize_promotion`] to complete it.
    Promotion,
    /// No legal move exists from `from` to `to`.
    Illegal,
}

/// Wraps a [`Position`] and a [`Search`], presenting the narrow,
/// coordinate-based surface a host needs and nothing more.
pub struct Engine {
    /// The current position.
    position: Position,
    /// The search, reused across calls so its transposition table
    /// survives between moves.
    search: Search,
    /// A pending promotion move awaiting [`Engine::finalize_promotion`],
    /// set by [`Engine::attempt_move`] when it returns
    /// [`AttemptResult::Promotion`].
    pending_promotion: Option<Move>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an [`Engine`] at the standard starting position.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Position::new_position(),
            search: Search::new(),
            pending_promotion: None,
        }
    }

    /// Returns the current position.
    #[must_use]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// Creates an [`Engine`] sitting at `position`, for scenario and
    /// perft tests that need a position other than the standard
    /// start.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn from_position(position: Position) -> Self {
        Self {
            position,
            search: Search::new(),
            pending_promotion: None,
        }
    }

    /// Attempts to move the piece on `from` to `to`.
    ///
    /// If exactly one legal move matches `from` and `to` and it is not
    /// a promotion, it is applied immediately and this returns
    /// [`AttemptResult::Valid`]. If the only match is a promotion, it
    /// is stashed and this returns [`AttemptResult::Promotion`]; the
    /// host must then call [`Self::finalize_promotion`]. Otherwise
    /// this returns [`AttemptResult::Illegal`] and the position is
    /// unchanged.
    pub fn attempt_move(&mut self, from: Square, to: Square) -> AttemptResult {
        let side = self.position.side_to_move();
        let candidates: Vec<Move> = self
            .position
            .legal_moves(side)
            .into_iter()
            .filter(|mv| mv.from == from && mv.to == to)
            .collect();

        if candidates.is_empty() {
            return AttemptResult::Illegal;
        }
        if candidates[0].kind == MoveKind::Promotion {
            self.pending_promotion = Some(candidates[0]);
            return AttemptResult::Promotion;
        }

        self.position.apply(candidates[0]);
        AttemptResult::Valid
    }

    /// Completes a pending promotion chosen by [`Self::attempt_move`],
    /// picking the concrete move whose `promo_to` is `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if there is no pending promotion, or if
    /// `kind` is not one of the four legal promotion choices for it
    /// (only possible if a host offers a piece kind outside
    /// queen/rook/bishop/knight).
    pub fn finalize_promotion(&mut self, kind: PieceKind) -> Result<(), MoveError> {
        let pending = self.pending_promotion.take().ok_or(MoveError)?;
        let side = self.position.side_to_move();
        let chosen = self
            .position
            .legal_moves(side)
            .into_iter()
            .find(|mv| mv.from == pending.from && mv.to == pending.to && mv.promo_to == Some(kind))
            .ok_or(MoveError)?;
        self.position.apply(chosen);
        Ok(())
    }

    /// Searches for and applies the engine's own move, returning it,
    /// or `None` if the side to move has no legal move.
    pub fn choose_move(&mut self, max_depth: u32, iterative_deepening: bool) -> Option<Move> {
        let mv = self.search.choose_move(&mut self.position, max_depth, iterative_deepening)?;
        self.position.apply(mv);
        Some(mv)
    }

    /// Returns the node count from the most recent [`Self::choose_move`]
    /// call.
    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.search.nodes()
    }

    /// Returns how the game currently stands.
    pub fn game_end(&mut self) -> GameEnd {
        self.position.game_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_move_with_no_piece_on_the_source_square() {
        let mut engine = Engine::new();
        let result = engine.attempt_move("e4".parse().unwrap(), "e5".parse().unwrap());
        assert_eq!(result, AttemptResult::Illegal);
    }

    #[test]
    fn applies_a_legal_pawn_push() {
        let mut engine = Engine::new();
        let result = engine.attempt_move("e2".parse().unwrap(), "e4".parse().unwrap());
        assert_eq!(result, AttemptResult::Valid);
        assert_eq!(engine.position().side_to_move(), crate::types::Colour::Black);
    }

    #[test]
    fn promotion_requires_finalization() {
        let mut engine = Engine::new();
        let position = Position::from_fen("8/4P3/8/8/k7/8/7K/8 w - - 0 1").expect("valid FEN");
        engine.position = position;
        let result = engine.attempt_move("e7".parse().unwrap(), "e8".parse().unwrap());
        assert_eq!(result, AttemptResult::Promotion);
        engine.finalize_promotion(PieceKind::Queen).expect("queen is a legal choice");
        assert_eq!(engine.position().piece_at("e8".parse().unwrap()).map(|p| p.kind), Some(PieceKind::Queen));
    }
}
