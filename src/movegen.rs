//! Pseudo-legal move generation.
//!
//! This module only ever reads a [`Position`]; the legality filter
//! (applying a move, testing for check, undoing it) needs mutable
//! access the Position alone can grant, so it lives on
//! [`Position::legal_moves`] instead of here. Keeping the split this
//! way means the generator can be unit-tested as a pure function of a
//! board snapshot.

pub mod ordering;
pub mod templates;

use arrayvec::ArrayVec;

use crate::{
    position::Position,
    types::{Colour, Piece, PieceKind, Square},
};

/// An upper bound on the number of pseudo-legal moves reachable from
/// any legal chess position. The true maximum (a contrived position
/// with multiple queens) is 218; this leaves headroom.
pub const MAX_MOVES: usize = 256;

/// A fixed-capacity list of moves, avoiding a heap allocation per
/// generation call.
pub type MoveList = ArrayVec<Move, MAX_MOVES>;

/// The four promotion choices, in the order the generator emits them.
pub const PROMOTION_KINDS: [PieceKind; 4] =
    [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

/// The kind of a move, matching the five-way tag in the move record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MoveKind {
    /// A move to an empty square that is not a castle.
    Quiet,
    /// A king and rook moving together.
    Castle,
    /// A pawn capturing the square it skipped over on a double push.
    EnPassant,
    /// A pawn reaching the last rank (with or without a capture).
    Promotion,
    /// A capture that is not en passant or a promotion.
    Capture,
}

/// A single move: everything needed to apply it to a [`Position`] and
/// to undo it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    /// The square the moving piece starts on.
    pub from: Square,
    /// The square the moving piece ends on.
    pub to: Square,
    /// The piece being moved, as it was before the move.
    pub piece: Piece,
    /// The piece captured, if any (the en-passant victim for EP, the
    /// piece on `to` otherwise).
    pub captured: Option<Piece>,
    /// The kind of move.
    pub kind: MoveKind,
    /// The piece kind a pawn promotes to, set only for `Promotion`.
    pub promo_to: Option<PieceKind>,
    /// The rook's start square (`Castle`) or the captured pawn's
    /// square (`EnPassant`).
    pub secondary_from: Option<Square>,
    /// The rook's end square, set only for `Castle`.
    pub secondary_to: Option<Square>,
}

impl Move {
    /// Returns `true` if this move is "tactical": a capture,
    /// en-passant, or promotion. Used to select quiescence-search
    /// candidates.
    #[must_use]
    pub const fn is_tactical(&self) -> bool {
        matches!(
            self.kind,
            MoveKind::Capture | MoveKind::EnPassant | MoveKind::Promotion
        )
    }
}

/// One side of the board to castle toward.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CastleSide {
    /// Toward the `h`-file rook.
    King,
    /// Toward the `a`-file rook.
    Queen,
}

/// Generates every pseudo-legal move for `colour` in `position`.
///
/// "Pseudo-legal" means consistent with piece geometry, occupancy,
/// and colour, including castling-path emptiness and en-passant
/// eligibility, but WITHOUT checking whether the move leaves the
/// mover's own king in check; see [`Position::legal_moves`] for the
/// filter that adds that check.
#[must_use]
pub fn generate_pseudo_legal(position: &Position, colour: Colour) -> MoveList {
    let mut moves = MoveList::new();
    for y in 0..8 {
        for x in 0..8 {
            let from = Square::new(x, y);
            let Some(piece) = position.piece_at(from) else {
                continue;
            };
            if piece.colour != colour {
                continue;
            }
            match piece.kind {
                PieceKind::Pawn => generate_pawn_moves(position, from, piece, &mut moves),
                PieceKind::Knight => {
                    generate_stepper_moves(position, from, piece, templates::knight_steps(from), &mut moves);
                }
                PieceKind::King => {
                    generate_stepper_moves(position, from, piece, templates::king_steps(from), &mut moves);
                    generate_castle_moves(position, from, piece, &mut moves);
                }
                PieceKind::Bishop => {
                    generate_sliding_moves(position, from, piece, &templates::BISHOP_RAYS, &mut moves);
                }
                PieceKind::Rook => {
                    generate_sliding_moves(position, from, piece, &templates::ROOK_RAYS, &mut moves);
                }
                PieceKind::Queen => {
                    generate_sliding_moves(position, from, piece, &templates::QUEEN_RAYS, &mut moves);
                }
            }
        }
    }
    moves
}

/// Pushes a quiet move or a capture depending on what occupies `to`,
/// for non-sliding, non-pawn pieces.
fn generate_stepper_moves(
    position: &Position,
    from: Square,
    piece: Piece,
    steps: impl Iterator<Item = Square>,
    moves: &mut MoveList,
) {
    for to in steps {
        push_quiet_or_capture(position, from, to, piece, moves);
    }
}

/// Walks each ray in `rays` from `from` until it leaves the board or
/// is blocked, pushing a quiet move for every empty square and a
/// single capture for the first occupied one.
fn generate_sliding_moves(
    position: &Position,
    from: Square,
    piece: Piece,
    rays: &[crate::types::Direction],
    moves: &mut MoveList,
) {
    for &dir in rays {
        let mut to = from.offset(dir);
        while to.in_bounds() {
            match position.piece_at(to) {
                None => {
                    moves.push(Move {
                        from,
                        to,
                        piece,
                        captured: None,
                        kind: MoveKind::Quiet,
                        promo_to: None,
                        secondary_from: None,
                        secondary_to: None,
                    });
                }
                Some(occupant) => {
                    if occupant.colour != piece.colour {
                        moves.push(Move {
                            from,
                            to,
                            piece,
                            captured: Some(occupant),
                            kind: MoveKind::Capture,
                            promo_to: None,
                            secondary_from: None,
                            secondary_to: None,
                        });
                    }
                    break;
                }
            }
            to = to.offset(dir);
        }
    }
}

/// Pushes a `Quiet` move if `to` is empty, or a `Capture` if it holds
/// an enemy piece; pushes nothing for an own-piece occupant.
fn push_quiet_or_capture(position: &Position, from: Square, to: Square, piece: Piece, moves: &mut MoveList) {
    match position.piece_at(to) {
        None => moves.push(Move {
            from,
            to,
            piece,
            captured: None,
            kind: MoveKind::Quiet,
            promo_to: None,
            secondary_from: None,
            secondary_to: None,
        }),
        Some(occupant) if occupant.colour != piece.colour => moves.push(Move {
            from,
            to,
            piece,
            captured: Some(occupant),
            kind: MoveKind::Capture,
            promo_to: None,
            secondary_from: None,
            secondary_to: None,
        }),
        Some(_) => {}
    }
}

/// Generates pushes, double pushes, captures (including en passant),
/// and promotions for the pawn on `from`.
fn generate_pawn_moves(position: &Position, from: Square, piece: Piece, moves: &mut MoveList) {
    let colour = piece.colour;
    let push_dir = templates::pawn_push_direction(colour);
    let one = from.offset(push_dir);
    if one.in_bounds() && position.piece_at(one).is_none() {
        push_pawn_destination(from, one, piece, None, moves);
        if from.y == colour.pawn_start_row() {
            let two = one.offset(push_dir);
            if position.piece_at(two).is_none() {
                moves.push(Move {
                    from,
                    to: two,
                    piece,
                    captured: None,
                    kind: MoveKind::Quiet,
                    promo_to: None,
                    secondary_from: None,
                    secondary_to: None,
                });
            }
        }
    }
    for dir in templates::pawn_capture_directions(colour) {
        let to = from.offset(dir);
        if !to.in_bounds() {
            continue;
        }
        if let Some(target) = position.piece_at(to) {
            if target.colour != colour {
                push_pawn_destination(from, to, piece, Some(target), moves);
            }
        } else if position.en_passant_target() == Some(to) {
            let captured_square = Square::new(to.x, from.y);
            let captured = position.piece_at(captured_square);
            moves.push(Move {
                from,
                to,
                piece,
                captured,
                kind: MoveKind::EnPassant,
                promo_to: None,
                secondary_from: Some(captured_square),
                secondary_to: None,
            });
        }
    }
}

/// Pushes either a plain quiet/capture move, or (when `to` is on the
/// last rank) all four promotion variants, for a pawn move from
/// `from` to `to`.
fn push_pawn_destination(
    from: Square,
    to: Square,
    piece: Piece,
    captured: Option<Piece>,
    moves: &mut MoveList,
) {
    if to.y == piece.colour.promotion_row() {
        for &promo_to in &PROMOTION_KINDS {
            moves.push(Move {
                from,
                to,
                piece,
                captured,
                kind: MoveKind::Promotion,
                promo_to: Some(promo_to),
                secondary_from: None,
                secondary_to: None,
            });
        }
    } else {
        let kind = if captured.is_some() {
            MoveKind::Capture
        } else {
            MoveKind::Quiet
        };
        moves.push(Move {
            from,
            to,
            piece,
            captured,
            kind,
            promo_to: None,
            secondary_from: None,
            secondary_to: None,
        });
    }
}

/// Generates the 0, 1, or 2 pseudo-legal castles available to the king
/// on `from`.
fn generate_castle_moves(position: &Position, from: Square, piece: Piece, moves: &mut MoveList) {
    if piece.has_moved {
        return;
    }
    for side in [CastleSide::King, CastleSide::Queen] {
        if let Some(mv) = try_castle(position, from, piece, side) {
            moves.push(mv);
        }
    }
}

/// Tests whether the single castle `side` is pseudo-legal for the
/// king on `from`, returning the move if so.
fn try_castle(position: &Position, from: Square, piece: Piece, side: CastleSide) -> Option<Move> {
    let row = from.y;
    let (rook_x, king_dest_x, rook_dest_x, between_xs): (i8, i8, i8, &[i8]) = match side {
        CastleSide::King => (7, 6, 5, &[5, 6]),
        CastleSide::Queen => (0, 2, 3, &[1, 2, 3]),
    };
    let rook_square = Square::new(rook_x, row);
    let rook = position.piece_at(rook_square)?;
    if rook.kind != PieceKind::Rook || rook.colour != piece.colour || rook.has_moved {
        return None;
    }
    for &x in between_xs {
        if position.piece_at(Square::new(x, row)).is_some() {
            return None;
        }
    }
    let passed_xs: &[i8] = match side {
        CastleSide::King => &[4, 5, 6],
        CastleSide::Queen => &[4, 3, 2],
    };
    for &x in passed_xs {
        if position.is_attacked(Square::new(x, row), piece.colour.flip()) {
            return None;
        }
    }
    Some(Move {
        from,
        to: Square::new(king_dest_x, row),
        piece,
        captured: None,
        kind: MoveKind::Castle,
        promo_to: None,
        secondary_from: Some(rook_square),
        secondary_to: Some(Square::new(rook_dest_x, row)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_has_twenty_pseudo_legal_moves_per_side() {
        let position = Position::new_position();
        assert_eq!(generate_pseudo_legal(&position, Colour::White).len(), 20);
        assert_eq!(generate_pseudo_legal(&position, Colour::Black).len(), 20);
    }
}
