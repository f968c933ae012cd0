//! Static evaluation: material, piece-square tables, mobility, king
//! safety, and file structure, combined into a single centipawn score
//! from the side-to-move's perspective (negamax convention).

pub mod tables;

use crate::{
    movegen,
    position::{GameEnd, Position},
    types::{Colour, Piece, PieceKind, Square},
};

/// The sentinel magnitude used for a forced mate, large enough that
/// no realistic material/positional score could be mistaken for one.
/// `terminal_value` subtracts the ply count from this so shorter
/// mates score higher than longer ones.
pub const MATE: i32 = 1_000_000;

/// The per-file bonus a rook earns on a fully open file (no pawns of
/// either colour).
const OPEN_FILE_ROOK_BONUS: i32 = 25;
/// The per-file bonus a rook earns on a semi-open file (no friendly
/// pawns, at least one enemy pawn).
const SEMI_OPEN_FILE_ROOK_BONUS: i32 = 15;
/// The penalty per pawn beyond the first a side has doubled on a
/// file.
const DOUBLED_PAWN_PENALTY: i32 = -20;
/// The bonus a king earns for a friendly pawn directly in front of it.
const PAWN_SHIELD_BONUS: i32 = 15;
/// The additional bonus when that shielding pawn is on the king's own
/// file.
const SAME_FILE_SHIELD_BONUS: i32 = 3;
/// The per-pseudo-legal-move mobility weight.
const MOBILITY_WEIGHT: i32 = 2;

/// Mirrors a row for piece-square lookups: White reads its table
/// directly; Black reads it upside down, since row `0` is always
/// Black's back rank.
const fn mirror_row(colour: Colour, y: i8) -> usize {
    let mirrored = match colour {
        Colour::White => y,
        Colour::Black => 7 - y,
    };
    mirrored as usize
}

/// The material-plus-PST contribution of a single piece at a square,
/// signed so White's pieces contribute positively and Black's
/// negatively — exactly the quantity [`crate::position::Position`]
/// accumulates incrementally on every `apply`/`undo`.
#[must_use]
pub fn incremental_value(piece: Piece, square: Square) -> i32 {
    let material = piece.kind.material_value();
    let raw_table_value = tables::table_for(piece.kind)[mirror_row(piece.colour, square.y)][square.x as usize];
    let fraction = f64::from(raw_table_value) / 100.0;

    let magnitude = if piece.kind == PieceKind::King {
        (100.0 * fraction).round() as i32
    } else {
        let clamped = fraction.clamp(-0.6, 0.6);
        (f64::from(material) * clamped).round() as i32
    };

    let signed_material = match piece.colour {
        Colour::White => material,
        Colour::Black => -material,
    };
    let signed_pst = match piece.colour {
        Colour::White => magnitude,
        Colour::Black => -magnitude,
    };
    signed_material + signed_pst
}

/// Recomputes the material+PST accumulator from scratch by scanning
/// every square. Used to seed a freshly parsed [`Position`] and to
/// check the incremental accumulator for drift in tests.
#[must_use]
pub fn full_incremental_sum(position: &Position) -> i32 {
    let mut total = 0;
    for y in 0..8 {
        for x in 0..8 {
            if let Some(piece) = position.piece_at(Square::new(x, y)) {
                total += incremental_value(piece, Square::new(x, y));
            }
        }
    }
    total
}

/// Counts pawns and rooks of `colour` on file `x`.
fn file_counts(position: &Position, x: i8, colour: Colour) -> (i32, i32) {
    let mut pawns = 0;
    let mut rooks = 0;
    for y in 0..8 {
        if let Some(piece) = position.piece_at(Square::new(x, y)) {
            if piece.colour == colour {
                match piece.kind {
                    PieceKind::Pawn => pawns += 1,
                    PieceKind::Rook => rooks += 1,
                    _ => {}
                }
            }
        }
    }
    (pawns, rooks)
}

/// The signed sum, across all files, of doubled-pawn penalties and
/// open/semi-open file bonuses for `colour`'s own rooks.
fn file_structure_bonus(position: &Position, colour: Colour) -> i32 {
    let mut total = 0;
    for x in 0..8 {
        let (own_pawns, own_rooks) = file_counts(position, x, colour);
        let (enemy_pawns, _enemy_rooks) = file_counts(position, x, colour.flip());
        if own_pawns > 1 {
            total += (own_pawns - 1) * DOUBLED_PAWN_PENALTY;
        }
        if own_pawns == 0 && enemy_pawns == 0 {
            total += OPEN_FILE_ROOK_BONUS * own_rooks;
        } else if own_pawns == 0 && enemy_pawns > 0 {
            total += SEMI_OPEN_FILE_ROOK_BONUS * own_rooks;
        }
    }
    total
}

/// The pawn-shield bonus for `colour`'s king.
fn pawn_shield_bonus(position: &Position, colour: Colour) -> i32 {
    let king_square = position.king_square(colour);
    let shield_y = king_square.y + colour.pawn_push_dy();
    if !(0..8).contains(&shield_y) {
        return 0;
    }
    let mut total = 0;
    for dx in -1..=1i8 {
        let file = king_square.x + dx;
        if !(0..8).contains(&file) {
            continue;
        }
        let shield_square = Square::new(file, shield_y);
        if let Some(piece) = position.piece_at(shield_square) {
            if piece.kind == PieceKind::Pawn && piece.colour == colour {
                total += PAWN_SHIELD_BONUS;
                if file == king_square.x {
                    total += SAME_FILE_SHIELD_BONUS;
                }
            }
        }
    }
    total
}

/// Returns the static evaluation of `position`, in centipawns from
/// the side-to-move's perspective (negamax convention): positive
/// means the side to move is better off.
#[must_use]
pub fn static_eval(position: &Position) -> i32 {
    let material_and_pst = position.eval_accumulator();

    let white_mobility = movegen::generate_pseudo_legal(position, Colour::White).len() as i32;
    let black_mobility = movegen::generate_pseudo_legal(position, Colour::Black).len() as i32;
    let mobility = MOBILITY_WEIGHT * (white_mobility - black_mobility);

    let king_safety = pawn_shield_bonus(position, Colour::White) - pawn_shield_bonus(position, Colour::Black);
    let file_bonus = file_structure_bonus(position, Colour::White) - file_structure_bonus(position, Colour::Black);

    let white_perspective = material_and_pst + mobility + king_safety + file_bonus;
    match position.side_to_move() {
        Colour::White => white_perspective,
        Colour::Black => -white_perspective,
    }
}

/// Returns the search-relative score for a terminal game state `ply`
/// plies from the search root.
///
/// # Panics
///
/// Panics if `game_end` is [`GameEnd::None`]: callers must only reach
/// this function once [`Position::game_end`] has already confirmed
/// the position is terminal.
#[must_use]
pub fn terminal_value(game_end: GameEnd, ply: u32) -> i32 {
    match game_end {
        GameEnd::Checkmate => -MATE + ply as i32,
        GameEnd::Stalemate | GameEnd::FiftyMove | GameEnd::Repetition => 0,
        GameEnd::None => panic!("terminal_value called on a non-terminal position"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_is_balanced() {
        let position = Position::new_position();
        assert_eq!(static_eval(&position), 0);
    }

    #[test]
    fn accumulator_matches_full_rescan_after_a_move() {
        let mut position = Position::new_position();
        let mv = position.legal_moves(Colour::White)[0];
        position.apply(mv);
        assert_eq!(position.eval_accumulator(), full_incremental_sum(&position));
    }

    #[test]
    fn mate_score_prefers_shorter_mates() {
        // terminal_value is taken from the mated side's perspective; negamax
        // negates it once more going up to the mating side, so a shallower
        // mate must score higher only after that negation.
        assert!(-terminal_value(GameEnd::Checkmate, 1) > -terminal_value(GameEnd::Checkmate, 3));
    }
}
