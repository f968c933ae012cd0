//! The canonical position fingerprint: a fixed-size byte key encoding
//! side to move, castling rights, the en-passant target, and the full
//! board, used for both threefold-repetition counting and
//! transposition-table lookup.

use crate::{
    position::Position,
    types::{Colour, PieceKind, Square},
};

/// `ceil(269 bits / 8) = 34` bytes: 1 side-to-move bit, 4 castling
/// bits, 8 en-passant bits, and 64 squares of 4 bits each, padded with
/// zero bits to a byte boundary.
const FINGERPRINT_BYTES: usize = 34;

/// A deterministic, collision-free encoding of everything that matters
/// for repetition and transposition-table equality.
///
/// A fixed-size array rather than a growable byte vector: the encoded
/// length is a compile-time constant, so there is nothing for a `Vec`
/// to buy here.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_BYTES]);

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint(")?;
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Writes individual bits, most-significant-bit first, into a fixed
/// byte buffer.
struct BitWriter {
    /// The buffer being filled.
    bytes: [u8; FINGERPRINT_BYTES],
    /// The next bit index to write, counting from the start of the
    /// buffer.
    cursor: usize,
}

impl BitWriter {
    const fn new() -> Self {
        Self {
            bytes: [0; FINGERPRINT_BYTES],
            cursor: 0,
        }
    }

    /// Writes the low `width` bits of `value`, most-significant first.
    fn write_bits(&mut self, value: u32, width: u32) {
        for i in (0..width).rev() {
            let bit = (value >> i) & 1;
            if bit != 0 {
                let byte_index = self.cursor / 8;
                let bit_index = 7 - (self.cursor % 8);
                self.bytes[byte_index] |= 1 << bit_index;
            }
            self.cursor += 1;
        }
    }

    const fn finish(self) -> Fingerprint {
        Fingerprint(self.bytes)
    }
}

/// Maps a piece kind to its 3-bit fingerprint code.
const fn kind_code(kind: PieceKind) -> u32 {
    match kind {
        PieceKind::Pawn => 0b001,
        PieceKind::Rook => 0b010,
        PieceKind::Bishop => 0b011,
        PieceKind::Queen => 0b100,
        PieceKind::Knight => 0b101,
        PieceKind::King => 0b110,
    }
}

/// Computes the fingerprint of `position`.
#[must_use]
pub fn compute(position: &Position) -> Fingerprint {
    let mut writer = BitWriter::new();

    writer.write_bits(u32::from(position.side_to_move() == Colour::White), 1);

    for (rook_square, king_square) in [
        (Square::new(0, 7), Square::new(4, 7)), // WQ rook a1
        (Square::new(7, 7), Square::new(4, 7)), // WK rook h1
        (Square::new(0, 0), Square::new(4, 0)), // BQ rook a8
        (Square::new(7, 0), Square::new(4, 0)), // BK rook h8
    ] {
        let rights = rook_and_king_unmoved(position, rook_square, king_square);
        writer.write_bits(u32::from(rights), 1);
    }

    match position.en_passant_target() {
        Some(sq) => {
            writer.write_bits(sq.x as u32, 4);
            writer.write_bits(sq.y as u32, 4);
        }
        None => writer.write_bits(0xFF, 8),
    }

    for y in 0..8 {
        for x in 0..8 {
            match position.piece_at(Square::new(x, y)) {
                None => writer.write_bits(0, 4),
                Some(piece) => {
                    let colour_bit = u32::from(piece.colour == Colour::White);
                    let code = (colour_bit << 3) | kind_code(piece.kind);
                    writer.write_bits(code, 4);
                }
            }
        }
    }

    writer.finish()
}

/// Returns `true` iff the rook on `rook_square` and the king on
/// `king_square` are both present, of the same colour, and have
/// never moved — the condition a per-rook castling-rights bit encodes.
fn rook_and_king_unmoved(position: &Position, rook_square: Square, king_square: Square) -> bool {
    let Some(rook) = position.piece_at(rook_square) else {
        return false;
    };
    let Some(king) = position.piece_at(king_square) else {
        return false;
    };
    rook.kind == PieceKind::Rook
        && king.kind == PieceKind::King
        && rook.colour == king.colour
        && !rook.has_moved
        && !king.has_moved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_fingerprint_is_stable() {
        let position = Position::new_position();
        assert_eq!(compute(&position), compute(&position));
    }

    #[test]
    fn side_to_move_changes_the_fingerprint() {
        let mut position = Position::new_position();
        let before = compute(&position);
        let mv = crate::movegen::generate_pseudo_legal(&position, Colour::White)[0];
        position.apply(mv);
        assert_ne!(compute(&position), before);
    }
}
