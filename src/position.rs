//! The board, piece rosters, and all incrementally-maintained state:
//! castling eligibility, the en-passant target, the halfmove clock,
//! the incremental material+PST accumulator, and the repetition
//! counter. Everything else in this crate mutates the game through
//! [`Position::apply`]/[`Position::undo`]; no component keeps its own
//! copy of the board.

pub mod fingerprint;

use std::{collections::HashMap, fmt};

use crate::{
    evaluation,
    movegen::{self, Move, MoveKind, MoveList},
    types::{Colour, Piece, PieceKind, Square},
    util::Stack,
};

pub use fingerprint::Fingerprint;

/// How search (and the legality filter) may find a position to end.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GameEnd {
    /// The game continues.
    None,
    /// The side to move has no legal moves and is in check.
    Checkmate,
    /// The side to move has no legal moves and is not in check.
    Stalemate,
    /// The halfmove clock has reached the limit with no reset.
    FiftyMove,
    /// The current position has occurred three or more times.
    Repetition,
}

/// The number of plies since the last capture or pawn move at which
/// the fifty-move rule applies. Counted in plies, not the 100-ply
/// (fifty full-move) form most chess rule sets use; see `DESIGN.md`.
pub(crate) const FIFTY_MOVE_PLY_LIMIT: u32 = 50;

/// The repetition count at or above which a position is a draw.
pub(crate) const REPETITION_LIMIT: u32 = 3;

/// An upper bound on plies a single `choose_move` call can apply
/// before unwinding, sizing the undo-history stack.
const MAX_SEARCH_PLY: usize = 256;

/// Per-ply state that [`Position::apply`] cannot reconstruct from the
/// [`Move`] alone, stashed so [`Position::undo`] can restore it
/// exactly. Kept off the `Move` record itself: the delta lives on a
/// stack frame, not on the move.
#[derive(Clone, Copy)]
struct UndoFrame {
    /// The en-passant target square before this move was applied.
    previous_en_passant_target: Option<Square>,
    /// The halfmove clock before this move was applied.
    previous_halfmove_clock: u32,
    /// The net change `apply` made to the eval accumulator, so `undo`
    /// can subtract it back out without recomputing piece values.
    eval_delta: i32,
}

/// A chess position: the board, whose turn it is, and all of the
/// incidental state a legal game of chess needs to track.
pub struct Position {
    /// `board[y][x]`: the piece occupying each square, or `None`.
    board: [[Option<Piece>; 8]; 8],
    /// The side to move.
    side_to_move: Colour,
    /// The square a pawn skipped over on its most recent double push,
    /// if any, making it capturable en passant this ply only.
    en_passant_target: Option<Square>,
    /// Plies since the last capture or pawn move.
    halfmove_clock: u32,
    /// The ply number, starting at 0, incremented on every `apply`.
    turn: u64,
    /// The material + piece-square-table accumulator, White's
    /// perspective, maintained incrementally.
    eval_accumulator: i32,
    /// How many times each fingerprint has occurred so far this game.
    position_counts: HashMap<Fingerprint, u32>,
    /// Undo information for moves applied but not yet undone.
    undo_history: Stack<UndoFrame, MAX_SEARCH_PLY>,
}

impl Position {
    /// Returns the standard chess starting position.
    #[must_use]
    #[inline]
    pub fn new_position() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("the standard starting FEN is always valid")
    }

    /// Returns the piece on `square`, if any.
    #[must_use]
    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.y as usize][square.x as usize]
    }

    /// Returns the side to move.
    #[must_use]
    #[inline]
    pub const fn side_to_move(&self) -> Colour {
        self.side_to_move
    }

    /// Returns the current en-passant target square, if any.
    #[must_use]
    #[inline]
    pub const fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    /// Returns the number of plies since the last capture or pawn
    /// move.
    #[must_use]
    #[inline]
    pub const fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Returns the ply number, incremented once per `apply`.
    #[must_use]
    #[inline]
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Returns the incrementally maintained material + PST
    /// accumulator, from White's perspective.
    #[must_use]
    #[inline]
    pub const fn eval_accumulator(&self) -> i32 {
        self.eval_accumulator
    }

    /// Returns the number of times `fingerprint` has occurred so far.
    #[must_use]
    pub fn repetition_count(&self, fingerprint: Fingerprint) -> u32 {
        self.position_counts.get(&fingerprint).copied().unwrap_or(0)
    }

    /// Computes this position's canonical fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint::compute(self)
    }

    /// Returns the square `colour`'s king occupies.
    ///
    /// # Panics
    ///
    /// Panics if `colour` has no king on the board — an invariant
    /// violation, never reachable through `apply`/`undo` on a legally
    /// constructed position.
    #[must_use]
    pub fn king_square(&self, colour: Colour) -> Square {
        for y in 0..8 {
            for x in 0..8 {
                let square = Square::new(x, y);
                if let Some(piece) = self.piece_at(square) {
                    if piece.kind == PieceKind::King && piece.colour == colour {
                        return square;
                    }
                }
            }
        }
        panic!("invariant violation: {colour:?} has no king on the board");
    }

    /// Returns `true` iff `square` is attacked by any piece of colour
    /// `by`, ignoring castling and en-passant.
    #[must_use]
    pub fn is_attacked(&self, square: Square, by: Colour) -> bool {
        for dir in movegen::templates::pawn_capture_directions(by) {
            let from = square.offset(crate::types::Direction::new(-dir.dx, -dir.dy));
            if from.in_bounds() {
                if let Some(piece) = self.piece_at(from) {
                    if piece.kind == PieceKind::Pawn && piece.colour == by {
                        return true;
                    }
                }
            }
        }
        for from in movegen::templates::knight_steps(square) {
            if let Some(piece) = self.piece_at(from) {
                if piece.kind == PieceKind::Knight && piece.colour == by {
                    return true;
                }
            }
        }
        for from in movegen::templates::king_steps(square) {
            if let Some(piece) = self.piece_at(from) {
                if piece.kind == PieceKind::King && piece.colour == by {
                    return true;
                }
            }
        }
        if self.ray_attacked(square, by, &movegen::templates::ROOK_RAYS, &[PieceKind::Rook, PieceKind::Queen]) {
            return true;
        }
        if self.ray_attacked(square, by, &movegen::templates::BISHOP_RAYS, &[PieceKind::Bishop, PieceKind::Queen]) {
            return true;
        }
        false
    }

    /// Walks each direction in `rays` from `square`, returning `true`
    /// if the first occupied square hit belongs to `by` and has a
    /// kind in `attacker_kinds`.
    fn ray_attacked(
        &self,
        square: Square,
        by: Colour,
        rays: &[crate::types::Direction],
        attacker_kinds: &[PieceKind],
    ) -> bool {
        for &dir in rays {
            let mut probe = square.offset(dir);
            while probe.in_bounds() {
                if let Some(piece) = self.piece_at(probe) {
                    if piece.colour == by && attacker_kinds.contains(&piece.kind) {
                        return true;
                    }
                    break;
                }
                probe = probe.offset(dir);
            }
        }
        false
    }

    /// Returns `true` iff `colour`'s king is currently attacked.
    #[must_use]
    pub fn in_check(&self, colour: Colour) -> bool {
        self.is_attacked(self.king_square(colour), colour.flip())
    }

    /// Returns every legal move for `colour`: pseudo-legal moves
    /// (`movegen::generate_pseudo_legal`) filtered to those that do
    /// not leave `colour`'s own king in check.
    #[must_use]
    pub fn legal_moves(&mut self, colour: Colour) -> Vec<Move> {
        let pseudo_legal: MoveList = movegen::generate_pseudo_legal(self, colour);
        let mut legal = Vec::with_capacity(pseudo_legal.len());
        for mv in pseudo_legal {
            self.apply(mv);
            let leaves_king_in_check = self.in_check(colour);
            self.undo(mv);
            if !leaves_king_in_check {
                legal.push(mv);
            }
        }
        legal
    }

    /// Returns how the game currently stands for the side to move.
    ///
    /// Repetition takes precedence over the fifty-move rule, which
    /// takes precedence over checkmate/stalemate detection.
    #[must_use]
    pub fn game_end(&mut self) -> GameEnd {
        if self.repetition_count(self.fingerprint()) >= REPETITION_LIMIT {
            return GameEnd::Repetition;
        }
        if self.halfmove_clock >= FIFTY_MOVE_PLY_LIMIT {
            return GameEnd::FiftyMove;
        }
        let side = self.side_to_move;
        if self.legal_moves(side).is_empty() {
            if self.in_check(side) {
                GameEnd::Checkmate
            } else {
                GameEnd::Stalemate
            }
        } else {
            GameEnd::None
        }
    }

    /// Applies `mv` to this position.
    ///
    /// `mv` is assumed to be at least pseudo-legal for the side to
    /// move, sourced from `movegen::generate_pseudo_legal` or a
    /// legal-move list derived from it — never an arbitrary,
    /// unchecked move. See [`crate::error::MoveError`] for the
    /// boundary where illegality is instead reported as a value.
    pub fn apply(&mut self, mv: Move) {
        let is_pawn_move = mv.piece.kind == PieceKind::Pawn;
        let is_capture = mv.captured.is_some();
        let new_halfmove_clock = if is_pawn_move || is_capture {
            0
        } else {
            self.halfmove_clock + 1
        };

        let mut eval_delta = 0;
        eval_delta -= evaluation::incremental_value(mv.piece, mv.from);

        let captured_square = match mv.kind {
            MoveKind::EnPassant => mv.secondary_from,
            _ => Some(mv.to),
        };
        if let (Some(captured), Some(square)) = (mv.captured, captured_square) {
            eval_delta -= evaluation::incremental_value(captured, square);
        }

        let moved_kind = mv.promo_to.unwrap_or(mv.piece.kind);
        let moved_piece = Piece {
            kind: moved_kind,
            colour: mv.piece.colour,
            has_moved: true,
        };
        eval_delta += evaluation::incremental_value(moved_piece, mv.to);

        self.set_square(mv.from, None);
        match mv.kind {
            MoveKind::EnPassant => {
                let captured_square = mv.secondary_from.expect("en passant always sets secondary_from");
                self.set_square(captured_square, None);
                self.set_square(mv.to, Some(moved_piece));
            }
            MoveKind::Castle => {
                let rook_from = mv.secondary_from.expect("castle always sets secondary_from");
                let rook_to = mv.secondary_to.expect("castle always sets secondary_to");
                let rook = self.piece_at(rook_from).expect("castling rook must be present");
                eval_delta -= evaluation::incremental_value(rook, rook_from);
                let moved_rook = Piece {
                    kind: PieceKind::Rook,
                    colour: rook.colour,
                    has_moved: true,
                };
                eval_delta += evaluation::incremental_value(moved_rook, rook_to);
                self.set_square(rook_from, None);
                self.set_square(rook_to, Some(moved_rook));
                self.set_square(mv.to, Some(moved_piece));
            }
            MoveKind::Quiet | MoveKind::Capture | MoveKind::Promotion => {
                self.set_square(mv.to, Some(moved_piece));
            }
        }

        self.undo_history.push(UndoFrame {
            previous_en_passant_target: self.en_passant_target,
            previous_halfmove_clock: self.halfmove_clock,
            eval_delta,
        });

        self.en_passant_target = (is_pawn_move && (mv.to.y - mv.from.y).abs() == 2)
            .then(|| Square::new(mv.from.x, (mv.from.y + mv.to.y) / 2));
        self.halfmove_clock = new_halfmove_clock;
        self.side_to_move = self.side_to_move.flip();
        self.turn += 1;
        self.eval_accumulator += eval_delta;

        let fingerprint = self.fingerprint();
        *self.position_counts.entry(fingerprint).or_insert(0) += 1;
    }

    /// Undoes `mv`, restoring the exact state before the matching
    /// `apply(mv)` call.
    ///
    /// # Panics
    ///
    /// Panics if there is no matching `apply` to undo — an internal
    /// invariant violation, since every `undo` call in this crate is
    /// paired with a preceding `apply` of the same move.
    pub fn undo(&mut self, mv: Move) {
        let fingerprint = self.fingerprint();
        if let Some(count) = self.position_counts.get_mut(&fingerprint) {
            *count -= 1;
            if *count == 0 {
                self.position_counts.remove(&fingerprint);
            }
        }

        let frame = self
            .undo_history
            .pop()
            .expect("invariant violation: undo() called with no matching apply()");

        self.turn -= 1;
        self.side_to_move = self.side_to_move.flip();
        self.halfmove_clock = frame.previous_halfmove_clock;
        self.en_passant_target = frame.previous_en_passant_target;
        self.eval_accumulator -= frame.eval_delta;

        match mv.kind {
            MoveKind::EnPassant => {
                let captured_square = mv.secondary_from.expect("en passant always sets secondary_from");
                self.set_square(mv.to, None);
                self.set_square(captured_square, mv.captured);
                self.set_square(mv.from, Some(mv.piece));
            }
            MoveKind::Castle => {
                let rook_from = mv.secondary_from.expect("castle always sets secondary_from");
                let rook_to = mv.secondary_to.expect("castle always sets secondary_to");
                self.set_square(rook_to, None);
                self.set_square(
                    rook_from,
                    Some(Piece {
                        kind: PieceKind::Rook,
                        colour: mv.piece.colour,
                        has_moved: false,
                    }),
                );
                self.set_square(mv.to, None);
                self.set_square(mv.from, Some(mv.piece));
            }
            MoveKind::Quiet | MoveKind::Capture | MoveKind::Promotion => {
                self.set_square(mv.to, mv.captured);
                self.set_square(mv.from, Some(mv.piece));
            }
        }
    }

    /// Writes `piece` onto `square`, replacing whatever was there.
    fn set_square(&mut self, square: Square, piece: Option<Piece>) {
        self.board[square.y as usize][square.x as usize] = piece;
    }

    /// Parses a FEN string into a [`Position`].
    ///
    /// Only the piece-placement and side-to-move fields are required;
    /// castling availability, en-passant target, halfmove clock, and
    /// fullmove number default to "none granted" / none / 0 / 1 when
    /// omitted, matching `-` in standard FEN.
    ///
    /// A castling letter grants the right only if the corresponding
    /// king and rook are both physically present and undisturbed by
    /// this parse; if a colour's FEN castling letters are both
    /// absent, that colour's king is recorded as having moved, since
    /// `hasMoved` (not a separate rights mask) is this crate's only
    /// record of castling eligibility.
    pub fn from_fen(fen: &str) -> Result<Self, crate::error::ParseError> {
        use crate::error::ParseError;

        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(ParseError::ExpectedToken)?;
        let side_to_move = match fields.next() {
            Some("w") | None => Colour::White,
            Some("b") => Colour::Black,
            Some(_) => return Err(ParseError::InvalidToken),
        };
        let castling = fields.next().unwrap_or("-");
        let en_passant = fields.next().unwrap_or("-");
        let halfmove_clock: u32 = fields
            .next()
            .unwrap_or("0")
            .parse()
            .map_err(|_err| ParseError::InvalidToken)?;
        let fullmove_number: u64 = fields
            .next()
            .unwrap_or("1")
            .parse()
            .map_err(|_err| ParseError::InvalidToken)?;

        let mut board: [[Option<Piece>; 8]; 8] = [[None; 8]; 8];
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 8 {
            return Err(ParseError::ErroneousToken);
        }
        for (y, row) in rows.iter().enumerate() {
            let mut x = 0usize;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    x += skip as usize;
                } else {
                    if x >= 8 {
                        return Err(ParseError::ErroneousToken);
                    }
                    let mut piece = Piece::from_char(c)?;
                    piece.has_moved = true;
                    board[y][x] = Some(piece);
                    x += 1;
                }
            }
            if x != 8 {
                return Err(ParseError::ErroneousToken);
            }
        }

        for (rank_char, file_char, colour) in [
            ('K', 'h', Colour::White),
            ('Q', 'a', Colour::White),
            ('k', 'h', Colour::Black),
            ('q', 'a', Colour::Black),
        ] {
            if castling.contains(rank_char) {
                let y = if colour == Colour::White { 7 } else { 0 };
                let x = if file_char == 'a' { 0 } else { 7 };
                if let Some(rook) = board[y][x].as_mut() {
                    if rook.kind == PieceKind::Rook && rook.colour == colour {
                        rook.has_moved = false;
                    }
                }
                let king_y = y;
                if let Some(king) = board[king_y][4].as_mut() {
                    if king.kind == PieceKind::King && king.colour == colour {
                        king.has_moved = false;
                    }
                }
            }
        }

        let en_passant_target = if en_passant == "-" {
            None
        } else {
            Some(en_passant.parse::<Square>()?)
        };

        let mut position = Self {
            board,
            side_to_move,
            en_passant_target,
            halfmove_clock,
            turn: fullmove_number.saturating_sub(1) * 2 + u64::from(side_to_move == Colour::Black),
            eval_accumulator: 0,
            position_counts: HashMap::new(),
            undo_history: Stack::new(),
        };
        position.eval_accumulator = evaluation::full_incremental_sum(&position);
        let fingerprint = position.fingerprint();
        position.position_counts.insert(fingerprint, 1);
        Ok(position)
    }

    /// Renders this position as FEN.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for y in 0..8 {
            let mut empty_run = 0u8;
            for x in 0..8 {
                match self.piece_at(Square::new(x, y)) {
                    None => empty_run += 1,
                    Some(piece) => {
                        if empty_run > 0 {
                            placement.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        placement.push(piece.to_char());
                    }
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if y != 7 {
                placement.push('/');
            }
        }

        let side = if self.side_to_move == Colour::White { "w" } else { "b" };

        let mut castling = String::new();
        for (letter, rook_square, king_square, colour) in [
            ('K', Square::new(7, 7), Square::new(4, 7), Colour::White),
            ('Q', Square::new(0, 7), Square::new(4, 7), Colour::White),
            ('k', Square::new(7, 0), Square::new(4, 0), Colour::Black),
            ('q', Square::new(0, 0), Square::new(4, 0), Colour::Black),
        ] {
            let has_right = self.piece_at(rook_square).is_some_and(|rook| {
                rook.kind == PieceKind::Rook && rook.colour == colour && !rook.has_moved
            }) && self
                .piece_at(king_square)
                .is_some_and(|king| king.kind == PieceKind::King && !king.has_moved);
            if has_right {
                castling.push(letter);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let en_passant = self
            .en_passant_target
            .map_or_else(|| "-".to_owned(), |sq| sq.to_string());

        let fullmove_number = self.turn / 2 + 1;

        format!("{placement} {side} {castling} {en_passant} {} {fullmove_number}", self.halfmove_clock)
    }
}

impl fmt::Display for Position {
    /// Pretty-prints the board as an 8x8 ASCII grid, White's pieces
    /// upper-case, rank 8 first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..8 {
            write!(f, "{} ", 8 - y)?;
            for x in 0..8 {
                let glyph = self.piece_at(Square::new(x, y)).map_or('.', Piece::to_char);
                write!(f, "{glyph} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_position_round_trips_to_fen() {
        let position = Position::new_position();
        assert_eq!(
            position.to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn apply_then_undo_restores_every_field() {
        let mut position = Position::new_position();
        let before_fen = position.to_fen();
        let before_eval = position.eval_accumulator();
        let mv = position.legal_moves(Colour::White)[0];
        position.apply(mv);
        assert_ne!(position.to_fen(), before_fen);
        position.undo(mv);
        assert_eq!(position.to_fen(), before_fen);
        assert_eq!(position.eval_accumulator(), before_eval);
    }

    #[test]
    fn starting_position_is_not_in_check() {
        let position = Position::new_position();
        assert!(!position.in_check(Colour::White));
        assert!(!position.in_check(Colour::Black));
    }

    #[test]
    fn starting_position_has_no_game_end() {
        let mut position = Position::new_position();
        assert_eq!(position.game_end(), GameEnd::None);
    }
}
