use std::fmt::{self, Display, Formatter};

/// An error that occurs when a string (FEN, algebraic notation) cannot
/// be parsed.
#[allow(clippy::enum_variant_names)]
#[derive(Debug)]
pub enum ParseError {
    /// A token was outside an expected range.
    ErroneousToken,
    /// Expected a token but found nothing.
    ExpectedToken,
    /// Expected a different token.
    InvalidToken,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::ErroneousToken => "a token was outside the expected range",
            Self::ExpectedToken => "expected a token but found nothing",
            Self::InvalidToken => "expected a different token",
        };
        write!(f, "{message}")
    }
}

impl std::error::Error for ParseError {}

/// An error returned when a caller asks [`crate::position::Position`]
/// to apply a move that is not legal in the current position.
///
/// This is the only boundary at which illegality is reported through a
/// [`Result`] rather than a host-facing enum: [`crate::engine::Engine`]
/// never constructs a [`MoveError`] itself, since
/// [`Engine::attempt_move`](crate::engine::Engine::attempt_move) checks
/// legality up front and reports the outcome through
/// [`crate::engine::AttemptResult`]. Everywhere else in this crate, a
/// [`Move`](crate::movegen::Move) handed to
/// [`Position::apply`](crate::position::Position::apply) is assumed to
/// have come from [`crate::movegen`] itself (search, perft, tests); an
/// illegal move reaching `apply` there is an internal invariant
/// violation, not user error, and is a `debug_assert!` panic instead.
#[derive(Debug)]
pub struct MoveError;

impl Display for MoveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "the given move is not legal in this position")
    }
}

impl std::error::Error for MoveError {}
