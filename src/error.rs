use thiserror::Error;

/// Errors raised while parsing a single card or hand notation (C1).
///
/// These are kept distinct from [`SolveError`] so that unit tests on
/// `parse_card`/`Range::from_str` can match on the narrow type directly;
/// `solve()` wraps them into [`SolveError`] at the crate boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BadCard {
    #[error("invalid card string `{0}` (expected two characters, e.g. \"As\")")]
    Malformed(String),
    #[error("invalid rank character `{0}`")]
    BadRank(char),
    #[error("invalid suit character `{0}`")]
    BadSuit(char),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BadNotation {
    #[error("invalid hand notation `{0}`")]
    Malformed(String),
    #[error("pair notation `{0}` must use two equal ranks with no suffix")]
    BadPair(String),
    #[error("invalid rank character `{0}` in notation")]
    BadRank(char),
}

/// Top-level failure taxonomy for the solver entry point (spec §7).
///
/// `Cancelled` is deliberately absent: cancellation is surfaced as a
/// `status` field on an otherwise well-formed [`crate::solver::SolverResult`],
/// never as an `Err`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("bad card: {0}")]
    BadCard(#[from] BadCard),

    #[error("bad notation: {0}")]
    BadNotation(#[from] BadNotation),

    #[error("bad board: {0}")]
    BadBoard(String),

    #[error("empty range: {0}")]
    EmptyRange(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = SolveError> = std::result::Result<T, E>;
