//! Error types shared across the prediction engine.
//!
//! Every failure here is synchronous and local: the engine is pure, so a
//! failed call leaves nothing to roll back, and retrying with the same input
//! reproduces the same error.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type TideResult<T> = Result<T, TideError>;

/// Errors produced by the tidal prediction engine.
#[derive(Error, Debug)]
pub enum TideError {
    /// Unparseable or out-of-domain input (bad date string, NaN lunar age).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A harmonic-constant list was empty where at least one entry is required.
    #[error("harmonic constant list is empty")]
    EmptyConstituents,

    /// An unrecognized constituent name was passed to a top-level lookup.
    ///
    /// Unknown names embedded in a constant list handed to synthesis are
    /// skipped with a warning instead; only direct lookups reject.
    #[error("unknown tidal constituent '{0}'")]
    UnknownConstituent(String),

    /// Extremum search was asked for a window with `end <= start`.
    #[error("invalid search range: end must be after start")]
    InvalidRange,

    /// A non-positive (or NaN) normalized moon-distance factor.
    #[error("invalid moon distance factor {0}: must be positive")]
    InvalidDistanceFactor(f64),
}
