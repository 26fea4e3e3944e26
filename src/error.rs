//! Error taxonomy for theory construction and queries

use crate::level::Coord;
use thiserror::Error;

/// Errors produced while building or querying a theory
#[derive(Debug, Error)]
pub enum TheoryError {
    /// The level description failed ingestion checks; no theory was built
    #[error("malformed level: {0}")]
    MalformedLevel(#[from] LevelError),

    /// A proposition was looked up that the registry never created
    #[error("unknown proposition: {0}")]
    UnknownProposition(String),

    /// A query that needs a witness was run against an unsatisfiable theory
    #[error("theory is unsatisfiable")]
    UnsatisfiableTheory,

    /// A SAT or counting delegate failed
    #[error("{engine} delegate failed: {reason}")]
    DelegateFailure { engine: &'static str, reason: String },

    /// Likelihood was requested while the unconditioned theory has no models
    #[error("likelihood is undefined: the theory has no models")]
    DivideByZeroLikelihood,
}

impl TheoryError {
    pub(crate) fn delegate(engine: &'static str, reason: impl Into<String>) -> Self {
        TheoryError::DelegateFailure {
            engine,
            reason: reason.into(),
        }
    }
}

/// Reasons a level description is rejected at ingestion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("there must be exactly one entrance (found {0})")]
    EntranceCount(usize),

    #[error("there must be exactly one exit (found {0})")]
    ExitCount(usize),

    #[error("{what} at {coord} lies outside the {cols}x{rows} grid")]
    OutOfBounds {
        what: &'static str,
        coord: Coord,
        cols: usize,
        rows: usize,
    },

    #[error("{what} at {coord} has color {color}, but the level has {color_count} colors")]
    ColorOutOfRange {
        what: &'static str,
        coord: Coord,
        color: usize,
        color_count: usize,
    },

    #[error("more than one entity occupies {0}")]
    Overlap(Coord),
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, TheoryError>;
