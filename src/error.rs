//! Error taxonomy for the evolutionary engine.
//!
//! Three failure classes exist and none of them is retried:
//!
//! - [`EvolveError::Configuration`]: rejected before any generation runs
//!   (bad shapes, zero sizes, gene-type mismatches, invalid limits).
//! - [`EvolveError::Evaluation`]: the user's fitness function failed. The
//!   engine never substitutes a default score.
//! - [`EvolveError::Invariant`]: an internal defect, e.g. an operator produced
//!   a chromosome of the wrong length.

use thiserror::Error;

/// Error returned by user fitness functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FitnessError(pub String);

impl FitnessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for FitnessError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for FitnessError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Errors raised by the engine and its components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolveError {
    /// Invalid configuration, detected before the run starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The fitness function failed for the individual at `index`
    /// (position within the evaluated population).
    #[error("evaluation of individual {index} failed: {source}")]
    Evaluation {
        index: usize,
        #[source]
        source: FitnessError,
    },

    /// A structural invariant was broken at runtime.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl EvolveError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        EvolveError::Configuration(message.into())
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        EvolveError::Invariant(message.into())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EvolveError>;
