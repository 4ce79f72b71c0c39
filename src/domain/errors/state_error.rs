//! Load state and source set errors.

use thiserror::Error;

use crate::domain::entities::LoadPhase;

/// Attempted phase change that the transition table forbids.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("illegal load transition {from} -> {to}")]
pub struct TransitionError {
    /// Phase the state was in.
    pub from: LoadPhase,
    /// Phase that was requested.
    pub to: LoadPhase,
}

impl TransitionError {
    /// Creates a transition error.
    #[must_use]
    pub const fn new(from: LoadPhase, to: LoadPhase) -> Self {
        Self { from, to }
    }
}

/// A source set that cannot be rendered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceSetError {
    /// The ultimate fallback URL is blank.
    #[error("source set has no original url")]
    MissingOriginal,
}
