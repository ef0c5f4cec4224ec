//! Top-level execution errors

use crate::validation::ValidationError;

/// Errors that end a scheduler run before or outside normal node flow
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The graph failed validation; nothing was executed
    #[error("Graph validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ValidationError>),

    /// A scheduler invariant was violated; the run ended immediately
    #[error("Scheduler invariant violated: {0}")]
    Internal(String),
}

impl ExecuteError {
    /// The validation errors behind an `Invalid` rejection
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Invalid(errors) => errors,
            Self::Internal(_) => &[],
        }
    }
}
