//! Error type of the record services

use crate::validation::ValidationErrors;

/// Error types for record service operations
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// One or more rules failed; nothing was written
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Lookup by identity found no row
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The store or its driver failed
    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl RecordError {
    /// Validation errors, if this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ValidationErrors> for RecordError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
