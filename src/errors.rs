//! Unified error types for budget phase handling.
//!
//! Validation failures are field-scoped and meant to be shown to the administrator
//! who submitted the record. `InvalidKind` and `CorruptPhaseChain` signal data
//! integrity problems and are meant for logs, not end users.

use crate::core::validation::ValidationErrors;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A record failed validation and was not persisted
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A phase kind outside the closed catalog was requested
    #[error("Invalid phase kind: {kind}")]
    InvalidKind {
        /// The rejected kind name
        kind: String,
    },

    /// The `next_phase` links of a budget do not form a usable chain
    #[error("Corrupt phase chain in budget {budget_id}: {reason}")]
    CorruptPhaseChain {
        /// Budget owning the chain (0 when not yet persisted)
        budget_id: i64,
        /// What was wrong with the chain
        reason: String,
    },

    /// Budget lookup failed
    #[error("Budget not found: {id}")]
    BudgetNotFound {
        /// Requested budget id
        id: i64,
    },

    /// Phase lookup failed
    #[error("Phase {kind} not found in budget {budget_id}")]
    PhaseNotFound {
        /// Budget that was searched
        budget_id: i64,
        /// Requested kind
        kind: String,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
    },

    /// Storage layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
