//! Error types for the constraint model.
//!
//! Constraints are validated when they are built; an illegal combination of
//! kind, value and extras is rejected here rather than coerced.

use thiserror::Error;

/// Result type for constraint model operations.
pub type Result<T> = std::result::Result<T, ConstraintError>;

/// Main error type for constraint model operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    /// Illegal kind/value/extra combination
    #[error("Invalid constraint specification for '{kind}': {message}")]
    InvalidConstraintSpecification {
        /// Constraint kind being built
        kind: String,
        /// What was wrong with it
        message: String,
    },

    /// Constraint kind outside the known vocabulary
    #[error("Unknown constraint kind: {0}")]
    UnknownKind(String),

    /// Type name outside the classifier's vocabulary
    #[error("Unknown data type: {0}")]
    UnknownType(String),

    /// Sign name outside the sign vocabulary
    #[error("Unknown sign: {0}")]
    UnknownSign(String),

    /// Precision name outside the precision vocabulary
    #[error("Unknown precision: {0}")]
    UnknownPrecision(String),

    /// Dataset shape is inconsistent
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
}

impl ConstraintError {
    /// Creates a new invalid specification error.
    pub fn invalid(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConstraintSpecification {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
