//! Diagnostics raised during verification.
//!
//! A diagnostic never aborts a run: the constraint it concerns is counted as
//! a failure and verification moves on to the next one.

use constraints_core::ConstraintKind;
use serde::Serialize;
use thiserror::Error;

/// Something worth reporting about a failed constraint beyond its outcome.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A bound and the column it was compared with have different coarse types
    #[error("Type mismatch for '{kind}' on field '{field}': expected {expected}, found {actual}")]
    TypeMismatch {
        field: String,
        kind: ConstraintKind,
        expected: String,
        actual: String,
    },

    /// A constrained field is absent from the dataset
    #[error("Field '{field}' is constrained but missing from the dataset")]
    MissingField { field: String },
}

impl Diagnostic {
    /// Creates a new type mismatch diagnostic.
    pub fn type_mismatch(
        field: impl Into<String>,
        kind: ConstraintKind,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            kind,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new missing field diagnostic.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Field the diagnostic is about.
    pub fn field(&self) -> &str {
        match self {
            Diagnostic::TypeMismatch { field, .. } | Diagnostic::MissingField { field } => field,
        }
    }
}
