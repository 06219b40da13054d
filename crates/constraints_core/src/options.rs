//! Options for verification runs.
//!
//! Mirrors the knobs exposed on the command line: fuzzy tolerance, the
//! type-checking mode and which fields a report shows.

use serde::{Deserialize, Serialize};

/// Default relative tolerance for fuzzy bounds (1%).
pub const DEFAULT_EPSILON: f64 = 0.01;

/// How strictly `type` constraints are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeChecking {
    /// The classified type must be one of the allowed types
    Strict,
    /// Also accept storage-induced promotions (int stored as real, bool
    /// stored as string)
    #[default]
    Sloppy,
}

/// Which fields a rendered report includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFilter {
    /// Every verified field
    #[default]
    All,
    /// Only fields with at least one failing constraint
    Failing,
}

/// Options for a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationOptions {
    /// Relative tolerance applied to fuzzy `min`/`max` bounds
    pub epsilon: f64,

    /// Type-checking mode
    pub type_checking: TypeChecking,

    /// Report filter
    pub report: ReportFilter,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            type_checking: TypeChecking::default(),
            report: ReportFilter::default(),
        }
    }
}

impl VerificationOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fuzzy tolerance.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the type-checking mode.
    pub fn with_type_checking(mut self, type_checking: TypeChecking) -> Self {
        self.type_checking = type_checking;
        self
    }

    /// Sets the report filter.
    pub fn with_report(mut self, report: ReportFilter) -> Self {
        self.report = report;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = VerificationOptions::new();
        assert_eq!(options.epsilon, 0.01);
        assert_eq!(options.type_checking, TypeChecking::Sloppy);
        assert_eq!(options.report, ReportFilter::All);
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let options: VerificationOptions =
            serde_json::from_str(r#"{"type_checking": "strict"}"#).unwrap();
        assert_eq!(options.type_checking, TypeChecking::Strict);
        assert_eq!(options.epsilon, DEFAULT_EPSILON);
    }
}
