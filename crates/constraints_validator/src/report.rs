//! Verification results and their renderings.

use crate::Diagnostic;
use constraints_core::{ConstraintKind, ReportFilter};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Outcome of checking one constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Pass,
    Fail,
    /// No verifier exists for the kind
    Unknown,
}

impl Outcome {
    /// Marker used in text reports.
    pub fn marker(&self) -> &'static str {
        match self {
            Outcome::Pass => "✓",
            Outcome::Fail => "✗",
            Outcome::Unknown => "-",
        }
    }

    /// `Some(true)`, `Some(false)` or `None` for unknown.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Outcome::Pass => Some(true),
            Outcome::Fail => Some(false),
            Outcome::Unknown => None,
        }
    }
}

impl From<bool> for Outcome {
    fn from(passed: bool) -> Self {
        if passed { Outcome::Pass } else { Outcome::Fail }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bool().serialize(serializer)
    }
}

/// Outcomes for the constraints of one field (or field group).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldVerification {
    pub name: String,
    pub passes: usize,
    pub failures: usize,
    /// Outcome per kind, in canonical kind order
    pub outcomes: BTreeMap<ConstraintKind, Outcome>,
}

impl FieldVerification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passes: 0,
            failures: 0,
            outcomes: BTreeMap::new(),
        }
    }

    /// Records an outcome and updates the counts.
    pub fn record(&mut self, kind: ConstraintKind, outcome: Outcome) {
        if let Some(previous) = self.outcomes.insert(kind, outcome) {
            self.uncount(previous);
        }
        match outcome {
            Outcome::Pass => self.passes += 1,
            Outcome::Fail => self.failures += 1,
            Outcome::Unknown => {}
        }
    }

    fn uncount(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Pass => self.passes -= 1,
            Outcome::Fail => self.failures -= 1,
            Outcome::Unknown => {}
        }
    }

    pub fn outcome(&self, kind: ConstraintKind) -> Option<Outcome> {
        self.outcomes.get(&kind).copied()
    }

    pub fn passed(&self) -> bool {
        self.failures == 0
    }
}

/// Result of verifying a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationResult {
    /// Total passing constraints
    pub passes: usize,

    /// Total failing constraints
    pub failures: usize,

    /// Per-field outcomes, in constraint order
    pub fields: IndexMap<String, FieldVerification>,

    /// Diagnostics raised while verifying
    pub diagnostics: Vec<Diagnostic>,

    /// Fields shown by the `Display` rendering, from the run's options
    #[serde(skip)]
    pub filter: ReportFilter,
}

impl VerificationResult {
    /// Adds a field's outcomes to the totals.
    pub fn add_field(&mut self, field: FieldVerification) {
        if let Some(previous) = self.fields.get(&field.name) {
            self.passes -= previous.passes;
            self.failures -= previous.failures;
        }
        self.passes += field.passes;
        self.failures += field.failures;
        self.fields.insert(field.name.clone(), field);
    }

    pub fn field(&self, name: &str) -> Option<&FieldVerification> {
        self.fields.get(name)
    }

    /// True when no constraint failed.
    pub fn passed(&self) -> bool {
        self.failures == 0
    }

    /// Text view of the result, optionally limited to failing fields.
    ///
    /// `Display` uses the filter the result was verified with.
    pub fn report(&self, filter: ReportFilter) -> Report<'_> {
        Report {
            result: self,
            filter,
        }
    }

    /// Tabular form: one row per field, one column per kind encountered.
    pub fn to_table(&self) -> VerificationTable {
        let kinds: BTreeSet<ConstraintKind> = self
            .fields
            .values()
            .flat_map(|f| f.outcomes.keys().copied())
            .collect();
        let kinds: Vec<ConstraintKind> = kinds.into_iter().collect();

        let rows = self
            .fields
            .values()
            .map(|f| TableRow {
                field: f.name.clone(),
                failures: f.failures,
                passes: f.passes,
                outcomes: kinds.iter().map(|k| f.outcome(*k)).collect(),
            })
            .collect();

        VerificationTable { kinds, rows }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.report(self.filter), f)
    }
}

/// Text rendering of a [`VerificationResult`].
///
/// ```text
/// FIELDS:
///
/// age: 1 failure  4 passes  type ✓  min ✓  max ✗  sign ✓  max_nulls ✓
///
/// SUMMARY:
///
/// Constraints passing: 4
/// Constraints failing: 1
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Report<'r> {
    result: &'r VerificationResult,
    filter: ReportFilter,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FIELDS:")?;
        writeln!(f)?;
        for field in self.result.fields.values() {
            if self.filter == ReportFilter::Failing && field.passed() {
                continue;
            }
            write!(
                f,
                "{}: {}  {}",
                field.name,
                plural(field.failures, "failure", "failures"),
                plural(field.passes, "pass", "passes")
            )?;
            for (kind, outcome) in &field.outcomes {
                write!(f, "  {kind} {outcome}")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "SUMMARY:")?;
        writeln!(f)?;
        writeln!(f, "Constraints passing: {}", self.result.passes)?;
        writeln!(f, "Constraints failing: {}", self.result.failures)
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// Verification result as a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationTable {
    /// Kind columns, in canonical order
    pub kinds: Vec<ConstraintKind>,
    pub rows: Vec<TableRow>,
}

/// One row of a [`VerificationTable`]. `outcomes` lines up with `kinds`;
/// `None` where the field has no constraint of that kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub field: String,
    pub failures: usize,
    pub passes: usize,
    pub outcomes: Vec<Option<Outcome>>,
}

impl VerificationTable {
    /// Column headers: `field`, `failures`, `passes`, then one per kind.
    pub fn columns(&self) -> Vec<String> {
        ["field", "failures", "passes"]
            .into_iter()
            .map(String::from)
            .chain(self.kinds.iter().map(|k| k.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> VerificationResult {
        let mut age = FieldVerification::new("age");
        age.record(ConstraintKind::Max, Outcome::Fail);
        age.record(ConstraintKind::Type, Outcome::Pass);
        age.record(ConstraintKind::Min, Outcome::Pass);

        let mut name = FieldVerification::new("name");
        name.record(ConstraintKind::Type, Outcome::Pass);
        name.record(ConstraintKind::AllowedValues, Outcome::Pass);

        let mut span = FieldVerification::new("start:end");
        span.record(ConstraintKind::Lt, Outcome::Unknown);

        let mut result = VerificationResult::default();
        result.add_field(age);
        result.add_field(name);
        result.add_field(span);
        result
    }

    #[test]
    fn test_counts() {
        let result = sample();
        assert_eq!(result.passes, 4);
        assert_eq!(result.failures, 1);
        assert!(!result.passed());
        assert_eq!(result.field("age").unwrap().failures, 1);
    }

    #[test]
    fn test_record_replaces_outcome() {
        let mut field = FieldVerification::new("x");
        field.record(ConstraintKind::Min, Outcome::Fail);
        field.record(ConstraintKind::Min, Outcome::Pass);
        assert_eq!((field.passes, field.failures), (1, 0));
    }

    #[test]
    fn test_text_report() {
        let expected = "FIELDS:\n\
                        \n\
                        age: 1 failure  2 passes  type ✓  min ✓  max ✗\n\
                        name: 0 failures  2 passes  type ✓  allowed_values ✓\n\
                        start:end: 0 failures  0 passes  lt -\n\
                        \n\
                        SUMMARY:\n\
                        \n\
                        Constraints passing: 4\n\
                        Constraints failing: 1\n";
        assert_eq!(sample().to_string(), expected);
    }

    #[test]
    fn test_failing_only_report() {
        let text = sample().report(ReportFilter::Failing).to_string();
        assert!(text.contains("age: 1 failure"));
        assert!(!text.contains("name:"));
        assert!(text.contains("Constraints passing: 4"));
    }

    #[test]
    fn test_table() {
        let table = sample().to_table();
        assert_eq!(
            table.columns(),
            vec![
                "field",
                "failures",
                "passes",
                "type",
                "min",
                "max",
                "allowed_values",
                "lt"
            ]
        );
        assert_eq!(
            table.rows[1].outcomes,
            vec![Some(Outcome::Pass), None, None, Some(Outcome::Pass), None]
        );
    }

    #[test]
    fn test_json_outcomes_are_tri_state() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["fields"]["age"]["outcomes"]["max"], serde_json::json!(false));
        assert_eq!(json["fields"]["age"]["outcomes"]["type"], serde_json::json!(true));
        assert_eq!(
            json["fields"]["start:end"]["outcomes"]["lt"],
            serde_json::Value::Null
        );
    }
}
