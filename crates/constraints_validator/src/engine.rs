//! Main verification engine.
//!
//! This module provides the `ConstraintVerifier` that checks every constraint
//! of a `DatasetConstraints` against a dataset and builds a
//! `VerificationResult`.

use crate::cache::{StatValue, Statistic, StatisticCache};
use crate::fuzzy::{fuzzy_greater_than, fuzzy_less_than};
use crate::{Diagnostic, FieldVerification, Outcome, VerificationResult};
use constraints_core::{
    Column, Constraint, ConstraintKind, DataSet, DataType, DataValue, DatasetConstraints,
    FieldConstraints, Precision, Sign, TypeChecking, ValueKey, VerificationOptions, coarse_type,
    parse_date, types_compatible,
};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, info};

/// A per-kind verifier: returns whether the constraint holds for the column.
pub type VerifyFn<'a> = fn(&mut ConstraintVerifier<'a>, &Column, &Constraint) -> bool;

/// Verifies constraints against one dataset.
///
/// The verifier owns a statistic cache for its dataset, so statistics shared
/// by several constraints (`min` for `min` and `sign`, say) are computed once.
///
/// # Example
///
/// ```rust
/// use constraints_core::{Column, DataSet, DataType, FieldConstraintsBuilder, ConstraintsBuilder, VerificationOptions};
/// use constraints_validator::ConstraintVerifier;
///
/// let dataset = DataSet::from_columns([Column::new("age", [31, 47, 25])]).unwrap();
/// let constraints = ConstraintsBuilder::new()
///     .field(FieldConstraintsBuilder::new("age").data_type(DataType::Int).min(18).build().unwrap())
///     .build();
///
/// let mut verifier = ConstraintVerifier::new(&dataset, VerificationOptions::default());
/// let result = verifier.verify(&constraints);
///
/// assert!(result.passed());
/// assert_eq!(result.passes, 2);
/// ```
#[derive(Debug)]
pub struct ConstraintVerifier<'a> {
    dataset: &'a DataSet,
    options: VerificationOptions,
    cache: StatisticCache,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ConstraintVerifier<'a> {
    /// Creates a verifier for a dataset.
    pub fn new(dataset: &'a DataSet, options: VerificationOptions) -> Self {
        Self {
            dataset,
            options,
            cache: StatisticCache::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn options(&self) -> &VerificationOptions {
        &self.options
    }

    pub fn cache(&self) -> &StatisticCache {
        &self.cache
    }

    /// Mutable access to the cache, e.g. to preload or override statistics.
    pub fn cache_mut(&mut self) -> &mut StatisticCache {
        &mut self.cache
    }

    /// Verifies every constraint and returns the result.
    ///
    /// Fields are reported in the order of `constraints`, followed by any
    /// multi-field groups, whose kinds have no verifier and come out as
    /// `unknown`.
    pub fn verify(&mut self, constraints: &DatasetConstraints) -> VerificationResult {
        let mut result = VerificationResult {
            filter: self.options.report,
            ..VerificationResult::default()
        };

        for field in constraints.fields() {
            result.add_field(self.verify_field(field));
        }

        for group in constraints.field_groups() {
            let mut verification = FieldVerification::new(group.key());
            for constraint in group.iter() {
                verification.record(constraint.kind(), Outcome::Unknown);
            }
            result.add_field(verification);
        }

        result.diagnostics = std::mem::take(&mut self.diagnostics);

        info!(
            "Verification finished: {} passing, {} failing",
            result.passes, result.failures
        );
        result
    }

    /// Verifies the constraints of a single field.
    pub fn verify_field(&mut self, field: &FieldConstraints) -> FieldVerification {
        let mut verification = FieldVerification::new(field.name());
        let dataset = self.dataset;

        let Some(column) = dataset.column(field.name()) else {
            debug!("Field '{}' is missing from the dataset", field.name());
            self.diagnostics.push(Diagnostic::missing_field(field.name()));
            for constraint in field.iter() {
                let outcome = match Self::verifier_for(constraint.kind()) {
                    None => Outcome::Unknown,
                    Some(_) if !constraint.is_active() => Outcome::Pass,
                    Some(_) => Outcome::Fail,
                };
                verification.record(constraint.kind(), outcome);
            }
            return verification;
        };

        for constraint in field.iter() {
            let outcome = self.verify_constraint(column, constraint);
            debug!(
                "{}.{} = {:?}: {}",
                field.name(),
                constraint.kind(),
                constraint.value(),
                outcome
            );
            verification.record(constraint.kind(), outcome);
        }
        verification
    }

    /// Verifies one constraint against a column.
    pub fn verify_constraint(&mut self, column: &Column, constraint: &Constraint) -> Outcome {
        let Some(verifier) = Self::verifier_for(constraint.kind()) else {
            return Outcome::Unknown;
        };
        if !constraint.is_active() {
            return Outcome::Pass;
        }
        Outcome::from(verifier(self, column, constraint))
    }

    /// Static dispatch from kind to verifier. Multi-field kinds have none.
    pub fn verifier_for(kind: ConstraintKind) -> Option<VerifyFn<'a>> {
        let verifier: VerifyFn<'a> = match kind {
            ConstraintKind::Type => Self::verify_type,
            ConstraintKind::Min => Self::verify_min,
            ConstraintKind::Max => Self::verify_max,
            ConstraintKind::MinLength => Self::verify_min_length,
            ConstraintKind::MaxLength => Self::verify_max_length,
            ConstraintKind::Sign => Self::verify_sign,
            ConstraintKind::MaxNulls => Self::verify_max_nulls,
            ConstraintKind::NoDuplicates => Self::verify_no_duplicates,
            ConstraintKind::AllowedValues => Self::verify_allowed_values,
            ConstraintKind::Lt
            | ConstraintKind::Lte
            | ConstraintKind::Eq
            | ConstraintKind::Gt
            | ConstraintKind::Gte => return None,
        };
        Some(verifier)
    }

    fn non_null_count(&mut self, column: &Column) -> usize {
        let nulls = self
            .cache
            .count(column, Statistic::NullCount)
            .unwrap_or_else(|| column.null_count());
        column.len().saturating_sub(nulls)
    }

    fn verify_type(&mut self, column: &Column, constraint: &Constraint) -> bool {
        if self.non_null_count(column) == 0 {
            return true;
        }
        let Some(allowed) = constraint.allowed_types() else {
            return false;
        };
        let actual = self.cache.data_type(column);
        if allowed.contains(&actual) {
            return true;
        }
        if self.options.type_checking == TypeChecking::Strict {
            return false;
        }
        (allowed.contains(&DataType::Int)
            && actual == DataType::Real
            && self.cache.count(column, Statistic::NonIntegerCount) == Some(0))
            || (allowed.contains(&DataType::Bool)
                && actual == DataType::String
                && self.cache.flag(column, Statistic::AllNonNullBoolean))
    }

    fn verify_min(&mut self, column: &Column, constraint: &Constraint) -> bool {
        self.verify_bound(column, constraint, Statistic::Min)
    }

    fn verify_max(&mut self, column: &Column, constraint: &Constraint) -> bool {
        self.verify_bound(column, constraint, Statistic::Max)
    }

    fn verify_bound(&mut self, column: &Column, constraint: &Constraint, stat: Statistic) -> bool {
        if self.non_null_count(column) == 0 {
            return true;
        }
        let (Some(actual), Some(bound)) = (self.cache.value(column, stat), constraint.scalar())
        else {
            return false;
        };
        let bound = coerce_bound(bound, &actual);

        if !types_compatible(&actual, &bound) {
            self.diagnostics.push(Diagnostic::type_mismatch(
                column.name(),
                constraint.kind(),
                coarse_type(&bound).to_string(),
                coarse_type(&actual).to_string(),
            ));
            return false;
        }

        let lower = stat == Statistic::Min;
        match constraint.precision() {
            Precision::Fuzzy => match (actual.as_f64(), bound.as_f64()) {
                (Some(a), Some(b)) if lower => fuzzy_greater_than(a, b, self.options.epsilon),
                (Some(a), Some(b)) => fuzzy_less_than(a, b, self.options.epsilon),
                _ => within(&actual, &bound, lower, true),
            },
            Precision::Closed => within(&actual, &bound, lower, true),
            Precision::Open => within(&actual, &bound, lower, false),
        }
    }

    fn verify_min_length(&mut self, column: &Column, constraint: &Constraint) -> bool {
        self.verify_length(column, constraint, Statistic::MinLength)
    }

    fn verify_max_length(&mut self, column: &Column, constraint: &Constraint) -> bool {
        self.verify_length(column, constraint, Statistic::MaxLength)
    }

    fn verify_length(&mut self, column: &Column, constraint: &Constraint, stat: Statistic) -> bool {
        if self.non_null_count(column) == 0 {
            return true;
        }
        let Some(bound) = constraint.count() else {
            return false;
        };
        match self.cache.length(column, stat) {
            Some(len) if stat == Statistic::MinLength => len >= bound,
            Some(len) => len <= bound,
            None => {
                let actual = self.cache.data_type(column);
                self.diagnostics.push(Diagnostic::type_mismatch(
                    column.name(),
                    constraint.kind(),
                    "string",
                    actual.to_string(),
                ));
                false
            }
        }
    }

    fn verify_sign(&mut self, column: &Column, constraint: &Constraint) -> bool {
        let Some(sign) = constraint.sign_value() else {
            return false;
        };
        let any_values = self.non_null_count(column) > 0;
        if sign == Sign::Null {
            return !any_values;
        }
        if !any_values {
            return true;
        }

        let min = self.cache.value(column, Statistic::Min);
        let max = self.cache.value(column, Statistic::Max);
        let (Some(min), Some(max)) = (
            min.as_ref().and_then(DataValue::as_f64),
            max.as_ref().and_then(DataValue::as_f64),
        ) else {
            return false;
        };
        match sign {
            Sign::Positive => min > 0.0,
            Sign::NonNegative => min >= 0.0,
            Sign::Zero => min == 0.0 && max == 0.0,
            Sign::NonPositive => max <= 0.0,
            Sign::Negative => max < 0.0,
            Sign::Null => false,
        }
    }

    fn verify_max_nulls(&mut self, column: &Column, constraint: &Constraint) -> bool {
        let Some(limit) = constraint.count() else {
            return false;
        };
        self.cache
            .count(column, Statistic::NullCount)
            .is_some_and(|nulls| nulls <= limit)
    }

    fn verify_no_duplicates(&mut self, column: &Column, constraint: &Constraint) -> bool {
        let non_null = self.non_null_count(column);
        if non_null == 0 || constraint.flag() == Some(false) {
            return true;
        }
        self.cache.count(column, Statistic::DistinctCount) == Some(non_null)
    }

    fn verify_allowed_values(&mut self, column: &Column, constraint: &Constraint) -> bool {
        if self.non_null_count(column) == 0 {
            return true;
        }
        let Some(allowed) = constraint.values() else {
            return false;
        };
        if self
            .cache
            .count(column, Statistic::DistinctCount)
            .is_some_and(|n| n > allowed.len())
        {
            return false;
        }
        let allowed: HashSet<ValueKey> = allowed.iter().filter_map(DataValue::key).collect();
        match self.cache.get_or_compute(column, Statistic::DistinctValues) {
            StatValue::Values(values) => values
                .iter()
                .all(|v| v.key().is_some_and(|k| allowed.contains(&k))),
            _ => false,
        }
    }
}

/// Compares a column extreme with a bound. `lower` selects `>=`/`>` over
/// `<=`/`<`; `inclusive` selects the closed form.
fn within(actual: &DataValue, bound: &DataValue, lower: bool, inclusive: bool) -> bool {
    match (actual.compare(bound), lower, inclusive) {
        (Some(Ordering::Equal), _, inclusive) => inclusive,
        (Some(Ordering::Greater), lower, _) => lower,
        (Some(Ordering::Less), lower, _) => !lower,
        (None, _, _) => false,
    }
}

/// Reads a string bound as a date when the column holds dates.
fn coerce_bound(bound: &DataValue, actual: &DataValue) -> DataValue {
    match (bound, actual) {
        (DataValue::String(s), DataValue::Date(_)) => parse_date(s)
            .map(DataValue::Date)
            .unwrap_or_else(|| bound.clone()),
        _ => bound.clone(),
    }
}

/// Verifies a dataset against constraints with a fresh verifier.
///
/// # Example
///
/// ```rust
/// use constraints_core::{Column, DataSet, VerificationOptions};
/// use constraints_validator::{discover, verify};
///
/// let reference = DataSet::from_columns([Column::new("i", [1, 2, 3, 4])]).unwrap();
/// let constraints = discover(&reference).unwrap().unwrap();
///
/// let drifted = DataSet::from_columns([Column::new("i", [1, 2, 2, 6])]).unwrap();
/// let result = verify(&drifted, &constraints, VerificationOptions::default());
///
/// assert!(!result.passed());
/// assert_eq!(result.failures, 2);
/// ```
pub fn verify(
    dataset: &DataSet,
    constraints: &DatasetConstraints,
    options: VerificationOptions,
) -> VerificationResult {
    ConstraintVerifier::new(dataset, options).verify(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use constraints_core::{DEFAULT_EPSILON, FieldConstraintsBuilder, ReportFilter};
    use pretty_assertions::assert_eq;

    fn check(column: Column, constraint: Constraint) -> Outcome {
        let dataset = DataSet::from_columns([column.clone()]).unwrap();
        let mut verifier = ConstraintVerifier::new(&dataset, VerificationOptions::default());
        verifier.verify_constraint(&column, &constraint)
    }

    #[test]
    fn test_dispatch_covers_single_field_kinds() {
        for kind in ConstraintKind::STANDARD {
            assert!(ConstraintVerifier::verifier_for(kind).is_some(), "{kind}");
        }
        for kind in ConstraintKind::MULTI_FIELD {
            assert!(ConstraintVerifier::verifier_for(kind).is_none(), "{kind}");
        }
    }

    #[test]
    fn test_bound_precision() {
        let col = Column::new("x", [10, 20, 30]);
        let min = |v: i64, p: Precision| Constraint::min(v).unwrap().with_precision(p).unwrap();

        assert_eq!(check(col.clone(), min(10, Precision::Closed)), Outcome::Pass);
        assert_eq!(check(col.clone(), min(10, Precision::Open)), Outcome::Fail);
        assert_eq!(check(col.clone(), min(9, Precision::Open)), Outcome::Pass);
        assert_eq!(check(col.clone(), min(11, Precision::Closed)), Outcome::Fail);

        let max = Constraint::max(29.8).unwrap();
        assert_eq!(check(col.clone(), max.clone()), Outcome::Fail);
        let fuzzy = max.with_precision(Precision::Fuzzy).unwrap();
        assert_eq!(check(col, fuzzy), Outcome::Pass);
    }

    #[test]
    fn test_fuzzy_uses_configured_epsilon() {
        let dataset = DataSet::from_columns([Column::new("x", [95.0])]).unwrap();
        let column = dataset.column("x").unwrap();
        let min = Constraint::min(100.0)
            .unwrap()
            .with_precision(Precision::Fuzzy)
            .unwrap();

        let mut default = ConstraintVerifier::new(&dataset, VerificationOptions::default());
        assert_eq!(default.options().epsilon, DEFAULT_EPSILON);
        assert_eq!(default.verify_constraint(column, &min), Outcome::Fail);

        let mut loose =
            ConstraintVerifier::new(&dataset, VerificationOptions::new().with_epsilon(0.1));
        assert_eq!(loose.verify_constraint(column, &min), Outcome::Pass);
    }

    #[test]
    fn test_open_max() {
        let col = Column::new("x", [10, 20, 30]);
        let max = |v: i64, p: Precision| Constraint::max(v).unwrap().with_precision(p).unwrap();

        assert_eq!(check(col.clone(), max(30, Precision::Closed)), Outcome::Pass);
        assert_eq!(check(col.clone(), max(30, Precision::Open)), Outcome::Fail);
        assert_eq!(check(col, max(31, Precision::Open)), Outcome::Pass);
    }

    #[test]
    fn test_fuzzy_negative_min() {
        // fuzz_down(-100) widens the bound to -101
        let min = Constraint::min(-100.0)
            .unwrap()
            .with_precision(Precision::Fuzzy)
            .unwrap();
        let closed = Constraint::min(-100.0).unwrap();

        let near = Column::new("x", [-100.5, -50.0]);
        assert_eq!(check(near.clone(), closed), Outcome::Fail);
        assert_eq!(check(near, min.clone()), Outcome::Pass);

        let far = Column::new("x", [-102.0, -50.0]);
        assert_eq!(check(far, min), Outcome::Fail);
    }

    #[test]
    fn test_result_renders_with_configured_filter() {
        let dataset = DataSet::from_columns([
            Column::new("ok", [1, 2]),
            Column::new("bad", [1, 1]),
        ])
        .unwrap();
        let constraints = constraints_core::ConstraintsBuilder::new()
            .field(FieldConstraintsBuilder::new("ok").min(1).build().unwrap())
            .field(
                FieldConstraintsBuilder::new("bad")
                    .no_duplicates(true)
                    .build()
                    .unwrap(),
            )
            .build();

        let all = verify(&dataset, &constraints, VerificationOptions::default());
        assert_eq!(all.filter, ReportFilter::All);
        assert!(all.to_string().contains("ok: 0 failures"));

        let failing = verify(
            &dataset,
            &constraints,
            VerificationOptions::new().with_report(ReportFilter::Failing),
        );
        assert_eq!(failing.filter, ReportFilter::Failing);
        let text = failing.to_string();
        assert!(!text.contains("ok:"));
        assert!(text.contains("bad: 1 failure"));
    }

    #[test]
    fn test_incompatible_bound_is_a_diagnosed_failure() {
        let dataset = DataSet::from_columns([Column::new("x", [1, 2])]).unwrap();
        let constraints = constraints_core::ConstraintsBuilder::new()
            .field(FieldConstraintsBuilder::new("x").min("a").build().unwrap())
            .build();
        let result = verify(&dataset, &constraints, VerificationOptions::default());

        assert_eq!(result.failures, 1);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::type_mismatch("x", ConstraintKind::Min, "string", "number")]
        );
    }

    #[test]
    fn test_date_bound_given_as_string() {
        let when = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let col = Column::new("d", [when]);
        assert_eq!(
            check(col.clone(), Constraint::min("2024-05-01 00:00:00").unwrap()),
            Outcome::Pass
        );
        assert_eq!(
            check(col, Constraint::max("2024-05-01").unwrap()),
            Outcome::Fail
        );
    }

    #[test]
    fn test_sloppy_type_rules() {
        let promoted = Column::new("i", [Some(1.0), None, Some(3.0)]);
        let strict = VerificationOptions::new().with_type_checking(TypeChecking::Strict);
        let int = Constraint::data_type(DataType::Int);

        assert_eq!(check(promoted.clone(), int.clone()), Outcome::Pass);
        let dataset = DataSet::from_columns([promoted.clone()]).unwrap();
        let mut verifier = ConstraintVerifier::new(&dataset, strict);
        assert_eq!(verifier.verify_constraint(&promoted, &int), Outcome::Fail);

        let fractional = Column::new("r", [1.5, 3.0]);
        assert_eq!(check(fractional, int), Outcome::Fail);

        let bools = Column::new("b", [Some(true), None, Some(false)])
            .with_declared_type(DataType::String);
        assert_eq!(
            check(bools, Constraint::data_type(DataType::Bool)),
            Outcome::Pass
        );
        let strings = Column::new("s", ["true", "false"]);
        assert_eq!(
            check(strings, Constraint::data_type(DataType::Bool)),
            Outcome::Fail
        );
    }

    #[test]
    fn test_type_allow_list() {
        let col = Column::new("x", [1.5, 2.0]);
        let constraint = Constraint::data_types(&[DataType::Int, DataType::Real]).unwrap();
        assert_eq!(check(col, constraint), Outcome::Pass);
    }

    #[test]
    fn test_sign_null() {
        let empty = Column::new("x", [DataValue::Null, DataValue::Null]);
        assert_eq!(check(empty, Constraint::sign(Sign::Null)), Outcome::Pass);
        let full = Column::new("x", [Some(0), None]);
        assert_eq!(check(full.clone(), Constraint::sign(Sign::Null)), Outcome::Fail);
        assert_eq!(check(full.clone(), Constraint::sign(Sign::Zero)), Outcome::Pass);
        assert_eq!(check(full, Constraint::sign(Sign::Positive)), Outcome::Fail);
    }

    #[test]
    fn test_lengths() {
        let col = Column::new("s", ["ab", "abcd"]);
        assert_eq!(check(col.clone(), Constraint::min_length(2)), Outcome::Pass);
        assert_eq!(check(col.clone(), Constraint::min_length(3)), Outcome::Fail);
        assert_eq!(check(col.clone(), Constraint::max_length(4)), Outcome::Pass);
        assert_eq!(check(col, Constraint::max_length(3)), Outcome::Fail);

        let numbers = Column::new("n", [1, 2]);
        assert_eq!(check(numbers, Constraint::max_length(3)), Outcome::Fail);
    }

    #[test]
    fn test_no_duplicates() {
        let dup = Column::new("x", [Some(1), Some(2), Some(2), Some(3)]);
        assert_eq!(check(dup.clone(), Constraint::no_duplicates(true)), Outcome::Fail);
        assert_eq!(check(dup, Constraint::no_duplicates(false)), Outcome::Pass);

        let nulls = Column::new("x", [Some(1), Some(2), None, None]);
        assert_eq!(check(nulls, Constraint::no_duplicates(true)), Outcome::Pass);
    }

    #[test]
    fn test_allowed_values() {
        let col = Column::new("s", ["a", "b", "a"]);
        let allowed = |values: &[&str]| {
            Constraint::allowed_values(values.iter().map(|v| DataValue::from(*v)).collect())
                .unwrap()
        };
        assert_eq!(check(col.clone(), allowed(&["a", "b"])), Outcome::Pass);
        assert_eq!(check(col.clone(), allowed(&["a", "b", "c"])), Outcome::Pass);
        assert_eq!(check(col.clone(), allowed(&["a"])), Outcome::Fail);
        assert_eq!(check(col, allowed(&["a", "c"])), Outcome::Fail);
    }

    #[test]
    fn test_inactive_and_unknown() {
        let col = Column::new("x", [1]);
        let inactive = Constraint::new(ConstraintKind::Min, DataValue::Null).unwrap();
        assert_eq!(check(col.clone(), inactive), Outcome::Pass);

        let lt = Constraint::new(ConstraintKind::Lt, DataValue::Bool(true)).unwrap();
        assert_eq!(check(col, lt), Outcome::Unknown);
    }

    #[test]
    fn test_statistics_are_cached() {
        let dataset = DataSet::from_columns([Column::new("x", [3, 1, 2])]).unwrap();
        let column = dataset.column("x").unwrap();
        let mut verifier = ConstraintVerifier::new(&dataset, VerificationOptions::default());

        verifier.verify_constraint(column, &Constraint::sign(Sign::Positive));
        assert!(verifier.cache().contains("x", Statistic::Min));
        assert!(verifier.cache().contains("x", Statistic::Max));

        verifier
            .cache_mut()
            .insert("x", Statistic::Min, StatValue::Value(Some(DataValue::Int(-5))));
        assert_eq!(
            verifier.verify_constraint(column, &Constraint::sign(Sign::Positive)),
            Outcome::Fail
        );
    }
}
