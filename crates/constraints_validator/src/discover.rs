//! Constraint discovery.
//!
//! Infers a compact set of constraints from a reference dataset. The rules
//! are deliberately conservative: every emitted constraint holds for the
//! dataset it was discovered from.

use crate::cache::{StatValue, Statistic, StatisticCache};
use constraints_core::{
    Column, Constraint, DataSet, DataType, DataValue, DatasetConstraints, FieldConstraints,
    Result, Sign,
};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Columns with at most this many distinct strings get `allowed_values`.
pub const MAX_CATEGORIES: usize = 20;

/// Discovers constraints for every column of a dataset.
///
/// Returns `Ok(None)` when no column yields any constraint.
///
/// # Example
///
/// ```rust
/// use constraints_core::{Column, ConstraintKind, DataSet};
/// use constraints_validator::discover;
///
/// let dataset = DataSet::from_columns([Column::new("i", [1, 2, 3, 4])]).unwrap();
/// let constraints = discover(&dataset).unwrap().unwrap();
///
/// let i = constraints.field("i").unwrap();
/// assert_eq!(i.len(), 6);
/// assert!(i.get(ConstraintKind::NoDuplicates).is_some());
/// ```
pub fn discover(dataset: &DataSet) -> Result<Option<DatasetConstraints>> {
    let mut cache = StatisticCache::new();
    let mut constraints = DatasetConstraints::new();

    for column in dataset.columns() {
        if let Some(field) = discover_field(column, dataset.row_count(), &mut cache)? {
            constraints.add_field(field);
        }
    }

    info!(
        "Discovered {} constraints on {} of {} fields",
        constraints.constraint_count(),
        constraints.len(),
        dataset.column_count()
    );

    Ok((!constraints.is_empty()).then_some(constraints))
}

/// Discovers the constraints of a single column.
///
/// Returns `Ok(None)` for columns that yield nothing (those classified
/// `other`).
pub fn discover_field(
    column: &Column,
    row_count: usize,
    cache: &mut StatisticCache,
) -> Result<Option<FieldConstraints>> {
    let data_type = cache.data_type(column);
    if data_type == DataType::Other {
        debug!("Skipping field '{}' of mixed or opaque type", column.name());
        return Ok(None);
    }

    let mut field = FieldConstraints::new(column.name());
    field.add(Constraint::data_type(data_type))?;

    let n_null = cache.count(column, Statistic::NullCount).unwrap_or(0);
    let n_non_null = column.non_null_count();
    assert_eq!(
        n_null + n_non_null,
        row_count,
        "null and non-null counts of '{}' do not add up to the row count",
        column.name()
    );
    debug!(
        "Field '{}': type {}, {} nulls, {} non-null",
        column.name(),
        data_type,
        n_null,
        n_non_null
    );

    if n_null < 2 {
        field.add(Constraint::max_nulls(n_null))?;
    }

    let n_unique = if data_type == DataType::Real {
        None
    } else {
        cache.count(column, Statistic::DistinctCount)
    };

    if n_non_null > 0 {
        if data_type == DataType::String {
            if n_unique.is_some_and(|n| n <= MAX_CATEGORIES) {
                field.add(Constraint::allowed_values(sorted_distinct(column, cache))?)?;
            }
            if let Some(len) = cache.length(column, Statistic::MinLength) {
                field.add(Constraint::min_length(len))?;
            }
            if let Some(len) = cache.length(column, Statistic::MaxLength) {
                field.add(Constraint::max_length(len))?;
            }
        } else {
            discover_bounds(column, data_type, &mut field, cache)?;
        }
    }

    if let Some(n_unique) = n_unique {
        if n_unique == n_non_null && n_unique > 1 {
            field.add(Constraint::no_duplicates(true))?;
        }
    }

    Ok((!field.is_empty()).then_some(field))
}

/// `min`, `max` and `sign` for a non-string column with values.
///
/// Both extremes exist once there is a non-null value, so a discovered sign
/// is never `null`. Infinite extremes have no persisted form and are left out.
fn discover_bounds(
    column: &Column,
    data_type: DataType,
    field: &mut FieldConstraints,
    cache: &mut StatisticCache,
) -> Result<()> {
    let (Some(min), Some(max)) = (
        cache.value(column, Statistic::Min),
        cache.value(column, Statistic::Max),
    ) else {
        return Ok(());
    };
    if min.is_scalar() {
        field.add(Constraint::min(min.clone())?)?;
    }
    if max.is_scalar() {
        field.add(Constraint::max(max.clone())?)?;
    }
    if data_type != DataType::Date {
        if let Some(sign) = sign_of(&min, &max) {
            field.add(Constraint::sign(sign))?;
        }
    }
    Ok(())
}

/// Sign implied by a column's bounds, `None` when they straddle zero.
fn sign_of(min: &DataValue, max: &DataValue) -> Option<Sign> {
    let (min, max) = (min.as_f64()?, max.as_f64()?);
    if min == 0.0 && max == 0.0 {
        Some(Sign::Zero)
    } else if min > 0.0 {
        Some(Sign::Positive)
    } else if min >= 0.0 {
        Some(Sign::NonNegative)
    } else if max < 0.0 {
        Some(Sign::Negative)
    } else if max <= 0.0 {
        Some(Sign::NonPositive)
    } else {
        None
    }
}

fn sorted_distinct(column: &Column, cache: &mut StatisticCache) -> Vec<DataValue> {
    let mut values = match cache.get_or_compute(column, Statistic::DistinctValues) {
        StatValue::Values(values) => values.clone(),
        _ => Vec::new(),
    };
    values.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use constraints_core::ConstraintKind;
    use pretty_assertions::assert_eq;

    fn discover_one(column: Column) -> Option<FieldConstraints> {
        let dataset = DataSet::from_columns([column]).unwrap();
        discover(&dataset)
            .unwrap()
            .and_then(|c| c.fields().next().cloned())
    }

    fn kinds(field: &FieldConstraints) -> Vec<ConstraintKind> {
        field.kinds().collect()
    }

    #[test]
    fn test_integer_column() {
        let field = discover_one(Column::new("i", [1, 2, 3, 4])).unwrap();
        let expected = constraints_core::FieldConstraintsBuilder::new("i")
            .data_type(DataType::Int)
            .min(1)
            .max(4)
            .sign(Sign::Positive)
            .max_nulls(0)
            .no_duplicates(true)
            .build()
            .unwrap();
        assert_eq!(field, expected);
    }

    #[test]
    fn test_all_null_column_yields_type_only() {
        let field = discover_one(Column::new("n", [DataValue::Null, DataValue::Null, DataValue::Null]))
            .unwrap();
        assert_eq!(kinds(&field), vec![ConstraintKind::Type]);
        assert_eq!(
            field.get(ConstraintKind::Type).unwrap().allowed_types(),
            Some(vec![DataType::Null])
        );
    }

    #[test]
    fn test_declared_string_all_null_yields_type_only() {
        let column = Column::new("s", [DataValue::Null, DataValue::Null, DataValue::Null])
            .with_declared_type(DataType::String);
        let field = discover_one(column).unwrap();
        assert_eq!(kinds(&field), vec![ConstraintKind::Type]);
        assert_eq!(
            field.get(ConstraintKind::Type).unwrap().allowed_types(),
            Some(vec![DataType::String])
        );
    }

    #[test]
    fn test_infinite_extreme_is_left_out() {
        let field = discover_one(Column::new("r", [1.5, f64::INFINITY])).unwrap();
        assert_eq!(
            field.get(ConstraintKind::Min).unwrap().scalar(),
            Some(&DataValue::Float(1.5))
        );
        assert!(field.get(ConstraintKind::Max).is_none());
        assert_eq!(
            field.get(ConstraintKind::Sign).unwrap().sign_value(),
            Some(Sign::Positive)
        );
    }

    #[test]
    fn test_string_column() {
        let field = discover_one(Column::new(
            "s",
            [Some("pear"), Some("fig"), None, Some("apple"), Some("fig")],
        ))
        .unwrap();
        assert_eq!(
            kinds(&field),
            vec![
                ConstraintKind::Type,
                ConstraintKind::MinLength,
                ConstraintKind::MaxLength,
                ConstraintKind::MaxNulls,
                ConstraintKind::AllowedValues,
            ]
        );
        assert_eq!(
            field.get(ConstraintKind::AllowedValues).unwrap().values().unwrap(),
            &[
                DataValue::from("apple"),
                DataValue::from("fig"),
                DataValue::from("pear")
            ]
        );
        assert_eq!(field.get(ConstraintKind::MinLength).unwrap().count(), Some(3));
        assert_eq!(field.get(ConstraintKind::MaxLength).unwrap().count(), Some(5));
    }

    #[test]
    fn test_many_categories_skip_allowed_values() {
        let values: Vec<String> = (0..=MAX_CATEGORIES).map(|i| format!("v{i:02}")).collect();
        let field = discover_one(Column::new("s", values)).unwrap();
        assert!(field.get(ConstraintKind::AllowedValues).is_none());
        assert!(field.get(ConstraintKind::NoDuplicates).is_some());
    }

    #[test]
    fn test_real_column_has_no_uniqueness_constraint() {
        let field = discover_one(Column::new("r", [-1.5, -0.5, -2.25])).unwrap();
        assert_eq!(
            field.get(ConstraintKind::Sign).unwrap().sign_value(),
            Some(Sign::Negative)
        );
        assert!(field.get(ConstraintKind::NoDuplicates).is_none());
        assert_eq!(
            field.get(ConstraintKind::Min).unwrap().scalar(),
            Some(&DataValue::Float(-2.25))
        );
    }

    #[test]
    fn test_sign_rules() {
        let sign = |values: Vec<i64>| {
            discover_one(Column::new("x", values))
                .and_then(|f| f.get(ConstraintKind::Sign).and_then(Constraint::sign_value))
        };
        assert_eq!(sign(vec![0, 0]), Some(Sign::Zero));
        assert_eq!(sign(vec![0, 3]), Some(Sign::NonNegative));
        assert_eq!(sign(vec![-3, 0]), Some(Sign::NonPositive));
        assert_eq!(sign(vec![-3, 3]), None);
    }

    #[test]
    fn test_two_nulls_suppress_max_nulls() {
        let field = discover_one(Column::new("x", [Some(1), None, None])).unwrap();
        assert!(field.get(ConstraintKind::MaxNulls).is_none());
        // a single distinct value is not evidence of uniqueness
        assert!(field.get(ConstraintKind::NoDuplicates).is_none());
    }

    #[test]
    fn test_date_column_has_bounds_but_no_sign() {
        let d = |day| {
            NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let field = discover_one(Column::new("d", [d(3), d(1), d(2)])).unwrap();
        assert_eq!(
            kinds(&field),
            vec![
                ConstraintKind::Type,
                ConstraintKind::Min,
                ConstraintKind::Max,
                ConstraintKind::MaxNulls,
                ConstraintKind::NoDuplicates,
            ]
        );
        assert_eq!(
            field.get(ConstraintKind::Min).unwrap().scalar(),
            Some(&DataValue::Date(d(1)))
        );
    }

    #[test]
    fn test_mixed_column_is_skipped() {
        let dataset = DataSet::from_columns([Column::new(
            "m",
            [DataValue::from("a"), DataValue::Int(1)],
        )])
        .unwrap();
        assert_eq!(discover(&dataset).unwrap(), None);
    }

    #[test]
    fn test_field_order_follows_dataset() {
        let dataset = DataSet::from_columns([
            Column::new("z", [1, 2]),
            Column::new("a", ["x", "y"]),
        ])
        .unwrap();
        let constraints = discover(&dataset).unwrap().unwrap();
        assert_eq!(constraints.field_names().collect::<Vec<_>>(), vec!["z", "a"]);
    }
}
