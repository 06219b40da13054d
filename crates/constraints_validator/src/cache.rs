//! Per-column statistic cache.
//!
//! Each statistic a verifier or the discovery pass needs is computed once per
//! column on first use and reused afterwards. Entries can be read and
//! overwritten directly, which lets tests force a statistic to a chosen value.

use constraints_core::{Column, DataType, DataValue};
use std::collections::{HashMap, HashSet};

/// A per-column statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Smallest non-null value
    Min,
    /// Largest non-null value
    Max,
    /// Shortest string length
    MinLength,
    /// Longest string length
    MaxLength,
    /// Classified type of the column
    Type,
    NullCount,
    /// Number of distinct non-null values
    DistinctCount,
    /// Distinct non-null values, in first-seen order
    DistinctValues,
    /// Number of non-null values with a fractional part
    NonIntegerCount,
    /// Whether every non-null value is a boolean
    AllNonNullBoolean,
}

/// The value of a cached statistic.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Value(Option<DataValue>),
    Length(Option<usize>),
    Type(DataType),
    Count(usize),
    Values(Vec<DataValue>),
    Flag(bool),
}

impl Statistic {
    /// Computes the statistic over a column.
    pub fn compute(self, column: &Column) -> StatValue {
        match self {
            Statistic::Min => StatValue::Value(extreme(column, Extreme::Smallest)),
            Statistic::Max => StatValue::Value(extreme(column, Extreme::Largest)),
            Statistic::MinLength => StatValue::Length(string_length(column, Extreme::Smallest)),
            Statistic::MaxLength => StatValue::Length(string_length(column, Extreme::Largest)),
            Statistic::Type => StatValue::Type(column.data_type()),
            Statistic::NullCount => StatValue::Count(column.null_count()),
            Statistic::DistinctCount => StatValue::Count(distinct_values(column).len()),
            Statistic::DistinctValues => StatValue::Values(distinct_values(column)),
            Statistic::NonIntegerCount => {
                StatValue::Count(column.non_null().filter(|v| !v.is_integral()).count())
            }
            Statistic::AllNonNullBoolean => {
                StatValue::Flag(column.non_null().all(|v| matches!(v, DataValue::Bool(_))))
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Extreme {
    Smallest,
    Largest,
}

fn extreme(column: &Column, which: Extreme) -> Option<DataValue> {
    let wanted = match which {
        Extreme::Smallest => std::cmp::Ordering::Less,
        Extreme::Largest => std::cmp::Ordering::Greater,
    };
    let mut best: Option<&DataValue> = None;
    for value in column.non_null() {
        match best {
            Some(current) if value.compare(current) != Some(wanted) => {}
            _ => best = Some(value),
        }
    }
    best.cloned()
}

/// Length extreme over string values; `None` if the column has no non-null
/// values or holds anything other than strings.
fn string_length(column: &Column, which: Extreme) -> Option<usize> {
    let mut result: Option<usize> = None;
    for value in column.non_null() {
        let len = value.as_str()?.chars().count();
        result = Some(match (result, which) {
            (None, _) => len,
            (Some(r), Extreme::Smallest) => r.min(len),
            (Some(r), Extreme::Largest) => r.max(len),
        });
    }
    result
}

/// Distinct non-null values in first-seen order. Values with no hashable
/// identity (lists, maps) are each counted as distinct.
pub(crate) fn distinct_values(column: &Column) -> Vec<DataValue> {
    let mut seen = HashSet::new();
    let mut distinct = Vec::new();
    for value in column.non_null() {
        let is_new = match value.key() {
            Some(key) => seen.insert(key),
            None => true,
        };
        if is_new {
            distinct.push(value.clone());
        }
    }
    distinct
}

/// Cache of statistics keyed by column name and statistic.
#[derive(Debug, Clone, Default)]
pub struct StatisticCache {
    columns: HashMap<String, HashMap<Statistic, StatValue>>,
}

impl StatisticCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str, statistic: Statistic) -> Option<&StatValue> {
        self.columns.get(column)?.get(&statistic)
    }

    /// Stores a value, replacing anything already cached.
    pub fn insert(&mut self, column: impl Into<String>, statistic: Statistic, value: StatValue) {
        self.columns
            .entry(column.into())
            .or_default()
            .insert(statistic, value);
    }

    pub fn contains(&self, column: &str, statistic: Statistic) -> bool {
        self.get(column, statistic).is_some()
    }

    /// Returns the cached statistic, computing it first if needed.
    pub fn get_or_compute(&mut self, column: &Column, statistic: Statistic) -> &StatValue {
        self.columns
            .entry(column.name().to_string())
            .or_default()
            .entry(statistic)
            .or_insert_with(|| statistic.compute(column))
    }

    /// Cached value of a `Value` statistic (min or max).
    pub fn value(&mut self, column: &Column, statistic: Statistic) -> Option<DataValue> {
        match self.get_or_compute(column, statistic) {
            StatValue::Value(v) => v.clone(),
            _ => None,
        }
    }

    /// Cached value of a `Length` statistic.
    pub fn length(&mut self, column: &Column, statistic: Statistic) -> Option<usize> {
        match self.get_or_compute(column, statistic) {
            StatValue::Length(n) => *n,
            _ => None,
        }
    }

    /// Cached value of a `Count` statistic.
    pub fn count(&mut self, column: &Column, statistic: Statistic) -> Option<usize> {
        match self.get_or_compute(column, statistic) {
            StatValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn data_type(&mut self, column: &Column) -> DataType {
        match self.get_or_compute(column, Statistic::Type) {
            StatValue::Type(t) => *t,
            _ => column.data_type(),
        }
    }

    pub fn flag(&mut self, column: &Column, statistic: Statistic) -> bool {
        matches!(self.get_or_compute(column, statistic), StatValue::Flag(true))
    }

    /// Number of (column, statistic) entries held.
    pub fn len(&self) -> usize {
        self.columns.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column() -> Column {
        Column::new("x", [Some(3), None, Some(1), Some(3), Some(-2)])
    }

    #[test]
    fn test_compute_statistics() {
        let col = column();
        assert_eq!(
            Statistic::Min.compute(&col),
            StatValue::Value(Some(DataValue::Int(-2)))
        );
        assert_eq!(
            Statistic::Max.compute(&col),
            StatValue::Value(Some(DataValue::Int(3)))
        );
        assert_eq!(Statistic::NullCount.compute(&col), StatValue::Count(1));
        assert_eq!(Statistic::DistinctCount.compute(&col), StatValue::Count(3));
        assert_eq!(
            Statistic::DistinctValues.compute(&col),
            StatValue::Values(vec![DataValue::Int(3), DataValue::Int(1), DataValue::Int(-2)])
        );
        assert_eq!(Statistic::Type.compute(&col), StatValue::Type(DataType::Int));
        assert_eq!(Statistic::MinLength.compute(&col), StatValue::Length(None));
    }

    #[test]
    fn test_string_lengths() {
        let col = Column::new("s", [Some("héllo"), None, Some("ab"), Some("abcdef")]);
        assert_eq!(Statistic::MinLength.compute(&col), StatValue::Length(Some(2)));
        assert_eq!(Statistic::MaxLength.compute(&col), StatValue::Length(Some(6)));
    }

    #[test]
    fn test_integral_and_boolean_checks() {
        let reals = Column::new("r", [1.0, 2.0, f64::NAN]);
        assert_eq!(Statistic::NonIntegerCount.compute(&reals), StatValue::Count(0));
        assert_eq!(Statistic::DistinctCount.compute(&reals), StatValue::Count(2));

        let bools = Column::new("b", [Some(true), None, Some(false)]);
        assert_eq!(
            Statistic::AllNonNullBoolean.compute(&bools),
            StatValue::Flag(true)
        );
    }

    #[test]
    fn test_cache_computes_once_and_can_be_overridden() {
        let col = column();
        let mut cache = StatisticCache::new();
        assert!(cache.is_empty());

        assert_eq!(cache.count(&col, Statistic::NullCount), Some(1));
        assert!(cache.contains("x", Statistic::NullCount));
        assert_eq!(cache.len(), 1);

        cache.insert("x", Statistic::NullCount, StatValue::Count(7));
        assert_eq!(cache.count(&col, Statistic::NullCount), Some(7));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert_eq!(cache.get("x", Statistic::NullCount), None);
    }
}
