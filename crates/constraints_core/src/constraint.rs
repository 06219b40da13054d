//! Constraint types and structures.
//!
//! A [`Constraint`] is a single rule: a kind tag, a value and, for `min` and
//! `max` only, a precision. [`FieldConstraints`] holds at most one constraint
//! per kind for a field, [`MultiFieldConstraints`] does the same for a group
//! of fields, and [`DatasetConstraints`] collects them for a whole dataset.
//!
//! The `Serialize` impls here define the persisted layout: kinds are written
//! in canonical order (see [`ConstraintKind::STANDARD`]) followed by any other
//! kinds alphabetically, so files stay stable under version control.

use crate::{ConstraintError, DataType, DataValue, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The constraint vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Type,
    Min,
    MinLength,
    Max,
    MaxLength,
    Sign,
    MaxNulls,
    NoDuplicates,
    AllowedValues,
    Lt,
    Lte,
    Eq,
    Gt,
    Gte,
}

impl ConstraintKind {
    /// Single-field kinds, in the order they are written to files.
    pub const STANDARD: [ConstraintKind; 9] = [
        ConstraintKind::Type,
        ConstraintKind::Min,
        ConstraintKind::MinLength,
        ConstraintKind::Max,
        ConstraintKind::MaxLength,
        ConstraintKind::Sign,
        ConstraintKind::MaxNulls,
        ConstraintKind::NoDuplicates,
        ConstraintKind::AllowedValues,
    ];

    /// Kinds that relate a group of fields.
    pub const MULTI_FIELD: [ConstraintKind; 5] = [
        ConstraintKind::Lt,
        ConstraintKind::Lte,
        ConstraintKind::Eq,
        ConstraintKind::Gt,
        ConstraintKind::Gte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Type => "type",
            ConstraintKind::Min => "min",
            ConstraintKind::MinLength => "min_length",
            ConstraintKind::Max => "max",
            ConstraintKind::MaxLength => "max_length",
            ConstraintKind::Sign => "sign",
            ConstraintKind::MaxNulls => "max_nulls",
            ConstraintKind::NoDuplicates => "no_duplicates",
            ConstraintKind::AllowedValues => "allowed_values",
            ConstraintKind::Lt => "lt",
            ConstraintKind::Lte => "lte",
            ConstraintKind::Eq => "eq",
            ConstraintKind::Gt => "gt",
            ConstraintKind::Gte => "gte",
        }
    }

    pub fn is_multi_field(&self) -> bool {
        Self::MULTI_FIELD.contains(self)
    }

    /// Position in the canonical order, `None` for non-standard kinds.
    pub fn canonical_position(&self) -> Option<usize> {
        Self::STANDARD.iter().position(|k| k == self)
    }
}

impl Ord for ConstraintKind {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = |k: &ConstraintKind| k.canonical_position().unwrap_or(usize::MAX);
        rank(self)
            .cmp(&rank(other))
            .then_with(|| self.as_str().cmp(other.as_str()))
    }
}

impl PartialOrd for ConstraintKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstraintKind {
    type Err = ConstraintError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::STANDARD
            .into_iter()
            .chain(Self::MULTI_FIELD)
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConstraintError::UnknownKind(s.to_string()))
    }
}

impl Serialize for ConstraintKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Strictness of a `min`/`max` bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Exclusive bound
    Open,
    /// Inclusive bound
    #[default]
    Closed,
    /// Inclusive bound relaxed by a relative tolerance
    Fuzzy,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Open => "open",
            Precision::Closed => "closed",
            Precision::Fuzzy => "fuzzy",
        }
    }
}

impl FromStr for Precision {
    type Err = ConstraintError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(Precision::Open),
            "closed" => Ok(Precision::Closed),
            "fuzzy" => Ok(Precision::Fuzzy),
            other => Err(ConstraintError::UnknownPrecision(other.to_string())),
        }
    }
}

/// Value of a `sign` constraint.
///
/// `Sign::Null` is a real sign ("there are no values"), not an inactive
/// constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    NonNegative,
    Zero,
    NonPositive,
    Negative,
    Null,
}

impl Sign {
    pub const ALL: [Sign; 6] = [
        Sign::Positive,
        Sign::NonNegative,
        Sign::Zero,
        Sign::NonPositive,
        Sign::Negative,
        Sign::Null,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sign::Positive => "positive",
            Sign::NonNegative => "non-negative",
            Sign::Zero => "zero",
            Sign::NonPositive => "non-positive",
            Sign::Negative => "negative",
            Sign::Null => "null",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sign {
    type Err = ConstraintError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Sign::ALL
            .into_iter()
            .find(|sign| sign.as_str() == s)
            .ok_or_else(|| ConstraintError::UnknownSign(s.to_string()))
    }
}

/// Raw value carried by a constraint.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConstraintValue {
    /// Inactive constraint, always satisfied
    #[default]
    Null,
    Scalar(DataValue),
    List(Vec<DataValue>),
}

impl ConstraintValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ConstraintValue::Null)
    }
}

impl From<DataValue> for ConstraintValue {
    fn from(value: DataValue) -> Self {
        match value {
            DataValue::Null => ConstraintValue::Null,
            DataValue::List(items) => ConstraintValue::List(items),
            other => ConstraintValue::Scalar(other),
        }
    }
}

impl From<Vec<DataValue>> for ConstraintValue {
    fn from(values: Vec<DataValue>) -> Self {
        ConstraintValue::List(values)
    }
}

impl Serialize for ConstraintValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ConstraintValue::Null => serializer.serialize_none(),
            ConstraintValue::Scalar(v) => v.serialize(serializer),
            ConstraintValue::List(items) => items.serialize(serializer),
        }
    }
}

/// A single rule about a field or a group of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    kind: ConstraintKind,
    value: ConstraintValue,
    precision: Precision,
}

impl Constraint {
    /// Creates a constraint, checking that the value is legal for the kind.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintError::InvalidConstraintSpecification` when the
    /// value has the wrong shape for `kind`.
    pub fn new(kind: ConstraintKind, value: impl Into<ConstraintValue>) -> Result<Self> {
        let value = value.into();
        validate_value(kind, &value)?;
        Ok(Self {
            kind,
            value,
            precision: Precision::default(),
        })
    }

    /// Sets the precision of a `min` or `max` constraint.
    pub fn with_precision(mut self, precision: Precision) -> Result<Self> {
        if !matches!(self.kind, ConstraintKind::Min | ConstraintKind::Max) {
            return Err(ConstraintError::invalid(
                self.kind.as_str(),
                "precision only applies to min and max",
            ));
        }
        self.precision = precision;
        Ok(self)
    }

    /// `type` constraint with a single allowed type.
    pub fn data_type(data_type: DataType) -> Self {
        Self::checked(
            ConstraintKind::Type,
            DataValue::from(data_type.as_str()).into(),
        )
    }

    /// `type` constraint with an allow-list of types.
    pub fn data_types(types: &[DataType]) -> Result<Self> {
        let names = types.iter().map(|t| DataValue::from(t.as_str())).collect();
        Self::new(ConstraintKind::Type, ConstraintValue::List(names))
    }

    pub fn min(value: impl Into<DataValue>) -> Result<Self> {
        Self::new(ConstraintKind::Min, value.into())
    }

    pub fn max(value: impl Into<DataValue>) -> Result<Self> {
        Self::new(ConstraintKind::Max, value.into())
    }

    pub fn min_length(length: usize) -> Self {
        Self::checked(ConstraintKind::MinLength, count_value(length))
    }

    pub fn max_length(length: usize) -> Self {
        Self::checked(ConstraintKind::MaxLength, count_value(length))
    }

    pub fn sign(sign: Sign) -> Self {
        Self::checked(ConstraintKind::Sign, DataValue::from(sign.as_str()).into())
    }

    pub fn max_nulls(count: usize) -> Self {
        Self::checked(ConstraintKind::MaxNulls, count_value(count))
    }

    pub fn no_duplicates(flag: bool) -> Self {
        Self::checked(ConstraintKind::NoDuplicates, DataValue::Bool(flag).into())
    }

    pub fn allowed_values(values: Vec<DataValue>) -> Result<Self> {
        Self::new(ConstraintKind::AllowedValues, ConstraintValue::List(values))
    }

    /// Builds a constraint whose value is correct by construction.
    fn checked(kind: ConstraintKind, value: ConstraintValue) -> Self {
        debug_assert!(validate_value(kind, &value).is_ok());
        Self {
            kind,
            value,
            precision: Precision::default(),
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn value(&self) -> &ConstraintValue {
        &self.value
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// False when the value is null, which makes the constraint a no-op.
    pub fn is_active(&self) -> bool {
        !self.value.is_null()
    }

    /// Allowed types of a `type` constraint.
    pub fn allowed_types(&self) -> Option<Vec<DataType>> {
        match &self.value {
            ConstraintValue::Scalar(DataValue::String(s)) => s.parse().ok().map(|t| vec![t]),
            ConstraintValue::List(items) => items
                .iter()
                .map(|v| v.as_str().and_then(|s| s.parse().ok()))
                .collect(),
            _ => None,
        }
    }

    /// Scalar value of a bound-like constraint.
    pub fn scalar(&self) -> Option<&DataValue> {
        match &self.value {
            ConstraintValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Value of a count or length constraint.
    pub fn count(&self) -> Option<usize> {
        self.scalar()
            .and_then(DataValue::as_int)
            .and_then(|n| usize::try_from(n).ok())
    }

    pub fn sign_value(&self) -> Option<Sign> {
        self.scalar()
            .and_then(DataValue::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn flag(&self) -> Option<bool> {
        self.scalar().and_then(DataValue::as_bool)
    }

    /// Values of an `allowed_values` constraint.
    pub fn values(&self) -> Option<&[DataValue]> {
        match &self.value {
            ConstraintValue::List(items) => Some(items),
            _ => None,
        }
    }
}

fn count_value(n: usize) -> ConstraintValue {
    DataValue::Int(i64::try_from(n).unwrap_or(i64::MAX)).into()
}

fn validate_value(kind: ConstraintKind, value: &ConstraintValue) -> Result<()> {
    let invalid = |message: String| Err(ConstraintError::invalid(kind.as_str(), message));
    let scalar = match value {
        ConstraintValue::Null => return Ok(()),
        ConstraintValue::Scalar(v) => Some(v),
        ConstraintValue::List(_) => None,
    };

    match kind {
        ConstraintKind::Type => {
            let names: Vec<&DataValue> = match value {
                ConstraintValue::List(items) if items.is_empty() => {
                    return invalid("type list cannot be empty".to_string());
                }
                ConstraintValue::List(items) => items.iter().collect(),
                _ => scalar.into_iter().collect(),
            };
            for name in names {
                match name.as_str().map(str::parse::<DataType>) {
                    Some(Ok(_)) => {}
                    _ => return invalid(format!("{name} is not a type name")),
                }
            }
            Ok(())
        }
        ConstraintKind::Min | ConstraintKind::Max => match scalar {
            Some(v) if v.is_scalar() => Ok(()),
            Some(v) => invalid(format!("{v} cannot be used as a bound")),
            None => invalid("bound must be a scalar, not a list".to_string()),
        },
        ConstraintKind::MinLength | ConstraintKind::MaxLength | ConstraintKind::MaxNulls => {
            match scalar.and_then(DataValue::as_int) {
                Some(n) if n >= 0 => Ok(()),
                _ => invalid("value must be a non-negative integer".to_string()),
            }
        }
        ConstraintKind::Sign => match scalar.and_then(DataValue::as_str) {
            Some(s) if s.parse::<Sign>().is_ok() => Ok(()),
            _ => invalid(format!(
                "sign must be one of {}",
                Sign::ALL.map(|s| s.as_str()).join(", ")
            )),
        },
        ConstraintKind::NoDuplicates => match scalar {
            Some(DataValue::Bool(_)) => Ok(()),
            _ => invalid("value must be a boolean".to_string()),
        },
        ConstraintKind::AllowedValues => match value {
            ConstraintValue::List(items) => match items.iter().find(|v| !v.is_scalar()) {
                Some(bad) => invalid(format!("{bad} cannot be an allowed value")),
                None => Ok(()),
            },
            _ => invalid("allowed values must be a list".to_string()),
        },
        ConstraintKind::Lt
        | ConstraintKind::Lte
        | ConstraintKind::Eq
        | ConstraintKind::Gt
        | ConstraintKind::Gte => match scalar {
            Some(v) if v.is_scalar() => Ok(()),
            _ => invalid("value must be a scalar".to_string()),
        },
    }
}

impl Serialize for Constraint {
    /// Writes the persisted value: a bare value, or `{value, precision}` for
    /// a `min`/`max` with a non-default precision.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.precision == Precision::Closed {
            return self.value.serialize(serializer);
        }
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("precision", self.precision.as_str())?;
        map.end()
    }
}

/// Constraints on a single field, at most one per kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConstraints {
    name: String,
    constraints: BTreeMap<ConstraintKind, Constraint>,
}

impl FieldConstraints {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a constraint, replacing any existing constraint of the same kind.
    ///
    /// Multi-field kinds are rejected.
    pub fn add(&mut self, constraint: Constraint) -> Result<Option<Constraint>> {
        if constraint.kind().is_multi_field() {
            return Err(ConstraintError::invalid(
                constraint.kind().as_str(),
                format!("not a single-field constraint (field '{}')", self.name),
            ));
        }
        Ok(self.constraints.insert(constraint.kind(), constraint))
    }

    pub fn get(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.constraints.get(&kind)
    }

    pub fn remove(&mut self, kind: ConstraintKind) -> Option<Constraint> {
        self.constraints.remove(&kind)
    }

    /// Iterates over the constraints in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ConstraintKind> + '_ {
        self.constraints.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl Serialize for FieldConstraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_constraints(&self.constraints, serializer)
    }
}

fn serialize_constraints<S: Serializer>(
    constraints: &BTreeMap<ConstraintKind, Constraint>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(constraints.len()))?;
    for (kind, constraint) in constraints {
        map.serialize_entry(kind.as_str(), constraint)?;
    }
    map.end()
}

/// Separator between field names in a persisted group key.
pub const GROUP_SEPARATOR: char = ':';

/// Constraints relating a group of fields, at most one per kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiFieldConstraints {
    names: Vec<String>,
    constraints: BTreeMap<ConstraintKind, Constraint>,
}

impl MultiFieldConstraints {
    pub fn new<N: Into<String>>(names: impl IntoIterator<Item = N>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            constraints: BTreeMap::new(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Key under which the group is persisted, e.g. `start:end`.
    pub fn key(&self) -> String {
        self.names.join(&GROUP_SEPARATOR.to_string())
    }

    /// Adds a constraint; only multi-field kinds are accepted.
    pub fn add(&mut self, constraint: Constraint) -> Result<Option<Constraint>> {
        if !constraint.kind().is_multi_field() {
            return Err(ConstraintError::invalid(
                constraint.kind().as_str(),
                format!("not a multi-field constraint (group '{}')", self.key()),
            ));
        }
        Ok(self.constraints.insert(constraint.kind(), constraint))
    }

    pub fn get(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.constraints.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl Serialize for MultiFieldConstraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_constraints(&self.constraints, serializer)
    }
}

/// Provenance recorded when a constraint file is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationMetadata {
    /// Tool and version that wrote the file
    pub creator: String,
    /// Generation time
    pub utc_time: DateTime<Utc>,
    /// Rows in the dataset constraints were discovered from
    pub n_records: usize,
    /// Columns in that dataset
    pub n_fields: usize,
}

/// All constraints for a dataset, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetConstraints {
    creation_metadata: Option<CreationMetadata>,
    fields: IndexMap<String, FieldConstraints>,
    field_groups: IndexMap<String, MultiFieldConstraints>,
}

impl DatasetConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the constraints of a field. A field that is already present keeps
    /// its position and has its constraints replaced.
    pub fn add_field(&mut self, field: FieldConstraints) {
        self.fields.insert(field.name().to_string(), field);
    }

    pub fn add_group(&mut self, group: MultiFieldConstraints) {
        self.field_groups.insert(group.key(), group);
    }

    pub fn field(&self, name: &str) -> Option<&FieldConstraints> {
        self.fields.get(name)
    }

    pub fn group(&self, key: &str) -> Option<&MultiFieldConstraints> {
        self.field_groups.get(key)
    }

    /// Iterates over the field constraints in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldConstraints> {
        self.fields.values()
    }

    pub fn field_groups(&self) -> impl Iterator<Item = &MultiFieldConstraints> {
        self.field_groups.values()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Total number of constraints across fields and groups.
    pub fn constraint_count(&self) -> usize {
        self.fields.values().map(FieldConstraints::len).sum::<usize>()
            + self
                .field_groups
                .values()
                .map(MultiFieldConstraints::len)
                .sum::<usize>()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.field_groups.is_empty()
    }

    pub fn creation_metadata(&self) -> Option<&CreationMetadata> {
        self.creation_metadata.as_ref()
    }

    pub fn set_creation_metadata(&mut self, metadata: CreationMetadata) {
        self.creation_metadata = Some(metadata);
    }
}

impl Serialize for DatasetConstraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(metadata) = &self.creation_metadata {
            map.serialize_entry("creation_metadata", metadata)?;
        }
        map.serialize_entry("fields", &self.fields)?;
        if !self.field_groups.is_empty() {
            map.serialize_entry("field_groups", &self.field_groups)?;
        }
        map.end()
    }
}
