//! Builder pattern for creating constraint sets.
//!
//! This module provides ergonomic builders for constructing field and dataset
//! constraints with a fluent API. Errors from individual constraints are held
//! until `build()`, so a chain reads top to bottom without `?` on every line.

use crate::{
    Constraint, ConstraintError, DataType, DataValue, DatasetConstraints, FieldConstraints,
    MultiFieldConstraints, Precision, Result, Sign,
};

/// Builder for creating a `FieldConstraints`.
///
/// # Example
///
/// ```rust
/// use constraints_core::{ConstraintKind, DataType, FieldConstraintsBuilder, Sign};
///
/// let field = FieldConstraintsBuilder::new("age")
///     .data_type(DataType::Int)
///     .min(0)
///     .max(120)
///     .sign(Sign::NonNegative)
///     .max_nulls(0)
///     .build()
///     .unwrap();
///
/// assert_eq!(field.len(), 5);
/// assert!(field.get(ConstraintKind::Max).is_some());
/// ```
#[derive(Debug)]
pub struct FieldConstraintsBuilder {
    field: FieldConstraints,
    error: Option<ConstraintError>,
}

impl FieldConstraintsBuilder {
    /// Creates a new builder for the named field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldConstraints::new(name),
            error: None,
        }
    }

    /// Adds an already-built constraint.
    pub fn constraint(self, constraint: Constraint) -> Self {
        self.push(Ok(constraint))
    }

    pub fn data_type(self, data_type: DataType) -> Self {
        self.push(Ok(Constraint::data_type(data_type)))
    }

    /// Allows any of several types.
    pub fn data_types(self, types: &[DataType]) -> Self {
        self.push(Constraint::data_types(types))
    }

    pub fn min(self, value: impl Into<DataValue>) -> Self {
        self.push(Constraint::min(value))
    }

    pub fn max(self, value: impl Into<DataValue>) -> Self {
        self.push(Constraint::max(value))
    }

    /// Lower bound with an explicit precision.
    pub fn min_with(self, value: impl Into<DataValue>, precision: Precision) -> Self {
        self.push(Constraint::min(value).and_then(|c| c.with_precision(precision)))
    }

    /// Upper bound with an explicit precision.
    pub fn max_with(self, value: impl Into<DataValue>, precision: Precision) -> Self {
        self.push(Constraint::max(value).and_then(|c| c.with_precision(precision)))
    }

    pub fn min_length(self, length: usize) -> Self {
        self.push(Ok(Constraint::min_length(length)))
    }

    pub fn max_length(self, length: usize) -> Self {
        self.push(Ok(Constraint::max_length(length)))
    }

    pub fn sign(self, sign: Sign) -> Self {
        self.push(Ok(Constraint::sign(sign)))
    }

    pub fn max_nulls(self, count: usize) -> Self {
        self.push(Ok(Constraint::max_nulls(count)))
    }

    pub fn no_duplicates(self, flag: bool) -> Self {
        self.push(Ok(Constraint::no_duplicates(flag)))
    }

    pub fn allowed_values<V: Into<DataValue>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.push(Constraint::allowed_values(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    fn push(mut self, constraint: Result<Constraint>) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(e) = constraint.and_then(|c| self.field.add(c)) {
            self.error = Some(e);
        }
        self
    }

    /// Builds the field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first specification error met while building.
    pub fn build(self) -> Result<FieldConstraints> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.field),
        }
    }
}

/// Builder for creating a `DatasetConstraints`.
///
/// # Example
///
/// ```rust
/// use constraints_core::{ConstraintsBuilder, DataType, FieldConstraintsBuilder};
///
/// let constraints = ConstraintsBuilder::new()
///     .field(FieldConstraintsBuilder::new("id").data_type(DataType::Int).build().unwrap())
///     .field(FieldConstraintsBuilder::new("name").data_type(DataType::String).build().unwrap())
///     .build();
///
/// assert_eq!(constraints.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ConstraintsBuilder {
    constraints: DatasetConstraints,
}

impl ConstraintsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field's constraints.
    pub fn field(mut self, field: FieldConstraints) -> Self {
        self.constraints.add_field(field);
        self
    }

    /// Adds multiple fields.
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldConstraints>) -> Self {
        for field in fields {
            self.constraints.add_field(field);
        }
        self
    }

    /// Adds a multi-field group.
    pub fn group(mut self, group: MultiFieldConstraints) -> Self {
        self.constraints.add_group(group);
        self
    }

    pub fn build(self) -> DatasetConstraints {
        self.constraints
    }
}
