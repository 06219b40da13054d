//! Columnar dataset representation.
//!
//! Adapters that read CSV, Parquet or any other storage build a [`DataSet`]
//! out of named [`Column`]s; discovery and verification only ever see this
//! in-memory form.

use crate::types::classify_values;
use crate::{ConstraintError, DataType, DataValue, Result};
use indexmap::IndexMap;

/// A named, ordered sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<DataValue>,
    declared_type: Option<DataType>,
}

impl Column {
    /// Creates a column whose type is inferred from its values.
    pub fn new<V: Into<DataValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            declared_type: None,
        }
    }

    /// Sets the storage type reported by the adapter that produced the column.
    ///
    /// Storage layers often promote types: integer columns holding nulls come
    /// back as floating point, boolean columns with nulls as generic objects.
    /// A declared type wins over inference from the values.
    pub fn with_declared_type(mut self, data_type: DataType) -> Self {
        self.declared_type = Some(data_type);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    pub fn declared_type(&self) -> Option<DataType> {
        self.declared_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the non-null values.
    pub fn non_null(&self) -> impl Iterator<Item = &DataValue> {
        self.values.iter().filter(|v| !v.is_null())
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Classified type of the column.
    pub fn data_type(&self) -> DataType {
        self.declared_type
            .unwrap_or_else(|| classify_values(&self.values))
    }
}

/// An ordered collection of equal-length columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    columns: IndexMap<String, Column>,
    row_count: usize,
}

impl DataSet {
    /// Creates a new empty dataset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a dataset from columns, keeping their order.
    ///
    /// Fails if two columns share a name or the columns differ in length.
    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Result<Self> {
        let mut dataset = Self::empty();
        for column in columns {
            dataset.add_column(column)?;
        }
        Ok(dataset)
    }

    /// Appends a column.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.columns.contains_key(column.name()) {
            return Err(ConstraintError::InvalidDataset(format!(
                "duplicate column '{}'",
                column.name()
            )));
        }
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(ConstraintError::InvalidDataset(format!(
                "column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.row_count
            )));
        }
        self.row_count = column.len();
        self.columns.insert(column.name().to_string(), column);
        Ok(())
    }

    /// Number of rows shared by every column.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the dataset has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Iterates over the columns in order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}
