//! Type classification for values and columns.

use crate::{ConstraintError, DataValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of types a value or column is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Null,
    Bool,
    Int,
    Real,
    String,
    Date,
    Other,
}

/// Coarse types: `bool`, `int` and `real` all collapse into `Number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoarseType {
    Number,
    String,
    Date,
    Null,
    Other,
}

impl DataType {
    pub const ALL: [DataType; 7] = [
        DataType::Null,
        DataType::Bool,
        DataType::Int,
        DataType::Real,
        DataType::String,
        DataType::Date,
        DataType::Other,
    ];

    /// Name used for this type in constraint files.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Real => "real",
            DataType::String => "string",
            DataType::Date => "date",
            DataType::Other => "other",
        }
    }

    pub fn coarsen(self) -> CoarseType {
        match self {
            DataType::Bool | DataType::Int | DataType::Real => CoarseType::Number,
            DataType::String => CoarseType::String,
            DataType::Date => CoarseType::Date,
            DataType::Null => CoarseType::Null,
            DataType::Other => CoarseType::Other,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.coarsen() == CoarseType::Number
    }
}

impl CoarseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoarseType::Number => "number",
            CoarseType::String => "string",
            CoarseType::Date => "date",
            CoarseType::Null => "null",
            CoarseType::Other => "other",
        }
    }
}

impl fmt::Display for CoarseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConstraintError::UnknownType(s.to_string()))
    }
}

/// Classifies a single value.
///
/// Null markers come first, then strings, booleans, integers, floats and
/// dates. Binary blobs, lists and maps are `Other`.
pub fn classify(value: &DataValue) -> DataType {
    if value.is_null() {
        return DataType::Null;
    }
    match value {
        DataValue::String(_) => DataType::String,
        DataValue::Bool(_) => DataType::Bool,
        DataValue::Int(_) => DataType::Int,
        DataValue::Float(_) => DataType::Real,
        DataValue::Date(_) => DataType::Date,
        _ => DataType::Other,
    }
}

/// Classifies the non-null values of a column.
///
/// A mix of integers and floats is `Real`; any other mix is `Other`. With no
/// non-null values at all the column is `Null`.
pub fn classify_values<'a>(values: impl IntoIterator<Item = &'a DataValue>) -> DataType {
    let mut seen: Option<DataType> = None;
    for value in values {
        let t = classify(value);
        if t == DataType::Null {
            continue;
        }
        seen = Some(match (seen, t) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(DataType::Int), DataType::Real) | (Some(DataType::Real), DataType::Int) => {
                DataType::Real
            }
            _ => return DataType::Other,
        });
    }
    seen.unwrap_or(DataType::Null)
}

pub fn coarse_type(value: &DataValue) -> CoarseType {
    classify(value).coarsen()
}

/// Returns whether two values have the same coarse type.
pub fn types_compatible(x: &DataValue, y: &DataValue) -> bool {
    coarse_type(x) == coarse_type(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_classify_scalars() {
        assert_eq!(classify(&DataValue::Null), DataType::Null);
        assert_eq!(classify(&DataValue::Float(f64::NAN)), DataType::Null);
        assert_eq!(classify(&DataValue::from("x")), DataType::String);
        assert_eq!(classify(&DataValue::Bool(false)), DataType::Bool);
        assert_eq!(classify(&DataValue::Int(3)), DataType::Int);
        assert_eq!(classify(&DataValue::Float(3.5)), DataType::Real);
        let date = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(classify(&DataValue::Date(date)), DataType::Date);
        assert_eq!(classify(&DataValue::Binary(vec![1, 2])), DataType::Other);
        assert_eq!(classify(&DataValue::List(vec![])), DataType::Other);
    }

    #[test]
    fn test_classify_columns() {
        let ints = [DataValue::Int(1), DataValue::Null, DataValue::Int(2)];
        assert_eq!(classify_values(&ints), DataType::Int);

        let mixed_numbers = [DataValue::Int(1), DataValue::Float(2.5)];
        assert_eq!(classify_values(&mixed_numbers), DataType::Real);

        let mixed = [DataValue::Int(1), DataValue::from("a")];
        assert_eq!(classify_values(&mixed), DataType::Other);

        let nulls = [DataValue::Null, DataValue::Null];
        assert_eq!(classify_values(&nulls), DataType::Null);
    }

    #[test]
    fn test_coarsening() {
        assert_eq!(DataType::Bool.coarsen(), CoarseType::Number);
        assert_eq!(DataType::Int.coarsen(), CoarseType::Number);
        assert_eq!(DataType::Real.coarsen(), CoarseType::Number);
        assert_eq!(DataType::Date.coarsen(), CoarseType::Date);
        assert!(types_compatible(&DataValue::Bool(true), &DataValue::Float(0.5)));
        assert!(!types_compatible(&DataValue::Int(1), &DataValue::from("1")));
    }

    #[test]
    fn test_type_names_parse() {
        for t in DataType::ALL {
            assert_eq!(t.as_str().parse::<DataType>().unwrap(), t);
        }
        assert!("integer".parse::<DataType>().is_err());
    }
}
