//! Scalar values.
//!
//! `DataValue` is shared by dataset columns and by constraint bounds, so a
//! bound read from a constraint file compares directly against the values a
//! column holds.

use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Format used when dates are written to constraint files.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A value in a dataset column or a constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value (NaN counts as null)
    Float(f64),
    /// String value
    String(String),
    /// Date/timestamp value
    Date(NaiveDateTime),
    /// Opaque binary blob
    Binary(Vec<u8>),
    /// List/array value
    List(Vec<DataValue>),
    /// Map/struct value
    Map(HashMap<String, DataValue>),
}

impl DataValue {
    /// Returns true if this value is null. Floating-point NaN is a null marker.
    pub fn is_null(&self) -> bool {
        match self {
            DataValue::Null => true,
            DataValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Returns true for the variants that may appear as a constraint bound.
    ///
    /// Non-finite floats are excluded: JSON has no representation for them.
    pub fn is_scalar(&self) -> bool {
        match self {
            DataValue::Bool(_) | DataValue::Int(_) | DataValue::String(_) | DataValue::Date(_) => {
                true
            }
            DataValue::Float(f) => f.is_finite(),
            _ => false,
        }
    }

    /// Attempts to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get this value as a date.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            DataValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Numeric view of the value. Booleans order as 0 and 1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            DataValue::Int(i) => Some(*i as f64),
            DataValue::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    /// Returns true if the value is a number with no fractional part.
    pub fn is_integral(&self) -> bool {
        match self {
            DataValue::Bool(_) | DataValue::Int(_) => true,
            DataValue::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => false,
        }
    }

    /// Orders two values of the same coarse type.
    ///
    /// Numbers (including booleans) compare numerically, strings
    /// lexicographically and dates chronologically. Anything else is
    /// incomparable.
    pub fn compare(&self, other: &DataValue) -> Option<Ordering> {
        match (self, other) {
            (DataValue::Int(a), DataValue::Int(b)) => Some(a.cmp(b)),
            (DataValue::Bool(a), DataValue::Bool(b)) => Some(a.cmp(b)),
            (DataValue::String(a), DataValue::String(b)) => Some(a.cmp(b)),
            (DataValue::Date(a), DataValue::Date(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    /// Hashable identity of the value, used to count distinct values.
    ///
    /// Integral floats share their key with the equal integer, so a column
    /// holding `1` and `1.0` has one distinct value.
    pub fn key(&self) -> Option<ValueKey> {
        match self {
            DataValue::Bool(b) => Some(ValueKey::Bool(*b)),
            DataValue::Int(i) => Some(ValueKey::Int(*i)),
            DataValue::Float(f) if f.is_nan() => None,
            DataValue::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(ValueKey::Int(*f as i64))
                } else {
                    Some(ValueKey::Float(f.to_bits()))
                }
            }
            DataValue::String(s) => Some(ValueKey::String(s.clone())),
            DataValue::Date(d) => Some(ValueKey::Date(*d)),
            DataValue::Binary(b) => Some(ValueKey::Binary(b.clone())),
            DataValue::Null | DataValue::List(_) | DataValue::Map(_) => None,
        }
    }
}

/// Hashable form of a non-null scalar, see [`DataValue::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    String(String),
    Date(NaiveDateTime),
    Binary(Vec<u8>),
}

/// Formats a date the way constraint files store it.
pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a date written by [`format_date`], an ISO-8601 timestamp, or a
/// bare `YYYY-MM-DD` date (taken as midnight).
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => write!(f, "null"),
            DataValue::Bool(b) => write!(f, "{b}"),
            DataValue::Int(i) => write!(f, "{i}"),
            DataValue::Float(x) => write!(f, "{x}"),
            DataValue::String(s) => write!(f, "{s:?}"),
            DataValue::Date(d) => write!(f, "{}", format_date(d)),
            DataValue::Binary(b) => write!(f, "<{} bytes>", b.len()),
            DataValue::List(items) => write!(f, "<list of {}>", items.len()),
            DataValue::Map(entries) => write!(f, "<map of {}>", entries.len()),
        }
    }
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataValue::Null => serializer.serialize_none(),
            DataValue::Bool(b) => serializer.serialize_bool(*b),
            DataValue::Int(i) => serializer.serialize_i64(*i),
            DataValue::Float(f) => serializer.serialize_f64(*f),
            DataValue::String(s) => serializer.serialize_str(s),
            DataValue::Date(d) => serializer.serialize_str(&format_date(d)),
            DataValue::Binary(b) => serializer.serialize_bytes(b),
            DataValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DataValue::Map(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for key in keys {
                    map.serialize_entry(key, &entries[key])?;
                }
                map.end()
            }
        }
    }
}

impl From<&serde_json::Value> for DataValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DataValue::Null,
            serde_json::Value::Bool(b) => DataValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => DataValue::Int(i),
                None => DataValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => DataValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                DataValue::List(items.iter().map(DataValue::from).collect())
            }
            serde_json::Value::Object(entries) => DataValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), DataValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::String(s)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::String(s.to_string())
    }
}

impl From<i64> for DataValue {
    fn from(i: i64) -> Self {
        DataValue::Int(i)
    }
}

impl From<i32> for DataValue {
    fn from(i: i32) -> Self {
        DataValue::Int(i64::from(i))
    }
}

impl From<f64> for DataValue {
    fn from(f: f64) -> Self {
        DataValue::Float(f)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Bool(b)
    }
}

impl From<NaiveDateTime> for DataValue {
    fn from(d: NaiveDateTime) -> Self {
        DataValue::Date(d)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DataValue::Null, Into::into)
    }
}
