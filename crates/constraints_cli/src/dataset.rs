//! Columnar JSON dataset loader.
//!
//! A dataset file is an object mapping column names to value arrays:
//!
//! ```json
//! {"id": [1, 2, 3], "name": ["a", "b", null]}
//! ```
//!
//! A column may instead be `{"type": "date", "values": [...]}` to declare
//! its storage type. Strings in a `date` column are parsed as timestamps;
//! elsewhere strings stay strings.

use anyhow::{Context, Result, bail};
use constraints_core::{Column, DataSet, DataType, DataValue, parse_date};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawColumn {
    Values(Vec<serde_json::Value>),
    Typed {
        #[serde(rename = "type")]
        data_type: DataType,
        values: Vec<serde_json::Value>,
    },
}

pub fn load(path: &Path) -> Result<DataSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let dataset = parse(&content)
        .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
    debug!(
        "Loaded {} rows x {} columns from {}",
        dataset.row_count(),
        dataset.column_count(),
        path.display()
    );
    Ok(dataset)
}

pub fn parse(content: &str) -> Result<DataSet> {
    let raw: IndexMap<String, RawColumn> =
        serde_json::from_str(content).context("Dataset must be a JSON object of columns")?;

    let mut dataset = DataSet::empty();
    for (name, column) in raw {
        let column = match column {
            RawColumn::Values(values) => Column::new(&name, values.iter().map(DataValue::from)),
            RawColumn::Typed { data_type, values } => {
                let values = values
                    .iter()
                    .map(|v| typed_value(&name, data_type, v))
                    .collect::<Result<Vec<_>>>()?;
                Column::new(&name, values).with_declared_type(data_type)
            }
        };
        dataset.add_column(column)?;
    }
    Ok(dataset)
}

fn typed_value(column: &str, data_type: DataType, value: &serde_json::Value) -> Result<DataValue> {
    match (data_type, value) {
        (DataType::Date, serde_json::Value::String(s)) => match parse_date(s) {
            Some(date) => Ok(DataValue::Date(date)),
            None => bail!("Column '{column}': '{s}' is not a date"),
        },
        _ => Ok(DataValue::from(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_columns() {
        let dataset = parse(r#"{"b": [1, 2.5, null], "a": ["x", "2024-01-01", null]}"#).unwrap();
        assert_eq!(dataset.column_names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(dataset.column("b").unwrap().data_type(), DataType::Real);
        assert_eq!(dataset.column("a").unwrap().data_type(), DataType::String);
    }

    #[test]
    fn test_parse_typed_columns() {
        let dataset = parse(
            r#"{"when": {"type": "date", "values": ["2024-01-01", null]},
                "n": {"type": "real", "values": [1, null]}}"#,
        )
        .unwrap();
        let when = dataset.column("when").unwrap();
        assert!(matches!(when.values()[0], DataValue::Date(_)));
        assert_eq!(dataset.column("n").unwrap().data_type(), DataType::Real);
    }

    #[test]
    fn test_bad_date_is_an_error() {
        assert!(parse(r#"{"when": {"type": "date", "values": ["soon"]}}"#).is_err());
    }

    #[test]
    fn test_ragged_columns_are_an_error() {
        assert!(parse(r#"{"a": [1, 2], "b": [1]}"#).is_err());
    }
}
