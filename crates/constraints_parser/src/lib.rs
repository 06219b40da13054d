//! Reader and writer for persisted constraint files.
//!
//! Constraint files are JSON (`.tdda`, `.json`) or YAML (`.yml`, `.yaml`)
//! documents with a root `fields` mapping from field name to an ordered
//! mapping of constraint kind to value:
//!
//! ```json
//! {
//!   "fields": {
//!     "age": {
//!       "type": "int",
//!       "min": 0,
//!       "max": {"value": 120, "precision": "fuzzy"},
//!       "sign": "non-negative",
//!       "max_nulls": 0
//!     }
//!   }
//! }
//! ```
//!
//! Unknown constraint kinds are skipped with a warning so that files written
//! by newer versions still load. The warnings are returned alongside the
//! constraints and also emitted through `tracing`.
//!
//! # Example
//!
//! ```rust
//! use constraints_core::ConstraintKind;
//! use constraints_parser::parse_json;
//!
//! let loaded = parse_json(r#"{"fields": {"age": {"type": "int", "rex": ["^\\d+$"]}}}"#).unwrap();
//! let age = loaded.constraints.field("age").unwrap();
//! assert!(age.get(ConstraintKind::Type).is_some());
//! assert_eq!(loaded.warnings.len(), 1);
//! ```

use constraints_core::{
    Constraint, ConstraintError, ConstraintKind, ConstraintValue, CreationMetadata, DataType,
    DataValue, DatasetConstraints, FieldConstraints, GROUP_SEPARATOR, MultiFieldConstraints,
    Precision, parse_date,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while reading or writing constraint files.
#[derive(Debug, Error)]
pub enum ParserError {
    /// JSON parsing or serialization failed
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A constraint in the file is malformed
    #[error("Invalid constraint in field '{field}': {source}")]
    InvalidConstraint {
        /// Field or group the constraint belongs to
        field: String,
        /// Underlying specification error
        #[source]
        source: ConstraintError,
    },

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported constraint file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintsFormat {
    /// JSON format (.tdda, .json)
    Json,
    /// YAML format (.yml, .yaml)
    Yaml,
}

/// Constraints read from a file, with the warnings raised while reading.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConstraints {
    pub constraints: DatasetConstraints,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConstraints {
    #[serde(default)]
    creation_metadata: Option<serde_json::Value>,
    #[serde(default)]
    fields: IndexMap<String, IndexMap<String, serde_json::Value>>,
    #[serde(default)]
    field_groups: IndexMap<String, IndexMap<String, serde_json::Value>>,
}

/// Parse constraints from a JSON string.
pub fn parse_json(content: &str) -> Result<LoadedConstraints> {
    let raw: RawConstraints = serde_json::from_str(content)?;
    from_raw(raw)
}

/// Parse constraints from a YAML string.
///
/// # Example
///
/// ```rust
/// use constraints_parser::parse_yaml;
///
/// let yaml = r#"
/// fields:
///   status:
///     type: string
///     allowed_values: [active, inactive]
/// "#;
///
/// let loaded = parse_yaml(yaml).unwrap();
/// assert_eq!(loaded.constraints.len(), 1);
/// assert!(loaded.warnings.is_empty());
/// ```
pub fn parse_yaml(content: &str) -> Result<LoadedConstraints> {
    let raw: RawConstraints = serde_yaml_ng::from_str(content)?;
    from_raw(raw)
}

/// Detect the file format from a path based on its extension.
///
/// # Supported Extensions
///
/// * `.tdda`, `.json` → `ConstraintsFormat::Json`
/// * `.yaml`, `.yml` → `ConstraintsFormat::Yaml`
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<ConstraintsFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "tdda" | "json" => Ok(ConstraintsFormat::Json),
        "yaml" | "yml" => Ok(ConstraintsFormat::Yaml),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a constraint file with automatic format detection.
pub fn parse_file(path: &Path) -> Result<LoadedConstraints> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    debug!("Parsing {:?} constraints from {}", format, path.display());

    match format {
        ConstraintsFormat::Json => parse_json(&content),
        ConstraintsFormat::Yaml => parse_yaml(&content),
    }
}

/// Serialize constraints as pretty-printed JSON with a trailing newline.
pub fn to_json(constraints: &DatasetConstraints) -> Result<String> {
    let mut text = serde_json::to_string_pretty(constraints)?;
    text.push('\n');
    Ok(text)
}

/// Serialize constraints as YAML.
pub fn to_yaml(constraints: &DatasetConstraints) -> Result<String> {
    Ok(serde_yaml_ng::to_string(constraints)?)
}

/// Serialize constraints in the given format.
pub fn to_string(constraints: &DatasetConstraints, format: ConstraintsFormat) -> Result<String> {
    match format {
        ConstraintsFormat::Json => to_json(constraints),
        ConstraintsFormat::Yaml => to_yaml(constraints),
    }
}

/// Write constraints to a file, choosing the format from its extension.
pub fn write_file(constraints: &DatasetConstraints, path: &Path) -> Result<()> {
    let text = to_string(constraints, detect_format(path)?)?;
    std::fs::write(path, text)?;
    Ok(())
}

fn from_raw(raw: RawConstraints) -> Result<LoadedConstraints> {
    let mut constraints = DatasetConstraints::new();
    let mut warnings = Vec::new();

    if let Some(value) = raw.creation_metadata {
        match serde_json::from_value::<CreationMetadata>(value) {
            Ok(metadata) => constraints.set_creation_metadata(metadata),
            Err(e) => warnings.push(warn_and_return(format!(
                "Ignoring unreadable creation_metadata: {e}"
            ))),
        }
    }

    for (name, entries) in raw.fields {
        let is_date = entries.get("type").and_then(|v| v.as_str()) == Some(DataType::Date.as_str());
        let mut field = FieldConstraints::new(name.clone());

        for (key, value) in &entries {
            let Some(kind) = recognise_kind(key, &name, &mut warnings) else {
                continue;
            };
            constraint_from_json(kind, value, is_date)
                .and_then(|c| field.add(c).map(|_| ()))
                .map_err(|source| ParserError::InvalidConstraint {
                    field: name.clone(),
                    source,
                })?;
        }
        constraints.add_field(field);
    }

    for (key, entries) in raw.field_groups {
        let mut group = MultiFieldConstraints::new(key.split(GROUP_SEPARATOR));
        for (kind_name, value) in &entries {
            let Some(kind) = recognise_kind(kind_name, &key, &mut warnings) else {
                continue;
            };
            constraint_from_json(kind, value, false)
                .and_then(|c| group.add(c).map(|_| ()))
                .map_err(|source| ParserError::InvalidConstraint {
                    field: key.clone(),
                    source,
                })?;
        }
        constraints.add_group(group);
    }

    Ok(LoadedConstraints {
        constraints,
        warnings,
    })
}

fn recognise_kind(key: &str, field: &str, warnings: &mut Vec<String>) -> Option<ConstraintKind> {
    match key.parse::<ConstraintKind>() {
        Ok(kind) => Some(kind),
        Err(_) => {
            warnings.push(warn_and_return(format!(
                "Constraint '{key}' on field '{field}' is not recognised and has been ignored"
            )));
            None
        }
    }
}

fn warn_and_return(message: String) -> String {
    warn!("{}", message);
    message
}

fn constraint_from_json(
    kind: ConstraintKind,
    value: &serde_json::Value,
    is_date: bool,
) -> std::result::Result<Constraint, ConstraintError> {
    match kind {
        ConstraintKind::Min | ConstraintKind::Max => {
            let (bound, precision) = split_bound(kind, value)?;
            let bound = match DataValue::from(bound) {
                DataValue::String(s) if is_date => parse_date(&s)
                    .map(DataValue::Date)
                    .unwrap_or(DataValue::String(s)),
                other => other,
            };
            Constraint::new(kind, bound)?.with_precision(precision)
        }
        _ => Constraint::new(kind, constraint_value(value)),
    }
}

/// Splits a `min`/`max` entry into its bound and precision.
fn split_bound(
    kind: ConstraintKind,
    value: &serde_json::Value,
) -> std::result::Result<(&serde_json::Value, Precision), ConstraintError> {
    let serde_json::Value::Object(entries) = value else {
        return Ok((value, Precision::default()));
    };
    if let Some(extra) = entries
        .keys()
        .find(|k| k.as_str() != "value" && k.as_str() != "precision")
    {
        return Err(ConstraintError::invalid(
            kind.as_str(),
            format!("unexpected key '{extra}'"),
        ));
    }
    let bound = entries
        .get("value")
        .ok_or_else(|| ConstraintError::invalid(kind.as_str(), "missing 'value'"))?;
    let precision = match entries.get("precision") {
        None | Some(serde_json::Value::Null) => Precision::default(),
        Some(serde_json::Value::String(s)) => s.parse()?,
        Some(other) => {
            return Err(ConstraintError::invalid(
                kind.as_str(),
                format!("precision must be a string, got {other}"),
            ));
        }
    };
    Ok((bound, precision))
}

fn constraint_value(value: &serde_json::Value) -> ConstraintValue {
    ConstraintValue::from(DataValue::from(value))
}
