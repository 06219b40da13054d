//! # Data Constraints Core
//!
//! Core data structures and types for the Data Constraints Engine.
//!
//! This crate provides the building blocks shared by discovery and
//! verification: the value and columnar dataset model, the type classifier,
//! and the typed constraint model with its persisted layout.
//!
//! ## Key Concepts
//!
//! - **DataSet**: an ordered set of named, equal-length columns
//! - **DataType**: the classifier's view of a value or column
//! - **Constraint**: a single rule (kind + value) about a field
//! - **DatasetConstraints**: every rule for a dataset, in field order
//!
//! ## Example
//!
//! ```rust
//! use constraints_core::{Column, DataSet, DataType, FieldConstraintsBuilder, Sign};
//!
//! let dataset = DataSet::from_columns([Column::new("i", [1, 2, 3, 4])]).unwrap();
//! assert_eq!(dataset.column("i").unwrap().data_type(), DataType::Int);
//!
//! let field = FieldConstraintsBuilder::new("i")
//!     .data_type(DataType::Int)
//!     .min(1)
//!     .max(4)
//!     .sign(Sign::Positive)
//!     .build()
//!     .unwrap();
//! assert_eq!(field.len(), 4);
//! ```

pub mod builder;
pub mod constraint;
pub mod dataset;
pub mod error;
pub mod options;
pub mod types;
pub mod value;

pub use builder::*;
pub use constraint::*;
pub use dataset::*;
pub use error::*;
pub use options::*;
pub use types::*;
pub use value::*;
