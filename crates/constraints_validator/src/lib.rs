//! # Data Constraints Validator
//!
//! Discovery and verification engine for dataset constraints. This crate
//! provides:
//!
//! - Discovery of per-field constraints from a reference dataset
//! - Verification of a dataset against stored constraints, with fuzzy
//!   bounds and tolerant type checking
//! - A per-column statistic cache shared by both
//! - Verification results with text and tabular renderings
//!
//! ## Example
//!
//! ```rust
//! use constraints_core::{Column, DataSet, ReportFilter, VerificationOptions};
//! use constraints_validator::{discover, verify};
//!
//! let reference = DataSet::from_columns([
//!     Column::new("id", [1, 2, 3]),
//!     Column::new("status", ["open", "closed", "open"]),
//! ])
//! .unwrap();
//! let constraints = discover(&reference).unwrap().unwrap();
//!
//! let today = DataSet::from_columns([
//!     Column::new("id", [4, 5, 6]),
//!     Column::new("status", ["open", "pending", "closed"]),
//! ])
//! .unwrap();
//! let result = verify(&today, &constraints, VerificationOptions::default());
//!
//! if !result.passed() {
//!     print!("{}", result.report(ReportFilter::Failing));
//! }
//! ```

pub mod cache;
mod discover;
mod engine;
mod error;
pub mod fuzzy;
mod report;

pub use cache::{StatValue, Statistic, StatisticCache};
pub use discover::*;
pub use engine::*;
pub use error::*;
pub use report::*;
