#![warn(missing_docs)]

//! # marcqa: MARC quality assessment
//!
//! Schema-driven structural validation of decoded MARC records against a
//! dialect-aware registry of field, indicator and subfield rules.
//!
//! ## Quick Start
//!
//! ```
//! use marcqa::{Dialect, Field, IgnorableFields, Leader, Record, SchemaRegistry, ValidationErrorType};
//!
//! let registry = SchemaRegistry::shared()?;
//! let mut record = Record::builder(Leader::default())
//!     .control_field("001", "123")
//!     .field(
//!         Field::builder("541", ' ', ' ')
//!             .subfield('a', "Gift of the author")
//!             .subfield('a', "Purchase")
//!             .build(),
//!     )
//!     .build();
//!
//! assert!(!record.validate(registry, Dialect::Marc21, false, &IgnorableFields::new()));
//! let finding = &record.validation_errors()[0];
//! assert_eq!(finding.error_type, ValidationErrorType::SubfieldNotRepeatable);
//! assert_eq!(finding.to_string(), "541$a: non-repeatable subfield: there are 2 instances");
//! # Ok::<(), marcqa::MarcError>(())
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: Field, indicator, subfield and code list definitions; the registry
//! - [`content`]: Value parsers and validators (linkage, control numbers, ISBN, ISSN)
//! - [`record`]: Decoded record structures (`Record`, `ControlField`, `Field`, `Subfield`)
//! - [`validation`]: The multi-pass record validator
//! - [`validation_error`]: Finding types, categories and signatures
//! - [`aggregator`]: Run-scoped finding ids and batch counters
//! - [`batch`]: Sequential and Rayon-parallel batch validation
//! - [`report`]: Report rows and CSV/TSV output
//! - [`frbr`]: FRBR user-task coverage analysis
//! - [`key_value`]: Flattened key/value record view
//! - [`config`]: Run parameters
//! - [`ignorable`]: Ignorable paths and record filters
//! - [`error`]: Error types and result type

pub mod aggregator;
pub mod batch;
pub mod config;
pub mod content;
pub mod dialect;
pub mod error;
pub mod frbr;
pub mod ignorable;
pub mod key_value;
pub mod leader;
/// Decoded record structures (`Record`, `ControlField`, `Field`, `Subfield`)
pub mod record;
pub mod report;
pub mod schema;
pub mod validation;
pub mod validation_error;

pub use aggregator::{Counts, ValidationAggregator};
pub use batch::ValidationRun;
pub use config::{ReportFormat, ValidationParams};
pub use dialect::Dialect;
pub use error::{MarcError, Result};
pub use frbr::{FrbrFunction, FunctionAnalyzer, FunctionValue};
pub use ignorable::{IgnorableFields, IgnorableRecords, RecordFilter};
pub use key_value::KeyProfile;
pub use leader::Leader;
pub use record::{ControlField, Field, FieldBuilder, Record, RecordBuilder, Subfield};
pub use schema::{FieldLookup, ResolvedField, SchemaRegistry};
pub use validation::Validator;
pub use validation_error::{ErrorSignature, ValidationError, ValidationErrorCategory, ValidationErrorType};

// README examples run as doctests.
#[cfg(doctest)]
#[doc = include_str!("../README.md")]
struct ReadmeDoctests;
