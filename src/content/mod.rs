//! Stateless value-level checks attached to subfields and control field positions.
//!
//! Two capabilities are exposed:
//! - [`ContentParser`] splits a value into named components
//!   (subfield 6 linkage, record control numbers, fixed-length positions).
//! - [`ContentValidator`] accepts or rejects a value with an exact [`Violation`] cause
//!   (ISBN and ISSN check digits).
//!
//! Both are pure: they never see the owning record. The schema tables reference them
//! by name through [`ParserKind`] and [`ValidatorKind`].

pub mod control_number;
pub mod linkage;
pub mod position;
pub mod standard_number;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use control_number::{ControlNumber, RecordControlNumberParser};
pub use linkage::{LinkageInfo, LinkageParser};
pub use position::PositionParser;
pub use standard_number::{IsbnValidator, IssnValidator};

/// Named components produced by a [`ContentParser`], in parse order.
pub type Components = IndexMap<String, String>;

/// The exact reason a value was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Violation {
    /// The check digit does not match the weighted sum of the other digits.
    #[error("bad checksum")]
    BadChecksum,
    /// The value has the wrong number of significant characters.
    #[error("bad length: {0}")]
    BadLength(usize),
    /// A character that is not allowed at its position.
    #[error("bad character: '{0}'")]
    BadCharacter(char),
    /// The value does not follow the expected layout.
    #[error("bad format")]
    BadFormat,
    /// The value is not one of the declared codes.
    #[error("unknown code: '{0}'")]
    UnknownCode(String),
}

/// Splits a value into named components.
pub trait ContentParser {
    /// Parse `value`, or explain why it cannot be parsed.
    ///
    /// # Errors
    ///
    /// Returns the [`Violation`] describing the malformed part of the value.
    fn parse(&self, value: &str) -> Result<Components, Violation>;
}

/// Accepts or rejects a value.
pub trait ContentValidator {
    /// Validate `value`.
    ///
    /// # Errors
    ///
    /// Returns the [`Violation`] describing why the value is not acceptable.
    fn validate(&self, value: &str) -> Result<(), Violation>;
}

/// Parser reference used by subfield definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParserKind {
    /// Subfield 6 linkage (`880-01/(3/r`)
    Linkage,
    /// Record control number with optional MARC organization prefix (`(OCoLC)123`)
    RecordControlNumber,
}

impl ParserKind {
    /// Run the referenced parser.
    ///
    /// # Errors
    ///
    /// Returns the parser's [`Violation`] when `value` is malformed.
    pub fn parse(&self, value: &str) -> Result<Components, Violation> {
        match self {
            Self::Linkage => LinkageParser.parse(value),
            Self::RecordControlNumber => RecordControlNumberParser.parse(value),
        }
    }
}

/// Validator reference used by subfield definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidatorKind {
    /// ISBN-10 or ISBN-13
    Isbn,
    /// ISSN
    Issn,
}

impl ValidatorKind {
    /// Run the referenced validator.
    ///
    /// # Errors
    ///
    /// Returns the validator's [`Violation`] when `value` is rejected.
    pub fn validate(&self, value: &str) -> Result<(), Violation> {
        match self {
            Self::Isbn => IsbnValidator.validate(value),
            Self::Issn => IssnValidator.validate(value),
        }
    }
}
