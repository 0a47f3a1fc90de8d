//! The in-memory shape of one decoded record.
//!
//! This module provides the core record types handed over by a decoder:
//! - [`Record`]: leader, control fields and data fields in document order
//! - [`ControlField`]: a `(tag, value)` pair (001-009)
//! - [`Field`]: variable data fields (010+)
//! - [`Subfield`]: named data elements within fields
//!
//! A record is filled while decoding and read afterwards. Validation attaches
//! findings without touching the field content.
//!
//! # Examples
//!
//! ```
//! use marcqa::{Dialect, Field, IgnorableFields, Leader, Record, SchemaRegistry};
//!
//! let mut record = Record::builder(Leader::default())
//!     .control_field("001", "12345")
//!     .field(
//!         Field::builder("245", '1', '0')
//!             .subfield('a', "Title")
//!             .build(),
//!     )
//!     .build();
//!
//! let registry = SchemaRegistry::shared()?;
//! let valid = record.validate(registry, Dialect::Marc21, false, &IgnorableFields::new());
//! assert!(valid);
//! assert_eq!(record.id(true), "12345");
//! # Ok::<(), marcqa::MarcError>(())
//! ```
//!
//! Iterate over fields:
//!
//! ```ignore
//! for field in record.fields_by_tag("650") {
//!     for value in field.subfields_by_code('a') {
//!         println!("Subject: {}", value);
//!     }
//! }
//! ```

use crate::config::ValidationParams;
use crate::dialect::Dialect;
use crate::error::{MarcError, Result};
use crate::ignorable::IgnorableFields;
use crate::key_value::{self, KeyProfile};
use crate::leader::Leader;
use crate::schema::SchemaRegistry;
use crate::validation::{self, Validator};
use crate::validation_error::ValidationError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A decoded MARC record.
///
/// Control fields and data fields are kept as sequences so the document order and
/// any repetition survive exactly as decoded.
///
/// Equality compares the leader and fields only; the findings of the last
/// validation are not part of a record's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Record leader
    pub leader: Leader,
    /// Control fields (001-009), in document order
    pub control_fields: Vec<ControlField>,
    /// Data fields (010+), in document order
    pub fields: Vec<Field>,
    #[serde(skip)]
    findings: Vec<ValidationError>,
    #[serde(skip)]
    ignored: Vec<ValidationError>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.leader == other.leader
            && self.control_fields == other.control_fields
            && self.fields == other.fields
    }
}

impl Eq for Record {}

/// A control field (001-009).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlField {
    /// Field tag
    pub tag: String,
    /// Field value
    pub value: String,
}

/// A data field in a MARC record (fields 010 and higher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field tag (3 characters)
    pub tag: String,
    /// First indicator
    pub indicator1: char,
    /// Second indicator
    pub indicator2: char,
    /// Subfields (stored in `SmallVec` to avoid allocation for typical fields with 4 or fewer subfields)
    pub subfields: SmallVec<[Subfield; 4]>,
}

/// A subfield within a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    /// Subfield code (single character)
    pub code: char,
    /// Subfield value
    pub value: String,
}

impl Record {
    /// Create a new record with the given leader and no fields
    #[must_use]
    pub fn new(leader: Leader) -> Self {
        Record {
            leader,
            control_fields: Vec::new(),
            fields: Vec::new(),
            findings: Vec::new(),
            ignored: Vec::new(),
        }
    }

    /// Create a builder for fluently constructing records
    #[must_use]
    pub fn builder(leader: Leader) -> RecordBuilder {
        RecordBuilder {
            record: Record::new(leader),
        }
    }

    /// Append a control field
    pub fn add_control_field(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.control_fields.push(ControlField {
            tag: tag.into(),
            value: value.into(),
        });
    }

    /// Value of the first control field with the given tag
    #[must_use]
    pub fn get_control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .iter()
            .find(|cf| cf.tag == tag)
            .map(|cf| cf.value.as_str())
    }

    /// Iterate over all control fields in document order
    pub fn control_fields_iter(&self) -> impl Iterator<Item = &ControlField> {
        self.control_fields.iter()
    }

    /// Append a data field
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// First field with a given tag
    #[must_use]
    pub fn get_field(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Iterate over all data fields in document order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Iterate over fields matching a specific tag
    pub fn fields_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    /// The record id: the value of 001, or an empty string when there is none.
    #[must_use]
    pub fn id(&self, trim: bool) -> String {
        let id = self.get_control_field("001").unwrap_or_default();
        if trim {
            id.trim().to_string()
        } else {
            id.to_string()
        }
    }

    /// Lossless serialization of the record content (findings excluded).
    ///
    /// # Errors
    ///
    /// [`MarcError::SerializationError`] if serialization fails.
    pub fn as_canonical_form(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a record from [`Record::as_canonical_form`].
    ///
    /// # Errors
    ///
    /// [`MarcError::InvalidRecord`] if the text is not a canonical record.
    pub fn from_canonical_form(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MarcError::InvalidRecord(e.to_string()))
    }

    /// Flatten the record into ordered `key -> values` pairs.
    ///
    /// See [`KeyProfile`] for the key naming. Elements the registry does not know
    /// keep their MARC keys.
    #[must_use]
    pub fn key_value_pairs(
        &self,
        registry: &SchemaRegistry,
        profile: KeyProfile,
        resolve_control_subfields: bool,
        dialect: Dialect,
    ) -> IndexMap<String, Vec<String>> {
        key_value::key_value_pairs(self, registry, profile, resolve_control_subfields, dialect)
    }

    /// Validate the record and keep the findings on it.
    ///
    /// Findings whose path matches `ignorable` are set aside and never affect the
    /// verdict. Returns `true` when no surfaced finding remains.
    pub fn validate(
        &mut self,
        registry: &SchemaRegistry,
        dialect: Dialect,
        collect_summary_only: bool,
        ignorable: &IgnorableFields,
    ) -> bool {
        self.run_validation(registry, dialect, collect_summary_only, ignorable, true)
    }

    /// Validate the record with the settings of a run.
    pub fn validate_with(&mut self, registry: &SchemaRegistry, params: &ValidationParams) -> bool {
        self.run_validation(
            registry,
            params.dialect,
            params.collect_summary_only,
            &params.ignorable_fields,
            params.trim_id,
        )
    }

    fn run_validation(
        &mut self,
        registry: &SchemaRegistry,
        dialect: Dialect,
        collect_summary_only: bool,
        ignorable: &IgnorableFields,
        trim_id: bool,
    ) -> bool {
        let record_id = self.id(trim_id);
        let findings = Validator::new(registry, dialect).validate(self, &record_id);
        let (mut surfaced, ignored) = validation::partition_ignorable(findings, ignorable);
        if collect_summary_only {
            surfaced = validation::collapse_duplicates(surfaced);
        }
        self.findings = surfaced;
        self.ignored = ignored;
        self.is_valid()
    }

    /// Surfaced findings of the last validation, in document order.
    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.findings
    }

    /// Findings of the last validation that matched an ignorable path.
    #[must_use]
    pub fn ignored_errors(&self) -> &[ValidationError] {
        &self.ignored
    }

    pub(crate) fn validation_errors_mut(&mut self) -> &mut [ValidationError] {
        &mut self.findings
    }

    /// Whether the last validation left no surfaced finding.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Builder for fluently constructing records
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Add a control field to the record being built
    #[must_use]
    pub fn control_field(mut self, tag: &str, value: &str) -> Self {
        self.record.add_control_field(tag, value);
        self
    }

    /// Add a data field to the record being built
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.record.add_field(field);
        self
    }

    /// Build the record
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

impl Field {
    /// Create a new data field
    #[must_use]
    pub fn new(tag: impl Into<String>, indicator1: char, indicator2: char) -> Self {
        Field {
            tag: tag.into(),
            indicator1,
            indicator2,
            subfields: SmallVec::new(),
        }
    }

    /// Create a builder for constructing fields fluently
    ///
    /// # Examples
    ///
    /// ```
    /// use marcqa::Field;
    ///
    /// let field = Field::builder("245", '1', '0')
    ///     .subfield('a', "The Great Gatsby")
    ///     .subfield('c', "F. Scott Fitzgerald")
    ///     .build();
    /// assert_eq!(field.get_subfield('c'), Some("F. Scott Fitzgerald"));
    /// ```
    #[must_use]
    pub fn builder(tag: impl Into<String>, indicator1: char, indicator2: char) -> FieldBuilder {
        FieldBuilder {
            field: Field::new(tag, indicator1, indicator2),
        }
    }

    /// Add a subfield
    pub fn add_subfield(&mut self, code: char, value: impl Into<String>) {
        self.subfields.push(Subfield {
            code,
            value: value.into(),
        });
    }

    /// Get first value for a subfield code
    #[must_use]
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Iterate over all subfields
    pub fn subfields(&self) -> impl Iterator<Item = &Subfield> {
        self.subfields.iter()
    }

    /// Iterate over subfield values with a specific code
    pub fn subfields_by_code(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Indicator 1 or 2
    #[must_use]
    pub fn indicator(&self, position: u8) -> Option<char> {
        match position {
            1 => Some(self.indicator1),
            2 => Some(self.indicator2),
            _ => None,
        }
    }
}

/// Builder for fluently constructing fields
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Add a subfield to the field being built
    #[must_use]
    pub fn subfield(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield(code, value);
        self
    }

    /// Build the field
    #[must_use]
    pub fn build(self) -> Field {
        self.field
    }
}
