//! Definition types that make up the schema registry.
//!
//! - [`FieldDefinition`]: a data field (010+): indicators, subfields, cardinality,
//!   and the subfields individual dialects add on top of the baseline
//! - [`SubfieldDefinition`]: one subfield code with its attached parser, validator
//!   and code list
//! - [`IndicatorDefinition`]: allowed values of one indicator position
//! - [`ControlFieldDefinition`] and [`PositionDefinition`]: control fields (001-009)
//!   and the coded positions inside fixed-length data, the leader included
//!
//! Definitions are immutable once a registry has been built.

use crate::content::{ParserKind, ValidatorKind, Violation};
use crate::dialect::Dialect;
use crate::error::{MarcError, Result};
use crate::frbr::FrbrFunction;
use crate::schema::code_list::CodeList;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether an element may occur more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// May repeat
    #[serde(rename = "R", alias = "Repeatable")]
    Repeatable,
    /// At most one occurrence
    #[serde(rename = "NR", alias = "Nonrepeatable")]
    Nonrepeatable,
}

impl Cardinality {
    /// Whether a second occurrence is allowed.
    #[must_use]
    pub const fn is_repeatable(&self) -> bool {
        matches!(self, Self::Repeatable)
    }

    /// The two-letter code used in MARC documentation.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Repeatable => "R",
            Self::Nonrepeatable => "NR",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Build a machine key from a human label: `"Date entered on file"` → `dateEnteredOnFile`.
///
/// With `upper_first` the first word is capitalised as well (`TitleStatement`).
#[must_use]
pub fn to_camel_case(label: &str, upper_first: bool) -> String {
    let mut key = String::with_capacity(label.len());
    for (i, word) in label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        if i == 0 && !upper_first {
            if word.chars().all(|c| !c.is_lowercase()) {
                key.push_str(&word.to_lowercase());
            } else {
                let mut chars = word.chars();
                if let Some(first) = chars.next() {
                    key.extend(first.to_lowercase());
                    key.push_str(chars.as_str());
                }
            }
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                key.extend(first.to_uppercase());
                key.push_str(chars.as_str());
            }
        }
    }
    key
}

/// Allowed values of an indicator position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorRule {
    /// Indicator is undefined; blank (`#` or space) is required
    Undefined,
    /// Indicator can be any single character
    Any,
    /// Indicator must be one of the listed codes (code, meaning)
    Codes(Vec<(char, String)>),
    /// Indicator must be a digit within the range
    Range {
        /// Minimum digit value (0-9)
        min: u8,
        /// Maximum digit value (0-9)
        max: u8,
    },
}

/// Outcome of checking one indicator character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorCheck {
    /// The character is allowed
    Valid,
    /// A code or range is declared and the character is outside it
    Invalid,
    /// The character is a formerly valid, now obsolete code
    Obsolete,
    /// The indicator is undefined but not blank
    NonEmpty,
}

/// Definition of one indicator position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorDefinition {
    /// Indicator label, e.g. "Privacy"
    pub label: Option<String>,
    /// Machine key used in key/value output
    pub mq_tag: Option<String>,
    /// What values are allowed
    pub rule: IndicatorRule,
    /// Codes valid in earlier editions of the format
    pub historical_codes: Vec<(char, String)>,
    /// FRBR user tasks the indicator supports
    pub functions: Vec<FrbrFunction>,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '#'
}

impl IndicatorDefinition {
    /// An undefined indicator.
    #[must_use]
    pub fn undefined() -> Self {
        Self::with_rule(IndicatorRule::Undefined)
    }

    /// An indicator that accepts every character.
    #[must_use]
    pub fn any() -> Self {
        Self::with_rule(IndicatorRule::Any)
    }

    /// An indicator restricted to the given (code, meaning) pairs.
    #[must_use]
    pub fn codes(codes: &[(char, &str)]) -> Self {
        Self::with_rule(IndicatorRule::Codes(
            codes.iter().map(|(c, m)| (*c, (*m).to_string())).collect(),
        ))
    }

    /// An indicator restricted to a digit range.
    #[must_use]
    pub fn range(min: u8, max: u8) -> Self {
        Self::with_rule(IndicatorRule::Range { min, max })
    }

    fn with_rule(rule: IndicatorRule) -> Self {
        IndicatorDefinition {
            label: None,
            mq_tag: None,
            rule,
            historical_codes: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Set the label; also derives the machine key when none is set.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if self.mq_tag.is_none() {
            self.mq_tag = Some(to_camel_case(&label, false));
        }
        self.label = Some(label);
        self
    }

    /// Set the machine key.
    #[must_use]
    pub fn with_mq_tag(mut self, mq_tag: impl Into<String>) -> Self {
        self.mq_tag = Some(mq_tag.into());
        self
    }

    /// Add obsolete codes.
    #[must_use]
    pub fn with_historical_codes(mut self, codes: &[(char, &str)]) -> Self {
        self.historical_codes
            .extend(codes.iter().map(|(c, m)| (*c, (*m).to_string())));
        self
    }

    /// Set the FRBR functions.
    #[must_use]
    pub fn with_functions(mut self, functions: &[FrbrFunction]) -> Self {
        self.functions = functions.to_vec();
        self
    }

    /// Whether the indicator carries any meaning (anything but [`IndicatorRule::Undefined`]).
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !matches!(self.rule, IndicatorRule::Undefined)
    }

    fn is_historical(&self, c: char) -> bool {
        self.historical_codes.iter().any(|(code, _)| *code == c)
    }

    /// Check one indicator character against this definition.
    #[must_use]
    pub fn check(&self, c: char) -> IndicatorCheck {
        let valid = match &self.rule {
            IndicatorRule::Any => true,
            IndicatorRule::Undefined => is_blank(c),
            IndicatorRule::Codes(codes) => codes
                .iter()
                .any(|(code, _)| *code == c || (is_blank(c) && is_blank(*code))),
            IndicatorRule::Range { min, max } => c
                .to_digit(10)
                .and_then(|d| u8::try_from(d).ok())
                .is_some_and(|d| d >= *min && d <= *max),
        };
        if valid {
            IndicatorCheck::Valid
        } else if self.is_historical(c) {
            IndicatorCheck::Obsolete
        } else if matches!(self.rule, IndicatorRule::Undefined) {
            IndicatorCheck::NonEmpty
        } else {
            IndicatorCheck::Invalid
        }
    }

    /// Semantic meaning of a code, when the indicator lists one.
    #[must_use]
    pub fn meaning(&self, c: char) -> Option<&str> {
        match &self.rule {
            IndicatorRule::Codes(codes) => codes
                .iter()
                .find(|(code, _)| *code == c || (is_blank(c) && is_blank(*code)))
                .map(|(_, meaning)| meaning.as_str()),
            _ => None,
        }
    }
}

impl Default for IndicatorDefinition {
    fn default() -> Self {
        Self::undefined()
    }
}

/// Definition of one subfield code within a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubfieldDefinition {
    /// Subfield code
    pub code: char,
    /// Human-readable label
    pub label: String,
    /// Machine key used in key/value output
    pub mq_tag: String,
    /// Whether the code may repeat within one field
    pub cardinality: Cardinality,
    /// Content parser run on every occurrence
    pub parser: Option<ParserKind>,
    /// Validator run on every occurrence
    pub validator: Option<ValidatorKind>,
    /// Name of the code list the value must belong to
    pub code_list: Option<String>,
    /// FRBR user tasks the subfield supports
    pub functions: Vec<FrbrFunction>,
    /// National compliance levels (e.g. "M", "A", "O")
    pub levels: Option<String>,
}

impl SubfieldDefinition {
    /// Create a subfield definition.
    #[must_use]
    pub fn new(code: char, label: impl Into<String>, cardinality: Cardinality) -> Self {
        let label = label.into();
        SubfieldDefinition {
            code,
            mq_tag: to_camel_case(&label, false),
            label,
            cardinality,
            parser: None,
            validator: None,
            code_list: None,
            functions: Vec::new(),
            levels: None,
        }
    }

    /// Attach a content parser.
    #[must_use]
    pub fn with_parser(mut self, parser: ParserKind) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Attach a validator.
    #[must_use]
    pub fn with_validator(mut self, validator: ValidatorKind) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attach a code list by name.
    #[must_use]
    pub fn with_code_list(mut self, name: impl Into<String>) -> Self {
        self.code_list = Some(name.into());
        self
    }

    /// Set the FRBR functions.
    #[must_use]
    pub fn with_functions(mut self, functions: &[FrbrFunction]) -> Self {
        self.functions = functions.to_vec();
        self
    }

    /// Set the machine key.
    #[must_use]
    pub fn with_mq_tag(mut self, mq_tag: impl Into<String>) -> Self {
        self.mq_tag = mq_tag.into();
        self
    }

    /// Set the compliance levels.
    #[must_use]
    pub fn with_levels(mut self, levels: impl Into<String>) -> Self {
        self.levels = Some(levels.into());
        self
    }
}

/// Definition of a data field (010 and higher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Field tag
    pub tag: String,
    /// Human-readable label
    pub label: String,
    /// Machine key used in key/value output
    pub mq_tag: String,
    /// Whether the field may repeat within a record
    pub cardinality: Cardinality,
    /// Documentation URL
    pub url: Option<String>,
    /// National compliance levels
    pub levels: Option<String>,
    /// First indicator
    pub ind1: IndicatorDefinition,
    /// Second indicator
    pub ind2: IndicatorDefinition,
    /// Baseline subfields, in documentation order
    pub subfields: Vec<SubfieldDefinition>,
    /// Subfields added by individual dialects
    pub dialect_subfields: BTreeMap<Dialect, Vec<SubfieldDefinition>>,
    /// Dialect the whole field belongs to, `None` for baseline fields
    pub dialect: Option<Dialect>,
}

impl FieldDefinition {
    /// Create a field definition with undefined indicators and no subfields.
    #[must_use]
    pub fn new(tag: impl Into<String>, label: impl Into<String>, cardinality: Cardinality) -> Self {
        let label = label.into();
        FieldDefinition {
            tag: tag.into(),
            mq_tag: to_camel_case(&label, true),
            label,
            cardinality,
            url: None,
            levels: None,
            ind1: IndicatorDefinition::undefined(),
            ind2: IndicatorDefinition::undefined(),
            subfields: Vec::new(),
            dialect_subfields: BTreeMap::new(),
            dialect: None,
        }
    }

    /// Set the first indicator.
    #[must_use]
    pub fn with_ind1(mut self, indicator: IndicatorDefinition) -> Self {
        self.ind1 = indicator;
        self
    }

    /// Set the second indicator.
    #[must_use]
    pub fn with_ind2(mut self, indicator: IndicatorDefinition) -> Self {
        self.ind2 = indicator;
        self
    }

    /// Append a baseline subfield.
    #[must_use]
    pub fn with_subfield(mut self, subfield: SubfieldDefinition) -> Self {
        self.subfields.push(subfield);
        self
    }

    /// Register subfields only the given dialect knows about.
    #[must_use]
    pub fn with_dialect_subfields(mut self, dialect: Dialect, subfields: Vec<SubfieldDefinition>) -> Self {
        self.dialect_subfields
            .entry(dialect)
            .or_default()
            .extend(subfields);
        self
    }

    /// Mark the whole field as local to one dialect.
    #[must_use]
    pub fn local_to(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Set the machine key.
    #[must_use]
    pub fn with_mq_tag(mut self, mq_tag: impl Into<String>) -> Self {
        self.mq_tag = mq_tag.into();
        self
    }

    /// Set the documentation URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the compliance levels.
    #[must_use]
    pub fn with_levels(mut self, levels: impl Into<String>) -> Self {
        self.levels = Some(levels.into());
        self
    }

    /// Baseline subfield by code.
    #[must_use]
    pub fn subfield(&self, code: char) -> Option<&SubfieldDefinition> {
        self.subfields.iter().find(|s| s.code == code)
    }

    /// Subfields added by a dialect (empty when it adds none).
    #[must_use]
    pub fn dialect_subfields(&self, dialect: Dialect) -> &[SubfieldDefinition] {
        self.dialect_subfields
            .get(&dialect)
            .map_or(&[], Vec::as_slice)
    }

    /// Indicator by position (1 or 2).
    #[must_use]
    pub fn indicator(&self, position: u8) -> Option<&IndicatorDefinition> {
        match position {
            1 => Some(&self.ind1),
            2 => Some(&self.ind2),
            _ => None,
        }
    }

    /// Reject duplicate subfield codes, counting each dialect's extensions with the baseline.
    pub(crate) fn check_unique_codes(&self) -> Result<()> {
        let mut seen: Vec<char> = Vec::with_capacity(self.subfields.len());
        for subfield in &self.subfields {
            if seen.contains(&subfield.code) {
                return Err(MarcError::DuplicateDefinition {
                    tag: self.tag.clone(),
                    code: Some(subfield.code),
                });
            }
            seen.push(subfield.code);
        }
        for extras in self.dialect_subfields.values() {
            let mut merged = seen.clone();
            for subfield in extras {
                if merged.contains(&subfield.code) {
                    return Err(MarcError::DuplicateDefinition {
                        tag: self.tag.clone(),
                        code: Some(subfield.code),
                    });
                }
                merged.push(subfield.code);
            }
        }
        Ok(())
    }
}

/// A coded range inside fixed-length data.
///
/// `start` is inclusive and `end` exclusive, both byte offsets.
#[derive(Debug, Clone)]
pub struct PositionDefinition {
    /// Position id: `06` for a single byte, `07-10` for a range
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Machine key used in key/value output
    pub mq_tag: String,
    /// First byte offset
    pub start: usize,
    /// One past the last byte offset
    pub end: usize,
    /// Allowed codes (code, meaning)
    pub codes: Vec<(String, String)>,
    /// Name of a code list the value must belong to
    pub code_list: Option<String>,
    /// Pattern the value must match
    pub pattern: Option<Regex>,
    /// FRBR user tasks the position supports
    pub functions: Vec<FrbrFunction>,
}

impl PartialEq for PositionDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.label == other.label
            && self.mq_tag == other.mq_tag
            && self.codes == other.codes
            && self.code_list == other.code_list
            && self.pattern.as_ref().map(Regex::as_str) == other.pattern.as_ref().map(Regex::as_str)
            && self.functions == other.functions
    }
}

impl PositionDefinition {
    /// Create a position covering `start..end`.
    #[must_use]
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        let label = label.into();
        let id = if end <= start + 1 {
            format!("{start:02}")
        } else {
            format!("{start:02}-{:02}", end - 1)
        };
        PositionDefinition {
            id,
            mq_tag: to_camel_case(&label, false),
            label,
            start,
            end,
            codes: Vec::new(),
            code_list: None,
            pattern: None,
            functions: Vec::new(),
        }
    }

    /// Restrict the position to the given codes.
    #[must_use]
    pub fn with_codes(mut self, codes: &[(&str, &str)]) -> Self {
        self.codes = codes
            .iter()
            .map(|(c, m)| ((*c).to_string(), (*m).to_string()))
            .collect();
        self
    }

    /// Restrict the position to a pattern.
    ///
    /// # Errors
    ///
    /// [`MarcError::InvalidSchema`] if the pattern does not compile.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| MarcError::InvalidSchema(format!("position {}: {e}", self.id)))?;
        self.pattern = Some(regex);
        Ok(self)
    }

    /// Restrict the position to a code list.
    #[must_use]
    pub fn with_code_list(mut self, name: impl Into<String>) -> Self {
        self.code_list = Some(name.into());
        self
    }

    /// Set the FRBR functions.
    #[must_use]
    pub fn with_functions(mut self, functions: &[FrbrFunction]) -> Self {
        self.functions = functions.to_vec();
        self
    }

    /// Set the machine key.
    #[must_use]
    pub fn with_mq_tag(mut self, mq_tag: impl Into<String>) -> Self {
        self.mq_tag = mq_tag.into();
        self
    }

    /// Check the value found at this position.
    ///
    /// A value made only of fill characters (`|`) is always accepted.
    ///
    /// # Errors
    ///
    /// [`Violation::UnknownCode`] for values outside the declared codes or code list,
    /// [`Violation::BadFormat`] for values that do not match the pattern.
    pub fn check_value(&self, value: &str, code_list: Option<&CodeList>) -> std::result::Result<(), Violation> {
        if !value.is_empty() && value.chars().all(|c| c == '|') {
            return Ok(());
        }
        if !self.codes.is_empty() {
            if self.codes.iter().any(|(code, _)| code == value) {
                return Ok(());
            }
            return Err(Violation::UnknownCode(value.to_string()));
        }
        let trimmed = value.trim_end();
        if let Some(list) = code_list {
            if !trimmed.is_empty() && !list.contains(trimmed) {
                return Err(Violation::UnknownCode(value.to_string()));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                return Err(Violation::BadFormat);
            }
        }
        Ok(())
    }

    /// Meaning of a code at this position.
    #[must_use]
    pub fn meaning(&self, value: &str) -> Option<&str> {
        self.codes
            .iter()
            .find(|(code, _)| code == value)
            .map(|(_, meaning)| meaning.as_str())
    }
}

/// Definition of a control field (001-009).
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFieldDefinition {
    /// Field tag
    pub tag: String,
    /// Human-readable label
    pub label: String,
    /// Machine key used in key/value output
    pub mq_tag: String,
    /// Whether the field may repeat
    pub cardinality: Cardinality,
    /// Required length in bytes, for fixed-length fields
    pub length: Option<usize>,
    /// Coded positions
    pub positions: Vec<PositionDefinition>,
    /// FRBR functions of the field as a whole (fields without positions)
    pub functions: Vec<FrbrFunction>,
}

impl ControlFieldDefinition {
    /// Create a control field definition.
    #[must_use]
    pub fn new(tag: impl Into<String>, label: impl Into<String>, cardinality: Cardinality) -> Self {
        let label = label.into();
        ControlFieldDefinition {
            tag: tag.into(),
            mq_tag: to_camel_case(&label, true),
            label,
            cardinality,
            length: None,
            positions: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Require a fixed length.
    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Append a coded position.
    #[must_use]
    pub fn with_position(mut self, position: PositionDefinition) -> Self {
        self.positions.push(position);
        self
    }

    /// Set the FRBR functions.
    #[must_use]
    pub fn with_functions(mut self, functions: &[FrbrFunction]) -> Self {
        self.functions = functions.to_vec();
        self
    }

    /// Whether the field is a plain value with no coded positions.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.positions.is_empty()
    }
}
