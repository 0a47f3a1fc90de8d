//! Caller-supplied exclusions: findings to ignore and records to skip.
//!
//! - [`IgnorableFields`] lists element paths whose findings never count against a
//!   record, e.g. `"042$a, 9XX, 880"`
//! - [`IgnorableRecords`] lists conditions that skip a whole record, e.g.
//!   `"STA$a=SUPPRESSED,LDR05=d"`
//! - [`RecordFilter`] is the predicate seam the batch driver consults; closures
//!   implement it too

use crate::error::{MarcError, Result};
use crate::record::Record;
use crate::validation_error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn is_wildcard(c: char) -> bool {
    matches!(c, 'X' | 'x' | '.')
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldPattern {
    tag: String,
    code: Option<char>,
}

impl FieldPattern {
    fn parse(pattern: &str) -> Result<Self> {
        let (tag, code) = match pattern.split_once('$') {
            Some((tag, code)) => {
                let mut chars = code.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => (tag, Some(c)),
                    _ => {
                        return Err(MarcError::InvalidConfig(format!(
                            "ignorable field '{pattern}': subfield code must be one character"
                        )))
                    },
                }
            },
            None => (pattern, None),
        };
        if tag.chars().count() != 3 {
            return Err(MarcError::InvalidConfig(format!(
                "ignorable field '{pattern}': tag must have three characters"
            )));
        }
        Ok(FieldPattern {
            tag: tag.to_string(),
            code,
        })
    }

    fn matches_tag(&self, tag: &str) -> bool {
        if tag == "leader" {
            return self.tag == "LDR";
        }
        tag.chars().count() == 3
            && self
                .tag
                .chars()
                .zip(tag.chars())
                .all(|(p, t)| is_wildcard(p) || p == t)
    }

    fn matches(&self, path: &str) -> bool {
        let (tag, rest) = split_path(path);
        if !self.matches_tag(tag) {
            return false;
        }
        match self.code {
            None => true,
            Some(code) => rest.is_some_and(|rest| {
                let mut chars = rest.chars();
                chars.next() == Some(code) && chars.next().is_none()
            }),
        }
    }
}

impl fmt::Display for FieldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}${code}", self.tag),
            None => f.write_str(&self.tag),
        }
    }
}

/// Split a finding path into its tag and the part after `$`.
fn split_path(path: &str) -> (&str, Option<&str>) {
    if path.starts_with("leader") {
        return ("leader", None);
    }
    if let Some((tag, rest)) = path.split_once('$') {
        return (tag, Some(rest));
    }
    (path.split('/').next().unwrap_or(path), None)
}

/// Element paths whose findings are ignored.
///
/// A pattern is a tag, where `X`, `x` and `.` stand for any character, optionally
/// followed by `$code`. A bare tag matches every finding of that tag (indicators
/// and subfields included); `tag$code` matches only that subfield. `LDR` matches
/// leader findings.
///
/// ```
/// use marcqa::IgnorableFields;
///
/// let ignorable = IgnorableFields::parse("042$a, 9XX").unwrap();
/// assert!(ignorable.matches_path("042$a"));
/// assert!(!ignorable.matches_path("042$b"));
/// assert!(ignorable.matches_path("938$ind1"));
/// assert!(!ignorable.matches_path("245$a"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IgnorableFields {
    patterns: Vec<FieldPattern>,
}

impl IgnorableFields {
    /// No exclusions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated pattern list. Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// [`MarcError::InvalidConfig`] for a pattern that is not a three character tag
    /// with an optional one character subfield code.
    pub fn parse(value: &str) -> Result<Self> {
        let patterns = value
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(FieldPattern::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(IgnorableFields { patterns })
    }

    /// Whether a finding path is excluded.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    /// Whether a finding is excluded.
    #[must_use]
    pub fn is_ignorable(&self, error: &ValidationError) -> bool {
        self.matches_path(&error.path)
    }

    /// Whether there are no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

impl fmt::Display for IgnorableFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{pattern}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for IgnorableFields {
    type Error = MarcError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<IgnorableFields> for String {
    fn from(value: IgnorableFields) -> Self {
        value.to_string()
    }
}

/// Predicate deciding whether a whole record is skipped before validation.
pub trait RecordFilter {
    /// Whether `record` should not be validated.
    fn is_ignorable(&self, record: &Record) -> bool;
}

impl<F> RecordFilter for F
where
    F: Fn(&Record) -> bool,
{
    fn is_ignorable(&self, record: &Record) -> bool {
        self(record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RecordCondition {
    /// `LDR05=d`
    Leader { position: usize, value: String },
    /// `001=ocm123`
    ControlField { tag: String, value: String },
    /// `STA$a=SUPPRESSED`
    Subfield {
        tag: String,
        code: char,
        value: String,
    },
}

impl RecordCondition {
    fn parse(condition: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            MarcError::InvalidConfig(format!("ignorable record condition '{condition}': {reason}"))
        };
        let (element, value) = condition
            .split_once('=')
            .ok_or_else(|| invalid("expected ELEMENT=VALUE"))?;
        let element = element.trim();
        let value = value.trim().to_string();

        if let Some(position) = element.strip_prefix("LDR") {
            let position = position
                .parse::<usize>()
                .map_err(|_| invalid("leader position must be a number"))?;
            return Ok(RecordCondition::Leader { position, value });
        }
        if let Some((tag, code)) = element.split_once('$') {
            let mut chars = code.chars();
            let code = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(invalid("subfield code must be one character")),
            };
            if tag.chars().count() != 3 {
                return Err(invalid("tag must have three characters"));
            }
            return Ok(RecordCondition::Subfield {
                tag: tag.to_string(),
                code,
                value,
            });
        }
        if element.chars().count() != 3 {
            return Err(invalid("tag must have three characters"));
        }
        Ok(RecordCondition::ControlField {
            tag: element.to_string(),
            value,
        })
    }

    fn matches(&self, record: &Record) -> bool {
        match self {
            RecordCondition::Leader { position, value } => record
                .leader
                .position(*position, position + value.len().max(1))
                .is_some_and(|actual| actual == value),
            RecordCondition::ControlField { tag, value } => {
                record.get_control_field(tag) == Some(value.as_str())
            },
            RecordCondition::Subfield { tag, code, value } => record
                .fields_by_tag(tag)
                .any(|field| field.subfields_by_code(*code).any(|v| v == value)),
        }
    }
}

impl fmt::Display for RecordCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordCondition::Leader { position, value } => write!(f, "LDR{position:02}={value}"),
            RecordCondition::ControlField { tag, value } => write!(f, "{tag}={value}"),
            RecordCondition::Subfield { tag, code, value } => write!(f, "{tag}${code}={value}"),
        }
    }
}

/// Conditions that exclude a whole record, e.g. deleted or suppressed ones.
///
/// A record is skipped when any condition holds:
/// - `LDRnn=v`: the leader has `v` at position `nn`
/// - `TAG=v`: control field `TAG` equals `v`
/// - `TAG$c=v`: some field `TAG` has a subfield `c` equal to `v`
///
/// ```
/// use marcqa::{IgnorableRecords, Leader, Record, RecordFilter};
///
/// let filter = IgnorableRecords::parse("LDR05=d").unwrap();
/// let deleted = Record::builder(Leader::new("00000dam a2200000 a 4500")).build();
/// assert!(filter.is_ignorable(&deleted));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IgnorableRecords {
    conditions: Vec<RecordCondition>,
}

impl IgnorableRecords {
    /// No conditions; no record is skipped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated condition list.
    ///
    /// # Errors
    ///
    /// [`MarcError::InvalidConfig`] for a malformed condition.
    pub fn parse(value: &str) -> Result<Self> {
        let conditions = value
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(RecordCondition::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(IgnorableRecords { conditions })
    }

    /// Whether there are no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl RecordFilter for IgnorableRecords {
    fn is_ignorable(&self, record: &Record) -> bool {
        self.conditions.iter().any(|c| c.matches(record))
    }
}

impl fmt::Display for IgnorableRecords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{condition}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for IgnorableRecords {
    type Error = MarcError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<IgnorableRecords> for String {
    fn from(value: IgnorableRecords) -> Self {
        value.to_string()
    }
}
