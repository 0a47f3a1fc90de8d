//! Finding taxonomy: what a schema-conformance issue is and how it is identified.
//!
//! Every [`ValidationErrorType`] belongs to exactly one [`ValidationErrorCategory`].
//! Both carry stable numeric ids used by the report rows. A [`ValidationError`] is one
//! finding; its [`ErrorSignature`] decides which run-scoped id it receives from the
//! [`ValidationAggregator`](crate::aggregator::ValidationAggregator).

use crate::content::{ParserKind, ValidatorKind, Violation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse grouping of finding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationErrorCategory {
    /// Elements missing from the schema, wrong lengths
    Structural,
    /// Repetition of non-repeatable fields or subfields
    Cardinality,
    /// Indicator values
    Indicator,
    /// Values rejected by a content parser or validator
    Content,
    /// Values outside a controlled vocabulary
    CodeList,
}

impl ValidationErrorCategory {
    /// Every category, in id order.
    pub const ALL: [ValidationErrorCategory; 5] = [
        ValidationErrorCategory::Structural,
        ValidationErrorCategory::Cardinality,
        ValidationErrorCategory::Indicator,
        ValidationErrorCategory::Content,
        ValidationErrorCategory::CodeList,
    ];

    /// Stable numeric id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        match self {
            Self::Structural => 1,
            Self::Cardinality => 2,
            Self::Indicator => 3,
            Self::Content => 4,
            Self::CodeList => 5,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Cardinality => "cardinality",
            Self::Indicator => "indicator",
            Self::Content => "content",
            Self::CodeList => "code list",
        }
    }
}

impl fmt::Display for ValidationErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed set of finding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationErrorType {
    /// The leader is not 24 characters long
    LeaderInvalidLength,
    /// A fixed-length control field has the wrong length
    ControlFieldInvalidLength,
    /// The tag is not defined for the active dialect
    FieldUndefined,
    /// The subfield code is not defined for the field
    SubfieldUndefined,
    /// A non-repeatable field occurs more than once
    FieldNotRepeatable,
    /// A non-repeatable subfield occurs more than once in one field
    SubfieldNotRepeatable,
    /// Indicator value outside the declared codes or range
    IndicatorInvalid,
    /// Indicator value that is no longer valid
    IndicatorObsolete,
    /// Undefined indicator that is not blank
    IndicatorNonEmpty,
    /// ISBN check digit mismatch
    IsbnBadChecksum,
    /// ISBN that isn't shaped like one
    IsbnBadFormat,
    /// ISSN check digit mismatch
    IssnBadChecksum,
    /// ISSN that isn't shaped like one
    IssnBadFormat,
    /// Malformed subfield 6
    LinkageBadFormat,
    /// Malformed record control number
    RecordControlNumberBadFormat,
    /// Code not allowed at a fixed-length position
    PositionInvalidValue,
    /// Value at a fixed-length position does not match its pattern
    PositionBadFormat,
    /// Value not in the attached code list
    CodeInvalid,
}

impl ValidationErrorType {
    /// Every type, in id order.
    pub const ALL: [ValidationErrorType; 18] = [
        ValidationErrorType::LeaderInvalidLength,
        ValidationErrorType::ControlFieldInvalidLength,
        ValidationErrorType::FieldUndefined,
        ValidationErrorType::SubfieldUndefined,
        ValidationErrorType::FieldNotRepeatable,
        ValidationErrorType::SubfieldNotRepeatable,
        ValidationErrorType::IndicatorInvalid,
        ValidationErrorType::IndicatorObsolete,
        ValidationErrorType::IndicatorNonEmpty,
        ValidationErrorType::IsbnBadChecksum,
        ValidationErrorType::IsbnBadFormat,
        ValidationErrorType::IssnBadChecksum,
        ValidationErrorType::IssnBadFormat,
        ValidationErrorType::LinkageBadFormat,
        ValidationErrorType::RecordControlNumberBadFormat,
        ValidationErrorType::PositionInvalidValue,
        ValidationErrorType::PositionBadFormat,
        ValidationErrorType::CodeInvalid,
    ];

    /// Stable numeric id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        match self {
            Self::LeaderInvalidLength => 1,
            Self::ControlFieldInvalidLength => 2,
            Self::FieldUndefined => 3,
            Self::SubfieldUndefined => 4,
            Self::FieldNotRepeatable => 5,
            Self::SubfieldNotRepeatable => 6,
            Self::IndicatorInvalid => 7,
            Self::IndicatorObsolete => 8,
            Self::IndicatorNonEmpty => 9,
            Self::IsbnBadChecksum => 10,
            Self::IsbnBadFormat => 11,
            Self::IssnBadChecksum => 12,
            Self::IssnBadFormat => 13,
            Self::LinkageBadFormat => 14,
            Self::RecordControlNumberBadFormat => 15,
            Self::PositionInvalidValue => 16,
            Self::PositionBadFormat => 17,
            Self::CodeInvalid => 18,
        }
    }

    /// The category the type belongs to.
    #[must_use]
    pub const fn category(&self) -> ValidationErrorCategory {
        match self {
            Self::LeaderInvalidLength
            | Self::ControlFieldInvalidLength
            | Self::FieldUndefined
            | Self::SubfieldUndefined => ValidationErrorCategory::Structural,
            Self::FieldNotRepeatable | Self::SubfieldNotRepeatable => {
                ValidationErrorCategory::Cardinality
            },
            Self::IndicatorInvalid | Self::IndicatorObsolete | Self::IndicatorNonEmpty => {
                ValidationErrorCategory::Indicator
            },
            Self::IsbnBadChecksum
            | Self::IsbnBadFormat
            | Self::IssnBadChecksum
            | Self::IssnBadFormat
            | Self::LinkageBadFormat
            | Self::RecordControlNumberBadFormat
            | Self::PositionInvalidValue
            | Self::PositionBadFormat => ValidationErrorCategory::Content,
            Self::CodeInvalid => ValidationErrorCategory::CodeList,
        }
    }

    /// Human-readable description used in report rows.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::LeaderInvalidLength => "invalid leader length",
            Self::ControlFieldInvalidLength => "invalid control field length",
            Self::FieldUndefined => "undefined field",
            Self::SubfieldUndefined => "undefined subfield",
            Self::FieldNotRepeatable => "non-repeatable field",
            Self::SubfieldNotRepeatable => "non-repeatable subfield",
            Self::IndicatorInvalid => "invalid indicator value",
            Self::IndicatorObsolete => "obsolete indicator value",
            Self::IndicatorNonEmpty => "non-empty undefined indicator",
            Self::IsbnBadChecksum => "ISBN check digit mismatch",
            Self::IsbnBadFormat => "invalid ISBN",
            Self::IssnBadChecksum => "ISSN check digit mismatch",
            Self::IssnBadFormat => "invalid ISSN",
            Self::LinkageBadFormat => "invalid linkage",
            Self::RecordControlNumberBadFormat => "invalid record control number",
            Self::PositionInvalidValue => "invalid value at position",
            Self::PositionBadFormat => "invalid format at position",
            Self::CodeInvalid => "invalid code",
        }
    }

    /// The finding type for a validator's violation.
    #[must_use]
    pub fn from_validator(kind: ValidatorKind, violation: &Violation) -> Self {
        match (kind, violation) {
            (ValidatorKind::Isbn, Violation::BadChecksum) => Self::IsbnBadChecksum,
            (ValidatorKind::Isbn, _) => Self::IsbnBadFormat,
            (ValidatorKind::Issn, Violation::BadChecksum) => Self::IssnBadChecksum,
            (ValidatorKind::Issn, _) => Self::IssnBadFormat,
        }
    }

    /// The finding type for a parser's violation.
    #[must_use]
    pub fn from_parser(kind: ParserKind) -> Self {
        match kind {
            ParserKind::Linkage => Self::LinkageBadFormat,
            ParserKind::RecordControlNumber => Self::RecordControlNumberBadFormat,
        }
    }

    /// The finding type for a rejected fixed-length position.
    #[must_use]
    pub fn from_position(violation: &Violation) -> Self {
        match violation {
            Violation::UnknownCode(_) => Self::PositionInvalidValue,
            _ => Self::PositionBadFormat,
        }
    }
}

impl fmt::Display for ValidationErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The identity of a finding: `(type, path, message)`.
///
/// Findings with equal signatures share one id within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorSignature {
    /// Finding type
    pub error_type: ValidationErrorType,
    /// Element path
    pub path: String,
    /// Rendered detail
    pub message: String,
}

/// One schema-conformance finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Run-scoped id, assigned by the aggregator
    pub id: Option<u32>,
    /// Id of the owning record (its 001)
    pub record_id: String,
    /// Element path: `541$a`, `541$ind1`, `leader06`, `008/06`, or a bare tag
    pub path: String,
    /// Finding type
    pub error_type: ValidationErrorType,
    /// Rendered detail (offending value, occurrence count)
    pub message: String,
    /// Documentation URL of the element, when known
    pub url: Option<String>,
    /// How many identical findings this one stands for (summary-only collection)
    pub occurrences: usize,
}

impl ValidationError {
    /// Create a finding.
    #[must_use]
    pub fn new(
        record_id: impl Into<String>,
        path: impl Into<String>,
        error_type: ValidationErrorType,
        message: impl Into<String>,
    ) -> Self {
        ValidationError {
            id: None,
            record_id: record_id.into(),
            path: path.into(),
            error_type,
            message: message.into(),
            url: None,
            occurrences: 1,
        }
    }

    /// Attach a documentation URL.
    #[must_use]
    pub fn with_url(mut self, url: Option<&str>) -> Self {
        self.url = url.map(str::to_string);
        self
    }

    /// Category of the finding type.
    #[must_use]
    pub fn category(&self) -> ValidationErrorCategory {
        self.error_type.category()
    }

    /// The dedup signature.
    #[must_use]
    pub fn signature(&self) -> ErrorSignature {
        ErrorSignature {
            error_type: self.error_type,
            path: self.path.clone(),
            message: self.message.clone(),
        }
    }

    /// Tag part of the path (`541` for `541$a`, `leader` for `leader06`).
    #[must_use]
    pub fn tag(&self) -> &str {
        if self.path.starts_with("leader") {
            return "leader";
        }
        self.path
            .split(['$', '/'])
            .next()
            .unwrap_or(&self.path)
    }
}

fn render(f: &mut fmt::Formatter<'_>, path: &str, error_type: ValidationErrorType, message: &str) -> fmt::Result {
    write!(f, "{path}: {error_type}")?;
    if !message.is_empty() {
        write!(f, ": {message}")?;
    }
    Ok(())
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, &self.path, self.error_type, &self.message)
    }
}

impl fmt::Display for ErrorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, &self.path, self.error_type, &self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_ordered() {
        for (i, error_type) in ValidationErrorType::ALL.iter().enumerate() {
            assert_eq!(error_type.id() as usize, i + 1);
        }
        for (i, category) in ValidationErrorCategory::ALL.iter().enumerate() {
            assert_eq!(category.id() as usize, i + 1);
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ValidationErrorType::FieldUndefined.category(),
            ValidationErrorCategory::Structural
        );
        assert_eq!(
            ValidationErrorType::SubfieldNotRepeatable.category(),
            ValidationErrorCategory::Cardinality
        );
        assert_eq!(
            ValidationErrorType::IsbnBadChecksum.category(),
            ValidationErrorCategory::Content
        );
        assert_eq!(
            ValidationErrorType::CodeInvalid.category(),
            ValidationErrorCategory::CodeList
        );
    }

    #[test]
    fn test_violation_mapping() {
        assert_eq!(
            ValidationErrorType::from_validator(ValidatorKind::Isbn, &Violation::BadChecksum),
            ValidationErrorType::IsbnBadChecksum
        );
        assert_eq!(
            ValidationErrorType::from_validator(ValidatorKind::Issn, &Violation::BadLength(3)),
            ValidationErrorType::IssnBadFormat
        );
        assert_eq!(
            ValidationErrorType::from_position(&Violation::UnknownCode("x".into())),
            ValidationErrorType::PositionInvalidValue
        );
    }

    #[test]
    fn test_display_and_tag() {
        let error = ValidationError::new(
            "123",
            "541$a",
            ValidationErrorType::SubfieldNotRepeatable,
            "there are 2 instances",
        );
        assert_eq!(
            error.to_string(),
            "541$a: non-repeatable subfield: there are 2 instances"
        );
        assert_eq!(error.tag(), "541");

        let error = ValidationError::new("123", "999", ValidationErrorType::FieldUndefined, "");
        assert_eq!(error.to_string(), "999: undefined field");
        assert_eq!(error.tag(), "999");
        assert_eq!(
            ValidationError::new("1", "008/06", ValidationErrorType::PositionInvalidValue, "x").tag(),
            "008"
        );
        assert_eq!(
            ValidationError::new("1", "leader06", ValidationErrorType::PositionInvalidValue, "x").tag(),
            "leader"
        );
    }
}
