//! Record control number parsing (`$0`, `$w`, field 035).
//!
//! A control number is optionally prefixed by the MARC organization code of the
//! assigning agency in parentheses: `(OCoLC)12345678`, `(DE-101)04021477X`.

use super::{Components, ContentParser, Violation};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PREFIXED_PATTERN: Option<Regex> = Regex::new(r"^\(([^()\s]+)\)\s*(\S.*)$").ok();
}

/// A parsed record control number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlNumber {
    /// MARC organization code of the assigning agency, when given
    pub organization: Option<String>,
    /// The number itself
    pub number: String,
}

impl ControlNumber {
    /// Parse a control number.
    ///
    /// ```
    /// use marcqa::content::ControlNumber;
    ///
    /// let number = ControlNumber::parse("(OCoLC)12345678").unwrap();
    /// assert_eq!(number.organization.as_deref(), Some("OCoLC"));
    /// assert_eq!(number.number, "12345678");
    /// ```
    ///
    /// # Errors
    ///
    /// [`Violation::BadFormat`] for empty values, unbalanced prefixes or a prefix
    /// without a number.
    pub fn parse(value: &str) -> Result<Self, Violation> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Violation::BadFormat);
        }
        if value.starts_with('(') {
            let pattern = PREFIXED_PATTERN.as_ref().ok_or(Violation::BadFormat)?;
            let caps = pattern.captures(value).ok_or(Violation::BadFormat)?;
            return Ok(ControlNumber {
                organization: caps.get(1).map(|m| m.as_str().to_string()),
                number: caps.get(2).map(|m| m.as_str().trim_end().to_string()).unwrap_or_default(),
            });
        }
        if value.contains(['(', ')']) {
            return Err(Violation::BadFormat);
        }
        Ok(ControlNumber {
            organization: None,
            number: value.to_string(),
        })
    }
}

/// [`ContentParser`] for record control numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordControlNumberParser;

impl ContentParser for RecordControlNumberParser {
    fn parse(&self, value: &str) -> Result<Components, Violation> {
        let parsed = ControlNumber::parse(value)?;
        let mut components = Components::new();
        if let Some(organization) = parsed.organization {
            components.insert("organization".to_string(), organization);
        }
        components.insert("number".to_string(), parsed.number);
        Ok(components)
    }
}
