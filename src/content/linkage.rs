//! Subfield 6 (Linkage) parsing.
//!
//! Subfield 6 connects a field with its alternate graphical representation in an 880
//! field. Its layout is `TAG-OCC[/SCRIPT][/r]`:
//! - `TAG`: three-digit tag of the linked field
//! - `OCC`: two or three digit occurrence number shared by both fields
//! - `SCRIPT`: optional script identification code, `(2` Hebrew, `(3` Arabic, `$1` CJK,
//!   `(N` Cyrillic, `(S` Greek, `(B` Latin
//! - `/r`: optional right-to-left field orientation

use super::{Components, ContentParser, Violation};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LINKAGE_PATTERN: Option<Regex> =
        Regex::new(r"^(\d{3})-(\d{2,3})(?:/([\(\$][A-Za-z0-9]))?(/r)?$").ok();
}

/// Information extracted from a subfield 6 value.
///
/// ```
/// use marcqa::content::LinkageInfo;
///
/// let info = LinkageInfo::parse("245-01/(2/r").unwrap();
/// assert_eq!(info.tag(), "245");
/// assert_eq!(info.occurrence(), "01");
/// assert_eq!(info.script_id(), "(2");
/// assert!(info.is_reverse());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageInfo {
    tag: String,
    occurrence: String,
    script_id: String,
    is_reverse: bool,
}

impl LinkageInfo {
    /// Parse a subfield 6 value.
    ///
    /// # Errors
    ///
    /// [`Violation::BadFormat`] when the value does not follow `TAG-OCC[/SCRIPT][/r]`.
    pub fn parse(value: &str) -> Result<Self, Violation> {
        let pattern = LINKAGE_PATTERN.as_ref().ok_or(Violation::BadFormat)?;
        let caps = pattern.captures(value).ok_or(Violation::BadFormat)?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();

        Ok(LinkageInfo {
            tag: group(1),
            occurrence: group(2),
            script_id: group(3),
            is_reverse: caps.get(4).is_some(),
        })
    }

    /// The linked field tag (e.g., "880", "245").
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The occurrence number; both sides of a link carry the same one.
    #[must_use]
    pub fn occurrence(&self) -> &str {
        &self.occurrence
    }

    /// The script identification code, empty when absent.
    #[must_use]
    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    /// Whether the right-to-left orientation flag is set.
    #[must_use]
    pub fn is_reverse(&self) -> bool {
        self.is_reverse
    }

    /// Whether the occurrence is `00`, meaning an 880 without a linked counterpart.
    #[must_use]
    pub fn is_unlinked(&self) -> bool {
        self.occurrence.chars().all(|c| c == '0')
    }
}

/// [`ContentParser`] for subfield 6.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkageParser;

impl ContentParser for LinkageParser {
    fn parse(&self, value: &str) -> Result<Components, Violation> {
        let info = LinkageInfo::parse(value)?;
        let mut components = Components::new();
        components.insert("tag".to_string(), info.tag);
        components.insert("occurrence".to_string(), info.occurrence);
        if !info.script_id.is_empty() {
            components.insert("script".to_string(), info.script_id);
        }
        if info.is_reverse {
            components.insert("orientation".to_string(), "r".to_string());
        }
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_linkage() {
        let info = LinkageInfo::parse("100-01").unwrap();
        assert_eq!(info.tag(), "100");
        assert_eq!(info.occurrence(), "01");
        assert_eq!(info.script_id(), "");
        assert!(!info.is_reverse());
    }

    #[test]
    fn test_parse_with_reverse_flag() {
        let info = LinkageInfo::parse("100-01/r").unwrap();
        assert!(info.is_reverse());
    }

    #[test]
    fn test_parse_script_codes() {
        let info = LinkageInfo::parse("100-02/(3/r").unwrap();
        assert_eq!(info.script_id(), "(3");
        assert!(info.is_reverse());

        let info = LinkageInfo::parse("245-01/$1").unwrap();
        assert_eq!(info.script_id(), "$1");
        assert!(!info.is_reverse());

        let info = LinkageInfo::parse("260-03/(N").unwrap();
        assert_eq!(info.occurrence(), "03");
        assert_eq!(info.script_id(), "(N");
    }

    #[test]
    fn test_parse_three_digit_occurrence() {
        let info = LinkageInfo::parse("100-001").unwrap();
        assert_eq!(info.occurrence(), "001");
    }

    #[test]
    fn test_unlinked_occurrence() {
        assert!(LinkageInfo::parse("880-00").unwrap().is_unlinked());
        assert!(!LinkageInfo::parse("880-01").unwrap().is_unlinked());
    }

    #[test]
    fn test_parse_invalid_formats() {
        for value in ["", "10001", "10-01", "1000-01", "100-1", "100-", "100-01/x", "100-01 "] {
            assert_eq!(LinkageInfo::parse(value), Err(Violation::BadFormat), "{value}");
        }
    }

    #[test]
    fn test_components() {
        let components = LinkageParser.parse("880-04/(2/r").unwrap();
        let keys: Vec<&str> = components.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["tag", "occurrence", "script", "orientation"]);
        assert_eq!(components["script"], "(2");

        let components = LinkageParser.parse("245-01").unwrap();
        assert_eq!(components.len(), 2);
    }
}
