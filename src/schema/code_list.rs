//! Closed controlled vocabularies referenced by name from the schema tables.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A closed set of permitted code → meaning pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeList {
    /// Name the schema tables use to reference the list (e.g. "relator")
    #[serde(default)]
    pub name: String,
    /// Human-readable title
    pub label: String,
    /// Codes in documentation order
    pub codes: IndexMap<String, String>,
}

impl CodeList {
    /// Create a code list.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>, codes: &[(&str, &str)]) -> Self {
        CodeList {
            name: name.into(),
            label: label.into(),
            codes: codes
                .iter()
                .map(|(c, m)| ((*c).to_string(), (*m).to_string()))
                .collect(),
        }
    }

    /// Whether `code` is a member.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains_key(code)
    }

    /// Meaning of a code.
    #[must_use]
    pub fn meaning(&self, code: &str) -> Option<&str> {
        self.codes.get(code).map(String::as_str)
    }

    /// Number of codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the list has no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
