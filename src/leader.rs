//! MARC record leader.
//!
//! The leader is the 24 character fixed-length field at the start of every MARC
//! record. It is kept as the string the decoder delivered so malformed leaders can be
//! reported instead of rejected; the coded positions are described by the schema
//! registry.
//!
//! # Structure
//!
//! - Positions 0-4: Record length (5 digits)
//! - Position 5: Record status
//! - Position 6: Type of record (a = language material, c = music, etc.)
//! - Position 7: Bibliographic level (m = monograph, s = serial, etc.)
//! - Position 8: Type of control
//! - Position 9: Character coding scheme (space = MARC-8, a = UCS/Unicode)
//! - Position 10: Indicator count (usually 2)
//! - Position 11: Subfield code count (usually 2)
//! - Positions 12-16: Base address of data (5 digits)
//! - Positions 17-19: Encoding level, cataloging form, multipart level
//! - Positions 20-23: Entry map (usually "4500")

use serde::{Deserialize, Serialize};
use std::fmt;

/// Required length of a leader.
pub const LEADER_LENGTH: usize = 24;

/// MARC leader as delivered by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leader(String);

impl Leader {
    /// Wrap a leader string.
    ///
    /// ```
    /// use marcqa::Leader;
    ///
    /// let leader = Leader::new("00000nam a2200000 a 4500");
    /// assert_eq!(leader.record_type(), Some('a'));
    /// assert_eq!(leader.bibliographic_level(), Some('m'));
    /// ```
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Leader(value.into())
    }

    /// The raw leader string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the leader is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the leader has the required 24 characters.
    #[must_use]
    pub fn has_valid_length(&self) -> bool {
        self.0.len() == LEADER_LENGTH
    }

    /// The slice `start..end`, if the leader is long enough.
    #[must_use]
    pub fn position(&self, start: usize, end: usize) -> Option<&str> {
        self.0.get(start..end)
    }

    fn char_at(&self, position: usize) -> Option<char> {
        self.position(position, position + 1)
            .and_then(|s| s.chars().next())
    }

    /// Record status - position 5
    #[must_use]
    pub fn record_status(&self) -> Option<char> {
        self.char_at(5)
    }

    /// Type of record - position 6
    #[must_use]
    pub fn record_type(&self) -> Option<char> {
        self.char_at(6)
    }

    /// Bibliographic level - position 7
    #[must_use]
    pub fn bibliographic_level(&self) -> Option<char> {
        self.char_at(7)
    }

    /// Character coding scheme - position 9
    #[must_use]
    pub fn character_coding(&self) -> Option<char> {
        self.char_at(9)
    }

    /// Encoding level - position 17
    #[must_use]
    pub fn encoding_level(&self) -> Option<char> {
        self.char_at(17)
    }
}

impl Default for Leader {
    /// A blank leader for a new language material monograph.
    fn default() -> Self {
        Leader::new("00000nam a2200000 a 4500")
    }
}

impl fmt::Display for Leader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Leader {
    fn from(value: &str) -> Self {
        Leader::new(value)
    }
}

impl From<String> for Leader {
    fn from(value: String) -> Self {
        Leader(value)
    }
}
