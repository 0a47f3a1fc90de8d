//! Error types for schema construction and boundary operations.
//!
//! This module provides the [`MarcError`] type and the [`Result`] convenience type.
//! Schema-conformance problems found in records are *not* errors: they are reported
//! as [`ValidationError`](crate::validation_error::ValidationError) findings and never
//! abort validation.

use thiserror::Error;

/// Error type for all fallible library operations.
///
/// Covers schema tables that break registry invariants, malformed configuration,
/// and failures at the serialization or I/O boundary.
#[derive(Error, Debug)]
pub enum MarcError {
    /// Schema table content that cannot form a valid registry.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Two definitions claim the same tag, or the same subfield code within one field.
    #[error("Duplicate definition for {tag}{}", .code.map(|c| format!("${c}")).unwrap_or_default())]
    DuplicateDefinition {
        /// Field tag of the colliding definition
        tag: String,
        /// Subfield code, when the collision is inside one field
        code: Option<char>,
    },

    /// A canonical record form that cannot be decoded back into a record.
    #[error("Invalid MARC record: {0}")]
    InvalidRecord(String),

    /// Configuration value that cannot be interpreted.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Failure writing report rows.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// IO error from the underlying destination.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience type alias for [`std::result::Result`] with [`MarcError`].
pub type Result<T> = std::result::Result<T, MarcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_definition_display() {
        let field = MarcError::DuplicateDefinition {
            tag: "245".to_string(),
            code: None,
        };
        assert_eq!(field.to_string(), "Duplicate definition for 245");

        let subfield = MarcError::DuplicateDefinition {
            tag: "336".to_string(),
            code: Some('7'),
        };
        assert_eq!(subfield.to_string(), "Duplicate definition for 336$7");
    }
}
