//! Configuration options for a validation run.
//!
//! This module provides the [`ValidationParams`] struct which controls which dialect
//! the records are checked against, what is ignored, and how the aggregated rows are
//! written.

use crate::dialect::Dialect;
use crate::error::{MarcError, Result};
use crate::ignorable::{IgnorableFields, IgnorableRecords};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delimited output format for report rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma separated values
    #[default]
    Csv,
    /// Tab separated values
    Tsv,
}

impl ReportFormat {
    /// Field delimiter.
    #[must_use]
    pub const fn delimiter(&self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }

    /// Returns the typical file extension for this format.
    #[must_use]
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "CSV"),
            Self::Tsv => write!(f, "TSV"),
        }
    }
}

/// Parameters of a validation run.
///
/// # Examples
///
/// ```
/// use marcqa::{Dialect, IgnorableFields, ValidationParams};
///
/// let params = ValidationParams::new()
///     .with_dialect(Dialect::Kbr)
///     .with_ignorable_fields(IgnorableFields::parse("9XX").unwrap())
///     .with_collector_flush_threshold(Some(1000));
/// assert_eq!(params.dialect, Dialect::Kbr);
///
/// let params: ValidationParams =
///     serde_json::from_str(r#"{"dialect": "DNB", "ignorableFields": "042$a"}"#).unwrap();
/// assert_eq!(params.dialect, Dialect::Dnb);
/// assert!(!params.collect_summary_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationParams {
    /// Dialect the records are validated against.
    pub dialect: Dialect,

    /// Keep one finding per signature and record instead of every instance.
    ///
    /// Aggregate instance counts are unaffected.
    pub collect_summary_only: bool,

    /// Paths whose findings are ignored.
    pub ignorable_fields: IgnorableFields,

    /// Conditions that skip a whole record.
    pub ignorable_records: IgnorableRecords,

    /// Trim whitespace from record ids (001).
    pub trim_id: bool,

    /// Flush the per-finding record id collector once it holds this many ids.
    ///
    /// `None` keeps every id until the end of the run.
    pub collector_flush_threshold: Option<usize>,

    /// Delimiter of the report rows.
    pub format: ReportFormat,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            collect_summary_only: false,
            ignorable_fields: IgnorableFields::default(),
            ignorable_records: IgnorableRecords::default(),
            trim_id: true,
            collector_flush_threshold: None,
            format: ReportFormat::default(),
        }
    }
}

impl ValidationParams {
    /// Create parameters with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load parameters from JSON; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`MarcError::InvalidConfig`] when the JSON or a value in it cannot be
    /// interpreted.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self =
            serde_json::from_str(json).map_err(|e| MarcError::InvalidConfig(e.to_string()))?;
        params.check()?;
        Ok(params)
    }

    /// Set the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Enable or disable summary-only collection.
    #[must_use]
    pub fn with_summary_only(mut self, enabled: bool) -> Self {
        self.collect_summary_only = enabled;
        self
    }

    /// Set the ignorable paths.
    #[must_use]
    pub fn with_ignorable_fields(mut self, fields: IgnorableFields) -> Self {
        self.ignorable_fields = fields;
        self
    }

    /// Set the record skip conditions.
    #[must_use]
    pub fn with_ignorable_records(mut self, records: IgnorableRecords) -> Self {
        self.ignorable_records = records;
        self
    }

    /// Enable or disable record id trimming.
    #[must_use]
    pub fn with_trim_id(mut self, enabled: bool) -> Self {
        self.trim_id = enabled;
        self
    }

    /// Set the collector flush threshold; zero is raised to one.
    #[must_use]
    pub fn with_collector_flush_threshold(mut self, threshold: Option<usize>) -> Self {
        self.collector_flush_threshold = threshold.map(|t| t.max(1));
        self
    }

    /// Set the report format.
    #[must_use]
    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Reject combinations that cannot work.
    ///
    /// # Errors
    ///
    /// [`MarcError::InvalidConfig`] for a zero flush threshold.
    pub fn check(&self) -> Result<()> {
        if self.collector_flush_threshold == Some(0) {
            return Err(MarcError::InvalidConfig(
                "collector flush threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
