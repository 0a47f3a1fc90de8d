//! Report rows produced by the aggregator and a delimited writer for them.
//!
//! The rows are plain serde records; [`write_rows`] emits any of them as CSV or TSV
//! with a header line. Choosing file names and opening files stays with the caller.

use crate::config::ReportFormat;
use crate::error::Result;
use serde::Serialize;
use std::io;

/// One deduplicated finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    /// Run-scoped finding id
    pub id: u32,
    /// The finding rendered as `path: type: message`
    pub finding: String,
    /// Number of instances
    pub instances: usize,
    /// Number of records with at least one instance
    pub records: usize,
}

/// Counts of one finding type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRow {
    /// Type id
    pub id: u32,
    /// Category id
    pub category_id: u32,
    /// Category name
    pub category: &'static str,
    /// Type description
    #[serde(rename = "type")]
    pub error_type: &'static str,
    /// Number of instances
    pub instances: usize,
    /// Number of records
    pub records: usize,
}

/// Counts of one finding category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    /// Category id
    pub id: u32,
    /// Category name
    pub category: &'static str,
    /// Number of instances
    pub instances: usize,
    /// Number of records
    pub records: usize,
}

/// Which total a [`TotalRow`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TotalKind {
    /// Every finding
    Total,
    /// Every finding except undefined fields
    TotalWithoutUndefinedFields,
}

/// A total over all findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalRow {
    /// Which total
    pub kind: TotalKind,
    /// Number of instances
    pub instances: usize,
    /// Number of records
    pub records: usize,
}

/// Records seen and records validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRow {
    /// Records handed to the run, skipped ones included
    pub total: usize,
    /// Records actually validated
    pub processed: usize,
}

/// Record ids carrying one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorRow {
    /// Finding id
    pub error_id: u32,
    /// Record ids joined with `;`
    pub record_ids: String,
}

impl CollectorRow {
    /// Create a row from record ids in the order given.
    #[must_use]
    pub fn new<'a>(error_id: u32, record_ids: impl IntoIterator<Item = &'a String>) -> Self {
        let record_ids = record_ids
            .into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");
        CollectorRow {
            error_id,
            record_ids,
        }
    }
}

/// Write `rows` with a header line in the given format.
///
/// # Errors
///
/// [`MarcError::CsvError`](crate::MarcError::CsvError) if a row can't be written,
/// [`MarcError::IoError`](crate::MarcError::IoError) if the destination can't be flushed.
///
/// # Examples
///
/// ```
/// use marcqa::report::{write_rows, CountRow};
/// use marcqa::ReportFormat;
///
/// let mut out = Vec::new();
/// write_rows(&mut out, &[CountRow { total: 3, processed: 2 }], ReportFormat::Tsv)?;
/// assert_eq!(String::from_utf8(out).unwrap(), "total\tprocessed\n3\t2\n");
/// # Ok::<(), marcqa::MarcError>(())
/// ```
pub fn write_rows<W: io::Write, R: Serialize>(writer: W, rows: &[R], format: ReportFormat) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_rows_as_csv() {
        let rows = vec![
            SummaryRow {
                id: 1,
                finding: "999: undefined field".to_string(),
                instances: 2,
                records: 2,
            },
            SummaryRow {
                id: 2,
                finding: "541$a: non-repeatable subfield: there are 2 instances".to_string(),
                instances: 1,
                records: 1,
            },
        ];
        let mut out = Vec::new();
        write_rows(&mut out, &rows, ReportFormat::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,finding,instances,records");
        assert_eq!(lines[1], "1,999: undefined field,2,2");
        assert_eq!(lines[2], "2,541$a: non-repeatable subfield: there are 2 instances,1,1");
    }

    #[test]
    fn test_type_row_header() {
        let rows = vec![TypeRow {
            id: 3,
            category_id: 1,
            category: "structural",
            error_type: "undefined field",
            instances: 1,
            records: 1,
        }];
        let mut out = Vec::new();
        write_rows(&mut out, &rows, ReportFormat::Tsv).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("id\tcategoryId\tcategory\ttype\tinstances\trecords\n"));
        assert!(text.contains("3\t1\tstructural\tundefined field\t1\t1"));
    }

    #[test]
    fn test_collector_row_join() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let row = CollectorRow::new(7, &ids);
        assert_eq!(row.record_ids, "a;b");
        let mut out = Vec::new();
        write_rows(&mut out, &[row], ReportFormat::Csv).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "errorId,recordIds\n7,a;b\n");
    }
}
