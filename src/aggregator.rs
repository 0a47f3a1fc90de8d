//! Batch-level accumulation of findings.
//!
//! A [`ValidationAggregator`] owns the run-scoped id space: the first finding of a
//! signature gets the next id, later ones reuse it. It also keeps instance and record
//! counters per finding, per type, per category and in two totals, plus a
//! finding → record ids collector for traceability.
//!
//! Aggregators built on separate workers are combined with
//! [`ValidationAggregator::merge`], which re-assigns the incoming ids so the result
//! equals one aggregator fed every record in order.

use crate::record::Record;
use crate::report::{CategoryRow, CollectorRow, CountRow, SummaryRow, TotalKind, TotalRow, TypeRow};
use crate::validation_error::{ErrorSignature, ValidationError, ValidationErrorCategory, ValidationErrorType};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Instance and record counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    /// Number of findings
    pub instances: usize,
    /// Number of records with at least one of them
    pub records: usize,
}

impl Counts {
    fn add(&mut self, other: Counts) {
        self.instances += other.instances;
        self.records += other.records;
    }
}

/// Accumulates findings of a validation run.
///
/// # Examples
///
/// ```
/// use marcqa::aggregator::ValidationAggregator;
/// use marcqa::{Dialect, Field, IgnorableFields, Leader, Record, SchemaRegistry};
///
/// let registry = SchemaRegistry::shared()?;
/// let mut aggregator = ValidationAggregator::new();
/// for id in ["r1", "r2"] {
///     let mut record = Record::builder(Leader::default())
///         .control_field("001", id)
///         .field(Field::builder("999", ' ', ' ').subfield('a', "x").build())
///         .build();
///     record.validate(registry, Dialect::Marc21, false, &IgnorableFields::new());
///     aggregator.add(&mut record);
/// }
/// let rows = aggregator.summary_rows();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].finding, "999: undefined field");
/// assert_eq!((rows[0].instances, rows[0].records), (2, 2));
/// # Ok::<(), marcqa::MarcError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationAggregator {
    ids: HashMap<ErrorSignature, u32>,
    signatures: Vec<ErrorSignature>,
    by_id: Vec<Counts>,
    by_type: BTreeMap<ValidationErrorType, Counts>,
    by_category: BTreeMap<ValidationErrorCategory, Counts>,
    total: Counts,
    total_without_undefined: Counts,
    records_seen: usize,
    processed: usize,
    with_findings: usize,
    collector: BTreeMap<u32, BTreeSet<String>>,
    flush_threshold: Option<usize>,
    flushed: Vec<CollectorRow>,
}

impl ValidationAggregator {
    /// Create an empty aggregator that keeps every collected record id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty aggregator that flushes a finding's record ids once they
    /// exceed `threshold`. A threshold of zero is treated as one.
    #[must_use]
    pub fn with_flush_threshold(threshold: Option<usize>) -> Self {
        ValidationAggregator {
            flush_threshold: threshold.map(|t| t.max(1)),
            ..Self::default()
        }
    }

    /// The id of `signature`, assigning the next one on first sight.
    pub fn register(&mut self, signature: &ErrorSignature) -> u32 {
        if let Some(id) = self.ids.get(signature) {
            return *id;
        }
        self.signatures.push(signature.clone());
        self.by_id.push(Counts::default());
        let id = u32::try_from(self.signatures.len()).unwrap_or(u32::MAX);
        self.ids.insert(signature.clone(), id);
        id
    }

    /// The id currently assigned to `signature`.
    #[must_use]
    pub fn id_of(&self, signature: &ErrorSignature) -> Option<u32> {
        self.ids.get(signature).copied()
    }

    /// The signature behind an id.
    #[must_use]
    pub fn signature(&self, id: u32) -> Option<&ErrorSignature> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.signatures.get(index)
    }

    /// Count a record the run skipped.
    pub fn record_skipped(&mut self) {
        self.records_seen += 1;
    }

    /// Count a validated record and assign ids to its surfaced findings.
    pub fn add(&mut self, record: &mut Record) {
        let record_id = record
            .validation_errors()
            .first()
            .map(|finding| finding.record_id.clone())
            .unwrap_or_default();
        self.add_findings(&record_id, record.validation_errors_mut());
    }

    /// Count one record's findings and assign their ids.
    pub fn add_findings(&mut self, record_id: &str, findings: &mut [ValidationError]) {
        self.records_seen += 1;
        self.processed += 1;
        if findings.is_empty() {
            return;
        }
        self.with_findings += 1;

        let mut ids = BTreeSet::new();
        let mut types = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut counts_without_undefined = false;
        for finding in findings.iter_mut() {
            let id = self.register(&finding.signature());
            finding.id = Some(id);
            let instances = finding.occurrences;

            self.by_id[id as usize - 1].instances += instances;
            self.by_type.entry(finding.error_type).or_default().instances += instances;
            self.by_category.entry(finding.category()).or_default().instances += instances;
            self.total.instances += instances;
            if finding.error_type != ValidationErrorType::FieldUndefined {
                self.total_without_undefined.instances += instances;
                counts_without_undefined = true;
            }
            ids.insert(id);
            types.insert(finding.error_type);
            categories.insert(finding.category());
        }

        for id in &ids {
            self.by_id[*id as usize - 1].records += 1;
            self.collect(*id, record_id);
        }
        for error_type in types {
            self.by_type.entry(error_type).or_default().records += 1;
        }
        for category in categories {
            self.by_category.entry(category).or_default().records += 1;
        }
        self.total.records += 1;
        if counts_without_undefined {
            self.total_without_undefined.records += 1;
        }
    }

    fn collect(&mut self, id: u32, record_id: &str) {
        let ids = self.collector.entry(id).or_default();
        ids.insert(record_id.to_string());
        if let Some(threshold) = self.flush_threshold {
            if ids.len() > threshold {
                let row = CollectorRow::new(id, ids.iter());
                tracing::debug!(error_id = id, records = ids.len(), "collector flushed");
                ids.clear();
                self.flushed.push(row);
            }
        }
    }

    /// Fold another aggregator into this one.
    ///
    /// Signatures new to `self` get ids in the order `other` assigned them, so merging
    /// the shards of an ordered batch left to right reproduces the ids of a
    /// sequential run.
    pub fn merge(&mut self, other: ValidationAggregator) {
        let mapping: Vec<u32> = other
            .signatures
            .iter()
            .map(|signature| self.register(signature))
            .collect();
        let remap = |id: u32| mapping[id as usize - 1];

        for (index, counts) in other.by_id.iter().enumerate() {
            self.by_id[mapping[index] as usize - 1].add(*counts);
        }
        for (error_type, counts) in other.by_type {
            self.by_type.entry(error_type).or_default().add(counts);
        }
        for (category, counts) in other.by_category {
            self.by_category.entry(category).or_default().add(counts);
        }
        self.total.add(other.total);
        self.total_without_undefined.add(other.total_without_undefined);
        self.records_seen += other.records_seen;
        self.processed += other.processed;
        self.with_findings += other.with_findings;

        for mut row in other.flushed {
            row.error_id = remap(row.error_id);
            self.flushed.push(row);
        }
        for (id, record_ids) in other.collector {
            let id = remap(id);
            for record_id in record_ids {
                self.collect(id, &record_id);
            }
        }
        tracing::trace!(
            distinct_findings = self.signatures.len(),
            processed = self.processed,
            "aggregators merged"
        );
    }

    /// Records handed to the run, skipped ones included.
    #[must_use]
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// Records validated.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Validated records with at least one surfaced finding.
    #[must_use]
    pub fn with_findings(&self) -> usize {
        self.with_findings
    }

    /// Number of distinct signatures seen.
    #[must_use]
    pub fn distinct_findings(&self) -> usize {
        self.signatures.len()
    }

    /// Counters of one finding id.
    #[must_use]
    pub fn counts_of(&self, id: u32) -> Counts {
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| self.by_id.get(index))
            .copied()
            .unwrap_or_default()
    }

    /// Counters of one finding type.
    #[must_use]
    pub fn type_counts(&self, error_type: ValidationErrorType) -> Counts {
        self.by_type.get(&error_type).copied().unwrap_or_default()
    }

    /// Counters of one category.
    #[must_use]
    pub fn category_counts(&self, category: ValidationErrorCategory) -> Counts {
        self.by_category.get(&category).copied().unwrap_or_default()
    }

    /// Counters over every finding.
    #[must_use]
    pub fn total(&self) -> Counts {
        self.total
    }

    /// Counters over every finding except undefined fields.
    #[must_use]
    pub fn total_without_undefined(&self) -> Counts {
        self.total_without_undefined
    }

    /// One row per signature, by type id, then record count (descending), then id.
    #[must_use]
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        let mut rows: Vec<(u32, SummaryRow)> = self
            .signatures
            .iter()
            .zip(&self.by_id)
            .enumerate()
            .map(|(index, (signature, counts))| {
                let row = SummaryRow {
                    id: u32::try_from(index + 1).unwrap_or(u32::MAX),
                    finding: signature.to_string(),
                    instances: counts.instances,
                    records: counts.records,
                };
                (signature.error_type.id(), row)
            })
            .collect();
        rows.sort_by(|(a_type, a), (b_type, b)| {
            a_type
                .cmp(b_type)
                .then(b.records.cmp(&a.records))
                .then(a.id.cmp(&b.id))
        });
        rows.into_iter().map(|(_, row)| row).collect()
    }

    /// One row per finding type that occurred, by type id.
    #[must_use]
    pub fn type_rows(&self) -> Vec<TypeRow> {
        self.by_type
            .iter()
            .map(|(error_type, counts)| TypeRow {
                id: error_type.id(),
                category_id: error_type.category().id(),
                category: error_type.category().name(),
                error_type: error_type.message(),
                instances: counts.instances,
                records: counts.records,
            })
            .collect()
    }

    /// One row per category that occurred, by category id.
    #[must_use]
    pub fn category_rows(&self) -> Vec<CategoryRow> {
        self.by_category
            .iter()
            .map(|(category, counts)| CategoryRow {
                id: category.id(),
                category: category.name(),
                instances: counts.instances,
                records: counts.records,
            })
            .collect()
    }

    /// Both totals.
    #[must_use]
    pub fn total_rows(&self) -> Vec<TotalRow> {
        vec![
            TotalRow {
                kind: TotalKind::Total,
                instances: self.total.instances,
                records: self.total.records,
            },
            TotalRow {
                kind: TotalKind::TotalWithoutUndefinedFields,
                instances: self.total_without_undefined.instances,
                records: self.total_without_undefined.records,
            },
        ]
    }

    /// Records seen and records validated.
    #[must_use]
    pub fn count_row(&self) -> CountRow {
        CountRow {
            total: self.records_seen,
            processed: self.processed,
        }
    }

    /// Take the collector segments flushed so far.
    pub fn take_flushed(&mut self) -> Vec<CollectorRow> {
        std::mem::take(&mut self.flushed)
    }

    /// Every collector row: flushed segments first, then the ids still held, by id.
    #[must_use]
    pub fn collector_rows(&self) -> Vec<CollectorRow> {
        self.flushed
            .iter()
            .cloned()
            .chain(
                self.collector
                    .iter()
                    .filter(|(_, ids)| !ids.is_empty())
                    .map(|(id, ids)| CollectorRow::new(*id, ids.iter())),
            )
            .collect()
    }
}
