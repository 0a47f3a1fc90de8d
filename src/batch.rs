//! Validation of record batches, sequentially or in parallel using Rayon.
//!
//! [`ValidationRun`] applies one set of [`ValidationParams`] to a slice of records.
//! Records matching the ignorable-record conditions (or a caller-supplied
//! [`RecordFilter`]) are counted but not validated.
//!
//! [`ValidationRun::validate_parallel`] folds each Rayon split into its own
//! [`ValidationAggregator`], merges the splits in order and finally rewrites the
//! finding ids on every record from the merged id space, so its result matches
//! [`ValidationRun::validate_sequential`].
//!
//! # Examples
//!
//! ```
//! use marcqa::batch::ValidationRun;
//! use marcqa::{Field, Leader, Record, SchemaRegistry, ValidationParams};
//!
//! let registry = SchemaRegistry::shared()?;
//! let params = ValidationParams::new();
//! let mut records: Vec<Record> = (0..4)
//!     .map(|i| {
//!         Record::builder(Leader::default())
//!             .control_field("001", &format!("rec-{i}"))
//!             .field(Field::builder("999", ' ', ' ').subfield('a', "x").build())
//!             .build()
//!     })
//!     .collect();
//!
//! let aggregator = ValidationRun::new(registry, &params).validate_parallel(&mut records);
//! assert_eq!(aggregator.processed(), 4);
//! assert!(records.iter().all(|r| r.validation_errors()[0].id == Some(1)));
//! # Ok::<(), marcqa::MarcError>(())
//! ```

use crate::aggregator::ValidationAggregator;
use crate::config::ValidationParams;
use crate::ignorable::RecordFilter;
use crate::record::Record;
use crate::schema::SchemaRegistry;
use rayon::prelude::*;

/// Number of records between two progress log lines.
pub const PROGRESS_INTERVAL: usize = 100_000;

/// A validation run over batches of records.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRun<'a> {
    registry: &'a SchemaRegistry,
    params: &'a ValidationParams,
}

impl<'a> ValidationRun<'a> {
    /// Create a run.
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry, params: &'a ValidationParams) -> Self {
        ValidationRun { registry, params }
    }

    /// An empty aggregator configured for this run.
    #[must_use]
    pub fn aggregator(&self) -> ValidationAggregator {
        ValidationAggregator::with_flush_threshold(self.params.collector_flush_threshold)
    }

    /// Validate one record and add it to `aggregator`.
    ///
    /// Returns `false` when the record was skipped.
    pub fn process<F: RecordFilter + ?Sized>(
        &self,
        record: &mut Record,
        filter: &F,
        aggregator: &mut ValidationAggregator,
    ) -> bool {
        if self.params.ignorable_records.is_ignorable(record) || filter.is_ignorable(record) {
            tracing::debug!(record_id = %record.id(self.params.trim_id), "record skipped");
            aggregator.record_skipped();
            return false;
        }
        record.validate_with(self.registry, self.params);
        aggregator.add(record);
        if aggregator.processed() % PROGRESS_INTERVAL == 0 {
            tracing::info!(processed = aggregator.processed(), "validation progress");
        }
        true
    }

    /// Validate `records` in order on the current thread.
    pub fn validate_sequential(&self, records: &mut [Record]) -> ValidationAggregator {
        self.validate_sequential_filtered(records, &|_: &Record| false)
    }

    /// Like [`ValidationRun::validate_sequential`], also skipping records `filter`
    /// rejects.
    pub fn validate_sequential_filtered<F: RecordFilter + ?Sized>(
        &self,
        records: &mut [Record],
        filter: &F,
    ) -> ValidationAggregator {
        let mut aggregator = self.aggregator();
        for record in records.iter_mut() {
            self.process(record, filter, &mut aggregator);
        }
        log_finished(&aggregator);
        aggregator
    }

    /// Validate `records` on the Rayon thread pool.
    ///
    /// The pool respects the `RAYON_NUM_THREADS` environment variable.
    pub fn validate_parallel(&self, records: &mut [Record]) -> ValidationAggregator {
        self.validate_parallel_filtered(records, &|_: &Record| false)
    }

    /// Like [`ValidationRun::validate_parallel`], also skipping records `filter`
    /// rejects.
    pub fn validate_parallel_filtered<F: RecordFilter + Sync + ?Sized>(
        &self,
        records: &mut [Record],
        filter: &F,
    ) -> ValidationAggregator {
        let merged = records
            .par_iter_mut()
            .fold(
                || self.aggregator(),
                |mut aggregator, record| {
                    self.process(record, filter, &mut aggregator);
                    aggregator
                },
            )
            .reduce(
                || self.aggregator(),
                |mut left, right| {
                    left.merge(right);
                    left
                },
            );

        records.par_iter_mut().for_each(|record| {
            for finding in record.validation_errors_mut() {
                finding.id = merged.id_of(&finding.signature());
            }
        });
        log_finished(&merged);
        merged
    }
}

fn log_finished(aggregator: &ValidationAggregator) {
    tracing::info!(
        records = aggregator.records_seen(),
        processed = aggregator.processed(),
        with_findings = aggregator.with_findings(),
        distinct_findings = aggregator.distinct_findings(),
        "validation finished"
    );
}
