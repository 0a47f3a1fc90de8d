//! FRBR user-task coverage of the schema and of a processed corpus.
//!
//! Every schema element can declare the user tasks it supports. The
//! [`FunctionAnalyzer`] counts those declarations once per element to build a
//! baseline, and then accumulates how many supporting elements each record actually
//! carries. It never produces findings.
//!
//! # Examples
//!
//! ```
//! use marcqa::frbr::{FrbrFunction, FunctionAnalyzer};
//! use marcqa::{Dialect, Field, Leader, Record, SchemaRegistry};
//!
//! let registry = SchemaRegistry::shared()?;
//! let mut analyzer = FunctionAnalyzer::new(registry, Dialect::Marc21);
//! assert!(analyzer.baseline_count(FrbrFunction::DiscoverySearch) > 0);
//!
//! let record = Record::builder(Leader::default())
//!     .control_field("001", "rec-1")
//!     .field(Field::builder("245", '1', '0').subfield('a', "A title").build())
//!     .build();
//! analyzer.process(&record);
//! assert_eq!(analyzer.records(), 1);
//! # Ok::<(), marcqa::MarcError>(())
//! ```

use crate::dialect::Dialect;
use crate::record::Record;
use crate::schema::SchemaRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A user task an element supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrbrFunction {
    /// Search for a resource
    DiscoverySearch,
    /// Identify a resource
    DiscoveryIdentify,
    /// Select a resource
    DiscoverySelect,
    /// Obtain a resource
    DiscoveryObtain,
    /// Restrict use of a resource
    UseRestrict,
    /// Manage a resource
    UseManage,
    /// Operate a resource
    UseOperate,
    /// Interpret a resource
    UseInterpret,
    /// Identify a record
    ManagementIdentify,
    /// Process a record
    ManagementProcess,
    /// Sort records
    ManagementSort,
    /// Display a record
    ManagementDisplay,
}

impl FrbrFunction {
    /// Every function, in declaration order.
    pub const ALL: [FrbrFunction; 12] = [
        FrbrFunction::DiscoverySearch,
        FrbrFunction::DiscoveryIdentify,
        FrbrFunction::DiscoverySelect,
        FrbrFunction::DiscoveryObtain,
        FrbrFunction::UseRestrict,
        FrbrFunction::UseManage,
        FrbrFunction::UseOperate,
        FrbrFunction::UseInterpret,
        FrbrFunction::ManagementIdentify,
        FrbrFunction::ManagementProcess,
        FrbrFunction::ManagementSort,
        FrbrFunction::ManagementDisplay,
    ];

    /// Human-readable label, e.g. `Discovery: search`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::DiscoverySearch => "Discovery: search",
            Self::DiscoveryIdentify => "Discovery: identify",
            Self::DiscoverySelect => "Discovery: select",
            Self::DiscoveryObtain => "Discovery: obtain",
            Self::UseRestrict => "Use: restrict",
            Self::UseManage => "Use: manage",
            Self::UseOperate => "Use: operate",
            Self::UseInterpret => "Use: interpret",
            Self::ManagementIdentify => "Management: identify",
            Self::ManagementProcess => "Management: process",
            Self::ManagementSort => "Management: sort",
            Self::ManagementDisplay => "Management: display",
        }
    }
}

impl fmt::Display for FrbrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Observed support for one function: the element count and its share of the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FunctionValue {
    /// Number of supporting elements seen
    pub count: usize,
    /// `count` relative to the baseline, once calculated
    pub percent: f64,
}

impl FunctionValue {
    /// Create a value.
    #[must_use]
    pub fn new(count: usize, percent: f64) -> Self {
        FunctionValue { count, percent }
    }

    /// Count one more supporting element.
    pub fn count(&mut self) {
        self.count += 1;
    }

    /// Set `percent` to `count / total`; a zero total leaves it at zero.
    pub fn calculate_percent(&mut self, total: usize) {
        self.percent = if total == 0 {
            0.0
        } else {
            self.count as f64 / total as f64
        };
    }

    /// Add another value to this one.
    pub fn add(&mut self, other: &FunctionValue) {
        self.count += other.count;
        self.percent += other.percent;
    }
}

/// Per-record function usage.
pub type FunctionCounts = BTreeMap<FrbrFunction, FunctionValue>;

/// Baseline and corpus statistics of FRBR function support for one dialect.
#[derive(Debug)]
pub struct FunctionAnalyzer<'a> {
    registry: &'a SchemaRegistry,
    dialect: Dialect,
    baseline: BTreeMap<FrbrFunction, usize>,
    elements_without_functions: usize,
    function_by_path: BTreeMap<String, Vec<FrbrFunction>>,
    paths_by_function: BTreeMap<FrbrFunction, Vec<String>>,
    collector: FunctionCounts,
    histogram: BTreeMap<FrbrFunction, BTreeMap<usize, usize>>,
    records: usize,
}

impl<'a> FunctionAnalyzer<'a> {
    /// Build the baseline from every element the registry defines for `dialect`.
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry, dialect: Dialect) -> Self {
        let mut analyzer = FunctionAnalyzer {
            registry,
            dialect,
            baseline: BTreeMap::new(),
            elements_without_functions: 0,
            function_by_path: BTreeMap::new(),
            paths_by_function: BTreeMap::new(),
            collector: BTreeMap::new(),
            histogram: BTreeMap::new(),
            records: 0,
        };
        analyzer.prepare_baseline();
        for function in analyzer.baseline.keys() {
            analyzer.collector.insert(*function, FunctionValue::default());
            analyzer.histogram.insert(*function, BTreeMap::new());
        }
        tracing::debug!(
            dialect = %dialect,
            covered = analyzer.function_by_path.len(),
            uncovered = analyzer.elements_without_functions,
            "FRBR baseline prepared"
        );
        analyzer
    }

    fn prepare_baseline(&mut self) {
        let registry = self.registry;
        for position in registry.leader_positions() {
            self.register(&position.functions, format!("leader{}", position.id));
        }
        for control in registry.control_fields() {
            if control.is_simple() {
                self.register(&control.functions, control.tag.clone());
            } else {
                for position in &control.positions {
                    self.register(&position.functions, format!("{}/{}", control.tag, position.id));
                }
            }
        }
        for field in registry.fields(self.dialect) {
            self.elements_without_functions += 1;
            for n in 1..=2 {
                if let Some(indicator) = field.indicator(n).filter(|i| i.is_defined()) {
                    self.register(&indicator.functions, format!("{}$ind{n}", field.tag()));
                }
            }
            for subfield in field.subfields() {
                self.register(&subfield.functions, format!("{}${}", field.tag(), subfield.code));
            }
        }
    }

    fn register(&mut self, functions: &[FrbrFunction], path: String) {
        if functions.is_empty() {
            self.elements_without_functions += 1;
            return;
        }
        for function in functions {
            self.paths_by_function
                .entry(*function)
                .or_default()
                .push(path.clone());
            *self.baseline.entry(*function).or_insert(0) += 1;
        }
        self.function_by_path.insert(path, functions.to_vec());
    }

    /// Dialect the baseline was built for.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Number of schema elements supporting each function.
    #[must_use]
    pub fn baseline(&self) -> &BTreeMap<FrbrFunction, usize> {
        &self.baseline
    }

    /// Number of schema elements supporting `function`.
    #[must_use]
    pub fn baseline_count(&self, function: FrbrFunction) -> usize {
        self.baseline.get(&function).copied().unwrap_or(0)
    }

    /// Elements that declare no function. Every data field counts as one.
    #[must_use]
    pub fn elements_without_functions(&self) -> usize {
        self.elements_without_functions
    }

    /// Functions declared by the element at `path` (`leader06`, `008/06`, `245$a`).
    #[must_use]
    pub fn functions_of(&self, path: &str) -> &[FrbrFunction] {
        self.function_by_path.get(path).map_or(&[], Vec::as_slice)
    }

    /// Element paths per function.
    #[must_use]
    pub fn paths_by_function(&self) -> &BTreeMap<FrbrFunction, Vec<String>> {
        &self.paths_by_function
    }

    /// Count the functions supported by the elements present in `record`.
    ///
    /// Every leader position the leader is long enough for counts, as does every
    /// control field position, every defined indicator and every known subfield.
    #[must_use]
    pub fn count_functions(&self, record: &Record) -> FunctionCounts {
        let mut counts = FunctionCounts::new();
        let mut count = |functions: &[FrbrFunction]| {
            for function in functions {
                counts.entry(*function).or_default().count();
            }
        };

        for position in self.registry.leader_positions() {
            if record.leader.position(position.start, position.end).is_some() {
                count(&position.functions);
            }
        }
        for control in record.control_fields_iter() {
            let Some(definition) = self.registry.resolve_control(&control.tag) else {
                continue;
            };
            if definition.is_simple() {
                count(&definition.functions);
            }
            for position in &definition.positions {
                if control.value.get(position.start..position.end).is_some() {
                    count(&position.functions);
                }
            }
        }
        for field in record.fields() {
            let Some(definition) = self.registry.resolve(&field.tag, self.dialect).defined() else {
                continue;
            };
            for n in 1..=2 {
                if let Some(indicator) = definition.indicator(n).filter(|i| i.is_defined()) {
                    count(&indicator.functions);
                }
            }
            for subfield in field.subfields() {
                if let Some(subfield_definition) = definition.subfield(subfield.code) {
                    count(&subfield_definition.functions);
                }
            }
        }
        counts
    }

    /// Turn raw counts into shares of the baseline.
    pub fn calculate_percent(&self, counts: &mut FunctionCounts) {
        for (function, total) in &self.baseline {
            if let Some(value) = counts.get_mut(function) {
                value.calculate_percent(*total);
            }
        }
    }

    /// Add one record's counts to the corpus totals.
    pub fn add(&mut self, counts: &FunctionCounts) {
        for (function, value) in counts {
            self.collector.entry(*function).or_default().add(value);
        }
    }

    /// Record one record's counts in the per-function histogram.
    pub fn add_to_histogram(&mut self, counts: &FunctionCounts) {
        for (function, value) in counts {
            *self
                .histogram
                .entry(*function)
                .or_default()
                .entry(value.count)
                .or_insert(0) += 1;
        }
    }

    /// Count, convert and accumulate one record.
    pub fn process(&mut self, record: &Record) {
        let mut counts = self.count_functions(record);
        self.calculate_percent(&mut counts);
        self.add(&counts);
        self.add_to_histogram(&counts);
        self.records += 1;
    }

    /// Records processed so far.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    /// Corpus totals per function.
    #[must_use]
    pub fn collector(&self) -> &FunctionCounts {
        &self.collector
    }

    /// For each function: how many records carried a given number of supporting elements.
    #[must_use]
    pub fn histogram(&self) -> &BTreeMap<FrbrFunction, BTreeMap<usize, usize>> {
        &self.histogram
    }

    /// Average count and average share per record over `total` records.
    ///
    /// A zero total yields zeros.
    #[must_use]
    pub fn percent_of(&self, total: usize) -> BTreeMap<FrbrFunction, (f64, f64)> {
        self.collector
            .iter()
            .map(|(function, value)| {
                let averages = if total == 0 {
                    (0.0, 0.0)
                } else {
                    (
                        value.count as f64 / total as f64,
                        value.percent / total as f64,
                    )
                };
                (*function, averages)
            })
            .collect()
    }
}
