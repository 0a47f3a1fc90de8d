//! Schema-driven validation of one record.
//!
//! [`Validator`] runs independent passes over a [`Record`] and never stops early,
//! so one element can collect several findings:
//!
//! 1. the leader length and its coded positions
//! 2. each control field: definition, fixed length, coded positions
//! 3. each data field: definition, indicators, then every subfield occurrence
//!    (definition, repetition, content rules, code list)
//! 4. record-level repetition of non-repeatable tags
//!
//! Findings come out in document order. An undefined data field yields one
//! [`ValidationErrorType::FieldUndefined`] finding and its indicators and subfields
//! are not looked at.

use crate::content::{PositionParser, Violation};
use crate::dialect::Dialect;
use crate::ignorable::IgnorableFields;
use crate::record::{ControlField, Field, Record};
use crate::schema::{FieldLookup, IndicatorCheck, PositionDefinition, ResolvedField, SchemaRegistry};
use crate::validation_error::{ValidationError, ValidationErrorType};
use indexmap::IndexMap;
use smallvec::SmallVec;

/// Validates records against a registry for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a SchemaRegistry,
    dialect: Dialect,
}

impl<'a> Validator<'a> {
    /// Create a validator.
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry, dialect: Dialect) -> Self {
        Validator { registry, dialect }
    }

    /// The dialect records are checked against.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Every finding for `record`, in document order, attributed to `record_id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcqa::validation::Validator;
    /// use marcqa::{Dialect, Field, Leader, Record, SchemaRegistry, ValidationErrorType};
    ///
    /// let registry = SchemaRegistry::shared()?;
    /// let record = Record::builder(Leader::default())
    ///     .field(Field::builder("999", ' ', ' ').subfield('a', "local").build())
    ///     .build();
    /// let findings = Validator::new(registry, Dialect::Marc21).validate(&record, "r1");
    /// assert_eq!(findings.len(), 1);
    /// assert_eq!(findings[0].error_type, ValidationErrorType::FieldUndefined);
    /// assert_eq!(findings[0].path, "999");
    /// # Ok::<(), marcqa::MarcError>(())
    /// ```
    #[must_use]
    pub fn validate(&self, record: &Record, record_id: &str) -> Vec<ValidationError> {
        let mut findings = Vec::new();
        self.validate_leader(record, record_id, &mut findings);
        for control in record.control_fields_iter() {
            self.validate_control_field(control, record_id, &mut findings);
        }
        for field in record.fields() {
            self.validate_field(field, record_id, &mut findings);
        }
        self.validate_field_repetition(record, record_id, &mut findings);
        findings
    }

    fn validate_leader(&self, record: &Record, record_id: &str, findings: &mut Vec<ValidationError>) {
        let leader = record.leader.as_str();
        if !record.leader.has_valid_length() {
            findings.push(ValidationError::new(
                record_id,
                "leader",
                ValidationErrorType::LeaderInvalidLength,
                format!("length is {}", leader.len()),
            ));
        }
        self.check_positions(self.registry.leader_positions(), leader, "leader", record_id, findings);
    }

    fn validate_control_field(
        &self,
        control: &ControlField,
        record_id: &str,
        findings: &mut Vec<ValidationError>,
    ) {
        let Some(definition) = self.registry.resolve_control(&control.tag) else {
            findings.push(ValidationError::new(
                record_id,
                control.tag.as_str(),
                ValidationErrorType::FieldUndefined,
                "",
            ));
            return;
        };
        if let Some(length) = definition.length {
            let actual = control.value.chars().count();
            if actual != length {
                findings.push(ValidationError::new(
                    record_id,
                    control.tag.as_str(),
                    ValidationErrorType::ControlFieldInvalidLength,
                    format!("length is {actual}, expected {length}"),
                ));
            }
        }
        let prefix = format!("{}/", control.tag);
        self.check_positions(&definition.positions, &control.value, &prefix, record_id, findings);
    }

    /// Positions the value is too short for are skipped; the length check reports them.
    fn check_positions(
        &self,
        positions: &[PositionDefinition],
        value: &str,
        prefix: &str,
        record_id: &str,
        findings: &mut Vec<ValidationError>,
    ) {
        for (position, slice) in PositionParser::new(positions).extract(value) {
            let Some(slice) = slice else { continue };
            let code_list = position
                .code_list
                .as_deref()
                .and_then(|name| self.registry.code_list(name));
            if let Err(violation) = position.check_value(slice, code_list) {
                findings.push(ValidationError::new(
                    record_id,
                    format!("{prefix}{}", position.id),
                    ValidationErrorType::from_position(&violation),
                    describe(slice, &violation),
                ));
            }
        }
    }

    fn validate_field(&self, field: &Field, record_id: &str, findings: &mut Vec<ValidationError>) {
        let resolved = match self.registry.resolve(&field.tag, self.dialect) {
            FieldLookup::Defined(resolved) => resolved,
            FieldLookup::Undefined => {
                findings.push(ValidationError::new(
                    record_id,
                    field.tag.as_str(),
                    ValidationErrorType::FieldUndefined,
                    "",
                ));
                return;
            },
        };
        let url = resolved.definition().url.as_deref();
        let start = findings.len();
        self.validate_indicators(field, &resolved, record_id, findings);
        self.validate_subfields(field, &resolved, record_id, findings);
        for finding in &mut findings[start..] {
            finding.url = url.map(str::to_string);
        }
    }

    fn validate_indicators(
        &self,
        field: &Field,
        resolved: &ResolvedField<'_>,
        record_id: &str,
        findings: &mut Vec<ValidationError>,
    ) {
        for (position, value) in [(1u8, field.indicator1), (2u8, field.indicator2)] {
            let Some(definition) = resolved.indicator(position) else { continue };
            let error_type = match definition.check(value) {
                IndicatorCheck::Valid => continue,
                IndicatorCheck::Invalid => ValidationErrorType::IndicatorInvalid,
                IndicatorCheck::Obsolete => ValidationErrorType::IndicatorObsolete,
                IndicatorCheck::NonEmpty => ValidationErrorType::IndicatorNonEmpty,
            };
            findings.push(ValidationError::new(
                record_id,
                format!("{}$ind{position}", field.tag),
                error_type,
                format!("'{value}'"),
            ));
        }
    }

    fn validate_subfields(
        &self,
        field: &Field,
        resolved: &ResolvedField<'_>,
        record_id: &str,
        findings: &mut Vec<ValidationError>,
    ) {
        // (code, occurrences, index of the repetition finding)
        let mut seen: SmallVec<[(char, usize, Option<usize>); 8]> = SmallVec::new();

        for subfield in field.subfields() {
            let path = format!("{}${}", field.tag, subfield.code);
            let Some(definition) = resolved.subfield(subfield.code) else {
                findings.push(ValidationError::new(
                    record_id,
                    path,
                    ValidationErrorType::SubfieldUndefined,
                    "",
                ));
                continue;
            };

            match seen.iter_mut().find(|(code, _, _)| *code == subfield.code) {
                Some(entry) => {
                    entry.1 += 1;
                    if !definition.cardinality.is_repeatable() && entry.2.is_none() {
                        entry.2 = Some(findings.len());
                        findings.push(ValidationError::new(
                            record_id,
                            path.clone(),
                            ValidationErrorType::SubfieldNotRepeatable,
                            "",
                        ));
                    }
                },
                None => seen.push((subfield.code, 1, None)),
            }

            let value = subfield.value.as_str();
            if let Some(parser) = definition.parser {
                if let Err(violation) = parser.parse(value) {
                    findings.push(ValidationError::new(
                        record_id,
                        path.clone(),
                        ValidationErrorType::from_parser(parser),
                        describe(value, &violation),
                    ));
                }
            }
            if let Some(validator) = definition.validator {
                if let Err(violation) = validator.validate(value) {
                    findings.push(ValidationError::new(
                        record_id,
                        path.clone(),
                        ValidationErrorType::from_validator(validator, &violation),
                        describe(value, &violation),
                    ));
                }
            }
            if let Some(list) = definition
                .code_list
                .as_deref()
                .and_then(|name| self.registry.code_list(name))
            {
                if !list.contains(value) {
                    findings.push(ValidationError::new(
                        record_id,
                        path,
                        ValidationErrorType::CodeInvalid,
                        format!("'{value}'"),
                    ));
                }
            }
        }

        for (_, count, index) in seen {
            if let Some(index) = index {
                findings[index].message = format!("there are {count} instances");
            }
        }
    }

    fn validate_field_repetition(
        &self,
        record: &Record,
        record_id: &str,
        findings: &mut Vec<ValidationError>,
    ) {
        let mut control_counts: IndexMap<&str, usize> = IndexMap::new();
        for control in record.control_fields_iter() {
            *control_counts.entry(control.tag.as_str()).or_insert(0) += 1;
        }
        for (tag, count) in control_counts {
            let repeatable = self
                .registry
                .resolve_control(tag)
                .map_or(true, |definition| definition.cardinality.is_repeatable());
            if count > 1 && !repeatable {
                findings.push(repetition_finding(record_id, tag, count));
            }
        }

        let mut field_counts: IndexMap<&str, usize> = IndexMap::new();
        for field in record.fields() {
            *field_counts.entry(field.tag.as_str()).or_insert(0) += 1;
        }
        for (tag, count) in field_counts {
            if count < 2 {
                continue;
            }
            if let Some(resolved) = self.registry.resolve(tag, self.dialect).defined() {
                if !resolved.cardinality().is_repeatable() {
                    findings.push(
                        repetition_finding(record_id, tag, count)
                            .with_url(resolved.definition().url.as_deref()),
                    );
                }
            }
        }
    }
}

fn repetition_finding(record_id: &str, tag: &str, count: usize) -> ValidationError {
    ValidationError::new(
        record_id,
        tag,
        ValidationErrorType::FieldNotRepeatable,
        format!("there are {count} instances"),
    )
}

fn describe(value: &str, violation: &Violation) -> String {
    match violation {
        Violation::UnknownCode(_) => format!("'{value}'"),
        other => format!("'{value}': {other}"),
    }
}

/// Split findings into those surfaced and those matching an ignorable path.
///
/// Both halves keep document order.
#[must_use]
pub fn partition_ignorable(
    findings: Vec<ValidationError>,
    ignorable: &IgnorableFields,
) -> (Vec<ValidationError>, Vec<ValidationError>) {
    if ignorable.is_empty() {
        return (findings, Vec::new());
    }
    findings
        .into_iter()
        .partition(|finding| !ignorable.is_ignorable(finding))
}

/// Keep the first finding of every signature, carrying the number of findings it
/// stands for in `occurrences`.
#[must_use]
pub fn collapse_duplicates(findings: Vec<ValidationError>) -> Vec<ValidationError> {
    let mut collapsed: IndexMap<_, ValidationError> = IndexMap::new();
    for finding in findings {
        match collapsed.entry(finding.signature()) {
            indexmap::map::Entry::Occupied(mut entry) => {
                entry.get_mut().occurrences += finding.occurrences;
            },
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(finding);
            },
        }
    }
    collapsed.into_values().collect()
}
