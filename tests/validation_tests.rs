//! Record validation against the embedded MARC21 tables and its dialects.

mod common;

use marcqa::{
    Dialect, Field, IgnorableFields, Leader, Record, ValidationErrorCategory, ValidationErrorType, ValidationParams,
};

fn types(record: &Record) -> Vec<ValidationErrorType> {
    record.validation_errors().iter().map(|e| e.error_type).collect()
}

fn validate(record: &mut Record, dialect: Dialect) -> bool {
    record.validate(common::registry(), dialect, false, &IgnorableFields::new())
}

#[test]
fn test_valid_record_has_no_findings() {
    let mut record = common::create_valid_record("valid-1");
    assert!(validate(&mut record, Dialect::Marc21));
    assert!(record.is_valid());
    assert!(record.validation_errors().is_empty());
    assert!(record.ignored_errors().is_empty());
}

#[test]
fn test_isbn_checksum() {
    let mut good = common::create_test_record("isbn-ok");
    good.add_field(Field::builder("020", ' ', ' ').subfield('a', "978-3-16-148410-0").build());
    assert!(validate(&mut good, Dialect::Marc21));

    let mut bad = common::create_test_record("isbn-bad");
    bad.add_field(Field::builder("020", ' ', ' ').subfield('a', "978-3-16-148410-1").build());
    assert!(!validate(&mut bad, Dialect::Marc21));
    assert_eq!(types(&bad), vec![ValidationErrorType::IsbnBadChecksum]);
    let finding = &bad.validation_errors()[0];
    assert_eq!(finding.path, "020$a");
    assert_eq!(finding.record_id, "isbn-bad");
    assert!(finding.message.contains("978-3-16-148410-1"));
    assert_eq!(
        finding.url.as_deref(),
        Some("https://www.loc.gov/marc/bibliographic/bd020.html")
    );
}

#[test]
fn test_issn_validator_on_022() {
    let mut record = common::create_test_record("issn");
    record.add_field(Field::builder("022", ' ', ' ').subfield('a', "0378-5955").build());
    assert!(validate(&mut record, Dialect::Marc21));

    let mut record = common::create_test_record("issn-bad");
    record.add_field(Field::builder("022", ' ', ' ').subfield('a', "0378-5954").build());
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::IssnBadChecksum]);
}

#[test]
fn test_nonrepeatable_subfield_reported_once() {
    let mut record = common::create_acquisition_record("acq", 3);
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::SubfieldNotRepeatable]);
    let finding = &record.validation_errors()[0];
    assert_eq!(finding.path, "541$a");
    assert_eq!(finding.message, "there are 3 instances");
    assert_eq!(finding.category(), ValidationErrorCategory::Cardinality);
}

#[test]
fn test_undefined_field_reported_once() {
    let mut record = common::create_test_record("undef");
    record.add_field(
        Field::builder("999", 'x', 'y')
            .subfield('a', "one")
            .subfield('a', "two")
            .subfield('q', "three")
            .build(),
    );
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::FieldUndefined]);
    assert_eq!(record.validation_errors()[0].path, "999");
    assert!(record.validation_errors()[0].message.is_empty());
}

#[test]
fn test_nonrepeatable_field() {
    let mut record = common::create_valid_record("twice");
    record.add_field(Field::builder("245", '1', '0').subfield('a', "Noch ein Titel").build());
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::FieldNotRepeatable]);
    assert_eq!(record.validation_errors()[0].message, "there are 2 instances");
}

#[test]
fn test_indicator_findings() {
    let mut record = common::create_test_record("ind");
    record.add_field(Field::builder("245", '9', '0').subfield('a', "Titel").build());
    record.add_field(Field::builder("541", '2', 'x').subfield('a', "Kauf").build());
    assert!(!validate(&mut record, Dialect::Marc21));

    let paths: Vec<(&str, ValidationErrorType)> = record
        .validation_errors()
        .iter()
        .map(|e| (e.path.as_str(), e.error_type))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("245$ind1", ValidationErrorType::IndicatorInvalid),
            ("541$ind1", ValidationErrorType::IndicatorInvalid),
            ("541$ind2", ValidationErrorType::IndicatorNonEmpty),
        ]
    );
    assert_eq!(record.validation_errors()[0].message, "'9'");
}

#[test]
fn test_code_list_membership() {
    let mut record = common::create_test_record("codes");
    record.add_field(
        Field::builder("100", '1', ' ')
            .subfield('a', "Mustermann, Max")
            .subfield('4', "xyz")
            .build(),
    );
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::CodeInvalid]);
    assert_eq!(record.validation_errors()[0].path, "100$4");
    assert_eq!(record.validation_errors()[0].message, "'xyz'");
}

#[test]
fn test_fixed_length_control_field() {
    let mut record = common::create_test_record("fixed");
    record.add_control_field("008", "850101s1985");
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::ControlFieldInvalidLength]);
    assert_eq!(record.validation_errors()[0].message, "length is 11, expected 40");
}

#[test]
fn test_fixed_length_counts_characters() {
    let mut record = common::create_test_record("umlaut");
    record.add_control_field("008", "850101s1985    gw   ä        000 0 ger d");
    assert!(validate(&mut record, Dialect::Marc21), "{:?}", record.validation_errors());

    let mut record = common::create_test_record("umlaut-short");
    record.add_control_field("008", "850101s1985    gw   ä        000 0 ger ");
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::ControlFieldInvalidLength]);
    assert_eq!(record.validation_errors()[0].message, "length is 39, expected 40");
}

#[test]
fn test_leader_length() {
    let mut record = Record::builder(Leader::new("00000nam")).control_field("001", "short").build();
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record)[0], ValidationErrorType::LeaderInvalidLength);
    assert_eq!(record.validation_errors()[0].path, "leader");
}

#[test]
fn test_record_control_number_parser() {
    let mut record = common::create_test_record("rcn");
    record.add_field(Field::builder("035", ' ', ' ').subfield('a', "(OCoLC)12345678").build());
    assert!(validate(&mut record, Dialect::Marc21));

    let mut record = common::create_test_record("rcn-bad");
    record.add_field(Field::builder("035", ' ', ' ').subfield('a', "(OCoLC12345678").build());
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::RecordControlNumberBadFormat]);
}

#[test]
fn test_malformed_linkage() {
    let mut record = common::create_test_record("link");
    record.add_field(
        Field::builder("541", ' ', ' ')
            .subfield('a', "Kauf")
            .subfield('6', "bad")
            .build(),
    );
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::LinkageBadFormat]);
    let finding = &record.validation_errors()[0];
    assert_eq!(finding.path, "541$6");
    assert_eq!(finding.message, "'bad': bad format");
}

#[test]
fn test_isbn_wrong_length() {
    let mut record = common::create_test_record("isbn-short");
    record.add_field(Field::builder("020", ' ', ' ').subfield('a', "12X").build());
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::IsbnBadFormat]);
    let finding = &record.validation_errors()[0];
    assert_eq!(finding.path, "020$a");
    assert_eq!(finding.message, "'12X': bad length: 3");
}

#[test]
fn test_issn_malformed() {
    let mut record = common::create_test_record("issn-format");
    record.add_field(Field::builder("022", ' ', ' ').subfield('a', "abc").build());
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::IssnBadFormat]);
    let finding = &record.validation_errors()[0];
    assert_eq!(finding.path, "022$a");
    assert_eq!(finding.message, "'abc': bad format");
}

#[test]
fn test_leader_position_format() {
    let mut record = Record::builder(Leader::new("0000Xnam a2200000 a 4500"))
        .control_field("001", "ldr")
        .build();
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::PositionBadFormat]);
    let finding = &record.validation_errors()[0];
    assert_eq!(finding.path, "leader00-04");
    assert_eq!(finding.message, "'0000X': bad format");
}

#[test]
fn test_obsolete_indicator() {
    let mut record = common::create_test_record("obsolete");
    record.add_field(Field::builder("070", '0', '1').subfield('a', "QK1").build());
    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(types(&record), vec![ValidationErrorType::IndicatorObsolete]);
    let finding = &record.validation_errors()[0];
    assert_eq!(finding.path, "070$ind2");
    assert_eq!(finding.message, "'1'");
}

#[test]
fn test_common_note_and_linking_fields() {
    let mut record = common::create_valid_record("notes");
    record.add_field(Field::builder("501", ' ', ' ').subfield('a', "With note").build());
    record.add_field(
        Field::builder("502", ' ', ' ')
            .subfield('b', "Dissertation")
            .subfield('c', "Universität Göttingen")
            .subfield('d', "1985")
            .build(),
    );
    record.add_field(Field::builder("653", ' ', '0').subfield('a', "Katzen").build());
    record.add_field(
        Field::builder("780", '0', '0')
            .subfield('t', "Vorgänger")
            .subfield('x', "0378-5955")
            .subfield('w', "(DE-101)123456789")
            .build(),
    );
    record.add_field(
        Field::builder("880", '1', '0')
            .subfield('6', "245-01")
            .subfield('a', "Титул")
            .build(),
    );
    assert!(validate(&mut record, Dialect::Marc21), "{:?}", record.validation_errors());
}

#[test]
fn test_dialect_extra_subfield() {
    let build = || {
        let mut record = common::create_test_record("kbr");
        record.add_field(
            Field::builder("336", ' ', ' ')
                .subfield('a', "text")
                .subfield('b', "txt")
                .subfield('2', "rdacontent")
                .subfield('@', "dut")
                .build(),
        );
        record
    };

    let mut kbr = build();
    assert!(validate(&mut kbr, Dialect::Kbr));

    let mut baseline = build();
    assert!(!validate(&mut baseline, Dialect::Marc21));
    assert_eq!(types(&baseline), vec![ValidationErrorType::SubfieldUndefined]);
    assert_eq!(baseline.validation_errors()[0].path, "336$@");
}

#[test]
fn test_local_field_of_dialect() {
    let build = || {
        let mut record = common::create_test_record("oclc");
        record.add_field(Field::builder("938", ' ', ' ').subfield('a', "Baker & Taylor").build());
        record
    };

    let mut oclc = build();
    assert!(validate(&mut oclc, Dialect::Oclc));

    let mut marc21 = build();
    assert!(!validate(&mut marc21, Dialect::Marc21));
    assert_eq!(types(&marc21), vec![ValidationErrorType::FieldUndefined]);
}

#[test]
fn test_ignorable_fields_do_not_affect_verdict() {
    let mut record = common::create_test_record("ignore");
    record.add_field(Field::builder("999", ' ', ' ').subfield('a', "local").build());
    let ignorable = IgnorableFields::parse("9XX").unwrap();

    assert!(record.validate(common::registry(), Dialect::Marc21, false, &ignorable));
    assert!(record.validation_errors().is_empty());
    assert_eq!(record.ignored_errors().len(), 1);
    assert_eq!(record.ignored_errors()[0].path, "999");

    record.add_field(Field::builder("245", '9', '0').subfield('a', "Titel").build());
    assert!(!record.validate(common::registry(), Dialect::Marc21, false, &ignorable));
    assert_eq!(types(&record), vec![ValidationErrorType::IndicatorInvalid]);
}

#[test]
fn test_summary_only_collapses_duplicates() {
    let mut record = common::create_test_record("summary");
    for _ in 0..3 {
        record.add_field(Field::builder("999", ' ', ' ').subfield('a', "local").build());
    }

    let params = ValidationParams::new().with_summary_only(true);
    assert!(!record.validate_with(common::registry(), &params));
    assert_eq!(types(&record), vec![ValidationErrorType::FieldUndefined]);
    assert_eq!(record.validation_errors()[0].occurrences, 3);

    assert!(!validate(&mut record, Dialect::Marc21));
    assert_eq!(record.validation_errors().len(), 3);
    assert!(record.validation_errors().iter().all(|e| e.occurrences == 1));
}

#[test]
fn test_validation_is_repeatable() {
    let mut record = common::create_three_record_batch().remove(1);
    validate(&mut record, Dialect::Marc21);
    let first = record.validation_errors().to_vec();
    validate(&mut record, Dialect::Marc21);
    assert_eq!(first, record.validation_errors());
}

#[test]
fn test_trimmed_record_id() {
    let mut record = common::create_test_record("  padded  ");
    record.add_field(Field::builder("999", ' ', ' ').build());

    validate(&mut record, Dialect::Marc21);
    assert_eq!(record.validation_errors()[0].record_id, "padded");

    let params = ValidationParams::new().with_trim_id(false);
    record.validate_with(common::registry(), &params);
    assert_eq!(record.validation_errors()[0].record_id, "  padded  ");
}
