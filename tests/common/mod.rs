//! Common test helpers and utilities shared across test suite.

use marcqa::{Field, Leader, Record, SchemaRegistry};

/// The shared registry built from the embedded tables.
pub fn registry() -> &'static SchemaRegistry {
    SchemaRegistry::shared().expect("embedded tables build a registry")
}

/// A valid 24-character leader for a language material monograph.
pub fn create_test_leader() -> Leader {
    Leader::new("00000nam a2200000 a 4500")
}

/// A record with a leader and an 001 only.
pub fn create_test_record(id: &str) -> Record {
    Record::builder(create_test_leader())
        .control_field("001", id)
        .build()
}

/// A record that conforms to the MARC21 baseline.
#[allow(dead_code)]
pub fn create_valid_record(id: &str) -> Record {
    Record::builder(create_test_leader())
        .control_field("001", id)
        .control_field("003", "DE-101")
        .control_field("008", "850101s1985    gw            000 0 ger d")
        .field(Field::builder("020", ' ', ' ').subfield('a', "978-3-16-148410-0").build())
        .field(Field::builder("041", '0', ' ').subfield('a', "ger").subfield('h', "eng").build())
        .field(
            Field::builder("100", '1', ' ')
                .subfield('a', "Mustermann, Max")
                .subfield('4', "aut")
                .build(),
        )
        .field(
            Field::builder("245", '1', '0')
                .subfield('a', "Ein Titel")
                .subfield('c', "Max Mustermann")
                .build(),
        )
        .field(
            Field::builder("650", ' ', '7')
                .subfield('a', "Katzen")
                .subfield('2', "gnd")
                .build(),
        )
        .build()
}

/// A record with one 541 carrying the given number of `$a` subfields.
#[allow(dead_code)]
pub fn create_acquisition_record(id: &str, sources: usize) -> Record {
    let mut field = Field::new("541", ' ', ' ');
    for i in 0..sources {
        field.add_subfield('a', format!("Source {i}"));
    }
    let mut record = create_test_record(id);
    record.add_field(field);
    record
}

/// The three-record batch: A has one 541$a, B repeats 541$a, C carries an undefined 999.
#[allow(dead_code)]
pub fn create_three_record_batch() -> Vec<Record> {
    let mut c = create_test_record("C");
    c.add_field(Field::builder("999", ' ', ' ').subfield('a', "local").build());
    vec![
        create_acquisition_record("A", 1),
        create_acquisition_record("B", 2),
        c,
    ]
}
