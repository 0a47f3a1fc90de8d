//! Schema registry contract: dialect resolution, local fields and table loading.

mod common;

use marcqa::schema::{Cardinality, FieldDefinition, IndicatorCheck, SubfieldDefinition};
use marcqa::{Dialect, FieldLookup, MarcError, SchemaRegistry};

#[test]
fn test_541_subfields() {
    let registry = common::registry();
    let field = registry.resolve("541", Dialect::Marc21).defined().unwrap();

    let codes: Vec<char> = field.codes();
    assert_eq!(
        codes,
        vec!['a', 'b', 'c', 'd', 'e', 'f', 'h', 'n', 'o', '3', '5', '6', '8']
    );
    for code in ['a', 'b', 'c', 'd', 'e', 'f', 'h', '3', '5', '6'] {
        assert_eq!(field.subfield(code).unwrap().cardinality, Cardinality::Nonrepeatable, "${code}");
    }
    for code in ['n', 'o', '8'] {
        assert_eq!(field.subfield(code).unwrap().cardinality, Cardinality::Repeatable, "${code}");
    }
    assert_eq!(field.cardinality(), Cardinality::Repeatable);
    assert_eq!(field.definition().mq_tag, "ImmediateAcquisition");
}

#[test]
fn test_541_indicators() {
    let registry = common::registry();
    let field = registry.resolve("541", Dialect::Marc21).defined().unwrap();
    let privacy = field.indicator(1).unwrap();
    assert_eq!(privacy.check(' '), IndicatorCheck::Valid);
    assert_eq!(privacy.check('#'), IndicatorCheck::Valid);
    assert_eq!(privacy.check('1'), IndicatorCheck::Valid);
    assert_eq!(privacy.check('2'), IndicatorCheck::Invalid);
    assert_eq!(field.indicator(2).unwrap().check('x'), IndicatorCheck::NonEmpty);
}

#[test]
fn test_undefined_tag() {
    let registry = common::registry();
    assert!(matches!(registry.resolve("999", Dialect::Marc21), FieldLookup::Undefined));
    assert!(!registry.resolve("999", Dialect::Kbr).is_defined());
}

#[test]
fn test_bibliographic_tags_defined() {
    let registry = common::registry();
    let tags = [
        "013", "017", "028", "033", "034", "037", "042", "046", "083", "088", "210", "222", "242",
        "243", "247", "255", "263", "310", "340", "344", "347", "362", "380", "382", "388", "501",
        "502", "506", "510", "521", "530", "533", "538", "540", "545", "561", "583", "588", "611",
        "630", "648", "653", "655", "720", "730", "751", "758", "760", "762", "765", "767", "770",
        "772", "774", "775", "777", "780", "785", "787", "810", "811", "850", "852", "866", "876",
        "880", "881", "883", "886", "887",
    ];
    for tag in tags {
        assert!(registry.resolve(tag, Dialect::Marc21).is_defined(), "{tag}");
    }
    for tag in ["900", "949", "990", "999"] {
        assert!(!registry.resolve(tag, Dialect::Marc21).is_defined(), "{tag}");
    }
}

#[test]
fn test_linking_entry_layout() {
    let registry = common::registry();
    let preceding = registry.resolve("780", Dialect::Marc21).defined().unwrap();
    assert_eq!(preceding.indicator(1).unwrap().check('0'), IndicatorCheck::Valid);
    assert_eq!(preceding.indicator(2).unwrap().check('7'), IndicatorCheck::Valid);
    assert_eq!(preceding.indicator(2).unwrap().check('8'), IndicatorCheck::Invalid);
    assert!(preceding.subfield('w').unwrap().parser.is_some());
    assert!(preceding.subfield('x').unwrap().validator.is_some());
    assert_eq!(preceding.subfield('t').unwrap().cardinality, Cardinality::Nonrepeatable);

    let alternate = registry.resolve("880", Dialect::Marc21).defined().unwrap();
    assert_eq!(alternate.indicator(1).unwrap().check('7'), IndicatorCheck::Valid);
    assert!(alternate.subfield('6').unwrap().parser.is_some());
    assert_eq!(alternate.subfield('a').unwrap().cardinality, Cardinality::Repeatable);
}

#[test]
fn test_dialect_extras_merge_with_baseline() {
    let registry = common::registry();
    let baseline = registry.resolve("336", Dialect::Marc21).defined().unwrap();
    let kbr = registry.resolve("336", Dialect::Kbr).defined().unwrap();
    let nkcr = registry.resolve("336", Dialect::Nkcr).defined().unwrap();

    assert!(baseline.subfield('@').is_none());
    assert!(kbr.subfield('@').is_some());
    assert!(nkcr.subfield('7').is_some());
    assert!(nkcr.subfield('@').is_none());

    // extensions only add codes
    for code in baseline.codes() {
        assert!(kbr.subfield(code).is_some());
        assert!(nkcr.subfield(code).is_some());
    }
    assert!(kbr.codes().len() > baseline.codes().len());
}

#[test]
fn test_dialect_without_extras_falls_back_to_baseline() {
    let registry = common::registry();
    let baseline = registry.resolve("336", Dialect::Marc21).defined().unwrap();
    let dnb = registry.resolve("336", Dialect::Dnb).defined().unwrap();
    assert_eq!(baseline.codes(), dnb.codes());
}

#[test]
fn test_local_fields_visible_only_to_their_dialect() {
    let registry = common::registry();
    assert!(!registry.resolve("938", Dialect::Marc21).is_defined());
    assert!(registry.resolve("938", Dialect::Oclc).is_defined());
    assert!(registry.resolve("029", Dialect::Oclc).is_defined());
    assert_eq!(
        registry.field_count(Dialect::Oclc),
        registry.field_count(Dialect::Marc21) + 2
    );
    let tags: Vec<String> = registry
        .fields(Dialect::Oclc)
        .map(|f| f.tag().to_string())
        .collect();
    let mut sorted = tags.clone();
    sorted.sort();
    assert_eq!(tags, sorted);
}

#[test]
fn test_control_fields_and_leader() {
    let registry = common::registry();
    assert_eq!(registry.leader_positions().len(), 16);
    let fixed = registry.resolve_control("008").unwrap();
    assert_eq!(fixed.length, Some(40));
    assert!(!fixed.is_simple());
    assert!(registry.resolve_control("001").unwrap().is_simple());
    assert!(registry.resolve_control("009").is_none());
}

#[test]
fn test_code_lists() {
    let registry = common::registry();
    let relator = registry.code_list("relator").unwrap();
    assert!(relator.contains("aut"));
    assert!(!relator.contains("xyz"));
    assert!(registry.code_list("language").unwrap().contains("ger"));
    assert!(registry.code_list_names().any(|name| name == "subjectSource"));
}

#[test]
fn test_shared_registry_is_built_once() {
    let first = SchemaRegistry::shared().unwrap();
    let second = SchemaRegistry::shared().unwrap();
    assert!(std::ptr::eq(first, second));
}

#[test]
fn test_shared_registry_concurrent_first_use() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| SchemaRegistry::shared().unwrap() as *const SchemaRegistry as usize))
        .collect();
    let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_duplicate_subfield_code_rejected() {
    let result = SchemaRegistry::builder()
        .field(
            FieldDefinition::new("500", "General Note", Cardinality::Repeatable)
                .with_subfield(SubfieldDefinition::new('a', "General note", Cardinality::Nonrepeatable))
                .with_subfield(SubfieldDefinition::new('a', "Again", Cardinality::Nonrepeatable)),
        )
        .build();
    assert!(matches!(
        result,
        Err(MarcError::DuplicateDefinition { code: Some('a'), .. })
    ));
}

#[test]
fn test_dialect_extra_colliding_with_baseline_rejected() {
    let result = SchemaRegistry::builder()
        .field(
            FieldDefinition::new("500", "General Note", Cardinality::Repeatable)
                .with_subfield(SubfieldDefinition::new('a', "General note", Cardinality::Nonrepeatable))
                .with_dialect_subfields(
                    Dialect::Kbr,
                    vec![SubfieldDefinition::new('a', "Shadow", Cardinality::Repeatable)],
                ),
        )
        .build();
    assert!(matches!(result, Err(MarcError::DuplicateDefinition { .. })));
}

#[test]
fn test_local_field_colliding_with_baseline_rejected() {
    let result = SchemaRegistry::builder()
        .field(FieldDefinition::new("500", "General Note", Cardinality::Repeatable))
        .field(FieldDefinition::new("500", "Local note", Cardinality::Repeatable).local_to(Dialect::Oclc))
        .build();
    assert!(matches!(
        result,
        Err(MarcError::DuplicateDefinition { code: None, .. })
    ));
}

#[test]
fn test_unknown_code_list_rejected() {
    let result = SchemaRegistry::builder()
        .field(
            FieldDefinition::new("100", "Main Entry", Cardinality::Nonrepeatable).with_subfield(
                SubfieldDefinition::new('4', "Relationship", Cardinality::Repeatable).with_code_list("nowhere"),
            ),
        )
        .build();
    assert!(matches!(result, Err(MarcError::InvalidSchema(_))));
}

#[test]
fn test_from_json_tables() {
    let fields = r#"{"fields": [
        {"tag": "500", "label": "General Note", "cardinality": "R",
         "subfields": [["a", "General note", "NR"], ["6", "Linkage", "NR"]]}
    ]}"#;
    let control = r#"{"leader": [], "fields": []}"#;
    let lists = r#"{"lists": {}}"#;
    let registry = SchemaRegistry::from_json(fields, control, lists).unwrap();
    let note = registry.resolve("500", Dialect::Marc21).defined().unwrap();
    assert_eq!(note.codes(), vec!['a', '6']);
    assert!(note.subfield('6').unwrap().parser.is_some());

    let bad = r#"{"fields": [{"tag": "5000", "label": "x", "cardinality": "R"}]}"#;
    assert!(SchemaRegistry::from_json(bad, control, lists).is_err());
    assert!(matches!(
        SchemaRegistry::from_json("{", control, lists),
        Err(MarcError::SerializationError(_))
    ));
}
