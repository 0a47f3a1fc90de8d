//! Flattened `key -> values` view of a record for indexing.
//!
//! Keys are built from MARC addresses, from the registry's machine keys (`mq_tag`),
//! or from both, depending on the [`KeyProfile`]:
//!
//! | element        | `Marc`      | `Human`                         | `Mixed`                              |
//! |----------------|-------------|---------------------------------|--------------------------------------|
//! | 541 $a         | `541a`      | `ImmediateAcquisition_source`   | `541a_ImmediateAcquisition_source`   |
//! | 541 ind1       | `541ind1`   | `ImmediateAcquisition_privacy`  | `541ind1_ImmediateAcquisition_privacy` |
//! | leader/06      | `leader06`  | `Leader_typeOfRecord`           | `leader06_Leader_typeOfRecord`       |
//!
//! Elements the registry does not know always get their MARC key.

use crate::content::position::char_range;
use crate::dialect::Dialect;
use crate::record::Record;
use crate::schema::{PositionDefinition, SchemaRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How keys are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyProfile {
    /// Tag and code (`541a`)
    #[default]
    Marc,
    /// Machine keys from the registry (`ImmediateAcquisition_source`)
    Human,
    /// Both, MARC first (`541a_ImmediateAcquisition_source`)
    Mixed,
}

impl KeyProfile {
    fn key(self, marc: &str, human: Option<&str>) -> String {
        match (self, human) {
            (KeyProfile::Marc, _) | (_, None) => marc.to_string(),
            (KeyProfile::Human, Some(human)) => human.to_string(),
            (KeyProfile::Mixed, Some(human)) => format!("{marc}_{human}"),
        }
    }
}

const LEADER_KEY: &str = "Leader";

type Pairs = IndexMap<String, Vec<String>>;

fn push(pairs: &mut Pairs, key: String, value: &str) {
    pairs.entry(key).or_default().push(value.to_string());
}

fn push_positions(
    pairs: &mut Pairs,
    profile: KeyProfile,
    positions: &[PositionDefinition],
    value: &str,
    marc_prefix: &str,
    human_prefix: &str,
) {
    for position in positions {
        if let Some(slice) = char_range(value, position.start, position.end) {
            let marc = format!("{marc_prefix}{}", position.id);
            let human = format!("{human_prefix}_{}", position.mq_tag);
            push(pairs, profile.key(&marc, Some(&human)), slice);
        }
    }
}

/// Flatten `record` into ordered key/value pairs.
///
/// The leader comes first, then control fields and data fields in document order.
/// Repeated elements append to the same key. With `resolve_control_subfields`
/// every declared position of the leader and of control fields gets its own key
/// next to the whole value.
///
/// ```
/// use marcqa::key_value::{key_value_pairs, KeyProfile};
/// use marcqa::{Dialect, Field, Leader, Record, SchemaRegistry};
///
/// let registry = SchemaRegistry::shared()?;
/// let record = Record::builder(Leader::default())
///     .field(Field::builder("541", ' ', ' ').subfield('a', "Gift").build())
///     .build();
/// let pairs = key_value_pairs(&record, registry, KeyProfile::Mixed, false, Dialect::Marc21);
/// assert_eq!(pairs["541a_ImmediateAcquisition_source"], vec!["Gift"]);
/// # Ok::<(), marcqa::MarcError>(())
/// ```
#[must_use]
pub fn key_value_pairs(
    record: &Record,
    registry: &SchemaRegistry,
    profile: KeyProfile,
    resolve_control_subfields: bool,
    dialect: Dialect,
) -> Pairs {
    let mut pairs = Pairs::new();

    let leader = record.leader.as_str();
    push(&mut pairs, profile.key("leader", Some(LEADER_KEY)), leader);
    if resolve_control_subfields {
        push_positions(&mut pairs, profile, registry.leader_positions(), leader, "leader", LEADER_KEY);
    }

    for control in record.control_fields_iter() {
        let Some(definition) = registry.resolve_control(&control.tag) else {
            push(&mut pairs, control.tag.clone(), &control.value);
            continue;
        };
        push(
            &mut pairs,
            profile.key(&control.tag, Some(&definition.mq_tag)),
            &control.value,
        );
        if resolve_control_subfields {
            let marc_prefix = format!("{}_", control.tag);
            push_positions(
                &mut pairs,
                profile,
                &definition.positions,
                &control.value,
                &marc_prefix,
                &definition.mq_tag,
            );
        }
    }

    for field in record.fields() {
        let resolved = registry.resolve(&field.tag, dialect).defined();
        let field_key = resolved.as_ref().map(|r| r.definition().mq_tag.as_str());

        if let Some(resolved) = &resolved {
            for (n, value) in [(1u8, field.indicator1), (2u8, field.indicator2)] {
                let Some(indicator) = resolved.indicator(n).filter(|i| i.is_defined()) else {
                    continue;
                };
                let marc = format!("{}ind{n}", field.tag);
                let element = indicator.mq_tag.clone().unwrap_or_else(|| format!("ind{n}"));
                let human = field_key.map(|f| format!("{f}_{element}"));
                push(&mut pairs, profile.key(&marc, human.as_deref()), &value.to_string());
            }
        }

        for subfield in field.subfields() {
            let marc = format!("{}{}", field.tag, subfield.code);
            let human = resolved
                .as_ref()
                .and_then(|r| r.subfield(subfield.code))
                .zip(field_key)
                .map(|(definition, f)| format!("{f}_{}", definition.mq_tag));
            push(&mut pairs, profile.key(&marc, human.as_deref()), &subfield.value);
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::Leader;
    use crate::record::Field;

    fn record() -> Record {
        Record::builder(Leader::default())
            .control_field("001", "rec-1")
            .control_field("008", "850101s1985    gw            000 0 ger d")
            .field(Field::builder("541", '1', ' ').subfield('a', "Gift").subfield('x', "odd").build())
            .field(Field::builder("541", ' ', ' ').subfield('a', "Purchase").build())
            .field(Field::builder("999", ' ', ' ').subfield('a', "local").build())
            .build()
    }

    #[test]
    fn test_marc_profile() {
        let registry = SchemaRegistry::shared().unwrap();
        let pairs = key_value_pairs(&record(), registry, KeyProfile::Marc, false, Dialect::Marc21);
        let keys: Vec<&str> = pairs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["leader", "001", "008", "541ind1", "541a", "541x", "999a"]);
        assert_eq!(pairs["541a"], vec!["Gift", "Purchase"]);
        assert_eq!(pairs["541ind1"], vec!["1", " "]);
    }

    #[test]
    fn test_human_and_mixed_profiles() {
        let registry = SchemaRegistry::shared().unwrap();
        let human = key_value_pairs(&record(), registry, KeyProfile::Human, false, Dialect::Marc21);
        assert_eq!(human["ImmediateAcquisition_source"], vec!["Gift", "Purchase"]);
        assert_eq!(human["ImmediateAcquisition_privacy"], vec!["1", " "]);
        // unknown elements keep MARC keys
        assert_eq!(human["541x"], vec!["odd"]);
        assert_eq!(human["999a"], vec!["local"]);

        let mixed = key_value_pairs(&record(), registry, KeyProfile::Mixed, false, Dialect::Marc21);
        assert_eq!(mixed["541a_ImmediateAcquisition_source"], vec!["Gift", "Purchase"]);
        assert_eq!(mixed["leader_Leader"], vec![Leader::default().to_string()]);
    }

    #[test]
    fn test_resolve_control_subfields() {
        let registry = SchemaRegistry::shared().unwrap();
        let pairs = key_value_pairs(&record(), registry, KeyProfile::Mixed, true, Dialect::Marc21);
        assert_eq!(pairs["leader06_Leader_typeOfRecord"], vec!["a"]);
        let language = pairs
            .iter()
            .find(|(key, _)| key.starts_with("008_35-37_"))
            .map(|(_, values)| values.clone());
        assert_eq!(language, Some(vec!["ger".to_string()]));

        let marc = key_value_pairs(&record(), registry, KeyProfile::Marc, true, Dialect::Marc21);
        assert_eq!(marc["leader07"], vec!["m"]);
        assert_eq!(marc["008_06"], vec!["s"]);
    }
}
