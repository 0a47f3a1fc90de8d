//! The schema registry: the authoritative, dialect-aware description of MARC21.
//!
//! A [`SchemaRegistry`] maps tags to [`FieldDefinition`]s and
//! [`ControlFieldDefinition`]s, holds the leader positions and the named
//! [`CodeList`]s. It is built once, either from the embedded tables
//! ([`SchemaRegistry::builtin`], [`SchemaRegistry::shared`]) or programmatically through
//! [`RegistryBuilder`], and is immutable afterwards, so a `&SchemaRegistry` can be
//! shared freely across threads.
//!
//! # Dialect resolution
//!
//! [`SchemaRegistry::resolve`] merges the baseline subfields of a tag with the
//! subfields the requested dialect adds. Dialects that add nothing to a tag see the
//! baseline definition. Tags the registry doesn't know resolve to
//! [`FieldLookup::Undefined`]; lookups never fail.
//!
//! ```
//! use marcqa::{Dialect, SchemaRegistry};
//!
//! let registry = SchemaRegistry::shared().unwrap();
//! let baseline = registry.resolve("336", Dialect::Marc21).defined().unwrap();
//! assert!(baseline.subfield('7').is_none());
//!
//! let nkcr = registry.resolve("336", Dialect::Nkcr).defined().unwrap();
//! assert_eq!(nkcr.subfield('7').unwrap().label, "NKCR Authority ID");
//! ```

pub mod code_list;
pub mod definition;
mod tables;

pub use code_list::CodeList;
pub use definition::{
    to_camel_case, Cardinality, ControlFieldDefinition, FieldDefinition, IndicatorCheck,
    IndicatorDefinition, IndicatorRule, PositionDefinition, SubfieldDefinition,
};

use crate::dialect::Dialect;
use crate::error::{MarcError, Result};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tables::{CodeListTable, ControlTable, FieldTable};

/// A field definition as seen by one dialect.
///
/// Borrows the stored definition and the dialect's extra subfields; building one
/// never copies definitions.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedField<'a> {
    definition: &'a FieldDefinition,
    extras: &'a [SubfieldDefinition],
    dialect: Dialect,
}

impl<'a> ResolvedField<'a> {
    /// The underlying definition (baseline subfields only).
    #[must_use]
    pub fn definition(&self) -> &'a FieldDefinition {
        self.definition
    }

    /// The dialect this view was resolved for.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Field tag.
    #[must_use]
    pub fn tag(&self) -> &'a str {
        &self.definition.tag
    }

    /// Field cardinality within a record.
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.definition.cardinality
    }

    /// Indicator by position (1 or 2).
    #[must_use]
    pub fn indicator(&self, position: u8) -> Option<&'a IndicatorDefinition> {
        self.definition.indicator(position)
    }

    /// Subfield by code, looking at the baseline first and then the dialect extras.
    #[must_use]
    pub fn subfield(&self, code: char) -> Option<&'a SubfieldDefinition> {
        self.definition
            .subfield(code)
            .or_else(|| self.extras.iter().find(|s| s.code == code))
    }

    /// All merged subfields: baseline in documentation order, then dialect extras.
    pub fn subfields(&self) -> impl Iterator<Item = &'a SubfieldDefinition> + 'a {
        self.definition.subfields.iter().chain(self.extras.iter())
    }

    /// The merged subfield codes.
    #[must_use]
    pub fn codes(&self) -> Vec<char> {
        self.subfields().map(|s| s.code).collect()
    }
}

/// Result of resolving a tag.
#[derive(Debug, Clone, Copy)]
pub enum FieldLookup<'a> {
    /// The tag is defined for the dialect
    Defined(ResolvedField<'a>),
    /// The tag is unknown to the dialect
    Undefined,
}

impl<'a> FieldLookup<'a> {
    /// The resolved field, if defined.
    #[must_use]
    pub fn defined(self) -> Option<ResolvedField<'a>> {
        match self {
            FieldLookup::Defined(field) => Some(field),
            FieldLookup::Undefined => None,
        }
    }

    /// Whether the tag is defined.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        matches!(self, FieldLookup::Defined(_))
    }
}

/// Immutable, dialect-aware schema of MARC21 fields.
#[derive(Debug)]
pub struct SchemaRegistry {
    fields: BTreeMap<String, FieldDefinition>,
    local_fields: BTreeMap<Dialect, BTreeMap<String, FieldDefinition>>,
    control_fields: BTreeMap<String, ControlFieldDefinition>,
    leader: Vec<PositionDefinition>,
    code_lists: BTreeMap<String, CodeList>,
}

static SHARED: OnceLock<std::result::Result<SchemaRegistry, String>> = OnceLock::new();

impl SchemaRegistry {
    /// Start building a registry programmatically.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Build a fresh registry from the embedded MARC21 tables.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded tables break a registry invariant.
    pub fn builtin() -> Result<Self> {
        Self::from_json(tables::MARC21_FIELDS, tables::CONTROL_FIELDS, tables::CODE_LISTS)
    }

    /// The process-wide registry built from the embedded tables.
    ///
    /// Built on first use; concurrent first calls build it once.
    ///
    /// # Errors
    ///
    /// Returns the construction error (every call reports the same one).
    pub fn shared() -> Result<&'static SchemaRegistry> {
        SHARED
            .get_or_init(|| SchemaRegistry::builtin().map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|message| MarcError::InvalidSchema(message.clone()))
    }

    /// Build a registry from JSON tables in the layout of the embedded ones.
    ///
    /// # Errors
    ///
    /// [`MarcError::SerializationError`] for malformed JSON, [`MarcError::InvalidSchema`]
    /// or [`MarcError::DuplicateDefinition`] for tables that break registry invariants.
    pub fn from_json(fields: &str, control_fields: &str, code_lists: &str) -> Result<Self> {
        let mut builder = RegistryBuilder::default();
        for definition in FieldTable::from_json(fields)?.into_definitions()? {
            builder = builder.field(definition);
        }
        let (leader, controls) = ControlTable::from_json(control_fields)?.into_definitions()?;
        for position in leader {
            builder = builder.leader_position(position);
        }
        for control in controls {
            builder = builder.control_field(control);
        }
        for list in CodeListTable::from_json(code_lists)?.into_lists() {
            builder = builder.code_list(list);
        }
        builder.build()
    }

    /// Resolve a data field tag for a dialect.
    #[must_use]
    pub fn resolve(&self, tag: &str, dialect: Dialect) -> FieldLookup<'_> {
        if let Some(definition) = self.fields.get(tag) {
            return FieldLookup::Defined(ResolvedField {
                definition,
                extras: definition.dialect_subfields(dialect),
                dialect,
            });
        }
        self.local_fields
            .get(&dialect)
            .and_then(|local| local.get(tag))
            .map_or(FieldLookup::Undefined, |definition| {
                FieldLookup::Defined(ResolvedField {
                    definition,
                    extras: definition.dialect_subfields(dialect),
                    dialect,
                })
            })
    }

    /// Control field definition by tag (control fields are the same in every dialect).
    #[must_use]
    pub fn resolve_control(&self, tag: &str) -> Option<&ControlFieldDefinition> {
        self.control_fields.get(tag)
    }

    /// Leader positions in order.
    #[must_use]
    pub fn leader_positions(&self) -> &[PositionDefinition] {
        &self.leader
    }

    /// Code list by name.
    #[must_use]
    pub fn code_list(&self, name: &str) -> Option<&CodeList> {
        self.code_lists.get(name)
    }

    /// Every data field visible to a dialect, in tag order.
    pub fn fields(&self, dialect: Dialect) -> impl Iterator<Item = ResolvedField<'_>> + '_ {
        let mut definitions: Vec<&FieldDefinition> = self.fields.values().collect();
        if let Some(local) = self.local_fields.get(&dialect) {
            definitions.extend(local.values());
            definitions.sort_by(|a, b| a.tag.cmp(&b.tag));
        }
        definitions.into_iter().map(move |definition| ResolvedField {
            definition,
            extras: definition.dialect_subfields(dialect),
            dialect,
        })
    }

    /// Every control field, in tag order.
    pub fn control_fields(&self) -> impl Iterator<Item = &ControlFieldDefinition> {
        self.control_fields.values()
    }

    /// Names of all code lists.
    pub fn code_list_names(&self) -> impl Iterator<Item = &str> {
        self.code_lists.keys().map(String::as_str)
    }

    /// Number of data fields visible to a dialect.
    #[must_use]
    pub fn field_count(&self, dialect: Dialect) -> usize {
        self.fields.len() + self.local_fields.get(&dialect).map_or(0, BTreeMap::len)
    }
}

/// Programmatic construction of a [`SchemaRegistry`].
///
/// Invariants are checked in [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    fields: Vec<FieldDefinition>,
    control_fields: Vec<ControlFieldDefinition>,
    leader: Vec<PositionDefinition>,
    code_lists: Vec<CodeList>,
}

impl RegistryBuilder {
    /// Add a data field definition (baseline, or dialect-local via [`FieldDefinition::local_to`]).
    #[must_use]
    pub fn field(mut self, definition: FieldDefinition) -> Self {
        self.fields.push(definition);
        self
    }

    /// Add a control field definition.
    #[must_use]
    pub fn control_field(mut self, definition: ControlFieldDefinition) -> Self {
        self.control_fields.push(definition);
        self
    }

    /// Add a leader position.
    #[must_use]
    pub fn leader_position(mut self, position: PositionDefinition) -> Self {
        self.leader.push(position);
        self
    }

    /// Add a code list.
    #[must_use]
    pub fn code_list(mut self, list: CodeList) -> Self {
        self.code_lists.push(list);
        self
    }

    /// Check the invariants and freeze the registry.
    ///
    /// # Errors
    ///
    /// - [`MarcError::DuplicateDefinition`] when a tag is defined twice for one dialect
    ///   (a local field colliding with a baseline tag included), or a subfield code
    ///   repeats within one merged field
    /// - [`MarcError::InvalidSchema`] when a definition references a code list that
    ///   does not exist
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut code_lists = BTreeMap::new();
        for list in self.code_lists {
            if code_lists.contains_key(&list.name) {
                return Err(MarcError::InvalidSchema(format!(
                    "code list '{}' is defined twice",
                    list.name
                )));
            }
            code_lists.insert(list.name.clone(), list);
        }
        let check_list = |owner: &str, name: &Option<String>| -> Result<()> {
            match name {
                Some(name) if !code_lists.contains_key(name) => Err(MarcError::InvalidSchema(
                    format!("{owner} references unknown code list '{name}'"),
                )),
                _ => Ok(()),
            }
        };

        let mut fields = BTreeMap::new();
        let mut local: Vec<FieldDefinition> = Vec::new();
        for definition in self.fields {
            definition.check_unique_codes()?;
            for subfield in definition
                .subfields
                .iter()
                .chain(definition.dialect_subfields.values().flatten())
            {
                check_list(&format!("{}${}", definition.tag, subfield.code), &subfield.code_list)?;
            }
            if definition.dialect.is_some() {
                local.push(definition);
            } else if fields.contains_key(&definition.tag) {
                return Err(MarcError::DuplicateDefinition {
                    tag: definition.tag,
                    code: None,
                });
            } else {
                fields.insert(definition.tag.clone(), definition);
            }
        }

        let mut local_fields: BTreeMap<Dialect, BTreeMap<String, FieldDefinition>> = BTreeMap::new();
        for definition in local {
            let Some(dialect) = definition.dialect else {
                continue;
            };
            let by_tag = local_fields.entry(dialect).or_default();
            if fields.contains_key(&definition.tag) || by_tag.contains_key(&definition.tag) {
                return Err(MarcError::DuplicateDefinition {
                    tag: definition.tag,
                    code: None,
                });
            }
            by_tag.insert(definition.tag.clone(), definition);
        }

        let mut control_fields = BTreeMap::new();
        for definition in self.control_fields {
            for position in &definition.positions {
                check_list(&format!("{}/{}", definition.tag, position.id), &position.code_list)?;
            }
            if fields.contains_key(&definition.tag) || control_fields.contains_key(&definition.tag) {
                return Err(MarcError::DuplicateDefinition {
                    tag: definition.tag,
                    code: None,
                });
            }
            control_fields.insert(definition.tag.clone(), definition);
        }
        for position in &self.leader {
            check_list(&format!("leader{}", position.id), &position.code_list)?;
        }

        tracing::debug!(
            fields = fields.len(),
            local_fields = local_fields.values().map(BTreeMap::len).sum::<usize>(),
            control_fields = control_fields.len(),
            code_lists = code_lists.len(),
            "schema registry built"
        );

        Ok(SchemaRegistry {
            fields,
            local_fields,
            control_fields,
            leader: self.leader,
            code_lists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_field() -> FieldDefinition {
        FieldDefinition::new("500", "General Note", Cardinality::Repeatable)
            .with_subfield(SubfieldDefinition::new('a', "General note", Cardinality::Nonrepeatable))
            .with_dialect_subfields(
                Dialect::Kbr,
                vec![SubfieldDefinition::new('@', "Language of field", Cardinality::Nonrepeatable)],
            )
    }

    #[test]
    fn test_resolve_merges_dialect_subfields() {
        let registry = SchemaRegistry::builder().field(note_field()).build().unwrap();

        let baseline = registry.resolve("500", Dialect::Marc21).defined().unwrap();
        assert_eq!(baseline.codes(), vec!['a']);

        let kbr = registry.resolve("500", Dialect::Kbr).defined().unwrap();
        assert_eq!(kbr.codes(), vec!['a', '@']);
        assert!(kbr.subfield('@').is_some());

        let dnb = registry.resolve("500", Dialect::Dnb).defined().unwrap();
        assert_eq!(dnb.codes(), vec!['a']);
    }

    #[test]
    fn test_undefined_tag() {
        let registry = SchemaRegistry::builder().field(note_field()).build().unwrap();
        assert!(!registry.resolve("999", Dialect::Marc21).is_defined());
    }

    #[test]
    fn test_local_fields_only_visible_to_their_dialect() {
        let registry = SchemaRegistry::builder()
            .field(note_field())
            .field(FieldDefinition::new("938", "Vendor-Specific Ordering Data", Cardinality::Repeatable).local_to(Dialect::Oclc))
            .build()
            .unwrap();
        assert!(registry.resolve("938", Dialect::Oclc).is_defined());
        assert!(!registry.resolve("938", Dialect::Marc21).is_defined());
        assert_eq!(registry.field_count(Dialect::Oclc), 2);
        assert_eq!(registry.field_count(Dialect::Marc21), 1);
        let tags: Vec<&str> = registry.fields(Dialect::Oclc).map(|f| f.tag()).collect();
        assert_eq!(tags, vec!["500", "938"]);
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let result = SchemaRegistry::builder().field(note_field()).field(note_field()).build();
        assert!(matches!(
            result,
            Err(MarcError::DuplicateDefinition { ref tag, code: None }) if tag == "500"
        ));

        let result = SchemaRegistry::builder()
            .field(note_field())
            .field(FieldDefinition::new("500", "Local note", Cardinality::Repeatable).local_to(Dialect::Oclc))
            .build();
        assert!(matches!(result, Err(MarcError::DuplicateDefinition { .. })));
    }

    #[test]
    fn test_unknown_code_list_rejected() {
        let field = FieldDefinition::new("041", "Language Code", Cardinality::Repeatable).with_subfield(
            SubfieldDefinition::new('a', "Language code", Cardinality::Repeatable).with_code_list("language"),
        );
        let result = SchemaRegistry::builder().field(field.clone()).build();
        assert!(matches!(result, Err(MarcError::InvalidSchema(_))));

        let registry = SchemaRegistry::builder()
            .field(field)
            .code_list(CodeList::new("language", "Languages", &[("eng", "English")]))
            .build()
            .unwrap();
        assert!(registry.code_list("language").unwrap().contains("eng"));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert!(registry.resolve("245", Dialect::Marc21).is_defined());
        assert!(!registry.resolve("999", Dialect::Marc21).is_defined());
        assert!(registry.resolve_control("008").is_some());
        assert_eq!(registry.leader_positions().len(), 16);
        assert!(registry.code_list("relator").is_some());
    }

    #[test]
    fn test_shared_registry_is_one_instance() {
        let a = SchemaRegistry::shared().unwrap();
        let b = SchemaRegistry::shared().unwrap();
        assert!(std::ptr::eq(a, b));
    }
}
