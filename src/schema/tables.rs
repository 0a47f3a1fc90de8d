//! Serde shapes of the declarative schema tables and their conversion into definitions.
//!
//! The built-in tables live under `src/schema/data/` and are embedded at compile time.
//! Subfields can be written in a short form, `["a", "Source of acquisition", "NR"]`,
//! or as an object when they carry a parser, validator, code list or FRBR functions.

use super::code_list::CodeList;
use super::definition::{
    Cardinality, ControlFieldDefinition, FieldDefinition, IndicatorDefinition, IndicatorRule,
    PositionDefinition, SubfieldDefinition,
};
use crate::content::{ParserKind, ValidatorKind};
use crate::dialect::Dialect;
use crate::error::{MarcError, Result};
use crate::frbr::FrbrFunction;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;

pub(crate) const MARC21_FIELDS: &str = include_str!("data/marc21_fields.json");
pub(crate) const CONTROL_FIELDS: &str = include_str!("data/control_fields.json");
pub(crate) const CODE_LISTS: &str = include_str!("data/code_lists.json");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FieldTable {
    fields: Vec<FieldEntry>,
    #[serde(default)]
    local: BTreeMap<String, Vec<FieldEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldEntry {
    tag: String,
    label: String,
    #[serde(default)]
    mq_tag: Option<String>,
    cardinality: Cardinality,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    levels: Option<String>,
    #[serde(default)]
    ind1: Option<IndicatorEntry>,
    #[serde(default)]
    ind2: Option<IndicatorEntry>,
    #[serde(default)]
    subfields: Vec<SubfieldEntry>,
    #[serde(default)]
    dialects: BTreeMap<String, Vec<SubfieldEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct IndicatorEntry {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    mq_tag: Option<String>,
    #[serde(default)]
    codes: Vec<(String, String)>,
    #[serde(default)]
    range: Option<(u8, u8)>,
    #[serde(default)]
    any: bool,
    #[serde(default)]
    historical: Vec<(String, String)>,
    #[serde(default)]
    functions: Vec<FrbrFunction>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubfieldEntry {
    Short(String, String, Cardinality),
    Full(SubfieldSpec),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SubfieldSpec {
    code: String,
    label: String,
    cardinality: Cardinality,
    #[serde(default)]
    mq_tag: Option<String>,
    #[serde(default)]
    parser: Option<ParserKind>,
    #[serde(default)]
    validator: Option<ValidatorKind>,
    #[serde(default)]
    code_list: Option<String>,
    #[serde(default)]
    functions: Vec<FrbrFunction>,
    #[serde(default)]
    levels: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ControlTable {
    #[serde(default)]
    leader: Vec<PositionEntry>,
    #[serde(default)]
    fields: Vec<ControlFieldEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ControlFieldEntry {
    tag: String,
    label: String,
    #[serde(default)]
    mq_tag: Option<String>,
    cardinality: Cardinality,
    #[serde(default)]
    length: Option<usize>,
    #[serde(default)]
    positions: Vec<PositionEntry>,
    #[serde(default)]
    functions: Vec<FrbrFunction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PositionEntry {
    start: usize,
    end: usize,
    label: String,
    #[serde(default)]
    mq_tag: Option<String>,
    #[serde(default)]
    codes: Vec<(String, String)>,
    #[serde(default)]
    code_list: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    functions: Vec<FrbrFunction>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CodeListTable {
    lists: IndexMap<String, CodeList>,
}

/// Indicator codes are single characters; `#` is the documentation spelling of blank.
fn indicator_char(code: &str, tag: &str) -> Result<char> {
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some('#'), None) => Ok(' '),
        (Some(c), None) => Ok(c),
        _ => Err(MarcError::InvalidSchema(format!(
            "{tag}: indicator code '{code}' is not a single character"
        ))),
    }
}

fn subfield_code(code: &str, tag: &str) -> Result<char> {
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(MarcError::InvalidSchema(format!(
            "{tag}: subfield code '{code}' is not a single character"
        ))),
    }
}

fn parse_dialect(key: &str) -> Result<Dialect> {
    key.parse()
        .map_err(|_| MarcError::InvalidSchema(format!("unknown dialect '{key}'")))
}

fn indicator_codes(codes: &[(String, String)], tag: &str) -> Result<Vec<(char, String)>> {
    codes
        .iter()
        .map(|(code, meaning)| Ok((indicator_char(code, tag)?, meaning.clone())))
        .collect()
}

impl IndicatorEntry {
    fn into_definition(self, tag: &str) -> Result<IndicatorDefinition> {
        let rule = if self.any {
            IndicatorRule::Any
        } else if let Some((min, max)) = self.range {
            if min > max || max > 9 {
                return Err(MarcError::InvalidSchema(format!(
                    "{tag}: indicator range {min}-{max} is not within 0-9"
                )));
            }
            IndicatorRule::Range { min, max }
        } else if !self.codes.is_empty() {
            IndicatorRule::Codes(indicator_codes(&self.codes, tag)?)
        } else {
            IndicatorRule::Undefined
        };
        let mut indicator = IndicatorDefinition {
            label: None,
            mq_tag: self.mq_tag,
            rule,
            historical_codes: indicator_codes(&self.historical, tag)?,
            functions: self.functions,
        };
        if let Some(label) = self.label {
            indicator = indicator.with_label(label);
        }
        Ok(indicator)
    }
}

impl SubfieldEntry {
    fn into_definition(self, tag: &str) -> Result<SubfieldDefinition> {
        let spec = match self {
            SubfieldEntry::Short(code, label, cardinality) => SubfieldSpec {
                code,
                label,
                cardinality,
                mq_tag: None,
                parser: None,
                validator: None,
                code_list: None,
                functions: Vec::new(),
                levels: None,
            },
            SubfieldEntry::Full(spec) => spec,
        };
        let code = subfield_code(&spec.code, tag)?;
        let mut subfield = SubfieldDefinition::new(code, spec.label, spec.cardinality)
            .with_functions(&spec.functions);
        subfield.parser = spec.parser;
        subfield.validator = spec.validator;
        subfield.code_list = spec.code_list;
        subfield.levels = spec.levels;
        if let Some(mq_tag) = spec.mq_tag {
            subfield = subfield.with_mq_tag(mq_tag);
        }
        // $6 always carries the linkage layout
        if code == '6' && subfield.parser.is_none() && subfield.label == "Linkage" {
            subfield.parser = Some(ParserKind::Linkage);
        }
        Ok(subfield)
    }
}

impl FieldEntry {
    fn into_definition(self, dialect: Option<Dialect>) -> Result<FieldDefinition> {
        let tag = self.tag;
        if tag.len() != 3 || !tag.is_ascii() {
            return Err(MarcError::InvalidSchema(format!(
                "'{tag}' is not a three character tag"
            )));
        }
        let mut field = FieldDefinition::new(tag.clone(), self.label, self.cardinality);
        if let Some(mq_tag) = self.mq_tag {
            field = field.with_mq_tag(mq_tag);
        }
        field.url = self.url;
        field.levels = self.levels;
        field.dialect = dialect;
        field.ind1 = self.ind1.unwrap_or_default().into_definition(&tag)?;
        field.ind2 = self.ind2.unwrap_or_default().into_definition(&tag)?;
        for entry in self.subfields {
            field.subfields.push(entry.into_definition(&tag)?);
        }
        for (key, entries) in self.dialects {
            let dialect = parse_dialect(&key)?;
            let extras = entries
                .into_iter()
                .map(|e| e.into_definition(&tag))
                .collect::<Result<Vec<_>>>()?;
            field = field.with_dialect_subfields(dialect, extras);
        }
        Ok(field)
    }
}

impl PositionEntry {
    fn into_definition(self, owner: &str) -> Result<PositionDefinition> {
        if self.end <= self.start {
            return Err(MarcError::InvalidSchema(format!(
                "{owner}: position '{}' has an empty range {}..{}",
                self.label, self.start, self.end
            )));
        }
        let mut position = PositionDefinition::new(self.start, self.end, self.label);
        position.codes = self.codes;
        position.code_list = self.code_list;
        position.functions = self.functions;
        if let Some(mq_tag) = self.mq_tag {
            position = position.with_mq_tag(mq_tag);
        }
        if let Some(pattern) = self.pattern {
            position = position.with_pattern(&pattern)?;
        }
        Ok(position)
    }
}

impl FieldTable {
    pub(crate) fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Baseline definitions followed by dialect-local ones.
    pub(crate) fn into_definitions(self) -> Result<Vec<FieldDefinition>> {
        let mut definitions = self
            .fields
            .into_iter()
            .map(|entry| entry.into_definition(None))
            .collect::<Result<Vec<_>>>()?;
        for (key, entries) in self.local {
            let dialect = parse_dialect(&key)?;
            for entry in entries {
                definitions.push(entry.into_definition(Some(dialect))?);
            }
        }
        Ok(definitions)
    }
}

impl ControlTable {
    pub(crate) fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn into_definitions(
        self,
    ) -> Result<(Vec<PositionDefinition>, Vec<ControlFieldDefinition>)> {
        let leader = self
            .leader
            .into_iter()
            .map(|p| p.into_definition("leader"))
            .collect::<Result<Vec<_>>>()?;
        let mut fields = Vec::with_capacity(self.fields.len());
        for entry in self.fields {
            let mut field = ControlFieldDefinition::new(entry.tag, entry.label, entry.cardinality)
                .with_functions(&entry.functions);
            if let Some(mq_tag) = entry.mq_tag {
                field.mq_tag = mq_tag;
            }
            field.length = entry.length;
            for position in entry.positions {
                if let Some(length) = field.length {
                    if position.end > length {
                        return Err(MarcError::InvalidSchema(format!(
                            "{}: position '{}' ends past the field length {length}",
                            field.tag, position.label
                        )));
                    }
                }
                field.positions.push(position.into_definition(&field.tag)?);
            }
            fields.push(field);
        }
        Ok((leader, fields))
    }
}

impl CodeListTable {
    pub(crate) fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn into_lists(self) -> Vec<CodeList> {
        self.lists
            .into_iter()
            .map(|(name, mut list)| {
                list.name = name;
                list
            })
            .collect()
    }
}
