//! Field catalog and recursive-descent validation
//!
//! A zettel is a YAML mapping whose keys come from a fixed catalog. Each
//! field belongs to one [`Category`] which decides the shape its value must
//! have:
//!
//! - text fields hold a single string
//! - list fields hold a sequence of strings
//! - `cite` and `dates` hold small mappings with one required and one
//!   optional sub-field
//!
//! [`parse_mapping`] walks a decoded mapping against the catalog and returns
//! typed [`FieldValue`]s; [`validate`] is the same walk with the values
//! thrown away.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;
use crate::value::{Citation, Dates, FieldValue};

/// A zettel field name.
///
/// Variants are declared in canonical order, so the derived `Ord` is the
/// order used for validation and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Title of the note
    Title,
    /// Bibliography key of the work the note is about
    Bibkey,
    /// Raw BibTeX entry
    Bibtex,
    /// Raw RIS entry
    Ris,
    /// Inline citation text
    Inline,
    /// Source URL
    Url,
    /// Summary
    Summary,
    /// Comment
    Comment,
    /// Free-form note
    Note,
    /// Tags
    Tags,
    /// Mentioned people or things
    Mentions,
    /// Structured citation
    Cite,
    /// Structured dates
    Dates,
    /// File the zettel is stored in
    Filename,
    /// Markdown body
    Document,
}

/// Shape of a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A single string
    Text,
    /// A list of strings
    TextList,
    /// `{bibkey, page?}`
    Citation,
    /// `{year, era?}`
    Dates,
}

impl Category {
    /// Human-readable description of the expected value
    pub fn expected(self) -> &'static str {
        match self {
            Category::Text => "a string",
            Category::TextList => "a list of strings",
            Category::Citation => "a nested (citation) mapping",
            Category::Dates => "a nested (dates) mapping",
        }
    }
}

impl Field {
    /// Every field, in canonical order
    pub const ALL: [Field; 15] = [
        Field::Title,
        Field::Bibkey,
        Field::Bibtex,
        Field::Ris,
        Field::Inline,
        Field::Url,
        Field::Summary,
        Field::Comment,
        Field::Note,
        Field::Tags,
        Field::Mentions,
        Field::Cite,
        Field::Dates,
        Field::Filename,
        Field::Document,
    ];

    /// Key used for this field in YAML
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Bibkey => "bibkey",
            Field::Bibtex => "bibtex",
            Field::Ris => "ris",
            Field::Inline => "inline",
            Field::Url => "url",
            Field::Summary => "summary",
            Field::Comment => "comment",
            Field::Note => "note",
            Field::Tags => "tags",
            Field::Mentions => "mentions",
            Field::Cite => "cite",
            Field::Dates => "dates",
            Field::Filename => "filename",
            Field::Document => "document",
        }
    }

    /// Shape this field's value must have
    pub fn category(self) -> Category {
        match self {
            Field::Tags | Field::Mentions => Category::TextList,
            Field::Cite => Category::Citation,
            Field::Dates => Category::Dates,
            _ => Category::Text,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| SchemaError::UnknownField {
                field: s.to_string(),
            })
    }
}

/// Sub-schema of a structured field
#[derive(Debug, Clone, Copy)]
pub struct SubSchema {
    /// Category of the field carrying this sub-schema
    pub category: Category,
    /// Label used in error messages
    pub label: &'static str,
    /// Sub-field that must be present
    pub required: &'static str,
    /// Sub-field that may be present
    pub optional: &'static str,
}

/// Sub-schema of `cite`
pub const CITATION: SubSchema = SubSchema {
    category: Category::Citation,
    label: "Citation",
    required: "bibkey",
    optional: "page",
};

/// Sub-schema of `dates`
pub const DATES: SubSchema = SubSchema {
    category: Category::Dates,
    label: "Dates",
    required: "year",
    optional: "era",
};

/// Typed fields of a zettel, keyed (and therefore ordered) by [`Field`]
pub type Fields = BTreeMap<Field, FieldValue>;

/// Check a decoded document against the schema without keeping the result.
pub fn validate(doc: &Value) -> Result<(), SchemaError> {
    parse(doc).map(|_| ())
}

/// Check a decoded mapping against the schema without keeping the result.
pub fn validate_mapping(mapping: &Mapping) -> Result<(), SchemaError> {
    parse_mapping(mapping).map(|_| ())
}

/// Parse a decoded document into typed fields.
pub fn parse(doc: &Value) -> Result<Fields, SchemaError> {
    match doc {
        Value::Mapping(mapping) => parse_mapping(mapping),
        other => Err(SchemaError::NotAMapping {
            found: type_name(other).to_string(),
        }),
    }
}

/// Parse a decoded mapping into typed fields.
///
/// Unknown keys are rejected before any value is looked at. Values are then
/// checked text fields first, then lists, then structured fields.
pub fn parse_mapping(mapping: &Mapping) -> Result<Fields, SchemaError> {
    let mut present = BTreeMap::new();
    for (key, value) in mapping {
        let field = key
            .as_str()
            .and_then(|name| name.parse::<Field>().ok())
            .ok_or_else(|| SchemaError::UnknownField {
                field: render(key),
            })?;
        present.insert(field, value);
    }

    let mut fields = Fields::new();
    for category in [
        Category::Text,
        Category::TextList,
        Category::Citation,
        Category::Dates,
    ] {
        for (&field, &value) in present.iter().filter(|(f, _)| f.category() == category) {
            fields.insert(field, parse_value(field, value)?);
        }
    }
    Ok(fields)
}

/// Parse the raw value of a single field.
pub fn parse_value(field: Field, value: &Value) -> Result<FieldValue, SchemaError> {
    let name = field.name();
    match field.category() {
        Category::Text => parse_text(name, value).map(FieldValue::Text),
        Category::TextList => parse_text_list(name, value).map(FieldValue::List),
        Category::Citation => {
            let (bibkey, page) = parse_structured(name, value, &CITATION)?;
            Ok(FieldValue::Citation(Citation { bibkey, page }))
        }
        Category::Dates => {
            let (year, era) = parse_structured(name, value, &DATES)?;
            Ok(FieldValue::Dates(Dates { year, era }))
        }
    }
}

fn parse_text(name: &str, value: &Value) -> Result<String, SchemaError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Null => Err(SchemaError::NullNotAllowed {
            field: name.to_string(),
        }),
        other => Err(wrong_type(name, Category::Text, other)),
    }
}

// Null entries are rejected like any other non-string entry.
fn parse_text_list(name: &str, value: &Value) -> Result<Vec<String>, SchemaError> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_text(&format!("{name}({index})"), item))
            .collect(),
        Value::Null => Err(SchemaError::NullNotAllowed {
            field: name.to_string(),
        }),
        other => Err(wrong_type(name, Category::TextList, other)),
    }
}

fn parse_structured(
    name: &str,
    value: &Value,
    schema: &SubSchema,
) -> Result<(String, Option<String>), SchemaError> {
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => {
            return Err(SchemaError::NullNotAllowed {
                field: name.to_string(),
            });
        }
        other => return Err(wrong_type(name, schema.category, other)),
    };

    for key in mapping.keys() {
        let known = key
            .as_str()
            .is_some_and(|k| k == schema.required || k == schema.optional);
        if !known {
            return Err(SchemaError::UnknownSubfield {
                field: name.to_string(),
                subfield: render(key),
                context: schema.label,
            });
        }
    }

    let required = match mapping.get(schema.required) {
        None | Some(Value::Null) => {
            return Err(SchemaError::MissingRequiredSubfield {
                field: name.to_string(),
                subfield: schema.required,
            });
        }
        Some(value) => parse_text(&format!("{name}.{}", schema.required), value)?,
    };
    let optional = mapping
        .get(schema.optional)
        .map(|value| parse_text(&format!("{name}.{}", schema.optional), value))
        .transpose()?;

    Ok((required, optional))
}

/// Build the error reported when a value of the wrong shape meets a field.
pub(crate) fn wrong_type(name: &str, category: Category, value: &Value) -> SchemaError {
    SchemaError::WrongType {
        field: name.to_string(),
        expected: category.expected(),
        found: type_name(value),
        value: render(value),
    }
}

/// YAML type name of a decoded value
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}
