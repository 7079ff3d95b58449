//! Typed field values

use serde_yaml::{Mapping, Value};

use crate::schema::{CITATION, DATES};

/// The value of one zettel field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Scalar text
    Text(String),
    /// Ordered strings without duplicates
    List(Vec<String>),
    /// `cite` sub-record
    Citation(Citation),
    /// `dates` sub-record
    Dates(Dates),
}

/// A citation: a bibliography key and an optional page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// Bibliography key
    pub bibkey: String,
    /// Page or page range
    pub page: Option<String>,
}

/// Dates: a year and an optional era
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dates {
    /// Year, kept as text
    pub year: String,
    /// Era, e.g. `BC`
    pub era: Option<String>,
}

impl FieldValue {
    /// Convert back into the decoded YAML shape the validator accepts.
    pub fn to_yaml(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::List(entries) => {
                Value::Sequence(entries.iter().cloned().map(Value::String).collect())
            }
            FieldValue::Citation(citation) => Value::Mapping(sub_record(
                CITATION.required,
                &citation.bibkey,
                CITATION.optional,
                citation.page.as_deref(),
            )),
            FieldValue::Dates(dates) => Value::Mapping(sub_record(
                DATES.required,
                &dates.year,
                DATES.optional,
                dates.era.as_deref(),
            )),
        }
    }
}

fn sub_record(required: &str, value: &str, optional: &str, extra: Option<&str>) -> Mapping {
    let mut mapping = Mapping::new();
    mapping.insert(required.into(), value.into());
    if let Some(extra) = extra {
        mapping.insert(optional.into(), extra.into());
    }
    mapping
}
