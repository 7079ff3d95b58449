//! Flattened single-string view of a record, for search indexes

use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::record::Record;
use crate::schema::Field;

/// Flatten a decoded value into a sequence of strings.
///
/// - null becomes `[""]`
/// - a mapping becomes one `key:value` string per entry, in mapping order
/// - a sequence becomes the concatenation of its flattened entries
/// - a scalar becomes its text
pub fn flatten(value: &Value) -> Vec<String> {
    match value {
        Value::Null => vec![String::new()],
        Value::Bool(flag) => vec![flag.to_string()],
        Value::Number(number) => vec![number.to_string()],
        Value::String(text) => vec![text.clone()],
        Value::Sequence(items) => items.iter().flat_map(flatten).collect(),
        Value::Mapping(mapping) => mapping
            .iter()
            .map(|(key, value)| format!("{}:{}", flatten(key).join(","), flatten(value).join(",")))
            .collect(),
        Value::Tagged(tagged) => flatten(&tagged.value),
    }
}

/// Each present field as one comma-joined string.
pub fn indexed_representation(record: &Record) -> BTreeMap<Field, String> {
    record
        .fields()
        .map(|(field, value)| (field, flatten(&value.to_yaml()).join(",")))
        .collect()
}
