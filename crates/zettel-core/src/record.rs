//! The in-memory zettel record and its primitive operations
//!
//! Every mutating operation runs inside a guard that re-validates the whole
//! record afterwards. The first failure poisons the record: operations that
//! already ran stay applied, and every later operation is refused with
//! [`Error::Poisoned`]. Callers are expected to discard a poisoned record.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result, SchemaError};
use crate::schema::{self, Category, Field, Fields};
use crate::value::{Citation, Dates, FieldValue};

/// One zettel's fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Fields,
    poisoned: bool,
}

impl Record {
    /// An empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a decoded YAML document
    pub fn from_value(doc: &Value) -> Result<Self> {
        Ok(Self {
            fields: schema::parse(doc)?,
            poisoned: false,
        })
    }

    /// Build a record from a decoded YAML mapping
    pub fn from_mapping(mapping: &Mapping) -> Result<Self> {
        Ok(Self {
            fields: schema::parse_mapping(mapping)?,
            poisoned: false,
        })
    }

    /// Value of a field, if present
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Whether a field is present
    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// Present fields in canonical order
    pub fn fields(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    /// Number of present fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is present
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Text of a scalar field
    pub fn text(&self, field: Field) -> Option<&str> {
        match self.fields.get(&field) {
            Some(FieldValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Entries of a list field; empty when absent
    pub fn list(&self, field: Field) -> &[String] {
        match self.fields.get(&field) {
            Some(FieldValue::List(entries)) => entries.as_slice(),
            _ => &[],
        }
    }

    /// The citation, if present
    pub fn citation(&self) -> Option<&Citation> {
        match self.fields.get(&Field::Cite) {
            Some(FieldValue::Citation(citation)) => Some(citation),
            _ => None,
        }
    }

    /// The dates, if present
    pub fn dates(&self) -> Option<&Dates> {
        match self.fields.get(&Field::Dates) {
            Some(FieldValue::Dates(dates)) => Some(dates),
            _ => None,
        }
    }

    /// Whether `cite` is present
    pub fn has_citation(&self) -> bool {
        self.contains(Field::Cite)
    }

    /// Whether `dates` is present
    pub fn has_dates(&self) -> bool {
        self.contains(Field::Dates)
    }

    /// The Markdown body, or `""`
    pub fn document(&self) -> &str {
        self.text(Field::Document).unwrap_or_default()
    }

    /// The stored filename, or `""`
    pub fn filename(&self) -> &str {
        self.text(Field::Filename).unwrap_or_default()
    }

    /// Whether an operation on this record has failed
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Decoded YAML form of the record, keys in canonical order
    pub fn to_mapping(&self) -> Mapping {
        self.fields
            .iter()
            .map(|(field, value)| (Value::from(field.name()), value.to_yaml()))
            .collect()
    }

    /// Re-run the schema check over the whole record
    pub fn validate(&self) -> std::result::Result<(), SchemaError> {
        schema::validate_mapping(&self.to_mapping())
    }

    /// Overwrite a scalar field.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<()> {
        let value = Value::String(value.into());
        self.guarded(|record| {
            let typed = schema::parse_value(field, &value)?;
            record.fields.insert(field, typed);
            Ok(())
        })
    }

    /// Set a scalar field from externally loaded text, trimming surrounding whitespace.
    pub fn load_field(&mut self, field: Field, text: &str) -> Result<()> {
        self.set_field(field, text.trim())
    }

    /// Remove a field. Returns whether it was present.
    pub fn delete_field(&mut self, field: Field) -> Result<bool> {
        self.guarded(|record| Ok(record.fields.remove(&field).is_some()))
    }

    /// Replace a list field with an empty list.
    pub fn reset_list_field(&mut self, field: Field) -> Result<()> {
        self.guarded(|record| {
            expect_list(field)?;
            record.fields.insert(field, FieldValue::List(Vec::new()));
            Ok(())
        })
    }

    /// Remove entries of a list field by 0-based position.
    ///
    /// Positions are removed from the highest down so earlier removals do
    /// not shift later ones. A list left empty is removed entirely. Returns
    /// `false` when the field is absent.
    pub fn delete_list_entries(&mut self, field: Field, positions: &[usize]) -> Result<bool> {
        self.guarded(|record| {
            expect_list(field)?;
            let Some(FieldValue::List(entries)) = record.fields.get_mut(&field) else {
                return Ok(false);
            };

            let mut positions = positions.to_vec();
            positions.sort_unstable_by(|a, b| b.cmp(a));
            positions.dedup();
            if let Some(&highest) = positions.first()
                && highest >= entries.len()
            {
                return Err(Error::PositionOutOfRange {
                    field: field.name().to_string(),
                    position: highest,
                    len: entries.len(),
                });
            }

            for position in positions {
                entries.remove(position);
            }
            if entries.is_empty() {
                record.fields.remove(&field);
            }
            Ok(true)
        })
    }

    /// Append to a list field unless the value is already in it.
    ///
    /// Returns whether the value was added.
    pub fn append_list_entry(&mut self, field: Field, value: impl Into<String>) -> Result<bool> {
        let value = value.into();
        self.guarded(|record| {
            expect_list(field)?;
            match record
                .fields
                .entry(field)
                .or_insert_with(|| FieldValue::List(Vec::new()))
            {
                FieldValue::List(entries) if entries.contains(&value) => Ok(false),
                FieldValue::List(entries) => {
                    entries.push(value);
                    Ok(true)
                }
                other => {
                    Err(schema::wrong_type(field.name(), Category::TextList, &other.to_yaml()).into())
                }
            }
        })
    }

    /// Replace the citation.
    pub fn set_citation(&mut self, bibkey: impl Into<String>, page: Option<String>) -> Result<()> {
        let citation = Citation {
            bibkey: bibkey.into(),
            page,
        };
        self.guarded(|record| {
            record
                .fields
                .insert(Field::Cite, FieldValue::Citation(citation));
            Ok(())
        })
    }

    /// Change the citation's bibkey.
    ///
    /// Only an existing citation is edited; without one, or with an empty
    /// `bibkey`, nothing changes. Returns whether the citation was edited.
    pub fn set_cite_bibkey(&mut self, bibkey: &str) -> Result<bool> {
        self.guarded(|record| {
            Ok(match record.fields.get_mut(&Field::Cite) {
                Some(FieldValue::Citation(citation)) if !bibkey.is_empty() => {
                    citation.bibkey = bibkey.to_string();
                    true
                }
                _ => false,
            })
        })
    }

    /// Change the citation's page. Same rules as [`Record::set_cite_bibkey`].
    pub fn set_cite_page(&mut self, page: &str) -> Result<bool> {
        self.guarded(|record| {
            Ok(match record.fields.get_mut(&Field::Cite) {
                Some(FieldValue::Citation(citation)) if !page.is_empty() => {
                    citation.page = Some(page.to_string());
                    true
                }
                _ => false,
            })
        })
    }

    /// Replace the dates.
    pub fn set_dates(&mut self, year: impl Into<String>, era: Option<String>) -> Result<()> {
        let dates = Dates {
            year: year.into(),
            era,
        };
        self.guarded(|record| {
            record.fields.insert(Field::Dates, FieldValue::Dates(dates));
            Ok(())
        })
    }

    /// Change the year of existing dates. Same rules as [`Record::set_cite_bibkey`].
    pub fn set_dates_year(&mut self, year: &str) -> Result<bool> {
        self.guarded(|record| {
            Ok(match record.fields.get_mut(&Field::Dates) {
                Some(FieldValue::Dates(dates)) if !year.is_empty() => {
                    dates.year = year.to_string();
                    true
                }
                _ => false,
            })
        })
    }

    /// Change the era of existing dates. Same rules as [`Record::set_cite_bibkey`].
    pub fn set_dates_era(&mut self, era: &str) -> Result<bool> {
        self.guarded(|record| {
            Ok(match record.fields.get_mut(&Field::Dates) {
                Some(FieldValue::Dates(dates)) if !era.is_empty() => {
                    dates.era = Some(era.to_string());
                    true
                }
                _ => false,
            })
        })
    }

    /// Single-string-per-field view for indexing, see [`crate::flatten`].
    pub fn indexed_representation(&self) -> BTreeMap<Field, String> {
        crate::flatten::indexed_representation(self)
    }

    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        let outcome = op(self).and_then(|out| {
            self.validate()?;
            Ok(out)
        });
        if let Err(err) = &outcome {
            tracing::debug!(error = %err, "record poisoned");
            self.poisoned = true;
        }
        outcome
    }
}

fn expect_list(field: Field) -> std::result::Result<(), SchemaError> {
    match field.category() {
        Category::TextList => Ok(()),
        category => Err(schema::wrong_type(
            field.name(),
            category,
            &Value::Sequence(Vec::new()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tagged(tags: &[&str]) -> Record {
        let mut record = Record::new();
        for tag in tags {
            record.append_list_entry(Field::Tags, *tag).unwrap();
        }
        record
    }

    #[test]
    fn test_set_and_get_text() {
        let mut record = Record::new();
        record.set_field(Field::Title, "On Notes").unwrap();
        assert_eq!(record.text(Field::Title), Some("On Notes"));
        record.set_field(Field::Title, "Replaced").unwrap();
        assert_eq!(record.text(Field::Title), Some("Replaced"));
    }

    #[test]
    fn test_set_field_on_list_poisons() {
        let mut record = Record::new();
        let err = record.set_field(Field::Tags, "a").unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::WrongType { ref field, .. }) if field == "tags"
        ));
        assert!(record.is_poisoned());
        assert!(!record.contains(Field::Tags));
        assert!(matches!(
            record.set_field(Field::Title, "x"),
            Err(Error::Poisoned)
        ));
        assert!(!record.contains(Field::Title));
    }

    #[test]
    fn test_load_field_trims() {
        let mut record = Record::new();
        record.load_field(Field::Summary, "\n  text  \n").unwrap();
        assert_eq!(record.text(Field::Summary), Some("text"));
    }

    #[test]
    fn test_delete_field_reports_presence() {
        let mut record = Record::new();
        record.set_field(Field::Url, "https://example.com").unwrap();
        assert!(record.delete_field(Field::Url).unwrap());
        assert!(!record.delete_field(Field::Url).unwrap());
        assert!(!record.is_poisoned());
    }

    #[test]
    fn test_append_is_idempotent() {
        let mut record = Record::new();
        assert!(record.append_list_entry(Field::Tags, "a").unwrap());
        assert!(!record.append_list_entry(Field::Tags, "a").unwrap());
        assert_eq!(record.list(Field::Tags), ["a"]);
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let record = tagged(&["z", "a", "m", "a"]);
        assert_eq!(record.list(Field::Tags), ["z", "a", "m"]);
    }

    #[test]
    fn test_append_to_text_field_fails() {
        let mut record = Record::new();
        assert!(record.append_list_entry(Field::Note, "x").is_err());
        assert!(record.is_poisoned());
    }

    #[test]
    fn test_reset_list_field() {
        let mut record = tagged(&["a", "b"]);
        record.reset_list_field(Field::Tags).unwrap();
        assert!(record.contains(Field::Tags));
        assert!(record.list(Field::Tags).is_empty());
    }

    #[rstest]
    #[case(&[0, 2], &["b"])]
    #[case(&[2, 0], &["b"])]
    #[case(&[1, 1], &["a", "c"])]
    #[case(&[], &["a", "b", "c"])]
    fn test_delete_list_entries(#[case] positions: &[usize], #[case] expected: &[&str]) {
        let mut record = tagged(&["a", "b", "c"]);
        assert!(record.delete_list_entries(Field::Tags, positions).unwrap());
        assert_eq!(record.list(Field::Tags), expected);
    }

    #[test]
    fn test_delete_all_entries_removes_field() {
        let mut record = tagged(&["a", "b", "c"]);
        record.delete_list_entries(Field::Tags, &[0, 2]).unwrap();
        record.delete_list_entries(Field::Tags, &[0]).unwrap();
        assert!(!record.contains(Field::Tags));
    }

    #[test]
    fn test_delete_entries_of_absent_list() {
        let mut record = Record::new();
        assert!(!record.delete_list_entries(Field::Mentions, &[0]).unwrap());
        assert!(!record.is_poisoned());
    }

    #[test]
    fn test_delete_entries_out_of_range_leaves_list() {
        let mut record = tagged(&["a", "b"]);
        let err = record.delete_list_entries(Field::Tags, &[0, 5]).unwrap_err();
        assert!(matches!(
            err,
            Error::PositionOutOfRange {
                position: 5,
                len: 2,
                ..
            }
        ));
        assert_eq!(record.list(Field::Tags), ["a", "b"]);
        assert!(record.is_poisoned());
    }

    #[test]
    fn test_guarded_cite_edit_without_citation() {
        let mut record = Record::new();
        assert!(!record.set_cite_bibkey("x").unwrap());
        assert!(!record.set_cite_page("7").unwrap());
        assert_eq!(record, Record::new());
    }

    #[test]
    fn test_cite_edit_with_citation() {
        let mut record = Record::new();
        record.set_citation("k1", Some("5".into())).unwrap();
        assert!(record.set_cite_bibkey("k2").unwrap());
        assert_eq!(
            record.citation(),
            Some(&Citation {
                bibkey: "k2".into(),
                page: Some("5".into()),
            })
        );
    }

    #[test]
    fn test_empty_sub_field_edit_is_noop() {
        let mut record = Record::new();
        record.set_citation("k1", None).unwrap();
        assert!(!record.set_cite_bibkey("").unwrap());
        assert!(!record.set_cite_page("").unwrap());
        assert_eq!(record.citation().unwrap().bibkey, "k1");
        assert_eq!(record.citation().unwrap().page, None);
    }

    #[test]
    fn test_dates_edits() {
        let mut record = Record::new();
        assert!(!record.set_dates_year("1999").unwrap());
        record.set_dates("44", None).unwrap();
        assert!(record.set_dates_era("BC").unwrap());
        assert!(record.set_dates_year("43").unwrap());
        assert_eq!(
            record.dates(),
            Some(&Dates {
                year: "43".into(),
                era: Some("BC".into()),
            })
        );
    }

    #[test]
    fn test_from_mapping_rejects_null_tags() {
        let mapping: Mapping = serde_yaml::from_str("tags: null").unwrap();
        assert!(Record::from_mapping(&mapping).is_err());
        let mapping: Mapping = serde_yaml::from_str("title: x").unwrap();
        assert!(Record::from_mapping(&mapping).is_ok());
    }

    #[test]
    fn test_to_mapping_is_canonical_and_valid() {
        let mapping: Mapping =
            serde_yaml::from_str("dates: {year: '1'}\ntags: [b]\ntitle: t").unwrap();
        let record = Record::from_mapping(&mapping).unwrap();
        let keys: Vec<_> = record
            .to_mapping()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, ["title", "tags", "dates"]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_document_and_filename_default_empty() {
        let mut record = Record::new();
        assert_eq!(record.document(), "");
        assert_eq!(record.filename(), "");
        record.set_field(Field::Document, "body").unwrap();
        record.set_field(Field::Filename, "note-0001.md").unwrap();
        assert_eq!(record.document(), "body");
        assert_eq!(record.filename(), "note-0001.md");
    }
}
