//! Decoding zettel files
//!
//! Zettels are stored either as pure YAML or as Markdown with a YAML
//! frontmatter block. The `load_*` functions never fail: unreadable files,
//! YAML syntax errors, and non-mapping documents all decode to an empty
//! mapping and a warning, so the validator only ever sees a mapping.
//! [`decode_yaml`], [`decode_markdown`] and [`read_path`] report those
//! failures as errors instead.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::error::{Error, Result, SchemaError};
use crate::record::Record;
use crate::schema::{self, Field};

/// On-disk zettel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.md`, `.markdown`, `.text`, `.txt`
    Markdown,
}

impl SourceFormat {
    /// Format implied by a file extension, if it is one zettels use
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            "md" | "markdown" | "text" | "txt" => Some(SourceFormat::Markdown),
            _ => None,
        }
    }
}

/// A decoded zettel file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loaded {
    /// Decoded YAML mapping; empty when decoding failed
    pub mapping: Mapping,
    /// Markdown body; empty for pure YAML
    pub document: String,
    /// Problems recovered from while decoding
    pub warnings: Vec<String>,
}

impl Loaded {
    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// The mapping with a non-empty body bound to `document`
    pub fn into_mapping(self) -> Mapping {
        let mut mapping = self.mapping;
        if !self.document.is_empty() {
            mapping.insert(Value::from(Field::Document.name()), Value::from(self.document));
        }
        mapping
    }

    /// Validate into a record
    pub fn into_record(self) -> Result<Record> {
        Record::from_mapping(&self.into_mapping())
    }
}

/// Decode text in the given format.
pub fn load_str(text: &str, format: SourceFormat) -> Loaded {
    match format {
        SourceFormat::Yaml => load_yaml(text),
        SourceFormat::Markdown => load_markdown(text),
    }
}

/// Decode the first YAML document in `text`, recovering from failures.
pub fn load_yaml(text: &str) -> Loaded {
    let mut loaded = Loaded::default();
    match decode_yaml(text) {
        Ok(mapping) => loaded.mapping = mapping,
        Err(Error::Yaml(err)) => loaded.warn(format!(
            "cannot load YAML ({err}); consider running a YAML linter"
        )),
        Err(err) => loaded.warn(err.to_string()),
    }
    loaded
}

/// Decode the first YAML document in `text`.
///
/// Blank text, a comment-only text, and a null document all decode to an
/// empty mapping.
pub fn decode_yaml(text: &str) -> Result<Mapping> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let Some(document) = serde_yaml::Deserializer::from_str(text).next() else {
        return Ok(Mapping::new());
    };
    match Value::deserialize(document)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(SchemaError::NotAMapping {
            found: schema::type_name(&other).to_string(),
        }
        .into()),
    }
}

/// Split a leading `---` frontmatter block from a Markdown body and decode it.
///
/// Without frontmatter the whole text is the body. Blank lines between the
/// frontmatter and the body, and trailing whitespace, are dropped.
pub fn load_markdown(text: &str) -> Loaded {
    let (frontmatter, body) = split_frontmatter(text);
    let mut loaded = frontmatter.map(load_yaml).unwrap_or_default();
    loaded.document = trim_body(body);
    loaded
}

/// Like [`load_markdown`], but a frontmatter that fails to decode is an error.
pub fn decode_markdown(text: &str) -> Result<Loaded> {
    let (frontmatter, body) = split_frontmatter(text);
    Ok(Loaded {
        mapping: frontmatter.map(decode_yaml).transpose()?.unwrap_or_default(),
        document: trim_body(body),
        warnings: Vec::new(),
    })
}

fn trim_body(body: &str) -> String {
    body.trim_start_matches(['\r', '\n']).trim_end().to_string()
}

fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let mut lines = text.split_inclusive('\n');
    let Some(opening) = lines.next() else {
        return (None, text);
    };
    if opening.trim_end() != "---" {
        return (None, text);
    }

    let start = opening.len();
    let mut offset = start;
    for line in lines {
        if matches!(line.trim_end(), "---" | "...") {
            return (Some(&text[start..offset]), &text[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

/// Read and decode a zettel file.
///
/// Returns `None` for extensions that are not zettel formats. Read errors
/// are recovered like decode errors.
pub fn load_path(path: &Path) -> Option<Loaded> {
    let format = SourceFormat::from_path(path)?;
    match std::fs::read_to_string(path) {
        Ok(text) => Some(load_str(&text, format)),
        Err(err) => {
            let mut loaded = Loaded::default();
            loaded.warn(format!(
                "I/O error on {} ({err}); is the file UTF-8?",
                path.display()
            ));
            Some(loaded)
        }
    }
}

/// Read and decode a zettel file without recovering from failures.
///
/// `Ok(None)` for extensions that are not zettel formats.
pub fn read_path(path: &Path) -> Result<Option<Loaded>> {
    let Some(format) = SourceFormat::from_path(path) else {
        return Ok(None);
    };
    let text = std::fs::read_to_string(path)?;
    let loaded = match format {
        SourceFormat::Yaml => Loaded {
            mapping: decode_yaml(&text)?,
            ..Loaded::default()
        },
        SourceFormat::Markdown => decode_markdown(&text)?,
    };
    Ok(Some(loaded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("a.yaml")),
            Some(SourceFormat::Yaml)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("dir/a.md")),
            Some(SourceFormat::Markdown)
        );
        assert_eq!(SourceFormat::from_path(Path::new("a.json")), None);
        assert_eq!(SourceFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_load_yaml_mapping() {
        let loaded = load_yaml("title: t\ntags: [a]\n");
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.mapping.len(), 2);
        assert!(loaded.document.is_empty());
    }

    #[test]
    fn test_load_yaml_takes_first_document() {
        let loaded = load_yaml("title: one\n---\ntitle: two\n");
        let record = loaded.into_record().unwrap();
        assert_eq!(record.text(Field::Title), Some("one"));
    }

    #[test]
    fn test_load_yaml_syntax_error_recovers() {
        let loaded = load_yaml("title: [unclosed\n");
        assert!(loaded.mapping.is_empty());
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn test_load_yaml_non_mapping_recovers() {
        let loaded = load_yaml("- a\n- b\n");
        assert!(loaded.mapping.is_empty());
        assert!(loaded.warnings[0].contains("sequence"));
    }

    #[test]
    fn test_decode_yaml_reports_failures() {
        assert!(matches!(decode_yaml("title: [unclosed\n"), Err(Error::Yaml(_))));
        assert!(matches!(
            decode_yaml("- a\n"),
            Err(Error::Schema(SchemaError::NotAMapping { .. }))
        ));
        assert!(decode_yaml("# only a comment\n").unwrap().is_empty());
        assert_eq!(decode_yaml("title: t\n").unwrap().len(), 1);
    }

    #[test]
    fn test_decode_markdown_reports_bad_frontmatter() {
        assert!(decode_markdown("---\ntitle: [unclosed\n---\nBody\n").is_err());
        let loaded = decode_markdown("---\ntitle: t\n---\n\nBody\n").unwrap();
        assert_eq!(loaded.document, "Body");
        assert_eq!(loaded.mapping.len(), 1);
    }

    #[test]
    fn test_read_path() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        std::fs::write(&good, "title: t\n").unwrap();
        let loaded = read_path(&good).unwrap().unwrap();
        assert_eq!(loaded.into_record().unwrap().text(Field::Title), Some("t"));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "title: [unclosed\n").unwrap();
        assert!(matches!(read_path(&bad), Err(Error::Yaml(_))));

        let missing = dir.path().join("missing.md");
        assert!(matches!(read_path(&missing), Err(Error::Io(_))));
        assert!(read_path(&dir.path().join("notes.json")).unwrap().is_none());
    }

    #[test]
    fn test_load_empty_yaml() {
        let loaded = load_yaml("");
        assert!(loaded.mapping.is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_load_markdown_with_frontmatter() {
        let loaded = load_markdown("---\ntitle: t\n---\n\n# Heading\n\nText.\n\n");
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.document, "# Heading\n\nText.");
        let record = loaded.into_record().unwrap();
        assert_eq!(record.text(Field::Title), Some("t"));
        assert_eq!(record.document(), "# Heading\n\nText.");
    }

    #[test]
    fn test_load_markdown_without_frontmatter() {
        let loaded = load_markdown("Just text.\n---\nmore\n");
        assert!(loaded.mapping.is_empty());
        assert_eq!(loaded.document, "Just text.\n---\nmore");
    }

    #[test]
    fn test_load_markdown_unclosed_frontmatter_is_body() {
        let loaded = load_markdown("---\ntitle: t\n");
        assert!(loaded.mapping.is_empty());
        assert_eq!(loaded.document, "---\ntitle: t");
    }

    #[test]
    fn test_body_overrides_document_key() {
        let loaded = load_markdown("---\ndocument: old\n---\nnew\n");
        assert_eq!(loaded.into_record().unwrap().document(), "new");
    }

    #[test]
    fn test_empty_body_is_not_bound() {
        let record = load_markdown("---\ntitle: t\n---\n").into_record().unwrap();
        assert!(!record.contains(Field::Document));
    }

    #[test]
    fn test_load_missing_path_recovers() {
        let loaded = load_path(Path::new("/nonexistent/zettel.yaml")).unwrap();
        assert!(loaded.mapping.is_empty());
        assert_eq!(loaded.warnings.len(), 1);
        assert!(load_path(Path::new("/nonexistent/zettel.json")).is_none());
    }
}
