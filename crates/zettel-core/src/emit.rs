//! Canonical YAML output
//!
//! Output is produced by hand rather than through a generic YAML emitter so
//! that field order and scalar style are fixed:
//!
//! - fields appear in [`EmitConfig::field_order`], restricted to a caller
//!   supplied subset, and `document` never appears
//! - text spanning more than one line uses a literal block (`|`)
//! - any other text is written plain when it reads back as the same string,
//!   double-quoted otherwise
//! - lists are block sequences, `cite` and `dates` nested mappings
//!
//! Decoding the output with `serde_yaml` and validating it yields the same
//! field values.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::record::Record;
use crate::schema::{CITATION, DATES, Field};
use crate::value::FieldValue;

/// Formatting options for [`EmitConfig::produce_yaml`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitConfig {
    /// Use literal block style for multi-line text
    #[serde(default = "default_block_multiline")]
    pub block_multiline: bool,

    /// Indentation width for nested mappings and block scalars (1 to 9)
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Order fields are written in; fields not listed are never written
    #[serde(default = "default_field_order")]
    pub field_order: Vec<Field>,
}

fn default_block_multiline() -> bool {
    true
}

fn default_indent() -> usize {
    2
}

fn default_field_order() -> Vec<Field> {
    Field::ALL.to_vec()
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            block_multiline: default_block_multiline(),
            indent: default_indent(),
            field_order: default_field_order(),
        }
    }
}

impl EmitConfig {
    /// Render the fields of `record` that appear in `restrict_to`.
    ///
    /// Returns `""` when no field qualifies.
    pub fn produce_yaml(&self, record: &Record, restrict_to: &[Field]) -> String {
        let mut out = String::new();
        for &field in &self.field_order {
            if field == Field::Document || !restrict_to.contains(&field) {
                continue;
            }
            if let Some(value) = record.get(field) {
                self.write_field(&mut out, field.name(), value);
            }
        }
        out
    }

    // Block scalar indentation indicators only go from 1 to 9.
    fn indent_width(&self) -> usize {
        self.indent.clamp(1, 9)
    }

    fn write_field(&self, out: &mut String, key: &str, value: &FieldValue) {
        out.push_str(key);
        out.push(':');
        match value {
            FieldValue::Text(text) => self.write_text(out, text),
            FieldValue::List(entries) if entries.is_empty() => out.push_str(" []\n"),
            FieldValue::List(entries) => {
                out.push('\n');
                for entry in entries {
                    out.push_str("- ");
                    out.push_str(&scalar(entry));
                    out.push('\n');
                }
            }
            FieldValue::Citation(citation) => {
                out.push('\n');
                self.write_sub_field(out, CITATION.required, Some(&citation.bibkey));
                self.write_sub_field(out, CITATION.optional, citation.page.as_deref());
            }
            FieldValue::Dates(dates) => {
                out.push('\n');
                self.write_sub_field(out, DATES.required, Some(&dates.year));
                self.write_sub_field(out, DATES.optional, dates.era.as_deref());
            }
        }
    }

    fn write_sub_field(&self, out: &mut String, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            out.push_str(&" ".repeat(self.indent_width()));
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&scalar(value));
            out.push('\n');
        }
    }

    fn write_text(&self, out: &mut String, text: &str) {
        if self.block_multiline
            && text.lines().count() > 1
            && let Some(block) = self.literal_block(text)
        {
            out.push(' ');
            out.push_str(&block);
            return;
        }
        out.push(' ');
        out.push_str(&scalar(text));
        out.push('\n');
    }

    /// Literal block scalar for `text`, header through final line break.
    ///
    /// `None` when the text holds characters a block scalar cannot carry
    /// verbatim, or nothing but line breaks.
    fn literal_block(&self, text: &str) -> Option<String> {
        let body = text.trim_end_matches('\n');
        if body.trim().is_empty()
            || body
                .chars()
                .any(|c| c != '\n' && c != '\t' && needs_escape(c))
        {
            return None;
        }

        let chomping = match text.len() - body.len() {
            0 => "-",
            1 => "",
            _ => "+",
        };
        let first_line = body.lines().find(|line| !line.is_empty()).unwrap_or("");
        // Leading whitespace on the first line would be read as indentation.
        let indicator = if first_line.starts_with([' ', '\t']) {
            self.indent_width().to_string()
        } else {
            String::new()
        };

        let pad = " ".repeat(self.indent_width());
        let mut block = format!("|{indicator}{chomping}\n");
        for line in body.split('\n') {
            if !line.is_empty() {
                block.push_str(&pad);
                block.push_str(line);
            }
            block.push('\n');
        }
        for _ in 1..text.len() - body.len() {
            block.push('\n');
        }
        Some(block)
    }
}

/// Render `record` with the default [`EmitConfig`].
pub fn produce_yaml(record: &Record, restrict_to: &[Field]) -> String {
    EmitConfig::default().produce_yaml(record, restrict_to)
}

/// The record's document body, or `""`
pub fn produce_document(record: &Record) -> String {
    record.document().to_string()
}

/// Frame YAML and document text as a zettel file.
///
/// With YAML present the result is `---`, the YAML, `---`, the document.
/// Without it only the document is written. Trailing whitespace of the
/// document is dropped and the output ends in exactly one newline, or is
/// empty when there is nothing to write.
pub fn assemble_output(yaml: &str, document: &str) -> String {
    let document = document.trim_end();
    if yaml.is_empty() {
        if document.is_empty() {
            return String::new();
        }
        return format!("{document}\n");
    }
    let yaml = yaml.strip_suffix('\n').unwrap_or(yaml);
    format!("---\n{yaml}\n---\n{document}\n")
}

// Words YAML 1.1 readers take as booleans even though YAML 1.2 does not.
const YAML11_BOOLEANS: &[&str] = &["y", "n", "yes", "no", "on", "off"];

fn scalar(text: &str) -> String {
    if is_plain_safe(text) {
        text.to_string()
    } else {
        double_quoted(text)
    }
}

fn is_plain_safe(text: &str) -> bool {
    !text.is_empty()
        && text.trim() == text
        && !text.chars().any(needs_escape)
        && !YAML11_BOOLEANS.contains(&text.to_ascii_lowercase().as_str())
        && matches!(
            serde_yaml::from_str::<Value>(text),
            Ok(Value::String(ref read_back)) if read_back == text
        )
}

fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if needs_escape(c) => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_yaml::Mapping;

    fn read_back(yaml: &str) -> Record {
        let mapping: Mapping = serde_yaml::from_str(yaml).unwrap();
        Record::from_mapping(&mapping).unwrap()
    }

    #[test]
    fn test_empty_record_gives_empty_yaml() {
        assert_eq!(produce_yaml(&Record::new(), &Field::ALL), "");
    }

    #[test]
    fn test_canonical_layout() {
        let mut record = Record::new();
        record.set_dates("1984", None).unwrap();
        record.append_list_entry(Field::Tags, "b").unwrap();
        record.append_list_entry(Field::Tags, "a").unwrap();
        record.set_citation("knuth84", Some("12".into())).unwrap();
        record.set_field(Field::Title, "Literate Programming").unwrap();
        record.set_field(Field::Document, "body").unwrap();

        assert_eq!(
            produce_yaml(&record, &Field::ALL),
            "title: Literate Programming\n\
             tags:\n\
             - b\n\
             - a\n\
             cite:\n  bibkey: knuth84\n  page: \"12\"\n\
             dates:\n  year: \"1984\"\n"
        );
    }

    #[test]
    fn test_restriction_filters_fields() {
        let mut record = Record::new();
        record.set_field(Field::Title, "t").unwrap();
        record.set_field(Field::Note, "n").unwrap();
        assert_eq!(produce_yaml(&record, &[Field::Note]), "note: n\n");
        assert_eq!(produce_yaml(&record, &[Field::Url]), "");
    }

    #[test]
    fn test_document_never_emitted() {
        let mut record = Record::new();
        record.set_field(Field::Document, "body").unwrap();
        assert_eq!(produce_yaml(&record, &[Field::Document]), "");
        assert_eq!(produce_document(&record), "body");
    }

    #[test]
    fn test_empty_list_is_flow_sequence() {
        let mut record = Record::new();
        record.reset_list_field(Field::Mentions).unwrap();
        let yaml = produce_yaml(&record, &Field::ALL);
        assert_eq!(yaml, "mentions: []\n");
        assert_eq!(read_back(&yaml), record);
    }

    #[test]
    fn test_multiline_uses_literal_block() {
        let mut record = Record::new();
        record.set_field(Field::Summary, "line one\nline two").unwrap();
        let yaml = produce_yaml(&record, &Field::ALL);
        assert_eq!(yaml, "summary: |-\n  line one\n  line two\n");
        assert_eq!(read_back(&yaml), record);
    }

    #[test]
    fn test_tab_indented_block_gets_indicator() {
        let mut record = Record::new();
        record.set_field(Field::Note, "\tindented code\nnext line").unwrap();
        let yaml = produce_yaml(&record, &Field::ALL);
        assert_eq!(yaml, "note: |2-\n  \tindented code\n  next line\n");
        assert_eq!(read_back(&yaml), record);
    }

    #[test]
    fn test_single_line_with_newline_is_quoted() {
        let mut record = Record::new();
        record.set_field(Field::Summary, "only\n").unwrap();
        let yaml = produce_yaml(&record, &Field::ALL);
        assert_eq!(yaml, "summary: \"only\\n\"\n");
        assert_eq!(read_back(&yaml), record);
    }

    #[test]
    fn test_block_style_can_be_disabled() {
        let config = EmitConfig {
            block_multiline: false,
            ..EmitConfig::default()
        };
        let mut record = Record::new();
        record.set_field(Field::Note, "a\nb").unwrap();
        assert_eq!(config.produce_yaml(&record, &Field::ALL), "note: \"a\\nb\"\n");
    }

    #[test]
    fn test_custom_field_order() {
        let config = EmitConfig {
            field_order: vec![Field::Note, Field::Title],
            ..EmitConfig::default()
        };
        let mut record = Record::new();
        record.set_field(Field::Title, "t").unwrap();
        record.set_field(Field::Note, "n").unwrap();
        record.set_field(Field::Url, "u").unwrap();
        assert_eq!(config.produce_yaml(&record, &Field::ALL), "note: n\ntitle: t\n");
    }

    #[test]
    fn test_config_from_yaml_defaults() {
        let config: EmitConfig = serde_yaml::from_str("indent: 4").unwrap();
        assert_eq!(config.indent, 4);
        assert!(config.block_multiline);
        assert_eq!(config.field_order, Field::ALL.to_vec());
    }

    #[rstest]
    #[case("plain text")]
    #[case("")]
    #[case(" leading space")]
    #[case("trailing space ")]
    #[case("true")]
    #[case("yes")]
    #[case("123")]
    #[case("1.5")]
    #[case("null")]
    #[case("~")]
    #[case("key: value")]
    #[case("- item")]
    #[case("# comment")]
    #[case("a #b")]
    #[case("[a, b]")]
    #[case("{a: b}")]
    #[case("*alias")]
    #[case("&anchor x")]
    #[case("!tag x")]
    #[case("'single'")]
    #[case("\"double\"")]
    #[case("back\\slash")]
    #[case("tab\there")]
    #[case("carriage\rreturn")]
    #[case("bell\u{7}")]
    #[case("---")]
    #[case("%percent")]
    #[case("@at")]
    #[case("`tick")]
    #[case("https://example.com/a?b=c#d")]
    #[case("ünïcödé ✓")]
    fn test_text_round_trips(#[case] text: &str) {
        let mut record = Record::new();
        record.set_field(Field::Title, text).unwrap();
        record.append_list_entry(Field::Tags, text).unwrap();
        record.set_citation(text, Some(text.to_string())).unwrap();
        let yaml = produce_yaml(&record, &Field::ALL);
        assert_eq!(read_back(&yaml), record, "yaml was:\n{yaml}");
    }

    #[rstest]
    #[case("a\nb")]
    #[case("a\nb\n")]
    #[case("a\nb\n\n\n")]
    #[case("\nleading blank\nline")]
    #[case("  indented\nfirst line")]
    #[case("a\n\n  b\n")]
    #[case("a\n   \nb")]
    #[case("key: value\n- item\n# not a comment")]
    #[case("a\r\nb")]
    #[case("\n\n")]
    #[case("x\n---\ny")]
    #[case("\tx\ny")]
    #[case("\n\tx")]
    #[case("\tindented code\nnext line")]
    #[case("a\n\tb")]
    fn test_multiline_round_trips(#[case] text: &str) {
        let mut record = Record::new();
        record.set_field(Field::Note, text).unwrap();
        record.set_field(Field::Title, "after").unwrap();
        record.set_field(Field::Url, "u").unwrap();
        let yaml = produce_yaml(&record, &Field::ALL);
        assert_eq!(read_back(&yaml), record, "yaml was:\n{yaml}");
    }

    #[test]
    fn test_assemble_with_yaml() {
        assert_eq!(
            assemble_output("title: t\n", "body\n\n"),
            "---\ntitle: t\n---\nbody\n"
        );
        assert_eq!(assemble_output("title: t\n", ""), "---\ntitle: t\n---\n\n");
    }

    #[test]
    fn test_assemble_without_yaml() {
        assert_eq!(assemble_output("", "body  \n"), "body\n");
        assert_eq!(assemble_output("", ""), "");
        assert_eq!(assemble_output("", " \n"), "");
    }

    #[test]
    fn test_assemble_keeps_kept_trailing_lines() {
        let mut record = Record::new();
        record.set_field(Field::Note, "a\nb\n\n").unwrap();
        let yaml = produce_yaml(&record, &Field::ALL);
        let output = assemble_output(&yaml, "");
        let inner = output
            .strip_prefix("---\n")
            .and_then(|rest| rest.strip_suffix("---\n\n"))
            .unwrap();
        assert_eq!(read_back(inner), record);
    }
}
