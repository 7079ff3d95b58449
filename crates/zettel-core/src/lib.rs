//! Zettel Core Library
//!
//! This crate provides the record model behind the `zettel` tool:
//! - Field catalog and schema validation
//! - The mutable record and its batched edits
//! - Canonical YAML output and file framing
//! - A flattened view for search indexes
//! - Decoding of YAML and Markdown-with-frontmatter files
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Loader    │────▶│   Schema    │────▶│   Record    │────▶│    Emit     │
//! │ (YAML / MD) │     │ (validate)  │     │   (edits)   │     │   (YAML)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use zettel_core::{Edit, Field, Record, apply_edits, assemble_output, produce_document, produce_yaml};
//!
//! let mut record = Record::new();
//! apply_edits(
//!     &mut record,
//!     vec![
//!         Edit::Append { field: Field::Tags, value: "rust".into() },
//!         Edit::Set { field: Field::Title, value: "Ownership".into() },
//!     ],
//! )?;
//!
//! let yaml = produce_yaml(&record, &Field::ALL);
//! let output = assemble_output(&yaml, &produce_document(&record));
//! assert_eq!(output, "---\ntitle: Ownership\ntags:\n- rust\n---\n\n");
//! # Ok::<(), zettel_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edit;
pub mod emit;
pub mod error;
pub mod flatten;
pub mod loader;
pub mod record;
pub mod schema;
pub mod value;

pub use edit::{Edit, Pass, apply_edits};
pub use emit::{EmitConfig, assemble_output, produce_document, produce_yaml};
pub use error::{Error, Result, SchemaError};
pub use flatten::{flatten, indexed_representation};
pub use loader::{Loaded, SourceFormat, load_path, read_path};
pub use record::Record;
pub use schema::{Category, Field, validate};
pub use value::{Citation, Dates, FieldValue};
