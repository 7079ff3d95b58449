//! Error types for zettel-core

use thiserror::Error;

/// Result type alias for zettel-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// A record that does not conform to the zettel schema.
///
/// Every variant names the offending field. List entries are named
/// `field(index)`, sub-fields of structured values `field.subfield`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The top level of a zettel was not a key/value mapping
    #[error("zettels require key/value mappings at top-level, found {found}")]
    NotAMapping {
        /// Type name of the value found
        found: String,
    },

    /// A key outside the field catalog
    #[error("invalid field '{field}' found in Zettel")]
    UnknownField {
        /// The unknown key, rendered as text
        field: String,
    },

    /// A key outside a structured field's sub-schema
    #[error("invalid field '{subfield}' found in {context} ('{field}')")]
    UnknownSubfield {
        /// Structured field name
        field: String,
        /// The unknown sub-key, rendered as text
        subfield: String,
        /// Sub-schema label (Citation, Dates)
        context: &'static str,
    },

    /// A key that is present but null
    #[error("field '{field}' may not be (YAML) null")]
    NullNotAllowed {
        /// Field name
        field: String,
    },

    /// A value of the wrong shape
    #[error("field '{field}' must be {expected}, found value {value} of type {found}")]
    WrongType {
        /// Field name
        field: String,
        /// Expected shape
        expected: &'static str,
        /// Type name of the value found
        found: &'static str,
        /// The value found, rendered as text
        value: String,
    },

    /// A structured field without its required sub-field
    #[error("field '{field}' requires sub-field '{subfield}'")]
    MissingRequiredSubfield {
        /// Structured field name
        field: String,
        /// The missing sub-field
        subfield: &'static str,
    },
}

/// Errors that can occur in zettel-core
#[derive(Error, Debug)]
pub enum Error {
    /// Record failed schema validation
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An earlier operation failed; the record must be discarded
    #[error("record was poisoned by an earlier failed operation")]
    Poisoned,

    /// List position beyond the end of a list field
    #[error("position {position} out of range for field '{field}' with {len} entries")]
    PositionOutOfRange {
        /// List field name
        field: String,
        /// Requested position
        position: usize,
        /// Current list length
        len: usize,
    },

    /// Zettel text is not valid YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Zettel file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
