//! CLI command implementations

pub mod check;
pub mod edit;
pub mod index;

use anyhow::{Context, Result};
use std::path::Path;
use zettel_core::{Record, load_path};

/// Load and validate a zettel file.
///
/// Files with an extension that is not a zettel format load as an empty
/// record.
pub fn load_record(path: &Path) -> Result<Record> {
    let Some(loaded) = load_path(path) else {
        tracing::warn!(
            "{} is not a .yaml or .md zettel; starting from an empty record",
            path.display()
        );
        return Ok(Record::new());
    };
    loaded
        .into_record()
        .with_context(|| format!("Invalid zettel: {}", path.display()))
}
