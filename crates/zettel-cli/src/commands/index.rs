//! Print the index view of a zettel

use anyhow::{Result, bail};
use std::path::Path;

use super::load_record;

/// Run the index command
pub fn run(file: &Path) -> Result<()> {
    if !file.is_file() {
        bail!("{} does not exist", file.display());
    }
    let record = load_record(file)?;
    let index = record.indexed_representation();
    println!("{}", serde_json::to_string_pretty(&index)?);
    Ok(())
}
