//! Validate a directory of zettels

use anyhow::{Result, bail};
use std::path::Path;
use zettel_core::read_path;

/// Run the check command
pub fn run(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    tracing::info!("Checking zettels in {}", dir.display());

    let mut checked = 0;
    let mut failed = 0;
    for entry in walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_zettel(e.path()))
    {
        let path = entry.path();
        checked += 1;
        if let Err(err) = check_file(path) {
            tracing::error!("{}: {:#}", path.display(), err);
            failed += 1;
        } else {
            tracing::debug!("✓ {}", path.display());
        }
    }

    if failed > 0 {
        bail!("{failed} of {checked} zettels are invalid");
    }
    tracing::info!("✓ {} zettels are valid", checked);
    Ok(())
}

fn is_zettel(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml" || ext == "md")
}

/// Decode and validate one file. Decode problems count as failures.
fn check_file(path: &Path) -> Result<()> {
    if let Some(loaded) = read_path(path)? {
        loaded.into_record()?;
    }
    Ok(())
}
