//! Persisted named counters
//!
//! Counters live in a small JSON object mapping counter name to the last
//! number issued. The file is created on first use.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// JSON file of named counters
#[derive(Debug, Clone)]
pub struct CounterStore {
    path: PathBuf,
}

impl CounterStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Issue the next number for `name`, starting at 0, and persist it.
    pub fn next(&self, name: &str) -> Result<u64> {
        let mut counters = self.read()?;
        let count = counters.get(name).map_or(0, |last| last + 1);
        counters.insert(name.to_string(), count);

        let json = serde_json::to_string(&counters)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write counters to {}", self.path.display()))?;

        tracing::debug!(counter = name, count, path = %self.path().display(), "issued counter");
        Ok(count)
    }

    fn read(&self) -> Result<BTreeMap<String, u64>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read counters from {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid counter file: {}", self.path.display()))
    }
}
