//! Generated output filenames
//!
//! `--name id counter timestamp` builds `<name-dir>/<id>-<counter>-<timestamp>.md`
//! from the components in the order given.

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use crate::counter::CounterStore;

/// A component of a generated filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NameComponent {
    /// The `--id` text
    Id,
    /// Next value of the named counter, zero-padded
    Counter,
    /// Local time as `%Y%m%d%H%M%S`
    Timestamp,
}

/// Options for generating an output filename
#[derive(Args, Debug, Clone)]
pub struct NamingArgs {
    /// Write to a generated filename built from these components, in order
    #[arg(long, num_args = 1.., value_enum, value_name = "COMPONENT")]
    pub name: Option<Vec<NameComponent>>,

    /// Folder for the generated file (must already exist)
    #[arg(long, default_value = ".")]
    pub name_dir: PathBuf,

    /// Human-readable id to include in the filename
    #[arg(long)]
    pub id: Option<String>,

    /// Minimum digits in the counter
    #[arg(long, default_value_t = 4)]
    pub digits: usize,

    /// Separator between components
    #[arg(long, default_value = "-")]
    pub separator: String,

    /// Counter name (defaults to --id)
    #[arg(long)]
    pub counter: Option<String>,

    /// File holding the counters
    #[arg(long, default_value = ".counter.dat")]
    pub counter_path: PathBuf,
}

/// Resolved values for each component
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    /// `--id`
    pub id: Option<String>,
    /// Padded counter value
    pub counter: Option<String>,
    /// Formatted timestamp
    pub timestamp: String,
}

impl NamingArgs {
    /// Counter to draw from: `--counter`, else `--id`
    pub fn counter_name(&self) -> Option<&str> {
        self.counter.as_deref().or(self.id.as_deref())
    }

    /// Build the output path for `components`, issuing a counter value if one is needed.
    pub fn resolve(&self, components: &[NameComponent]) -> Result<PathBuf> {
        if !self.name_dir.is_dir() {
            bail!(
                "Destination directory (--name-dir {}) does not exist. Will not write file.",
                self.name_dir.display()
            );
        }
        if components.contains(&NameComponent::Id) && self.id.is_none() {
            bail!("--name id requires --id");
        }

        let counter = if components.contains(&NameComponent::Counter) {
            let Some(counter_name) = self.counter_name() else {
                bail!("--name counter requires --counter or --id");
            };
            let count = CounterStore::new(&self.counter_path).next(counter_name)?;
            Some(pad_counter(count, self.digits))
        } else {
            None
        };

        let parts = NameParts {
            id: self.id.clone(),
            counter,
            timestamp: chrono::Local::now().format("%Y%m%d%H%M%S").to_string(),
        };
        let file_name = compose_file_name(components, &parts, &self.separator)?;
        Ok(self.name_dir.join(file_name))
    }
}

/// Zero-pad `count` to at least `digits` digits.
pub fn pad_counter(count: u64, digits: usize) -> String {
    format!("{count:0digits$}")
}

/// Join the components' values with `separator` and add `.md`.
pub fn compose_file_name(
    components: &[NameComponent],
    parts: &NameParts,
    separator: &str,
) -> Result<String> {
    if components.is_empty() {
        bail!("--name needs at least one component");
    }
    let mut values = Vec::with_capacity(components.len());
    for component in components {
        let value = match component {
            NameComponent::Id => parts.id.as_deref(),
            NameComponent::Counter => parts.counter.as_deref(),
            NameComponent::Timestamp => Some(parts.timestamp.as_str()),
        };
        let Some(value) = value else {
            bail!("no value for name component {component:?}");
        };
        values.push(value);
    }
    Ok(format!("{}.md", values.join(separator)))
}
