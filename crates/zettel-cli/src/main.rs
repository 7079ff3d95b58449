//! Zettel CLI
//!
//! Create, edit, check, and index zettel files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod counter;
mod naming;

/// Zettel - structured notes in YAML and Markdown
#[derive(Parser)]
#[command(name = "zettel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or edit a zettel and write it out
    Edit(commands::edit::EditArgs),

    /// Validate every zettel in a directory
    Check {
        /// Directory holding .yaml / .md zettels
        dir: PathBuf,
    },

    /// Print the flattened index view of a zettel as JSON
    Index {
        /// Zettel file (.yaml or .md)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for zettel output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Edit(args) => {
            commands::edit::run(&args)?;
        }
        Commands::Check { dir } => {
            commands::check::run(&dir)?;
        }
        Commands::Index { file } => {
            commands::index::run(&file)?;
        }
    }

    Ok(())
}
