//! Create or edit a zettel

use anyhow::{Context, Result, bail};
use clap::Args;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use zettel_core::{
    Category, Edit, Field, Record, apply_edits, assemble_output, produce_document, produce_yaml,
};

use super::load_record;
use crate::naming::NamingArgs;

/// Options for `zettel edit`
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Zettel to start from (.yaml or .md); a missing file starts empty
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Delete a field
    #[arg(long, value_name = "FIELD")]
    pub delete: Vec<Field>,

    /// Reset a list field to an empty list
    #[arg(long, value_name = "FIELD")]
    pub reset: Vec<Field>,

    /// Remove list entries by comma-separated positions, e.g. `tags 0,2`
    #[arg(long, num_args = 2, value_names = ["FIELD", "POSITIONS"])]
    pub remove_entries: Vec<String>,

    /// Set a field; `\n` in VALUE becomes a newline
    #[arg(long, num_args = 2, value_names = ["FIELD", "VALUE"])]
    pub set: Vec<String>,

    /// Set a field from the contents of a file
    #[arg(long, num_args = 2, value_names = ["FIELD", "PATH"])]
    pub load: Vec<String>,

    /// Append to a list field
    #[arg(long, num_args = 2, value_names = ["FIELD", "VALUE"])]
    pub append: Vec<String>,

    /// Set the citation; extra values are joined with commas into the page
    #[arg(long, num_args = 1.., value_names = ["BIBKEY", "PAGE"])]
    pub set_cite: Option<Vec<String>>,

    /// Set the dates; extra values are joined with commas into the era
    #[arg(long, num_args = 1.., value_names = ["YEAR", "ERA"])]
    pub set_dates: Option<Vec<String>>,

    /// Read a field's value from stdin until EOF
    #[arg(long, value_name = "FIELD")]
    pub prompt: Vec<Field>,

    /// Only write these fields (the document is always written)
    #[arg(long, num_args = 1.., value_name = "FIELD")]
    pub restrict_output_fields: Option<Vec<Field>>,

    /// Write to this file instead of stdout
    #[arg(long, conflicts_with_all = ["in_place", "name"])]
    pub save: Option<PathBuf>,

    /// Overwrite --file, keeping a backup
    #[arg(long, conflicts_with = "name")]
    pub in_place: bool,

    /// Suffix for backup files
    #[arg(long, default_value = "orig")]
    pub backup_id: String,

    #[command(flatten)]
    pub naming: NamingArgs,
}

/// Run the edit command
pub fn run(args: &EditArgs) -> Result<()> {
    let mut record = match &args.file {
        Some(path) if path.exists() => load_record(path)?,
        Some(path) => {
            tracing::info!("{} does not exist; starting a new zettel", path.display());
            Record::new()
        }
        None => Record::new(),
    };

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let edits = collect_edits(args, stdin.lock(), interactive)?;
    tracing::debug!("Applying {} edits", edits.len());
    apply_edits(&mut record, edits).context("Edit produced an invalid zettel")?;

    let fields = args
        .restrict_output_fields
        .as_deref()
        .unwrap_or(&Field::ALL);
    let output = assemble_output(&produce_yaml(&record, fields), &produce_document(&record));

    match output_target(args)? {
        Some(path) => {
            std::fs::write(&path, output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("✓ Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Translate the command line into edits.
///
/// Prompted fields read from `input`; `interactive` shows a hint on stderr
/// before each one.
pub fn collect_edits(
    args: &EditArgs,
    mut input: impl BufRead,
    interactive: bool,
) -> Result<Vec<Edit>> {
    let mut edits = Vec::new();

    edits.extend(args.delete.iter().copied().map(Edit::Delete));
    edits.extend(args.reset.iter().copied().map(Edit::Reset));
    for (field, positions) in pairs(&args.remove_entries)? {
        edits.push(Edit::RemoveEntries {
            field,
            positions: parse_positions(positions)?,
        });
    }

    for (field, value) in pairs(&args.set)? {
        edits.push(Edit::Set {
            field,
            value: value.replace("\\n", "\n"),
        });
    }
    for (field, path) in pairs(&args.load)? {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {path} for --load {field}"))?;
        edits.push(Edit::Load { field, text });
    }
    for (field, value) in pairs(&args.append)? {
        edits.push(Edit::Append {
            field,
            value: value.to_string(),
        });
    }

    if let Some((bibkey, page)) = args.set_cite.as_deref().and_then(split_rest) {
        edits.push(Edit::UpdateCitation { bibkey, page });
    }
    if let Some((year, era)) = args.set_dates.as_deref().and_then(split_rest) {
        edits.push(Edit::UpdateDates { year, era });
    }

    for &field in &args.prompt {
        let lines = prompt(field, &mut input, interactive)?;
        edits.extend(prompted_edits(field, lines));
    }

    Ok(edits)
}

/// Pair up `FIELD VALUE` arguments.
fn pairs(values: &[String]) -> Result<Vec<(Field, &str)>> {
    let mut pairs = Vec::with_capacity(values.len() / 2);
    for pair in values.chunks(2) {
        let [field, value] = pair else {
            bail!("expected FIELD VALUE pairs, got {values:?}");
        };
        pairs.push((field.parse::<Field>()?, value.as_str()));
    }
    Ok(pairs)
}

fn parse_positions(text: &str) -> Result<Vec<usize>> {
    text.split(',')
        .map(|pos| {
            pos.trim()
                .parse::<usize>()
                .with_context(|| format!("Non-integer list position '{pos}' in '{text}'"))
        })
        .collect()
}

/// First value, plus the remaining values joined with commas when there are any.
fn split_rest(values: &[String]) -> Option<(String, Option<String>)> {
    let (first, rest) = values.split_first()?;
    let rest = (!rest.is_empty()).then(|| rest.join(","));
    Some((first.clone(), rest))
}

fn prompt(field: Field, input: &mut impl BufRead, interactive: bool) -> Result<Vec<String>> {
    if interactive {
        eprintln!("Enter text for {field}. ctrl-d to end.");
    }
    let mut lines = Vec::new();
    let mut line = String::new();
    while input.read_line(&mut line)? > 0 {
        lines.push(line.trim_end_matches(['\r', '\n']).to_string());
        line.clear();
    }
    Ok(lines)
}

fn prompted_edits(field: Field, lines: Vec<String>) -> Vec<Edit> {
    match field.category() {
        Category::Text => vec![Edit::Set {
            field,
            value: lines.join("\n"),
        }],
        Category::TextList => lines
            .into_iter()
            .map(|value| Edit::Append { field, value })
            .collect(),
        Category::Citation => {
            let mut lines = lines.into_iter();
            match lines.next() {
                Some(bibkey) => vec![Edit::SetCitation {
                    bibkey,
                    page: lines.next(),
                }],
                None => Vec::new(),
            }
        }
        Category::Dates => {
            let mut lines = lines.into_iter();
            match lines.next() {
                Some(year) => vec![Edit::SetDates {
                    year,
                    era: lines.next(),
                }],
                None => Vec::new(),
            }
        }
    }
}

/// Where output goes: a file (after backing up what it replaces) or stdout.
fn output_target(args: &EditArgs) -> Result<Option<PathBuf>> {
    if args.in_place {
        let Some(file) = &args.file else {
            bail!("--in-place requires --file");
        };
        let extension = file.extension().and_then(|ext| ext.to_str());
        if !matches!(extension, Some("yaml" | "md")) {
            bail!(
                "--in-place only rewrites .yaml or .md files, not {}",
                file.display()
            );
        }
        backup(file, &args.backup_id)?;
        return Ok(Some(file.clone()));
    }

    if let Some(save) = &args.save {
        if args.file.as_ref() == Some(save) {
            bail!("--save {} would overwrite --file; use --in-place", save.display());
        }
        backup(save, &args.backup_id)?;
        return Ok(Some(save.clone()));
    }

    if let Some(components) = &args.naming.name {
        let path = args.naming.resolve(components)?;
        backup(&path, &args.backup_id)?;
        return Ok(Some(path));
    }

    Ok(None)
}

/// Copy `path` to `<path>.<backup_id>` if it exists.
fn backup(path: &Path, backup_id: &str) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut backup = path.as_os_str().to_owned();
    backup.push(".");
    backup.push(backup_id);
    let backup = PathBuf::from(backup);
    std::fs::copy(path, &backup).with_context(|| {
        format!("Failed to back up {} to {}", path.display(), backup.display())
    })?;
    tracing::info!("Backed up {} to {}", path.display(), backup.display());
    Ok(())
}
