//! Batched record edits
//!
//! A caller collects the edits it wants for one record in whatever order it
//! likes. [`apply_edits`] runs them in two passes:
//!
//! 1. destructive edits: [`Edit::Delete`], [`Edit::Reset`], [`Edit::RemoveEntries`]
//! 2. everything else, which only adds or overwrites
//!
//! Within a pass edits keep the order they were given in. A delete can
//! therefore never wipe out an append requested alongside it, whichever was
//! listed first.

use crate::error::Result;
use crate::record::Record;
use crate::schema::Field;

/// One requested change to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Remove a field
    Delete(Field),
    /// Replace a list field with an empty list
    Reset(Field),
    /// Remove list entries by position
    RemoveEntries {
        /// List field
        field: Field,
        /// 0-based positions
        positions: Vec<usize>,
    },
    /// Overwrite a scalar field
    Set {
        /// Scalar field
        field: Field,
        /// New value
        value: String,
    },
    /// Overwrite a scalar field with externally loaded text (trimmed)
    Load {
        /// Scalar field
        field: Field,
        /// Loaded text
        text: String,
    },
    /// Append to a list field unless already present
    Append {
        /// List field
        field: Field,
        /// Entry to add
        value: String,
    },
    /// Replace the citation
    SetCitation {
        /// Bibliography key
        bibkey: String,
        /// Optional page
        page: Option<String>,
    },
    /// Replace the dates
    SetDates {
        /// Year
        year: String,
        /// Optional era
        era: Option<String>,
    },
    /// Edit the existing citation's sub-fields, or create it when absent
    UpdateCitation {
        /// Bibliography key; empty keeps the current one
        bibkey: String,
        /// Page; `None` keeps the current one
        page: Option<String>,
    },
    /// Edit the existing dates' sub-fields, or create them when absent
    UpdateDates {
        /// Year; empty keeps the current one
        year: String,
        /// Era; `None` keeps the current one
        era: Option<String>,
    },
}

/// Which pass an edit runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pass {
    /// Runs first
    Destructive,
    /// Runs second
    Additive,
}

impl Edit {
    /// The pass this edit belongs to
    pub fn pass(&self) -> Pass {
        match self {
            Edit::Delete(_) | Edit::Reset(_) | Edit::RemoveEntries { .. } => Pass::Destructive,
            _ => Pass::Additive,
        }
    }

    /// Apply this edit on its own, ignoring pass order.
    pub fn apply_to(&self, record: &mut Record) -> Result<()> {
        match self {
            Edit::Delete(field) => {
                record.delete_field(*field)?;
            }
            Edit::Reset(field) => record.reset_list_field(*field)?,
            Edit::RemoveEntries { field, positions } => {
                record.delete_list_entries(*field, positions)?;
            }
            Edit::Set { field, value } => record.set_field(*field, value.as_str())?,
            Edit::Load { field, text } => record.load_field(*field, text)?,
            Edit::Append { field, value } => {
                record.append_list_entry(*field, value.as_str())?;
            }
            Edit::SetCitation { bibkey, page } => {
                record.set_citation(bibkey.as_str(), page.clone())?
            }
            Edit::SetDates { year, era } => record.set_dates(year.as_str(), era.clone())?,
            Edit::UpdateCitation { bibkey, page } => {
                if record.has_citation() {
                    record.set_cite_bibkey(bibkey)?;
                    if let Some(page) = page {
                        record.set_cite_page(page)?;
                    }
                } else {
                    record.set_citation(bibkey.as_str(), page.clone())?;
                }
            }
            Edit::UpdateDates { year, era } => {
                if record.has_dates() {
                    record.set_dates_year(year)?;
                    if let Some(era) = era {
                        record.set_dates_era(era)?;
                    }
                } else {
                    record.set_dates(year.as_str(), era.clone())?;
                }
            }
        }
        Ok(())
    }
}

/// Order edits for execution: destructive first, then additive, each group
/// in the order given.
pub fn plan<I>(edits: I) -> Vec<Edit>
where
    I: IntoIterator<Item = Edit>,
{
    let mut edits: Vec<Edit> = edits.into_iter().collect();
    edits.sort_by_key(Edit::pass);
    edits
}

/// Apply a batch of edits to a record in pass order.
///
/// Stops at the first failing edit. Edits before it stay applied and the
/// record is left poisoned.
pub fn apply_edits<I>(record: &mut Record, edits: I) -> Result<()>
where
    I: IntoIterator<Item = Edit>,
{
    for edit in plan(edits) {
        tracing::debug!(?edit, "applying edit");
        edit.apply_to(record)?;
    }
    Ok(())
}
