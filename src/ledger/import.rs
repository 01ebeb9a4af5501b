use crate::error::LedgerError;
use crate::ledger::format::{
    RecordFields, download_links, render_category_header, render_record, set_total_tracks,
    total_tracks,
};
use crate::ledger::util::write_atomic;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// One scraped track as delivered by the external source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub title: String,
    pub artist: String,
    pub preview_link: String,
    pub download_link: String,
}

impl ImportRecord {
    fn fields(&self) -> RecordFields<'_> {
        RecordFields {
            title: &self.title,
            artist: &self.artist,
            preview_link: &self.preview_link,
            download_link: &self.download_link,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub category: String,
    pub fresh: Vec<ImportRecord>,
    pub duplicates: Vec<ImportRecord>,
    pub existing_links: usize,
    pub previous_total: u64,
}

impl ImportPlan {
    pub fn new_total(&self) -> u64 {
        self.previous_total + self.fresh.len() as u64
    }
}

/// Reads the scraped track list. A missing file or content that is not a
/// JSON track array is a [`LedgerError`]; other I/O failures propagate.
pub fn load_source(path: &Path) -> Result<Vec<ImportRecord>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(LedgerError::SourceMissing(path.to_path_buf()).into());
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read import source {}", path.display()));
        }
    };
    let records: Vec<ImportRecord> =
        serde_json::from_slice(&raw).map_err(|err| LedgerError::SourceMalformed {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    tracing::info!(path = %path.display(), count = records.len(), "loaded import source");
    Ok(records)
}

pub fn existing_download_links(ledger: &str) -> HashSet<&str> {
    download_links(ledger).collect()
}

/// Splits `records` into fresh and already-known tracks by exact download
/// link match against the ledger. Input order is kept.
pub fn plan_import(
    ledger: &str,
    records: Vec<ImportRecord>,
    category: &str,
) -> Result<ImportPlan, LedgerError> {
    let previous_total = total_tracks(ledger)?.unwrap_or(0);
    let existing = existing_download_links(ledger);
    let (duplicates, fresh): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| existing.contains(r.download_link.as_str()));

    tracing::debug!(
        existing = existing.len(),
        fresh = fresh.len(),
        duplicates = duplicates.len(),
        "planned import"
    );

    Ok(ImportPlan {
        category: category.to_string(),
        fresh,
        duplicates,
        existing_links: existing.len(),
        previous_total,
    })
}

/// Ledger text with the counter bumped and the fresh tracks appended as one
/// category block.
pub fn render_import(ledger: &str, plan: &ImportPlan) -> String {
    let mut out = set_total_tracks(ledger, plan.new_total());
    out.push_str(&render_category_header(&plan.category, plan.fresh.len()));
    for record in &plan.fresh {
        out.push_str(&render_record(&record.fields()));
    }
    out
}

pub fn apply_import(ledger_path: &Path, ledger: &str, plan: &ImportPlan) -> Result<()> {
    if plan.fresh.is_empty() {
        return Err(LedgerError::NothingToImport(plan.duplicates.len()).into());
    }
    let updated = render_import(ledger, plan);
    write_atomic(ledger_path, updated.as_bytes())?;
    tracing::info!(
        path = %ledger_path.display(),
        added = plan.fresh.len(),
        total = plan.new_total(),
        "appended tracks to ledger"
    );
    Ok(())
}
