use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, absorb};
use crate::ledger::catalog::{self, CatalogOptions};
use crate::ledger::config::{LedgerConfig, ParseMode};
use crate::ledger::parse::read_ledger;
use crate::ledger::paths::LedgerPaths;

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub output: Option<PathBuf>,
    pub parse_mode: Option<ParseMode>,
    pub dry_run: bool,
}

pub fn run(
    paths: &LedgerPaths,
    config: &LedgerConfig,
    opts: &ConvertOptions,
) -> Result<CommandReport> {
    let mut report = CommandReport::new("convert");
    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| paths.catalog_file.clone());
    let mode = opts.parse_mode.unwrap_or(config.convert.parse_mode);

    report.detail(format!("ledger={}", paths.ledger_file.display()));
    report.detail(format!("output={}", output.display()));
    report.detail(format!("parse_mode={mode}"));

    let parsed = match read_ledger(&paths.ledger_file, mode) {
        Ok(parsed) => parsed,
        Err(err) => {
            absorb(&mut report, err)?;
            return Ok(report);
        }
    };

    let entries = catalog::build_catalog(
        &parsed.tracks,
        &CatalogOptions {
            default_year: config.convert.default_year,
            date_added: config.convert.date_added.clone(),
        },
    );
    report.detail(format!("records={}", parsed.tracks.len()));
    report.detail(format!("unique_tracks={}", entries.len()));
    report.detail(format!(
        "merged_duplicates={}",
        parsed.tracks.len() - entries.len()
    ));
    if !parsed.rejected.is_empty() {
        report.detail(format!("rejected_records={}", parsed.rejected.len()));
        for rejected in &parsed.rejected {
            report.detail(format!(
                "warning: skipped record at line {}: {}",
                rejected.line, rejected.reason
            ));
        }
    }

    if opts.dry_run {
        report.detail("dry-run: catalog not written".to_string());
        return Ok(report);
    }

    let bytes = catalog::write_catalog(&output, &entries)?;
    report.detail(format!("catalog_bytes={bytes}"));
    Ok(report)
}
