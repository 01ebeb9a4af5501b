use anyhow::Result;

use crate::commands::{CommandReport, absorb};
use crate::ledger::catalog::{CatalogOptions, build_catalog};
use crate::ledger::check::check_ledger;
use crate::ledger::config::{LedgerConfig, ParseMode};
use crate::ledger::parse::read_ledger;
use crate::ledger::paths::LedgerPaths;

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub parse_mode: Option<ParseMode>,
}

pub fn run(
    paths: &LedgerPaths,
    config: &LedgerConfig,
    opts: &CheckOptions,
) -> Result<CommandReport> {
    let mut report = CommandReport::new("check");
    let mode = opts.parse_mode.unwrap_or(config.convert.parse_mode);
    report.detail(format!("ledger={}", paths.ledger_file.display()));
    report.detail(format!("parse_mode={mode}"));

    let parsed = match read_ledger(&paths.ledger_file, mode) {
        Ok(parsed) => parsed,
        Err(err) => {
            absorb(&mut report, err)?;
            return Ok(report);
        }
    };
    let catalog = build_catalog(
        &parsed.tracks,
        &CatalogOptions {
            default_year: config.convert.default_year,
            date_added: config.convert.date_added.clone(),
        },
    );
    let check = check_ledger(&parsed, &catalog);

    match check.total_header {
        Some(total) => report.detail(format!("total_tracks_header={total}")),
        None => report.detail("total_tracks_header=missing".to_string()),
    }
    report.detail(format!("records={}", check.records));
    report.detail(format!("unique_links={}", check.unique_links));
    report.detail(format!("categories={}", check.blocks.len()));

    if !check.header_matches() {
        report.issue(format!(
            "Total Tracks header says {} but {} records were parsed",
            check.total_header.unwrap_or(0),
            check.records
        ));
    }
    for block in &check.blocks {
        if !block.consistent() {
            report.issue(format!(
                "category `{}` (line {}) declares {} tracks, found {}",
                block.name,
                block.line,
                block.declared.unwrap_or(0),
                block.found
            ));
        }
    }
    for rejected in &check.rejected {
        report.issue(format!(
            "malformed record at line {}: {}",
            rejected.line, rejected.reason
        ));
    }
    for drift in &check.drift {
        report.issue(format!(
            "category `{}` declares {} tracks but the catalog holds {}",
            drift.category, drift.declared, drift.in_catalog
        ));
    }

    Ok(report)
}
