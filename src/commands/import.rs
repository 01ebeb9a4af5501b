use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, absorb};
use crate::error::LedgerError;
use crate::ledger::config::LedgerConfig;
use crate::ledger::import::{self, ImportPlan};
use crate::ledger::parse::read_ledger_text;
use crate::ledger::paths::LedgerPaths;

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub source: Option<PathBuf>,
    pub category: Option<String>,
    pub assume_yes: bool,
    pub dry_run: bool,
}

pub fn run(
    paths: &LedgerPaths,
    config: &LedgerConfig,
    opts: &ImportOptions,
    confirm: impl FnOnce(&ImportPlan) -> Result<bool>,
) -> Result<CommandReport> {
    let mut report = CommandReport::new("import");
    let source = opts
        .source
        .clone()
        .unwrap_or_else(|| paths.source_file.clone());
    let category = opts
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(config.import.category.as_str());

    report.detail(format!("source={}", source.display()));
    report.detail(format!("ledger={}", paths.ledger_file.display()));
    report.detail(format!("category={category}"));

    if category.contains('(') || category.contains('\n') {
        report.issue(format!(
            "invalid category `{category}`: must not contain `(` or line breaks"
        ));
        return Ok(report);
    }

    let records = match import::load_source(&source) {
        Ok(records) => records,
        Err(err) => {
            absorb(&mut report, err)?;
            return Ok(report);
        }
    };
    if records.is_empty() {
        absorb(&mut report, LedgerError::SourceEmpty(source).into())?;
        return Ok(report);
    }
    report.detail(format!("source_tracks={}", records.len()));
    if let (Some(first), Some(last)) = (records.first(), records.last()) {
        report.detail(format!("first_track={}", first.title));
        if records.len() > 1 {
            report.detail(format!("last_track={}", last.title));
        }
    }

    let ledger = match read_ledger_text(&paths.ledger_file) {
        Ok(text) => text,
        Err(err) => {
            absorb(&mut report, err)?;
            return Ok(report);
        }
    };

    let plan = match import::plan_import(&ledger, records, category) {
        Ok(plan) => plan,
        Err(err) => {
            absorb(&mut report, err.into())?;
            return Ok(report);
        }
    };
    report.detail(format!("existing_links={}", plan.existing_links));
    report.detail(format!("duplicates={}", plan.duplicates.len()));
    report.detail(format!("new_tracks={}", plan.fresh.len()));

    if plan.fresh.is_empty() {
        absorb(
            &mut report,
            LedgerError::NothingToImport(plan.duplicates.len()).into(),
        )?;
        return Ok(report);
    }

    if opts.dry_run {
        report.detail(format!("previous_total={}", plan.previous_total));
        report.detail(format!("new_total={}", plan.new_total()));
        report.detail("dry-run: ledger not written".to_string());
        return Ok(report);
    }

    if !opts.assume_yes && !confirm(&plan)? {
        absorb(&mut report, LedgerError::Declined.into())?;
        return Ok(report);
    }

    if let Err(err) = import::apply_import(&paths.ledger_file, &ledger, &plan) {
        absorb(&mut report, err)?;
        return Ok(report);
    }
    report.detail(format!("previous_total={}", plan.previous_total));
    report.detail(format!("new_total={}", plan.new_total()));
    report.detail(format!("added={}", plan.fresh.len()));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const LEDGER: &str = "Total Tracks: 1

CATEGORY: Amapiano (1 tracks)
--------------------------------------------------
Title: Old
Artist: A
Preview Link: https://p/old
Download Link: https://d/old

";

    const SOURCE: &str = r#"[
  {"title": "Old", "artist": "A", "previewLink": "https://p/old", "downloadLink": "https://d/old"},
  {"title": "New", "artist": "B", "previewLink": "https://p/new", "downloadLink": "https://d/new"}
]"#;

    fn fixture() -> (tempfile::TempDir, LedgerPaths) {
        let tmp = tempdir().expect("tempdir");
        let paths = LedgerPaths::under(tmp.path());
        fs::write(&paths.ledger_file, LEDGER).expect("write ledger");
        fs::write(&paths.source_file, SOURCE).expect("write source");
        (tmp, paths)
    }

    #[test]
    fn import_is_idempotent() {
        let (_tmp, paths) = fixture();
        let cfg = LedgerConfig::default();
        let opts = ImportOptions {
            assume_yes: true,
            ..ImportOptions::default()
        };

        let first = run(&paths, &cfg, &opts, |_| Ok(true)).expect("first run");
        assert!(first.ok, "{:?}", first.issues);
        let after_first = fs::read_to_string(&paths.ledger_file).expect("read");
        assert!(after_first.starts_with("Total Tracks: 2\n"));
        assert!(after_first.contains("CATEGORY: Remix & Mashups (1 tracks)"));

        let second = run(&paths, &cfg, &opts, |_| Ok(true)).expect("second run");
        assert!(!second.ok);
        assert!(second.issues[0].contains("no new tracks"));
        assert_eq!(
            fs::read_to_string(&paths.ledger_file).expect("read"),
            after_first
        );
    }

    #[test]
    fn declined_prompt_leaves_ledger() {
        let (_tmp, paths) = fixture();
        let report = run(
            &paths,
            &LedgerConfig::default(),
            &ImportOptions::default(),
            |plan| {
                assert_eq!(plan.fresh.len(), 1);
                Ok(false)
            },
        )
        .expect("run");
        assert!(!report.ok);
        assert_eq!(report.issues, vec!["aborted by operator"]);
        assert_eq!(fs::read_to_string(&paths.ledger_file).expect("read"), LEDGER);
    }

    #[test]
    fn missing_and_empty_sources_abort() {
        let (_tmp, paths) = fixture();
        fs::remove_file(&paths.source_file).expect("remove source");
        let report = run(
            &paths,
            &LedgerConfig::default(),
            &ImportOptions::default(),
            |_| Ok(true),
        )
        .expect("run");
        assert!(report.issues[0].contains("import source not found"));

        fs::write(&paths.source_file, "[]").expect("write empty");
        let report = run(
            &paths,
            &LedgerConfig::default(),
            &ImportOptions::default(),
            |_| Ok(true),
        )
        .expect("run");
        assert!(report.issues[0].contains("contains no tracks"));
        assert_eq!(fs::read_to_string(&paths.ledger_file).expect("read"), LEDGER);
    }

    #[test]
    fn category_override_is_used() {
        let (_tmp, paths) = fixture();
        let opts = ImportOptions {
            category: Some("Club Edits 2025".to_string()),
            assume_yes: true,
            ..ImportOptions::default()
        };
        let report = run(&paths, &LedgerConfig::default(), &opts, |_| Ok(true)).expect("run");
        assert!(report.ok);
        let ledger = fs::read_to_string(&paths.ledger_file).expect("read");
        assert!(ledger.contains("CATEGORY: Club Edits 2025 (1 tracks)"));
    }
}
