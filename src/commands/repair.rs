use anyhow::Result;
use std::collections::BTreeSet;

use crate::commands::{CommandReport, absorb};
use crate::ledger::config::LedgerConfig;
use crate::ledger::paths::LedgerPaths;
use crate::ledger::repair::repair_ledger;

#[derive(Debug, Clone, Default)]
pub struct RepairOptions {
    /// Replaces the configured denylist when non-empty.
    pub bad_artists: Vec<String>,
    pub dry_run: bool,
}

pub fn run(
    paths: &LedgerPaths,
    config: &LedgerConfig,
    opts: &RepairOptions,
) -> Result<CommandReport> {
    let mut report = CommandReport::new("repair");
    let source = if opts.bad_artists.is_empty() {
        &config.repair.bad_artists
    } else {
        &opts.bad_artists
    };
    let denylist: BTreeSet<String> = source
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    let backup = paths.backup_file(&config.repair.backup_suffix);

    report.detail(format!("ledger={}", paths.ledger_file.display()));
    report.detail(format!(
        "denylist={}",
        denylist.iter().cloned().collect::<Vec<_>>().join(", ")
    ));
    if opts.dry_run {
        report.detail("repair.dry_run=true".to_string());
    }

    let out = match repair_ledger(&paths.ledger_file, &backup, &denylist, opts.dry_run) {
        Ok(out) => out,
        Err(err) => {
            absorb(&mut report, err)?;
            return Ok(report);
        }
    };

    if let (Some(path), Some(digest)) = (&out.backup_path, &out.backup_sha256) {
        report.detail(format!("backup={}", path.display()));
        report.detail(format!("backup_sha256={digest}"));
    }
    report.detail(format!("scanned={}", out.scanned));
    report.detail(format!("repaired={}", out.repaired.len()));
    for fix in &out.repaired {
        report.detail(format!(
            "line {}: artist `{}` -> `{}`, title -> `{}`",
            fix.line, fix.old_artist, fix.artist, fix.title
        ));
    }
    if opts.dry_run {
        report.detail("dry-run: ledger not written".to_string());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const LEDGER: &str = "CATEGORY: Afro House (2 tracks)
--------------------------------------------------
Title: DJX - Summer Vibes - Extended Mix
Artist: Afro House
Preview Link: https://p/1
Download Link: https://d/1

Title: Sunrise - Dub
Artist: Gqom
Preview Link: https://p/2
Download Link: https://d/2

";

    #[test]
    fn uses_configured_denylist_and_suffix() {
        let tmp = tempdir().expect("tempdir");
        let paths = LedgerPaths::under(tmp.path());
        fs::write(&paths.ledger_file, LEDGER).expect("write ledger");
        let mut cfg = LedgerConfig::default();
        cfg.repair.backup_suffix = ".orig".to_string();

        let report = run(&paths, &cfg, &RepairOptions::default()).expect("repair");
        assert!(report.ok, "{:?}", report.issues);
        assert!(report.details.contains(&"repaired=1".to_string()));

        let backup = tmp.path().join("r2_downloads_list.txt.orig");
        assert_eq!(fs::read_to_string(backup).expect("backup"), LEDGER);
        let ledger = fs::read_to_string(&paths.ledger_file).expect("ledger");
        assert!(ledger.contains("Title: Summer Vibes - Extended Mix\nArtist: DJX\n"));
        assert!(ledger.contains("Title: Sunrise - Dub\nArtist: Gqom\n"));
    }

    #[test]
    fn flag_denylist_replaces_config() {
        let tmp = tempdir().expect("tempdir");
        let paths = LedgerPaths::under(tmp.path());
        fs::write(&paths.ledger_file, LEDGER).expect("write ledger");
        let opts = RepairOptions {
            bad_artists: vec!["Gqom".to_string()],
            dry_run: false,
        };

        let report = run(&paths, &LedgerConfig::default(), &opts).expect("repair");
        assert!(report.details.contains(&"repaired=1".to_string()));
        let ledger = fs::read_to_string(&paths.ledger_file).expect("ledger");
        assert!(ledger.contains("Title: Dub\nArtist: Sunrise\n"));
        assert!(ledger.contains("Artist: Afro House\n"));
    }

    #[test]
    fn missing_ledger_is_an_issue_without_backup() {
        let tmp = tempdir().expect("tempdir");
        let paths = LedgerPaths::under(tmp.path());
        let report = run(&paths, &LedgerConfig::default(), &RepairOptions::default())
            .expect("repair");
        assert!(!report.ok);
        assert!(!paths.backup_file(".bak").exists());
    }
}
