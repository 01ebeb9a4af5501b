use anyhow::Result;
use std::env;
use std::path::Path;

use crate::commands::CommandReport;
use crate::ledger::config::{CONFIG_ENV_KEYS, LedgerConfig};
use crate::ledger::paths::{LedgerPaths, PATH_ENV_KEYS};
use crate::logging::LOG_ENV;

const ENV_PREFIX: &str = "TRACKLEDGER_";

fn is_known_env_key(key: &str) -> bool {
    key == LOG_ENV || PATH_ENV_KEYS.contains(&key) || CONFIG_ENV_KEYS.contains(&key)
}

fn unknown_env_keys<I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = keys
        .into_iter()
        .filter(|key| key.starts_with(ENV_PREFIX) && !is_known_env_key(key))
        .collect();
    out.sort();
    out
}

fn describe(path: &Path) -> String {
    let state = if path.is_file() { "present" } else { "missing" };
    format!("{} ({state})", path.display())
}

pub fn run(paths: &LedgerPaths, config: &LedgerConfig) -> Result<CommandReport> {
    let mut report = CommandReport::new("status");

    report.detail(format!("home={}", paths.home.display()));
    report.detail(format!("ledger={}", describe(&paths.ledger_file)));
    report.detail(format!("source={}", describe(&paths.source_file)));
    report.detail(format!("catalog={}", describe(&paths.catalog_file)));
    report.detail(format!(
        "backup={}",
        describe(&paths.backup_file(&config.repair.backup_suffix))
    ));
    report.detail(format!("import.category={}", config.import.category));
    report.detail(format!("convert.parse_mode={}", config.convert.parse_mode));
    report.detail(format!(
        "convert.default_year={}",
        config.convert.default_year
    ));
    report.detail(format!("convert.date_added={}", config.convert.date_added));
    report.detail(format!(
        "repair.bad_artists={}",
        config.repair.bad_artists.join(", ")
    ));

    if !paths.ledger_file.is_file() {
        report.issue(format!(
            "missing ledger file ({}); set TRACKLEDGER_LEDGER or TRACKLEDGER_HOME",
            paths.ledger_file.display()
        ));
    }
    let keys = env::vars_os().filter_map(|(k, _)| k.into_string().ok());
    for key in unknown_env_keys(keys) {
        report.issue(format!("unknown environment variable {key}"));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_keys_are_known() {
        for key in [
            "HOME",
            "LEDGER",
            "SOURCE",
            "CATALOG",
            "CONFIG_PATH",
            "IMPORT_CATEGORY",
            "DEFAULT_YEAR",
            "DATE_ADDED",
            "PARSE_MODE",
            "BAD_ARTISTS",
            "BACKUP_SUFFIX",
            "LOG",
        ] {
            let full = format!("{ENV_PREFIX}{key}");
            assert!(is_known_env_key(&full), "{full} is not recognised");
        }
    }

    #[test]
    fn flags_only_unknown_prefixed_keys() {
        let typo = format!("{ENV_PREFIX}LEGDER");
        let known = format!("{ENV_PREFIX}LEDGER");
        let got = unknown_env_keys(vec![typo.clone(), known, "PATH".to_string()]);
        assert_eq!(got, vec![typo]);
    }
}
