use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_LEDGER_FILE: &str = "r2_downloads_list.txt";
pub const DEFAULT_SOURCE_FILE: &str = "remix_tracks_data.json";
pub const DEFAULT_CATALOG_FILE: &str = "public/r2_tracks.json";

/// Environment variables read by [`resolve_paths`].
pub const PATH_ENV_KEYS: &[&str] = &[
    "TRACKLEDGER_HOME",
    "TRACKLEDGER_LEDGER",
    "TRACKLEDGER_SOURCE",
    "TRACKLEDGER_CATALOG",
];

#[derive(Debug, Clone)]
pub struct LedgerPaths {
    pub home: PathBuf,
    pub ledger_file: PathBuf,
    pub source_file: PathBuf,
    pub catalog_file: PathBuf,
}

impl LedgerPaths {
    pub fn under(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
            ledger_file: home.join(DEFAULT_LEDGER_FILE),
            source_file: home.join(DEFAULT_SOURCE_FILE),
            catalog_file: home.join(DEFAULT_CATALOG_FILE),
        }
    }

    /// `r2_downloads_list.txt` + `.bak` -> `r2_downloads_list.txt.bak`, next to the ledger.
    pub fn backup_file(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .ledger_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_LEDGER_FILE.into());
        name.push(suffix);
        self.ledger_file.with_file_name(name)
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

fn relative_to(home: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        home.join(path)
    }
}

pub fn resolve_paths() -> Result<LedgerPaths> {
    let home = match env_path("TRACKLEDGER_HOME") {
        Some(home) => home,
        None => env::current_dir().context("current directory could not be resolved")?,
    };

    let mut paths = LedgerPaths::under(&home);
    if let Some(ledger) = env_path("TRACKLEDGER_LEDGER") {
        paths.ledger_file = relative_to(&home, ledger);
    }
    if let Some(source) = env_path("TRACKLEDGER_SOURCE") {
        paths.source_file = relative_to(&home, source);
    }
    if let Some(catalog) = env_path("TRACKLEDGER_CATALOG") {
        paths.catalog_file = relative_to(&home, catalog);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_layout_under_home() {
        let paths = LedgerPaths::under(Path::new("/srv/music"));
        assert_eq!(
            paths.ledger_file,
            PathBuf::from("/srv/music/r2_downloads_list.txt")
        );
        assert_eq!(
            paths.catalog_file,
            PathBuf::from("/srv/music/public/r2_tracks.json")
        );
    }

    #[test]
    fn backup_sits_next_to_ledger_with_suffix() {
        let mut paths = LedgerPaths::under(Path::new("/srv/music"));
        paths.ledger_file = PathBuf::from("/data/ledger.txt");
        assert_eq!(
            paths.backup_file(".bak"),
            PathBuf::from("/data/ledger.txt.bak")
        );
    }

    #[test]
    fn relative_overrides_resolve_against_home() {
        let home = Path::new("/srv/music");
        assert_eq!(
            relative_to(home, PathBuf::from("out/catalog.json")),
            PathBuf::from("/srv/music/out/catalog.json")
        );
        assert_eq!(
            relative_to(home, PathBuf::from("/abs/catalog.json")),
            PathBuf::from("/abs/catalog.json")
        );
    }
}
