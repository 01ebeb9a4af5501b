use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variables read by [`load_config`].
pub const CONFIG_ENV_KEYS: &[&str] = &[
    "TRACKLEDGER_CONFIG_PATH",
    "TRACKLEDGER_IMPORT_CATEGORY",
    "TRACKLEDGER_DEFAULT_YEAR",
    "TRACKLEDGER_DATE_ADDED",
    "TRACKLEDGER_PARSE_MODE",
    "TRACKLEDGER_BAD_ARTISTS",
    "TRACKLEDGER_BACKUP_SUFFIX",
];

/// How the ledger reader treats a `Title:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Check the field prefix at every offset; a broken record is rejected and
    /// the reader resumes at the next record boundary.
    #[default]
    Validating,
    /// Read the four lines after `Title:` by position, whatever they hold.
    Positional,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Positional => "positional",
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "validating" | "strict" => Ok(Self::Validating),
            "positional" | "lenient" => Ok(Self::Positional),
            other => Err(anyhow!(
                "invalid parse mode `{other}`: use `validating` or `positional`"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub category: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            category: "Remix & Mashups".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub default_year: u32,
    pub date_added: String,
    pub parse_mode: ParseMode,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            default_year: 2024,
            date_added: "2024-02-12T00:00:00Z".to_string(),
            parse_mode: ParseMode::Validating,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Genre labels that were scraped into the artist field.
    pub bad_artists: Vec<String>,
    pub backup_suffix: String,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            bad_artists: [
                "Afro House",
                "Club Edits",
                "Dancehall Remixes",
                "Amapiano",
                "Reggae Fussion",
                "HYPE EDITS",
            ]
            .into_iter()
            .map(ToOwned::to_owned)
            .collect(),
            backup_suffix: ".bak".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    pub import: ImportConfig,
    pub convert: ConvertConfig,
    pub repair: RepairConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLedgerConfig {
    import: Option<ImportConfig>,
    convert: Option<ConvertConfig>,
    repair: Option<RepairConfig>,
}

fn env_or_u32(var: &str, fallback: u32) -> u32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_csv(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        Err(_) => fallback.to_vec(),
    }
}

pub fn validate(cfg: &LedgerConfig) -> Result<()> {
    let category = cfg.import.category.trim();
    if category.is_empty() {
        return Err(anyhow!("invalid import category: cannot be empty"));
    }
    if category.contains('(') || category.contains('\n') {
        return Err(anyhow!(
            "invalid import category `{category}`: must not contain `(` or line breaks"
        ));
    }
    if !(1900..=2100).contains(&cfg.convert.default_year) {
        return Err(anyhow!(
            "invalid default year {}: require 1900 <= year <= 2100",
            cfg.convert.default_year
        ));
    }
    if chrono::DateTime::parse_from_rfc3339(&cfg.convert.date_added).is_err() {
        return Err(anyhow!(
            "invalid date_added `{}`: expected an RFC 3339 timestamp",
            cfg.convert.date_added
        ));
    }
    if cfg.repair.backup_suffix.trim().is_empty() {
        return Err(anyhow!("invalid backup suffix: cannot be empty"));
    }
    if cfg.repair.backup_suffix.contains(['/', '\\']) {
        return Err(anyhow!(
            "invalid backup suffix `{}`: must not contain path separators",
            cfg.repair.backup_suffix
        ));
    }
    Ok(())
}

fn resolve_config_path(home: &Path) -> Option<PathBuf> {
    if let Ok(custom) = env::var("TRACKLEDGER_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let local = home.join("trackledger.toml");
    if local.exists() {
        return Some(local);
    }
    Some(dirs::config_dir()?.join("trackledger").join("config.toml"))
}

fn merge_file_config(base: &mut LedgerConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialLedgerConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(import) = parsed.import {
        base.import = import;
    }
    if let Some(convert) = parsed.convert {
        base.convert = convert;
    }
    if let Some(repair) = parsed.repair {
        base.repair = repair;
    }
    Ok(())
}

fn apply_env_overrides(cfg: &mut LedgerConfig) -> Result<()> {
    cfg.import.category = env_or_string("TRACKLEDGER_IMPORT_CATEGORY", &cfg.import.category);
    cfg.convert.default_year = env_or_u32("TRACKLEDGER_DEFAULT_YEAR", cfg.convert.default_year);
    cfg.convert.date_added = env_or_string("TRACKLEDGER_DATE_ADDED", &cfg.convert.date_added);
    if let Ok(mode) = env::var("TRACKLEDGER_PARSE_MODE")
        && !mode.trim().is_empty()
    {
        cfg.convert.parse_mode = mode.parse()?;
    }
    cfg.repair.bad_artists = env_or_csv("TRACKLEDGER_BAD_ARTISTS", &cfg.repair.bad_artists);
    cfg.repair.backup_suffix =
        env_or_string("TRACKLEDGER_BACKUP_SUFFIX", &cfg.repair.backup_suffix);
    Ok(())
}

/// Defaults, then the TOML file, then `TRACKLEDGER_*` environment variables.
pub fn load_config(home: &Path) -> Result<LedgerConfig> {
    let mut cfg = LedgerConfig::default();
    if let Some(path) = resolve_config_path(home) {
        merge_file_config(&mut cfg, &path)?;
    }
    apply_env_overrides(&mut cfg)?;

    validate(&cfg)?;
    Ok(cfg)
}
