use crate::ledger::format::{ARTIST_PREFIX, TITLE_PREFIX, field_value};
use crate::ledger::parse::read_ledger_text;
use crate::ledger::util::{write_atomic, write_backup};
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const TITLE_DELIMITER: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedRecord {
    /// 1-based line of the `Title:` field.
    pub line: usize,
    pub old_artist: String,
    pub artist: String,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct RepairOutcome {
    pub scanned: usize,
    pub repaired: Vec<RepairedRecord>,
    pub backup_path: Option<PathBuf>,
    pub backup_sha256: Option<String>,
    pub ledger_updated: bool,
}

/// `"DJX - Summer Vibes - Extended Mix"` -> `("DJX", "Summer Vibes - Extended Mix")`.
pub fn split_artist_title(title: &str) -> Option<(&str, &str)> {
    let (artist, rest) = title.split_once(TITLE_DELIMITER)?;
    let (artist, rest) = (artist.trim(), rest.trim());
    if artist.is_empty() || rest.is_empty() {
        return None;
    }
    Some((artist, rest))
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Rewrites `Title:`/`Artist:` pairs whose artist is a denylisted label and
/// whose title carries an `artist - title` pair. Every other byte is kept.
pub fn repair_text(
    content: &str,
    denylist: &BTreeSet<String>,
) -> (String, usize, Vec<RepairedRecord>) {
    let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_owned).collect();
    let mut scanned = 0usize;
    let mut repaired = Vec::new();

    for i in 0..lines.len() {
        if !lines[i].starts_with(TITLE_PREFIX) {
            continue;
        }
        let Some(artist_line) = lines.get(i + 1) else {
            continue;
        };
        if !artist_line.starts_with(ARTIST_PREFIX) {
            continue;
        }
        scanned += 1;

        let artist = field_value(artist_line, ARTIST_PREFIX);
        if !denylist.contains(artist) {
            continue;
        }
        let title = field_value(&lines[i], TITLE_PREFIX);
        let Some((new_artist, new_title)) = split_artist_title(title) else {
            tracing::debug!(line = i + 1, artist, title, "denylisted artist without delimiter");
            continue;
        };

        let record = RepairedRecord {
            line: i + 1,
            old_artist: artist.to_string(),
            artist: new_artist.to_string(),
            title: new_title.to_string(),
        };
        let title_line = format!("{TITLE_PREFIX} {}{}", record.title, line_ending(&lines[i]));
        let artist_line = format!(
            "{ARTIST_PREFIX} {}{}",
            record.artist,
            line_ending(&lines[i + 1])
        );
        lines[i] = title_line;
        lines[i + 1] = artist_line;
        repaired.push(record);
    }

    (lines.concat(), scanned, repaired)
}

/// Backs the ledger up, then rewrites it when anything changed. A dry run
/// touches neither file.
pub fn repair_ledger(
    ledger_path: &Path,
    backup_path: &Path,
    denylist: &BTreeSet<String>,
    dry_run: bool,
) -> Result<RepairOutcome> {
    let content = read_ledger_text(ledger_path)?;
    let (updated, scanned, repaired) = repair_text(&content, denylist);
    let mut out = RepairOutcome {
        scanned,
        repaired,
        ..RepairOutcome::default()
    };
    if dry_run {
        return Ok(out);
    }

    let digest = write_backup(ledger_path, backup_path)?;
    tracing::info!(backup = %backup_path.display(), sha256 = %digest, "ledger backup written");
    out.backup_path = Some(backup_path.to_path_buf());
    out.backup_sha256 = Some(digest);

    if !out.repaired.is_empty() {
        write_atomic(ledger_path, updated.as_bytes())?;
        out.ledger_updated = true;
        tracing::info!(
            path = %ledger_path.display(),
            repaired = out.repaired.len(),
            "ledger metadata repaired"
        );
    }
    Ok(out)
}
