use crate::error::LedgerError;
use crate::ledger::config::ParseMode;
use crate::ledger::format::{
    ARTIST_PREFIX, CATEGORY_PREFIX, DOWNLOAD_PREFIX, PREVIEW_PREFIX, TITLE_PREFIX,
    category_name, declared_count, field_value, total_tracks,
};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Category of records that appear before any `CATEGORY:` header.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBlock {
    pub name: String,
    pub declared: Option<usize>,
    /// 1-based line of the `CATEGORY:` header.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTrack {
    pub category: String,
    /// Index into [`ParsedLedger::blocks`]; `None` before the first header.
    pub block: Option<usize>,
    pub title: String,
    pub artist: String,
    pub preview_url: String,
    pub download_url: String,
    /// 1-based line of the `Title:` field.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedLedger {
    pub total_tracks: Option<u64>,
    pub blocks: Vec<CategoryBlock>,
    pub tracks: Vec<LedgerTrack>,
    pub rejected: Vec<RejectedRecord>,
}

const FOLLOWING_FIELDS: [&str; 3] = [ARTIST_PREFIX, PREVIEW_PREFIX, DOWNLOAD_PREFIX];

fn is_boundary(line: &str) -> bool {
    line.is_empty() || line.starts_with(TITLE_PREFIX) || line.starts_with(CATEGORY_PREFIX)
}

struct Reader<'a> {
    lines: Vec<&'a str>,
    mode: ParseMode,
    category: String,
    block: Option<usize>,
    out: ParsedLedger,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str, mode: ParseMode) -> Self {
        let mut reader = Self {
            lines: text.lines().map(str::trim).collect(),
            mode,
            category: UNCATEGORIZED.to_string(),
            block: None,
            out: ParsedLedger::default(),
        };
        match total_tracks(text) {
            Ok(total) => reader.out.total_tracks = total,
            Err(err) => {
                let line = match &err {
                    LedgerError::HeaderMalformed { line, .. } => *line,
                    _ => 1,
                };
                reader.reject(line - 1, err.to_string());
            }
        }
        reader
    }

    fn line(&self, idx: usize) -> &'a str {
        self.lines.get(idx).copied().unwrap_or("")
    }

    fn run(mut self) -> ParsedLedger {
        let mut i = 0usize;
        while i < self.lines.len() {
            let line = self.lines[i];
            if line.starts_with(CATEGORY_PREFIX) {
                self.enter_category(i, line);
                i += 1;
            } else if line.starts_with(TITLE_PREFIX) {
                i = match self.mode {
                    ParseMode::Positional => self.read_positional(i),
                    ParseMode::Validating => self.read_validated(i),
                };
            } else {
                i += 1;
            }
        }
        self.out
    }

    fn enter_category(&mut self, idx: usize, line: &str) {
        self.category = category_name(line);
        self.block = Some(self.out.blocks.len());
        self.out.blocks.push(CategoryBlock {
            name: self.category.clone(),
            declared: declared_count(line),
            line: idx + 1,
        });
    }

    fn push_track(&mut self, idx: usize, fields: [&str; 4]) {
        let [title, artist, preview, download] = fields;
        self.out.tracks.push(LedgerTrack {
            category: self.category.clone(),
            block: self.block,
            title: title.to_string(),
            artist: artist.to_string(),
            preview_url: preview.to_string(),
            download_url: download.to_string(),
            line: idx + 1,
        });
    }

    /// Takes the next four lines whatever they contain. A record with a
    /// missing field shifts every record after it.
    fn read_positional(&mut self, idx: usize) -> usize {
        let fields = [
            field_value(self.line(idx), TITLE_PREFIX),
            field_value(self.line(idx + 1), ARTIST_PREFIX),
            field_value(self.line(idx + 2), PREVIEW_PREFIX),
            field_value(self.line(idx + 3), DOWNLOAD_PREFIX),
        ];
        self.push_track(idx, fields);
        idx + 4
    }

    fn read_validated(&mut self, idx: usize) -> usize {
        for (offset, prefix) in FOLLOWING_FIELDS.iter().enumerate() {
            let at = idx + offset + 1;
            if !self.line(at).starts_with(prefix) {
                self.reject(idx, format!("line {}: expected `{prefix}`", at + 1));
                return self.resync(idx + 1);
            }
        }

        let fields = [
            field_value(self.line(idx), TITLE_PREFIX),
            field_value(self.line(idx + 1), ARTIST_PREFIX),
            field_value(self.line(idx + 2), PREVIEW_PREFIX),
            field_value(self.line(idx + 3), DOWNLOAD_PREFIX),
        ];
        let names = [TITLE_PREFIX, ARTIST_PREFIX, PREVIEW_PREFIX, DOWNLOAD_PREFIX];
        if let Some(pos) = fields.iter().position(|v| v.is_empty()) {
            self.reject(idx, format!("empty `{}` field", names[pos]));
            return idx + 4;
        }

        self.push_track(idx, fields);
        idx + 4
    }

    fn resync(&self, mut idx: usize) -> usize {
        while idx < self.lines.len() && !is_boundary(self.lines[idx]) {
            idx += 1;
        }
        idx
    }

    fn reject(&mut self, idx: usize, reason: String) {
        tracing::warn!(line = idx + 1, %reason, "rejected ledger record");
        self.out.rejected.push(RejectedRecord {
            line: idx + 1,
            reason,
        });
    }
}

pub fn parse_ledger(text: &str, mode: ParseMode) -> ParsedLedger {
    Reader::new(text, mode).run()
}

pub fn read_ledger_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(LedgerError::LedgerMissing(path.to_path_buf()).into());
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn read_ledger(path: &Path, mode: ParseMode) -> Result<ParsedLedger> {
    let text = read_ledger_text(path)?;
    let parsed = parse_ledger(&text, mode);
    tracing::debug!(
        path = %path.display(),
        blocks = parsed.blocks.len(),
        tracks = parsed.tracks.len(),
        rejected = parsed.rejected.len(),
        "parsed ledger"
    );
    Ok(parsed)
}
