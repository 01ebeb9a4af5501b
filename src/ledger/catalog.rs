use crate::ledger::parse::LedgerTrack;
use crate::ledger::util::write_atomic;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"20[0-9]{2}").expect("valid year regex"));

pub const ORIGINAL_VERSION_ID: &str = "v1";
pub const ORIGINAL_VERSION_TYPE: &str = "Original";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackVersion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub download_url: String,
}

/// One catalog row per unique download link. Identity is left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub artist: String,
    pub title: String,
    /// Category of the first occurrence.
    pub genre: String,
    pub category: BTreeSet<String>,
    pub bpm: u32,
    pub year: u32,
    pub preview_url: String,
    pub versions: Vec<TrackVersion>,
    pub date_added: String,
}

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub default_year: u32,
    pub date_added: String,
}

fn first_year(text: &str) -> Option<u32> {
    YEAR.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Category name first, then title and artist, then the default.
pub fn resolve_year(category: &str, title: &str, artist: &str, default_year: u32) -> u32 {
    first_year(category)
        .or_else(|| first_year(&format!("{title} {artist}")))
        .unwrap_or(default_year)
}

fn new_entry(track: &LedgerTrack, opts: &CatalogOptions) -> CatalogEntry {
    CatalogEntry {
        artist: track.artist.clone(),
        title: track.title.clone(),
        genre: track.category.clone(),
        category: BTreeSet::new(),
        bpm: 0,
        year: resolve_year(
            &track.category,
            &track.title,
            &track.artist,
            opts.default_year,
        ),
        preview_url: track.preview_url.clone(),
        versions: vec![TrackVersion {
            id: ORIGINAL_VERSION_ID.to_string(),
            kind: ORIGINAL_VERSION_TYPE.to_string(),
            download_url: track.download_url.clone(),
        }],
        date_added: opts.date_added.clone(),
    }
}

/// Merges ledger records by download link. The first occurrence fixes every
/// field except `category`, which collects the category of each occurrence.
/// Output order is first-occurrence order.
pub fn build_catalog(tracks: &[LedgerTrack], opts: &CatalogOptions) -> Vec<CatalogEntry> {
    let mut entries: Vec<CatalogEntry> = Vec::new();
    let mut by_link: HashMap<&str, usize> = HashMap::new();

    for track in tracks {
        if let Some(&idx) = by_link.get(track.download_url.as_str()) {
            tracing::debug!(
                line = track.line,
                link = %track.download_url,
                category = %track.category,
                "merged repeated download link"
            );
            entries[idx].category.insert(track.category.clone());
            continue;
        }
        let mut entry = new_entry(track, opts);
        entry.category.insert(track.category.clone());
        by_link.insert(track.download_url.as_str(), entries.len());
        entries.push(entry);
    }

    entries
}

/// Number of catalog entries filed under each category.
pub fn category_counts(entries: &[CatalogEntry]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        for category in &entry.category {
            *counts.entry(category.clone()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn render_catalog(entries: &[CatalogEntry]) -> Result<String> {
    let data = serde_json::to_string_pretty(entries)?;
    Ok(format!("{data}\n"))
}

pub fn write_catalog(path: &Path, entries: &[CatalogEntry]) -> Result<usize> {
    let rendered = render_catalog(entries)?;
    write_atomic(path, rendered.as_bytes())?;
    tracing::info!(path = %path.display(), entries = entries.len(), "wrote catalog");
    Ok(rendered.len())
}
