use crate::ledger::catalog::{CatalogEntry, category_counts};
use crate::ledger::parse::{ParsedLedger, RejectedRecord};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTally {
    pub name: String,
    pub line: usize,
    pub declared: Option<usize>,
    pub found: usize,
}

impl BlockTally {
    pub fn consistent(&self) -> bool {
        self.declared.is_none_or(|declared| declared == self.found)
    }
}

/// Category whose declared header counts disagree with the merged catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDrift {
    pub category: String,
    pub declared: usize,
    pub in_catalog: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerCheck {
    pub total_header: Option<u64>,
    pub records: usize,
    pub unique_links: usize,
    pub blocks: Vec<BlockTally>,
    pub rejected: Vec<RejectedRecord>,
    pub drift: Vec<CatalogDrift>,
}

impl LedgerCheck {
    pub fn header_matches(&self) -> bool {
        self.total_header
            .is_none_or(|total| total == self.records as u64)
    }
}

pub fn check_ledger(parsed: &ParsedLedger, catalog: &[CatalogEntry]) -> LedgerCheck {
    let mut blocks: Vec<BlockTally> = parsed
        .blocks
        .iter()
        .map(|b| BlockTally {
            name: b.name.clone(),
            line: b.line,
            declared: b.declared,
            found: 0,
        })
        .collect();
    for track in &parsed.tracks {
        if let Some(idx) = track.block {
            blocks[idx].found += 1;
        }
    }

    let mut declared_by_name: BTreeMap<&str, usize> = BTreeMap::new();
    for block in &blocks {
        if let Some(declared) = block.declared {
            *declared_by_name.entry(block.name.as_str()).or_insert(0) += declared;
        }
    }
    let in_catalog = category_counts(catalog);
    let drift = declared_by_name
        .into_iter()
        .filter_map(|(name, declared)| {
            let found = in_catalog.get(name).copied().unwrap_or(0);
            (found != declared).then(|| CatalogDrift {
                category: name.to_string(),
                declared,
                in_catalog: found,
            })
        })
        .collect();

    let unique_links = parsed
        .tracks
        .iter()
        .map(|t| t.download_url.as_str())
        .collect::<HashSet<_>>()
        .len();

    LedgerCheck {
        total_header: parsed.total_tracks,
        records: parsed.tracks.len(),
        unique_links,
        blocks,
        rejected: parsed.rejected.clone(),
        drift,
    }
}
