use std::path::PathBuf;

use thiserror::Error;

/// Anticipated failures. Commands turn these into report issues; anything
/// else bubbles up through `anyhow` and ends the process in `main`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger not found: {}", .0.display())]
    LedgerMissing(PathBuf),
    #[error("import source not found: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("import source {} is not a valid track list: {reason}", .path.display())]
    SourceMalformed { path: PathBuf, reason: String },
    #[error("import source {} contains no tracks", .0.display())]
    SourceEmpty(PathBuf),
    #[error("ledger line {line}: `Total Tracks: {value}` is not a valid track count")]
    HeaderMalformed { line: usize, value: String },
    #[error("no new tracks to add; all {0} already exist in the ledger")]
    NothingToImport(usize),
    #[error("aborted by operator")]
    Declined,
}
