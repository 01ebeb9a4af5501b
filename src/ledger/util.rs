use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(bytes_sha256(&bytes))
}

pub fn bytes_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// Mode the replacement should carry: the current one when `path` exists,
/// otherwise world-readable. Temp files start out owner-only.
fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    }
}

/// Writes through a temporary file in the target directory, then renames it
/// over `path`. Parent directories are created and the target's permissions
/// survive the swap.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    if let Some(perms) = target_permissions(path) {
        tmp.as_file()
            .set_permissions(perms)
            .with_context(|| format!("failed to set permissions for {}", path.display()))?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Byte copy of `source` at `backup`, checked by digest. Returns the digest.
pub fn write_backup(source: &Path, backup: &Path) -> Result<String> {
    fs::copy(source, backup).with_context(|| {
        format!(
            "failed to back up {} to {}",
            source.display(),
            backup.display()
        )
    })?;
    let source_hash = file_sha256(source)?;
    let backup_hash = file_sha256(backup)?;
    if source_hash != backup_hash {
        anyhow::bail!(
            "backup {} does not match {} (sha256 {} != {})",
            backup.display(),
            source.display(),
            backup_hash,
            source_hash
        );
    }
    Ok(backup_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_parents_and_replaces() {
        let tmp = tempdir().expect("tempdir");
        let target = tmp.path().join("public/r2_tracks.json");

        write_atomic(&target, b"[]").expect("first write");
        write_atomic(&target, b"[1]").expect("second write");

        assert_eq!(fs::read(&target).expect("read"), b"[1]");
        let leftovers = fs::read_dir(target.parent().expect("parent"))
            .expect("read dir")
            .count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_keeps_target_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().expect("tempdir");
        let ledger = tmp.path().join("r2_downloads_list.txt");
        fs::write(&ledger, "Total Tracks: 0\n").expect("write");
        fs::set_permissions(&ledger, fs::Permissions::from_mode(0o664)).expect("chmod");

        write_atomic(&ledger, b"Total Tracks: 1\n").expect("rewrite");
        let mode = fs::metadata(&ledger).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o664);

        let catalog = tmp.path().join("public/r2_tracks.json");
        write_atomic(&catalog, b"[]\n").expect("fresh write");
        let mode = fs::metadata(&catalog).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn backup_matches_source_digest() {
        let tmp = tempdir().expect("tempdir");
        let source = tmp.path().join("ledger.txt");
        let backup = tmp.path().join("ledger.txt.bak");
        fs::write(&source, "Title: A\r\nArtist: B\n").expect("write");

        let digest = write_backup(&source, &backup).expect("backup");
        assert_eq!(digest, bytes_sha256(b"Title: A\r\nArtist: B\n"));
        assert_eq!(fs::read(&backup).expect("read"), fs::read(&source).expect("read"));
    }
}
