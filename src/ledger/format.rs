//! Line grammar of the ledger file.
//!
//! ```text
//! Total Tracks: 1204
//!
//! CATEGORY: Afro House 2023 (2 tracks)
//! --------------------------------------------------
//! Title: Summer Vibes
//! Artist: DJX
//! Preview Link: https://...
//! Download Link: https://...
//!
//! ```

use crate::error::LedgerError;
use once_cell::sync::Lazy;
use regex::Regex;

pub const CATEGORY_PREFIX: &str = "CATEGORY:";
pub const TITLE_PREFIX: &str = "Title:";
pub const ARTIST_PREFIX: &str = "Artist:";
pub const PREVIEW_PREFIX: &str = "Preview Link:";
pub const DOWNLOAD_PREFIX: &str = "Download Link:";

pub const SEPARATOR_WIDTH: usize = 50;

static TOTAL_TRACKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Total Tracks: ([0-9]+)").expect("valid total regex"));
static CATEGORY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CATEGORY: (.*?) \(").expect("valid category regex"));
static DECLARED_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([0-9]+) tracks?\)").expect("valid count regex"));
static DOWNLOAD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Download Link: (.+)").expect("valid download regex"));

/// Fields of one ledger record, verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub preview_link: &'a str,
    pub download_link: &'a str,
}

/// Value of a `Prefix: value` line. A line without the prefix yields the
/// whole trimmed line, which is what positional reads rely on.
pub fn field_value<'a>(line: &'a str, prefix: &str) -> &'a str {
    let trimmed = line.trim();
    trimmed.strip_prefix(prefix).unwrap_or(trimmed).trim()
}

/// Category name from a `CATEGORY: <name> (<n> tracks)` line.
pub fn category_name(line: &str) -> String {
    let trimmed = line.trim();
    if let Some(caps) = CATEGORY_NAME.captures(trimmed) {
        return caps[1].trim().to_string();
    }
    field_value(trimmed, CATEGORY_PREFIX).to_string()
}

pub fn declared_count(line: &str) -> Option<usize> {
    DECLARED_COUNT
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
}

/// First `Total Tracks: <n>` value anywhere in the ledger text. A counter
/// that does not fit in `u64` is an error rather than a missing header.
pub fn total_tracks(content: &str) -> Result<Option<u64>, LedgerError> {
    let Some(caps) = TOTAL_TRACKS.captures(content) else {
        return Ok(None);
    };
    let value = &caps[1];
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|_| LedgerError::HeaderMalformed {
            line: content[..caps.get(0).map_or(0, |m| m.start())]
                .matches('\n')
                .count()
                + 1,
            value: value.to_string(),
        })
}

/// Rewrites the first `Total Tracks` counter, or puts one on top when the
/// ledger has none.
pub fn set_total_tracks(content: &str, total: u64) -> String {
    let header = format!("Total Tracks: {total}");
    if TOTAL_TRACKS.is_match(content) {
        TOTAL_TRACKS
            .replace(content, regex::NoExpand(&header))
            .into_owned()
    } else {
        format!("{header}\n{content}")
    }
}

/// Every `Download Link:` value, as raw text up to the end of its line
/// (a CRLF terminator is not part of the value).
pub fn download_links(content: &str) -> impl Iterator<Item = &str> {
    DOWNLOAD_LINK
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim_end_matches('\r')))
}

pub fn render_category_header(name: &str, count: usize) -> String {
    format!(
        "\n\n{CATEGORY_PREFIX} {name} ({count} tracks)\n{}\n",
        "-".repeat(SEPARATOR_WIDTH)
    )
}

pub fn render_record(fields: &RecordFields<'_>) -> String {
    format!(
        "{TITLE_PREFIX} {}\n{ARTIST_PREFIX} {}\n{PREVIEW_PREFIX} {}\n{DOWNLOAD_PREFIX} {}\n\n",
        fields.title, fields.artist, fields.preview_link, fields.download_link
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_name_stops_before_count() {
        assert_eq!(
            category_name("CATEGORY: Deep House 2023 (12 tracks)"),
            "Deep House 2023"
        );
        assert_eq!(category_name("  CATEGORY: Amapiano   "), "Amapiano");
        assert_eq!(category_name("CATEGORY:"), "");
    }

    #[test]
    fn declared_count_reads_header() {
        assert_eq!(declared_count("CATEGORY: Amapiano (3 tracks)"), Some(3));
        assert_eq!(declared_count("CATEGORY: Amapiano (1 track)"), Some(1));
        assert_eq!(declared_count("CATEGORY: Amapiano"), None);
    }

    #[test]
    fn field_value_strips_prefix_and_whitespace() {
        assert_eq!(field_value("Title:   Song A  ", TITLE_PREFIX), "Song A");
        assert_eq!(field_value("Artist:", ARTIST_PREFIX), "");
        assert_eq!(field_value("  stray text ", ARTIST_PREFIX), "stray text");
    }

    #[test]
    fn total_tracks_header_is_updated_in_place() {
        let ledger = "Total Tracks: 7\n\nCATEGORY: A (7 tracks)\n";
        assert_eq!(total_tracks(ledger).expect("valid header"), Some(7));
        assert_eq!(
            set_total_tracks(ledger, 10),
            "Total Tracks: 10\n\nCATEGORY: A (7 tracks)\n"
        );
    }

    #[test]
    fn total_tracks_header_is_inserted_when_missing() {
        assert_eq!(
            total_tracks("CATEGORY: A (1 tracks)\n").expect("no header"),
            None
        );
        assert_eq!(
            set_total_tracks("CATEGORY: A (1 tracks)\n", 3),
            "Total Tracks: 3\nCATEGORY: A (1 tracks)\n"
        );
    }

    #[test]
    fn oversized_total_is_rejected_not_zeroed() {
        let ledger = "\nTotal Tracks: 99999999999999999999\n";
        match total_tracks(ledger) {
            Err(LedgerError::HeaderMalformed { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "99999999999999999999");
            }
            other => panic!("expected malformed header, got {other:?}"),
        }
    }

    #[test]
    fn download_links_are_collected_verbatim() {
        let ledger = "Download Link: https://a/1.mp3\nDownload Link: https://a/2.mp3 \n";
        let links: Vec<&str> = download_links(ledger).collect();
        assert_eq!(links, vec!["https://a/1.mp3", "https://a/2.mp3 "]);
    }

    #[test]
    fn record_layout_matches_ledger_grammar() {
        let rendered = render_record(&RecordFields {
            title: "Song",
            artist: "DJX",
            preview_link: "https://p",
            download_link: "https://d",
        });
        assert_eq!(
            rendered,
            "Title: Song\nArtist: DJX\nPreview Link: https://p\nDownload Link: https://d\n\n"
        );
        let header = render_category_header("Remix & Mashups", 2);
        assert!(header.starts_with("\n\nCATEGORY: Remix & Mashups (2 tracks)\n"));
        assert!(header.ends_with(&format!("{}\n", "-".repeat(50))));
    }
}
