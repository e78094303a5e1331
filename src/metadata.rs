//! Post metadata resolution: titles, descriptions and dates.
//!
//! Front matter is the primary source of metadata, but every field is
//! optional. When a field is absent the site still needs something to show,
//! so each field resolves from a list of sources in priority order:
//!
//! - **Title**: front-matter `title` → file name (`2021-01-10-hello-world.md` → "hello world")
//! - **Description**: front-matter `description` → body excerpt
//! - **Date**: front-matter `date` only. File-name dates are deliberately not
//!   used for ordering; see [`crate::query`].
//!
//! ## Date formats
//!
//! [`parse_date`] accepts what hand-written and CMS-written front matter
//! actually contains:
//!
//! ```text
//! 2021-01-10
//! 2021-01-10 09:30:00
//! 2021-01-10T09:30:00
//! 2021-01-10T09:30:00.000Z      (RFC 3339, normalized to UTC)
//! 2021-01-10T09:30:00+02:00
//! ```

use crate::naming::parse_entry_name;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;

/// Default display format for dates: `10 Jan, 2021`.
pub const DEFAULT_DATE_FORMAT: &str = "%d %b, %Y";

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value.
///
/// ```text
/// title:       resolve(&[front_matter_title, filename_title])
/// description: resolve(&[front_matter_description, excerpt])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Parse a front-matter date value. Returns `None` for anything unrecognized.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a date for display using a `strftime`-style pattern.
///
/// `pattern` must be valid (see `SiteConfig::validate`); an unknown
/// specifier makes chrono panic.
pub fn format_date(date: &NaiveDateTime, pattern: &str) -> String {
    date.format(pattern).to_string()
}

/// Derive a display title from a content file's relative path.
///
/// `index.md` files take their name from the enclosing directory, so
/// `2021-01-01-hello/index.md` and `2021-01-01-hello.md` both yield "hello".
/// Falls back to the raw stem when the name is date-only.
pub fn title_from_path(relative_path: &Path) -> String {
    let stem = relative_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = if stem == "index" {
        relative_path
            .parent()
            .and_then(Path::file_name)
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or(stem)
    } else {
        stem
    };
    let parsed = parse_entry_name(&name);
    if parsed.display_title.is_empty() {
        name
    } else {
        parsed.display_title
    }
}
