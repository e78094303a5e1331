//! Filename parsing for the `YYYY-MM-DD-name` post convention.
//!
//! Blog posts are commonly named with a leading publication date:
//! `2021-01-10-hello-world.md` or `2021-01-10-hello-world/index.md`. This
//! module splits such a name into its date prefix and the remaining name.
//!
//! The parsed parts are only used for display fallbacks (a post without a
//! `title` field is shown as "hello world"). Routing never looks at them: the
//! slug keeps the full name, date prefix and case included.
//!
//! ## Display Titles
//!
//! Dashes in the name portion are converted to spaces for display:
//! - `2021-01-10-hello-world` → "hello world"
//! - `about-me` → "about me"

use chrono::NaiveDate;

/// Result of parsing an entry name like `2021-01-10-hello-world`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present and a valid calendar date.
    pub date: Option<NaiveDate>,
    /// Raw name after the date prefix, dashes preserved. Empty if date-only.
    /// For undated entries, this is the full input.
    pub name: String,
    /// Display title: name with dashes converted to spaces.
    pub display_title: String,
}

/// Length of a `YYYY-MM-DD` prefix.
const DATE_PREFIX_LEN: usize = 10;

/// Parse an entry name following the `YYYY-MM-DD-name` convention.
///
/// - `"2021-01-10-hello-world"` → date=2021-01-10, name="hello-world", display_title="hello world"
/// - `"2021-01-10"` → date=2021-01-10, name="", display_title=""
/// - `"2021-01-10-"` → date=2021-01-10, name="", display_title=""
/// - `"hello-world"` → date=None, name="hello-world", display_title="hello world"
/// - `"2021-13-40-oops"` → date=None (not a real date), whole input is the name
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some(prefix) = name.get(..DATE_PREFIX_LEN)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        let rest = &name[DATE_PREFIX_LEN..];
        if rest.is_empty() || rest.starts_with('-') {
            let raw = rest.strip_prefix('-').unwrap_or(rest);
            return ParsedName {
                date: Some(date),
                name: raw.to_string(),
                display_title: raw.replace('-', " "),
            };
        }
    }
    ParsedName {
        date: None,
        name: name.to_string(),
        display_title: name.replace('-', " "),
    }
}
