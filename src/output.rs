//! CLI output formatting for the build commands.
//!
//! # Information-First Display
//!
//! Output lists what the site will contain, not which files were touched.
//! Every page leads with its positional index and title, with the route (or
//! written file) after an arrow. Posts and other pages are listed
//! separately so the post order, which is the part most worth checking, reads
//! top to bottom.
//!
//! # Output Format
//!
//! ## Check / Plan
//!
//! ```text
//! Posts
//! 001 world (01 Feb, 2021) → /2021-02-01-world/
//! 002 Hello (10 Jan, 2021) → /2021-01-10-hello/
//!
//! Pages
//! 001 Home → /
//! 002 All posts → /blog/
//!
//! Suppressed
//!     /about/
//!
//! Warnings
//!     blog:notes.md: missing `date` field
//!
//! 3 content nodes, 4 pages, 1 suppressed
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Home → index.html
//! 002 All posts → blog/index.html
//! 003 world → 2021-02-01-world/index.html
//!
//! Generated 3 pages (12.4 KB)
//! Digest: 5f0c…
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::{BuildReport, PageSummary};
use crate::types::TemplateId;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `001 Title (date)`, falling back to the route when a page has no title.
fn page_header(index: usize, page: &PageSummary) -> String {
    let title = if page.title.is_empty() {
        page.route.as_str()
    } else {
        page.title.as_str()
    };
    match &page.date {
        Some(date) => format!("{} {} ({})", format_index(index), title, date),
        None => format!("{} {}", format_index(index), title),
    }
}

/// `12.4 KB` style size.
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

// ============================================================================
// Check / plan output
// ============================================================================

/// Format the planned site: posts in query order, other pages, suppressed
/// routes, and warnings.
pub fn format_check_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    let (posts, pages): (Vec<&PageSummary>, Vec<&PageSummary>) = report
        .pages
        .iter()
        .partition(|p| p.template == TemplateId::Post);

    if !posts.is_empty() {
        lines.push("Posts".to_string());
        for (i, post) in posts.iter().enumerate() {
            lines.push(format!("{} \u{2192} {}", page_header(i + 1, post), post.route));
        }
        lines.push(String::new());
    }

    lines.push("Pages".to_string());
    for (i, page) in pages.iter().enumerate() {
        lines.push(format!("{} \u{2192} {}", page_header(i + 1, page), page.route));
    }

    if !report.suppressed.is_empty() {
        lines.push(String::new());
        lines.push("Suppressed".to_string());
        for route in &report.suppressed {
            lines.push(format!("{}{}", indent(1), route));
        }
    }

    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        for warning in &report.warnings {
            lines.push(format!("{}{}", indent(1), warning));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{} content nodes, {} pages, {} suppressed",
        report.node_count,
        report.pages.len(),
        report.suppressed.len()
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &BuildReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format the written files, in page order, followed by totals and the
/// build digest.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, written) in report.written.iter().enumerate() {
        let title = report
            .pages
            .iter()
            .find(|p| p.route == written.route)
            .map(|p| page_header(i + 1, p))
            .unwrap_or_else(|| format!("{} {}", format_index(i + 1), written.route));
        lines.push(format!(
            "{} \u{2192} {}",
            title,
            written.path.to_string_lossy().replace('\\', "/")
        ));
    }

    let total: usize = report.written.iter().map(|w| w.bytes).sum();
    lines.push(String::new());
    lines.push(format!(
        "Generated {} pages ({})",
        report.written.len(),
        format_size(total)
    ));
    if !report.suppressed.is_empty() {
        lines.push(format!("Suppressed {}", report.suppressed.join(", ")));
    }
    lines.push(format!("Digest: {}", report.digest));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
