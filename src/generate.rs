//! Writing the built site to disk.
//!
//! Takes the sealed [`FinalPages`](crate::filter::FinalPages), renders each
//! one through a [`PageRenderer`], and writes the result under the output
//! directory.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── .quire-output              # Marker: this directory is ours to clean
//! ├── index.html                 # Home page
//! ├── blog/
//! │   └── index.html             # Listing
//! ├── contact/
//! │   └── index.html             # Static page
//! ├── 2021-02-01-world/
//! │   └── index.html             # Post
//! └── sitemap.xml
//! ```
//!
//! The output directory is emptied before every build, so a page that was
//! suppressed or deleted since the last build cannot linger. To avoid wiping
//! an unrelated directory by mistake, only directories that are empty or
//! carry the marker file are cleaned.
//!
//! Every page is rendered before the directory is cleaned. Rendering and
//! writing both run in parallel; the returned list is in page order
//! regardless.

use crate::query::node_date;
use crate::render::{PageRenderer, RenderContext, RenderError};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error(
        "Refusing to clean {}: not empty and has no .quire-output marker",
        path.display()
    )]
    ForeignOutput { path: PathBuf },
}

/// File marking a directory as build output.
pub const OUTPUT_MARKER: &str = ".quire-output";

/// File name of the sitemap, at the output root.
pub const SITEMAP_FILE: &str = "sitemap.xml";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// One written page.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPage {
    pub route: String,
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub bytes: usize,
}

/// File a route is written to, relative to the output directory.
///
/// `/` → `index.html`, `/blog/` → `blog/index.html`, `/a/b` → `a/b/index.html`.
pub fn output_path(route: &str) -> PathBuf {
    let mut path: PathBuf = route.split('/').filter(|s| !s.is_empty()).collect();
    path.push("index.html");
    path
}

/// Render and write every final page plus the sitemap.
///
/// All pages are rendered in memory before the output directory is touched,
/// so a render failure leaves the previous build in place.
pub fn generate(
    renderer: &dyn PageRenderer,
    ctx: &RenderContext<'_>,
    output_dir: &Path,
) -> Result<Vec<GeneratedPage>, GenerateError> {
    let rendered = ctx
        .pages
        .pages()
        .par_iter()
        .map(|page| -> Result<(GeneratedPage, String), RenderError> {
            let html = renderer.render(page, ctx)?;
            let page = GeneratedPage {
                route: page.route_path.clone(),
                path: output_path(&page.route_path),
                bytes: html.len(),
            };
            Ok((page, html))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let sitemap = render_sitemap(ctx);

    prepare_output_dir(output_dir)?;
    rendered
        .par_iter()
        .try_for_each(|(page, html)| -> Result<(), GenerateError> {
            let target = output_dir.join(&page.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, html)?;
            log::debug!("wrote {}", target.display());
            Ok(())
        })?;
    fs::write(output_dir.join(SITEMAP_FILE), sitemap)?;

    Ok(rendered.into_iter().map(|(page, _)| page).collect())
}

/// Create `dir` if needed and empty it, leaving only the marker file.
pub fn prepare_output_dir(dir: &Path) -> Result<(), GenerateError> {
    if dir.exists() {
        let marker = dir.join(OUTPUT_MARKER);
        let is_empty = fs::read_dir(dir)?.next().is_none();
        if !is_empty && !marker.exists() {
            return Err(GenerateError::ForeignOutput {
                path: dir.to_path_buf(),
            });
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
    } else {
        fs::create_dir_all(dir)?;
    }
    fs::write(dir.join(OUTPUT_MARKER), "")?;
    Ok(())
}

/// Sitemap covering every final page. Post pages carry their date as
/// `lastmod`.
pub fn render_sitemap(ctx: &RenderContext<'_>) -> String {
    let base = ctx.config.site.site_url.trim_end_matches('/');
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for page in ctx.pages.iter() {
        let lastmod = page
            .slug()
            .and_then(|slug| ctx.nodes.get(slug))
            .and_then(|node| node_date(node).ok())
            .map(|d| d.format("%Y-%m-%d").to_string());

        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}</loc>\n",
            escape_xml(&format!("{base}{}", page.route_path))
        ));
        if let Some(lastmod) = lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
