//! Content source collection.
//!
//! Stage 1 of the build pipeline. Walks every declared source root and
//! returns the markdown files under it, tagged with the root's name and the
//! file's path relative to that root.
//!
//! ## Inclusion Policy
//!
//! - Files with a `.md` or `.markdown` extension (case-insensitive)
//! - Hidden entries (`.drafts/`, `.DS_Store`, ...) are skipped, including
//!   everything beneath a hidden directory
//! - Everything else (images, `.js` pages, sidecar files) is ignored
//!
//! ## Ordering
//!
//! Correctness never depends on the order files come back in, but the
//! collector is deterministic anyway: roots are visited in declared order
//! and each root is walked with entries sorted by file name. The resulting
//! `discovery_index` is the documented tie-break for posts sharing a date.

use crate::config::ConfigError;
use crate::types::SourceFile;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Source root '{name}' not found: {}", path.display())]
    MissingRoot { name: String, path: PathBuf },
}

/// Extensions of files treated as content.
pub const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Collect content files from all roots, in declared root order.
///
/// Root names must be distinct; a repeated name is a configuration error
/// rather than a silent merge.
pub fn collect(roots: &[(String, PathBuf)]) -> Result<Vec<SourceFile>, CollectError> {
    let mut seen = BTreeSet::new();
    for (name, _) in roots {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateSource(name.clone()).into());
        }
    }

    let mut files = Vec::new();
    for (name, path) in roots {
        let mut found = collect_root(name, path)?;
        log::debug!("collected {} file(s) from '{}'", found.len(), name);
        files.append(&mut found);
    }

    for (index, file) in files.iter_mut().enumerate() {
        file.discovery_index = index;
    }
    Ok(files)
}

/// Collect content files from a single root.
///
/// `discovery_index` is numbered from zero within this root; [`collect`]
/// renumbers across roots.
pub fn collect_root(name: &str, root: &Path) -> Result<Vec<SourceFile>, CollectError> {
    if !root.is_dir() {
        return Err(CollectError::MissingRoot {
            name: name.to_string(),
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if !is_content_file(&entry) {
            continue;
        }
        let relative_path = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
        files.push(SourceFile {
            source_root: name.to_string(),
            relative_path,
            absolute_path: entry.path().to_path_buf(),
            discovery_index: files.len(),
        });
    }
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_content_file(entry: &DirEntry) -> bool {
    if !entry.file_type().is_file() {
        return false;
    }
    let ext = entry
        .path()
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    CONTENT_EXTENSIONS.contains(&ext.as_str())
}
