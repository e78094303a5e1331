//! Shared test utilities for the quire test suite.
//!
//! Provides the fixture site and lookup helpers over pipeline results
//! (`NodeSet`, `FinalPages`, `BuildReport`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = load_fixture_config(tmp.path());
//! let nodes = load_content(tmp.path(), &config).unwrap();
//!
//! let post = find_node(&nodes, "/2021-01-10-hello/");
//! assert_eq!(post.field("title"), Some("Hello"));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::{self, SiteConfig};
use crate::derive::NodeSet;
use crate::filter::FinalPages;
use crate::types::{ContentNode, PageSpec};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

/// Load the fixture's `config.toml`. Panics if it does not validate.
pub fn load_fixture_config(site_dir: &Path) -> SiteConfig {
    config::load_config(site_dir).unwrap_or_else(|e| panic!("fixture config invalid: {e}"))
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a node by slug. Panics if not found.
pub fn find_node<'a>(nodes: &'a NodeSet, slug: &str) -> &'a ContentNode {
    nodes.get(slug).unwrap_or_else(|| {
        let slugs = node_slugs(nodes);
        panic!("node '{slug}' not found. Available: {slugs:?}")
    })
}

/// Find a final page by route. Panics if not found.
pub fn find_page<'a>(pages: &'a FinalPages, route: &str) -> &'a PageSpec {
    pages
        .iter()
        .find(|p| p.route_path == route)
        .unwrap_or_else(|| {
            let routes = page_routes(pages);
            panic!("page '{route}' not found. Available: {routes:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All slugs in discovery order.
pub fn node_slugs(nodes: &NodeSet) -> Vec<&str> {
    nodes.iter().map(ContentNode::slug).collect()
}

/// All final routes in plan order.
pub fn page_routes(pages: &FinalPages) -> Vec<&str> {
    pages.iter().map(|p| p.route_path.as_str()).collect()
}
