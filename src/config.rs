//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top of it, so
//! a config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml              # Site config (optional)
//! └── content/
//!     └── blog/                # Default `blog` source root
//!         ├── 2021-01-10-hello.md
//!         └── 2021-02-01-world/
//!             └── index.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! suppress = []             # Route prefixes never materialized, e.g. ["/about"]
//!
//! [site]
//! title = "My Site"
//! description = ""
//! author = ""
//! site_url = "https://example.com"
//!
//! [[sources]]               # Content roots; names must be unique
//! name = "blog"
//! path = "content/blog"
//!
//! [listing]
//! route = "/blog/"
//! title = "All posts"
//! date_format = "%d %b, %Y"
//!
//! [home]
//! title = "Home"
//! intro = ""
//! recent_posts = 3
//!
//! [[pages]]                 # Static pages (none by default)
//! route = "/contact/"
//! title = "Contact"
//! body = "Email me."
//!
//! [[nav]]
//! title = "Home"
//! route = "/"
//!
//! [query]
//! missing_date = "sort-last" # or "reject"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filter::RouteDenylist;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Duplicate source root name: {0}")]
    DuplicateSource(String),
    #[error("Invalid suppress list: {0}")]
    Denylist(String),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Route prefixes whose pages are dropped before rendering.
    pub suppress: Vec<String>,
    /// Site-wide metadata used in `<title>`, meta tags and the sitemap.
    pub site: SiteMeta,
    /// Content roots to collect markdown from.
    pub sources: Vec<SourceConfig>,
    /// The post listing page.
    pub listing: ListingConfig,
    /// The home page.
    pub home: HomeConfig,
    /// Static pages planned alongside content pages.
    pub pages: Vec<StaticPageConfig>,
    /// Header navigation links.
    pub nav: Vec<NavLink>,
    /// Query behaviour.
    pub query: QueryConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            suppress: Vec::new(),
            site: SiteMeta::default(),
            sources: vec![SourceConfig {
                name: "blog".to_string(),
                path: "content/blog".to_string(),
            }],
            listing: ListingConfig::default(),
            home: HomeConfig::default(),
            pages: Vec::new(),
            nav: vec![
                NavLink {
                    title: "Home".to_string(),
                    route: "/".to_string(),
                },
                NavLink {
                    title: "Blog".to_string(),
                    route: "/blog/".to_string(),
                },
            ],
            query: QueryConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values and cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[sources]] entry is required".into(),
            ));
        }
        let mut names = BTreeSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "sources.name must not be empty".into(),
                ));
            }
            if source.path.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "sources.path must not be empty (source '{}')",
                    source.name
                )));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
        }

        check_route("listing.route", &self.listing.route)?;
        check_date_format("listing.date_format", &self.listing.date_format)?;
        for page in &self.pages {
            check_route("pages.route", &page.route)?;
        }
        for link in &self.nav {
            check_route("nav.route", &link.route)?;
        }

        let denylist = RouteDenylist::new(&self.suppress)?;
        if denylist.suppresses(&self.listing.route) {
            return Err(ConfigError::Denylist(format!(
                "suppress would remove the listing route {}",
                self.listing.route
            )));
        }
        Ok(())
    }

    /// Resolve every source root against the site directory.
    pub fn source_roots(&self, site_dir: &Path) -> Vec<(String, PathBuf)> {
        self.sources
            .iter()
            .map(|s| (s.name.clone(), site_dir.join(&s.path)))
            .collect()
    }
}

fn check_route(key: &str, route: &str) -> Result<(), ConfigError> {
    if !route.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{key} must start with '/': {route:?}"
        )));
    }
    if route.contains("//") || route.split('/').any(|seg| seg == "..") {
        return Err(ConfigError::Validation(format!(
            "{key} is not a clean route: {route:?}"
        )));
    }
    Ok(())
}

/// Reject patterns chrono cannot display; formatting one panics.
fn check_date_format(key: &str, pattern: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Validation(format!(
            "{key} is not a valid strftime pattern: {pattern:?}"
        )));
    }
    Ok(())
}

/// Site-wide metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,
    pub author: String,
    /// Absolute base URL, used for sitemap entries.
    pub site_url: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "My Site".to_string(),
            description: String::new(),
            author: String::new(),
            site_url: "https://example.com".to_string(),
        }
    }
}

/// One content root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Name that tags every node found under this root.
    pub name: String,
    /// Directory, relative to the site directory.
    pub path: String,
}

/// The post listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    pub route: String,
    pub title: String,
    /// `strftime`-style pattern for post dates.
    pub date_format: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            route: "/blog/".to_string(),
            title: "All posts".to_string(),
            date_format: crate::metadata::DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// The home page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HomeConfig {
    pub title: String,
    /// Markdown shown above the recent posts.
    pub intro: String,
    /// How many of the newest posts to show. `0` hides the section.
    pub recent_posts: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            title: "Home".to_string(),
            intro: String::new(),
            recent_posts: 3,
        }
    }
}

/// A static page declared in config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StaticPageConfig {
    pub route: String,
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub body: String,
}

/// A header navigation link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NavLink {
    pub title: String,
    pub route: String,
}

/// What to do with content that has no usable `date` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePolicy {
    /// Treat as the earliest possible date: sorted after every dated node.
    #[default]
    SortLast,
    /// Fail the build.
    Reject,
}

/// Query behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub missing_date: DatePolicy,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the site directory.
pub fn load_config(site_dir: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(site_dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`. Used by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Quire Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Route prefixes that are never materialized. Matching is per path segment:
# "/about" removes /about, /about/ and /about/team/ but not /about-me/.
suppress = []

# ---------------------------------------------------------------------------
# Site metadata
# ---------------------------------------------------------------------------
[site]
title = "My Site"
description = ""
author = ""
# Base URL for sitemap entries.
site_url = "https://example.com"

# ---------------------------------------------------------------------------
# Content roots
# ---------------------------------------------------------------------------
# Each root is walked for .md/.markdown files. Names must be unique.
# A file at <path>/2021-01-10-hello.md is published at /2021-01-10-hello/.
[[sources]]
name = "blog"
path = "content/blog"

# ---------------------------------------------------------------------------
# Post listing
# ---------------------------------------------------------------------------
[listing]
route = "/blog/"
title = "All posts"
# strftime-style pattern, e.g. "%Y-%m-%d".
date_format = "%d %b, %Y"

# ---------------------------------------------------------------------------
# Home page
# ---------------------------------------------------------------------------
[home]
title = "Home"
# Markdown shown at the top of the home page.
intro = ""
# Number of newest posts listed on the home page (0 hides the list).
recent_posts = 3

# ---------------------------------------------------------------------------
# Static pages (none by default)
# ---------------------------------------------------------------------------
# [[pages]]
# route = "/contact/"
# title = "Contact"
# body = "Reach me at [me@example.com](mailto:me@example.com)."

# ---------------------------------------------------------------------------
# Header navigation
# ---------------------------------------------------------------------------
# Links to suppressed routes are hidden automatically.
[[nav]]
title = "Home"
route = "/"

[[nav]]
title = "Blog"
route = "/blog/"

# ---------------------------------------------------------------------------
# Query
# ---------------------------------------------------------------------------
[query]
# Posts without a parseable `date`:
#   "sort-last" - list them after all dated posts (a warning is logged)
#   "reject"    - fail the build
missing_date = "sort-last"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for transforming and writing pages.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
