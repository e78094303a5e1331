//! Shared types passed between pipeline stages.
//!
//! Content moves through three shapes on its way to a page:
//!
//! ```text
//! SourceFile  →  DraftNode  →  ContentNode  →  PageSpec
//!  (collect)     (transform)    (derive)        (plan)
//! ```
//!
//! A [`ContentNode`] can only be built by the field deriver, so any node a
//! query sees already carries its final slug and never changes again.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A content file found under one of the declared source roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Name of the root the file was discovered under (e.g. `"blog"`).
    pub source_root: String,
    /// Path relative to that root, e.g. `2021-01-10-hello.md`.
    pub relative_path: PathBuf,
    /// Absolute (or site-relative) path used to read the file.
    pub absolute_path: PathBuf,
    /// Position in the merged discovery order across all roots.
    pub discovery_index: usize,
}

impl SourceFile {
    /// Stable identifier `"<root>:<relative path>"`.
    pub fn id(&self) -> String {
        node_id(&self.source_root, &self.relative_path)
    }
}

fn node_id(source_root: &str, relative_path: &Path) -> String {
    format!("{}:{}", source_root, relative_path.display())
}

/// A front-matter value.
///
/// YAML has no native date type, so dates stay as [`FieldValue::Text`] and
/// are parsed by whichever stage needs them.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(", "))
            }
            FieldValue::Map(_) => f.write_str("{…}"),
        }
    }
}

/// Declared metadata keys of a node, in key order.
pub type RawFields = BTreeMap<String, FieldValue>;

/// Output of the markdown transformer: everything about a node except its slug.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftNode {
    pub source: SourceFile,
    pub raw_fields: RawFields,
    /// Rendered HTML body.
    pub body: String,
    /// Plain-text summary of the body.
    pub excerpt: String,
}

/// A fully derived content node. Read-only once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    source_root: String,
    relative_path: PathBuf,
    discovery_index: usize,
    raw_fields: RawFields,
    body: String,
    excerpt: String,
    slug: String,
}

impl ContentNode {
    /// Seal a draft with its derived slug. Only the field deriver calls this.
    pub(crate) fn from_draft(draft: DraftNode, slug: String) -> Self {
        Self {
            source_root: draft.source.source_root,
            relative_path: draft.source.relative_path,
            discovery_index: draft.source.discovery_index,
            raw_fields: draft.raw_fields,
            body: draft.body,
            excerpt: draft.excerpt,
            slug,
        }
    }

    pub fn id(&self) -> String {
        node_id(&self.source_root, &self.relative_path)
    }

    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn discovery_index(&self) -> usize {
        self.discovery_index
    }

    pub fn raw_fields(&self) -> &RawFields {
        &self.raw_fields
    }

    /// Look up a front-matter field as text. Non-text values yield `None`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.raw_fields.get(key).and_then(FieldValue::as_text)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

/// Which template renders a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    Home,
    Listing,
    Page,
    Post,
}

impl TemplateId {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateId::Home => "home",
            TemplateId::Listing => "listing",
            TemplateId::Page => "page",
            TemplateId::Post => "post",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a planned page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrigin {
    /// Planned from a content node by the page planner.
    Content,
    /// A route the site declares regardless of content (home, listing, static pages).
    Default,
}

/// Small key-value bag handed to the renderer alongside the route.
pub type PageContext = BTreeMap<String, String>;

/// A page to materialize: route → template → context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSpec {
    pub route_path: String,
    pub template_id: TemplateId,
    pub context: PageContext,
    pub origin: PageOrigin,
}

impl PageSpec {
    /// The `slug` context entry, present on every content page.
    pub fn slug(&self) -> Option<&str> {
        self.context.get("slug").map(String::as_str)
    }
}
