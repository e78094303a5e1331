//! Field derivation: the canonical slug of every content node.
//!
//! Stage 3 of the build pipeline. A slug is the public route of a post and is
//! computed from nothing but the node's location:
//!
//! ```text
//! root "blog", 2021-01-10-hello.md        →  /2021-01-10-hello/
//! root "blog", 2021-01-01-hello/index.md  →  /2021-01-01-hello/
//! root "blog", notes/Rust-Tips.md         →  /notes/Rust-Tips/
//! ```
//!
//! Rules:
//!
//! - the extension is stripped, segments are joined with `/`, and the result
//!   is wrapped in leading and trailing `/`
//! - a trailing `index` segment names its directory and is dropped
//! - case is preserved exactly; suppress patterns compare case-sensitively
//!
//! Derivation is all-or-nothing. A file with nothing to route on, or two
//! files that land on the same slug, fails the build rather than letting one
//! page silently overwrite another.

use crate::types::{ContentNode, DraftNode};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DerivationError {
    #[error("Cannot derive a slug for {source_root}:{}: no routable path segments", path.display())]
    NoSegments { source_root: String, path: PathBuf },
    #[error("Slug {slug} is derived by both {first} and {second}")]
    Collision {
        slug: String,
        first: String,
        second: String,
    },
}

/// Derive the slug for a file at `relative_path` under `source_root`.
///
/// Pure: identical arguments always produce an identical string.
pub fn derive_slug(source_root: &str, relative_path: &Path) -> Result<String, DerivationError> {
    let no_segments = || DerivationError::NoSegments {
        source_root: source_root.to_string(),
        path: relative_path.to_path_buf(),
    };

    let mut segments = Vec::new();
    for component in relative_path.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(no_segments());
            }
        }
    }

    let file_name = segments.pop().ok_or_else(no_segments)?;
    let stem = strip_extension(&file_name);
    if stem.is_empty() {
        return Err(no_segments());
    }
    if stem != "index" {
        segments.push(stem.to_string());
    }
    if segments.is_empty() {
        return Err(no_segments());
    }

    Ok(format!("/{}/", segments.join("/")))
}

/// `hello.md` → `hello`, `a.b.md` → `a.b`, `.md` → `""`, `README` → `README`.
fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) => &file_name[..pos],
        None => file_name,
    }
}

/// Immutable, slug-indexed collection of derived nodes in discovery order.
#[derive(Debug, Default)]
pub struct NodeSet {
    nodes: Vec<ContentNode>,
    by_slug: HashMap<String, usize>,
}

impl NodeSet {
    pub fn get(&self, slug: &str) -> Option<&ContentNode> {
        self.by_slug.get(slug).map(|&i| &self.nodes[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a ContentNode;
    type IntoIter = std::slice::Iter<'a, ContentNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Derive slugs for every draft and seal them into a [`NodeSet`].
///
/// Drafts are ordered by discovery index first, so the result does not
/// depend on the order they were handed in.
pub fn derive_fields(mut drafts: Vec<DraftNode>) -> Result<NodeSet, DerivationError> {
    drafts.sort_by_key(|d| d.source.discovery_index);

    let mut nodes = Vec::with_capacity(drafts.len());
    let mut by_slug: HashMap<String, usize> = HashMap::with_capacity(drafts.len());

    for draft in drafts {
        let slug = derive_slug(&draft.source.source_root, &draft.source.relative_path)?;
        if let Some(&existing) = by_slug.get(&slug) {
            let first: &ContentNode = &nodes[existing];
            return Err(DerivationError::Collision {
                slug,
                first: first.id(),
                second: draft.source.id(),
            });
        }
        by_slug.insert(slug.clone(), nodes.len());
        nodes.push(ContentNode::from_draft(draft, slug));
    }

    Ok(NodeSet { nodes, by_slug })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawFields, SourceFile};

    fn draft(root: &str, path: &str, index: usize) -> DraftNode {
        DraftNode {
            source: SourceFile {
                source_root: root.to_string(),
                relative_path: PathBuf::from(path),
                absolute_path: PathBuf::from(path),
                discovery_index: index,
            },
            raw_fields: RawFields::new(),
            body: String::new(),
            excerpt: String::new(),
        }
    }

    // =========================================================================
    // derive_slug
    // =========================================================================

    #[test]
    fn slug_from_flat_file() {
        assert_eq!(
            derive_slug("blog", Path::new("2021-01-10-hello.md")).unwrap(),
            "/2021-01-10-hello/"
        );
    }

    #[test]
    fn slug_from_index_uses_directory() {
        assert_eq!(
            derive_slug("blog", Path::new("2021-01-01-hello/index.md")).unwrap(),
            "/2021-01-01-hello/"
        );
    }

    #[test]
    fn slug_keeps_nested_segments() {
        assert_eq!(
            derive_slug("blog", Path::new("notes/rust/tips.md")).unwrap(),
            "/notes/rust/tips/"
        );
    }

    #[test]
    fn slug_preserves_case() {
        assert_eq!(
            derive_slug("blog", Path::new("About/Me.md")).unwrap(),
            "/About/Me/"
        );
    }

    #[test]
    fn slug_strips_only_last_extension() {
        assert_eq!(
            derive_slug("blog", Path::new("v1.2-release.md")).unwrap(),
            "/v1.2-release/"
        );
    }

    #[test]
    fn slug_is_pure() {
        let path = Path::new("2021-02-01-world.md");
        assert_eq!(
            derive_slug("blog", path).unwrap(),
            derive_slug("blog", path).unwrap()
        );
    }

    #[test]
    fn empty_file_name_is_error() {
        assert!(matches!(
            derive_slug("blog", Path::new(".md")),
            Err(DerivationError::NoSegments { .. })
        ));
    }

    #[test]
    fn root_index_is_error() {
        assert!(matches!(
            derive_slug("blog", Path::new("index.md")),
            Err(DerivationError::NoSegments { .. })
        ));
    }

    #[test]
    fn empty_path_is_error() {
        assert!(derive_slug("blog", Path::new("")).is_err());
    }

    #[test]
    fn escaping_path_is_error() {
        assert!(derive_slug("blog", Path::new("../outside.md")).is_err());
    }

    // =========================================================================
    // derive_fields
    // =========================================================================

    #[test]
    fn distinct_paths_get_distinct_slugs() {
        let set = derive_fields(vec![
            draft("blog", "a.md", 0),
            draft("blog", "b.md", 1),
            draft("blog", "a/b.md", 2),
        ])
        .unwrap();
        let slugs: Vec<&str> = set.iter().map(ContentNode::slug).collect();
        assert_eq!(slugs, vec!["/a/", "/b/", "/a/b/"]);
        assert_eq!(set.get("/a/b/").unwrap().relative_path(), Path::new("a/b.md"));
    }

    #[test]
    fn collision_names_both_files() {
        let err = derive_fields(vec![
            draft("blog", "hello.md", 0),
            draft("blog", "hello/index.md", 1),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            DerivationError::Collision {
                slug: "/hello/".to_string(),
                first: "blog:hello.md".to_string(),
                second: "blog:hello/index.md".to_string(),
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("blog:hello.md") && msg.contains("blog:hello/index.md"));
    }

    #[test]
    fn collision_across_roots_is_error() {
        let result = derive_fields(vec![draft("src", "about.md", 0), draft("blog", "about.md", 1)]);
        assert!(matches!(result, Err(DerivationError::Collision { .. })));
    }

    #[test]
    fn node_set_follows_discovery_order() {
        let set = derive_fields(vec![
            draft("blog", "c.md", 2),
            draft("blog", "a.md", 0),
            draft("blog", "b.md", 1),
        ])
        .unwrap();
        let indices: Vec<usize> = set.iter().map(ContentNode::discovery_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn empty_input_gives_empty_set() {
        let set = derive_fields(Vec::new()).unwrap();
        assert!(set.is_empty());
        assert!(set.get("/x/").is_none());
    }
}
