//! Route suppression.
//!
//! Stage 6 of the build pipeline. Some routes exist in the content tree but
//! must never ship, such as an `/about` page that is mid-rewrite. The site
//! declares them once in the top-level `suppress` list and this module
//! removes every planned page whose route falls under one of them.
//!
//! ## Matching
//!
//! Entries and routes are compared after trimming one trailing `/`, and an
//! entry covers a route when the route equals it or continues with a `/`:
//!
//! ```text
//! suppress = ["/about"]
//!
//!   /about/      suppressed
//!   /about/me/   suppressed
//!   /about-me/   kept        (prefix match stops at segment boundaries)
//!   /About/      kept        (routes are case-sensitive)
//! ```
//!
//! Filtering happens exactly once. [`crate::plan::PageSet::seal`] is the only
//! way to obtain [`FinalPages`], and the renderer accepts nothing else, so a
//! suppressed route cannot reach the output directory.

use crate::config::ConfigError;
use crate::types::PageSpec;
use serde::Serialize;

/// Trim one trailing `/`, keeping the root route intact.
pub fn normalize_route(route: &str) -> &str {
    if route.len() > 1 {
        route.strip_suffix('/').unwrap_or(route)
    } else {
        route
    }
}

/// Validated set of route prefixes to suppress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDenylist {
    entries: Vec<String>,
}

impl RouteDenylist {
    /// Build a denylist, rejecting entries that are malformed or that
    /// overlap another entry.
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Result<Self, ConfigError> {
        let mut normalized: Vec<String> = Vec::with_capacity(entries.len());
        for raw in entries {
            let raw = raw.as_ref();
            if !raw.starts_with('/') {
                return Err(ConfigError::Denylist(format!(
                    "suppress entry must start with '/': {raw:?}"
                )));
            }
            let entry = normalize_route(raw);
            if entry == "/" {
                return Err(ConfigError::Denylist(
                    "suppress entry \"/\" would remove every page".into(),
                ));
            }
            for existing in &normalized {
                if existing == entry {
                    return Err(ConfigError::Denylist(format!(
                        "suppress entry {raw:?} is listed twice"
                    )));
                }
                if covers(existing, entry) || covers(entry, existing) {
                    return Err(ConfigError::Denylist(format!(
                        "suppress entries {existing:?} and {raw:?} overlap"
                    )));
                }
            }
            normalized.push(entry.to_string());
        }
        Ok(Self {
            entries: normalized,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `route` is covered by any entry.
    pub fn suppresses(&self, route: &str) -> bool {
        let route = normalize_route(route);
        self.entries.iter().any(|entry| covers(entry, route))
    }

    /// Normalized entries, in declared order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// `prefix` covers `route` on a whole-segment boundary.
fn covers(prefix: &str, route: &str) -> bool {
    route == prefix
        || route
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// The pages that will actually be rendered, plus the routes that were
/// removed on the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalPages {
    pages: Vec<PageSpec>,
    suppressed: Vec<String>,
}

impl FinalPages {
    pub fn pages(&self) -> &[PageSpec] {
        &self.pages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageSpec> {
        self.pages.iter()
    }

    /// Routes removed by the denylist, in plan order.
    pub fn suppressed(&self) -> &[String] {
        &self.suppressed
    }

    /// Whether a page is rendered at `route` (trailing `/` ignored).
    pub fn contains_route(&self, route: &str) -> bool {
        let route = normalize_route(route);
        self.pages
            .iter()
            .any(|p| normalize_route(&p.route_path) == route)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Remove suppressed pages, keeping the rest in plan order.
pub(crate) fn apply(pages: Vec<PageSpec>, denylist: &RouteDenylist) -> FinalPages {
    let (suppressed, kept): (Vec<PageSpec>, Vec<PageSpec>) = pages
        .into_iter()
        .partition(|page| denylist.suppresses(&page.route_path));
    for page in &suppressed {
        log::debug!("suppressed {}", page.route_path);
    }
    FinalPages {
        pages: kept,
        suppressed: suppressed.into_iter().map(|p| p.route_path).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageContext, PageOrigin, TemplateId};

    fn page(route: &str) -> PageSpec {
        PageSpec {
            route_path: route.to_string(),
            template_id: TemplateId::Page,
            context: PageContext::new(),
            origin: PageOrigin::Default,
        }
    }

    fn routes(pages: &FinalPages) -> Vec<&str> {
        pages.iter().map(|p| p.route_path.as_str()).collect()
    }

    #[test]
    fn removes_matching_prefixes() {
        let denylist = RouteDenylist::new(&["/about"]).unwrap();
        let result = apply(
            vec![page("/about"), page("/about/me"), page("/contact")],
            &denylist,
        );
        assert_eq!(routes(&result), vec!["/contact"]);
        assert_eq!(result.suppressed(), &["/about", "/about/me"]);
    }

    #[test]
    fn removes_matching_prefixes_with_trailing_slashes() {
        let denylist = RouteDenylist::new(&["/about"]).unwrap();
        let result = apply(
            vec![page("/about/"), page("/about/me/"), page("/contact/")],
            &denylist,
        );
        assert_eq!(routes(&result), vec!["/contact/"]);
    }

    #[test]
    fn final_pages_serialize_as_plan() {
        let denylist = RouteDenylist::new(&["/about"]).unwrap();
        let result = apply(vec![page("/contact/"), page("/about/")], &denylist);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["pages"][0]["route_path"], "/contact/");
        assert_eq!(json["pages"][0]["template_id"], "page");
        assert_eq!(json["pages"][0]["origin"], "default");
        assert_eq!(json["suppressed"][0], "/about/");
    }

    #[test]
    fn prefix_stops_at_segment_boundary() {
        let denylist = RouteDenylist::new(&["/about"]).unwrap();
        assert!(!denylist.suppresses("/about-me/"));
        assert!(!denylist.suppresses("/aboutface"));
        assert!(denylist.suppresses("/about"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let denylist = RouteDenylist::new(&["/about"]).unwrap();
        assert!(!denylist.suppresses("/About/"));
    }

    #[test]
    fn trailing_slash_on_entry_is_ignored() {
        let denylist = RouteDenylist::new(&["/experience/"]).unwrap();
        assert!(denylist.suppresses("/experience"));
        assert!(denylist.suppresses("/experience/2020/"));
        assert_eq!(denylist.entries(), &["/experience"]);
    }

    #[test]
    fn empty_denylist_keeps_everything() {
        let result = apply(vec![page("/"), page("/blog/")], &RouteDenylist::empty());
        assert_eq!(routes(&result), vec!["/", "/blog/"]);
        assert!(result.suppressed().is_empty());
    }

    #[test]
    fn keeps_plan_order() {
        let denylist = RouteDenylist::new(&["/b"]).unwrap();
        let result = apply(
            vec![page("/c/"), page("/b/"), page("/a/"), page("/d/")],
            &denylist,
        );
        assert_eq!(routes(&result), vec!["/c/", "/a/", "/d/"]);
    }

    #[test]
    fn relative_entry_rejected() {
        assert!(matches!(
            RouteDenylist::new(&["about"]),
            Err(ConfigError::Denylist(_))
        ));
    }

    #[test]
    fn root_entry_rejected() {
        assert!(RouteDenylist::new(&["/"]).is_err());
    }

    #[test]
    fn duplicate_entry_rejected() {
        assert!(RouteDenylist::new(&["/about", "/about/"]).is_err());
    }

    #[test]
    fn nested_entries_rejected() {
        let err = RouteDenylist::new(&["/about/me", "/about"]).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn sibling_entries_allowed() {
        let denylist = RouteDenylist::new(&["/about", "/about-me"]).unwrap();
        assert_eq!(denylist.entries().len(), 2);
    }

    #[test]
    fn contains_route_ignores_trailing_slash() {
        let result = apply(vec![page("/contact/"), page("/")], &RouteDenylist::empty());
        assert!(result.contains_route("/contact"));
        assert!(result.contains_route("/"));
        assert!(!result.contains_route("/about/"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn normalize_keeps_root() {
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route("/a/"), "/a");
        assert_eq!(normalize_route("/a"), "/a");
    }
}
