//! Page planning.
//!
//! Stage 5 of the build pipeline. Turns query results and the site config
//! into the full list of pages the build intends to produce:
//!
//! ```text
//! /                      home      {}
//! /blog/                 listing   {}
//! /contact/              page      {page: /contact/}
//! /2021-02-01-world/     post      {slug: /2021-02-01-world/}
//! /2021-01-10-hello/     post      {slug: /2021-01-10-hello/}
//! ```
//!
//! Default pages come first, then one post page per query item in query
//! order. Nothing here touches the filesystem.
//!
//! A [`PageSet`] only grows. Once every contributor has pushed its pages it
//! is sealed against the route denylist, which is the single point where
//! suppression happens.

use crate::config::SiteConfig;
use crate::filter::{self, FinalPages, RouteDenylist, normalize_route};
use crate::query::QueryResult;
use crate::types::{PageContext, PageOrigin, PageSpec, TemplateId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PlanError {
    #[error("Route {route} is planned twice ({first} and {second})")]
    RouteConflict {
        route: String,
        first: TemplateId,
        second: TemplateId,
    },
}

/// One `post` page per query item, in query order.
pub fn plan_posts(items: &QueryResult<'_>) -> Vec<PageSpec> {
    items
        .iter()
        .map(|node| PageSpec {
            route_path: node.slug().to_string(),
            template_id: TemplateId::Post,
            context: PageContext::from([("slug".to_string(), node.slug().to_string())]),
            origin: PageOrigin::Content,
        })
        .collect()
}

/// Pages the site declares regardless of content: home, listing, and every
/// `[[pages]]` entry.
pub fn default_pages(config: &SiteConfig) -> Vec<PageSpec> {
    let mut pages = vec![
        default_page("/", TemplateId::Home, PageContext::new()),
        default_page(&config.listing.route, TemplateId::Listing, PageContext::new()),
    ];
    for page in &config.pages {
        pages.push(default_page(
            &page.route,
            TemplateId::Page,
            PageContext::from([("page".to_string(), page.route.clone())]),
        ));
    }
    pages
}

fn default_page(route: &str, template_id: TemplateId, context: PageContext) -> PageSpec {
    PageSpec {
        route_path: route.to_string(),
        template_id,
        context,
        origin: PageOrigin::Default,
    }
}

/// Plan every page of the site: defaults, then posts.
pub fn plan(config: &SiteConfig, posts: &QueryResult<'_>) -> Result<PageSet, PlanError> {
    let mut set = PageSet::new();
    set.extend(default_pages(config))?;
    set.extend(plan_posts(posts))?;
    Ok(set)
}

/// Append-only collection of planned pages.
#[derive(Debug, Default)]
pub struct PageSet {
    pages: Vec<PageSpec>,
    routes: HashMap<String, usize>,
}

impl PageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page. Two pages on the same route (trailing `/` ignored) is an
    /// error rather than a silent overwrite.
    pub fn push(&mut self, page: PageSpec) -> Result<(), PlanError> {
        let key = normalize_route(&page.route_path).to_string();
        if let Some(&existing) = self.routes.get(&key) {
            return Err(PlanError::RouteConflict {
                route: page.route_path,
                first: self.pages[existing].template_id,
                second: page.template_id,
            });
        }
        self.routes.insert(key, self.pages.len());
        self.pages.push(page);
        Ok(())
    }

    pub fn extend(&mut self, pages: impl IntoIterator<Item = PageSpec>) -> Result<(), PlanError> {
        for page in pages {
            self.push(page)?;
        }
        Ok(())
    }

    pub fn pages(&self) -> &[PageSpec] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Apply the denylist and close the set.
    pub fn seal(self, denylist: &RouteDenylist) -> FinalPages {
        filter::apply(self.pages, denylist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatePolicy, StaticPageConfig};
    use crate::derive::derive_fields;
    use crate::query::ContentQuery;
    use crate::types::{DraftNode, FieldValue, RawFields, SourceFile};
    use std::path::PathBuf;

    fn draft(path: &str, date: &str, index: usize) -> DraftNode {
        DraftNode {
            source: SourceFile {
                source_root: "blog".to_string(),
                relative_path: PathBuf::from(path),
                absolute_path: PathBuf::from(path),
                discovery_index: index,
            },
            raw_fields: RawFields::from([(
                "date".to_string(),
                FieldValue::Text(date.to_string()),
            )]),
            body: String::new(),
            excerpt: String::new(),
        }
    }

    fn routes(pages: &[PageSpec]) -> Vec<&str> {
        pages.iter().map(|p| p.route_path.as_str()).collect()
    }

    #[test]
    fn one_post_page_per_item_in_query_order() {
        let set = derive_fields(vec![
            draft("2021-01-10-hello.md", "2021-01-10", 0),
            draft("2021-02-01-world.md", "2021-02-01", 1),
        ])
        .unwrap();
        let result = ContentQuery::by_date_desc(DatePolicy::SortLast)
            .run(&set)
            .unwrap();
        let pages = plan_posts(&result);

        assert_eq!(
            routes(&pages),
            vec!["/2021-02-01-world/", "/2021-01-10-hello/"]
        );
        for page in &pages {
            assert_eq!(page.template_id, TemplateId::Post);
            assert_eq!(page.origin, PageOrigin::Content);
            assert_eq!(page.slug(), Some(page.route_path.as_str()));
            assert_eq!(page.context.len(), 1);
        }
    }

    #[test]
    fn default_pages_cover_home_listing_and_static() {
        let mut config = SiteConfig::default();
        config.pages.push(StaticPageConfig {
            route: "/contact/".to_string(),
            title: "Contact".to_string(),
            body: String::new(),
        });
        let pages = default_pages(&config);
        assert_eq!(routes(&pages), vec!["/", "/blog/", "/contact/"]);
        assert_eq!(pages[2].context.get("page").unwrap(), "/contact/");
        assert!(pages.iter().all(|p| p.origin == PageOrigin::Default));
    }

    #[test]
    fn push_rejects_duplicate_route() {
        let mut set = PageSet::new();
        set.extend(default_pages(&SiteConfig::default())).unwrap();
        let err = set
            .push(PageSpec {
                route_path: "/blog".to_string(),
                template_id: TemplateId::Post,
                context: PageContext::new(),
                origin: PageOrigin::Content,
            })
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::RouteConflict {
                route: "/blog".to_string(),
                first: TemplateId::Listing,
                second: TemplateId::Post,
            }
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn seal_filters_every_origin() {
        let mut config = SiteConfig::default();
        config.pages.push(StaticPageConfig {
            route: "/about/".to_string(),
            title: "About".to_string(),
            body: String::new(),
        });
        let nodes = derive_fields(vec![draft("about/me.md", "2020-01-01", 0)]).unwrap();
        let result = ContentQuery::by_date_desc(DatePolicy::SortLast)
            .run(&nodes)
            .unwrap();
        let set = plan(&config, &result).unwrap();
        assert_eq!(set.len(), 4);

        let denylist = RouteDenylist::new(&["/about"]).unwrap();
        let final_pages = set.seal(&denylist);
        assert_eq!(routes(final_pages.pages()), vec!["/", "/blog/"]);
        assert_eq!(final_pages.suppressed(), &["/about/", "/about/me/"]);
    }

    #[test]
    fn empty_query_plans_defaults_only() {
        let nodes = derive_fields(Vec::new()).unwrap();
        let result = ContentQuery::by_date_desc(DatePolicy::SortLast)
            .run(&nodes)
            .unwrap();
        let set = plan(&SiteConfig::default(), &result).unwrap();
        assert_eq!(routes(set.pages()), vec!["/", "/blog/"]);
    }
}
