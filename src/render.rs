//! HTML rendering of final pages.
//!
//! Stage 7 of the build pipeline. Every page in [`FinalPages`] is turned into
//! one HTML document by a [`PageRenderer`]. The default [`SiteRenderer`]
//! has one template per [`TemplateId`]:
//!
//! - **home** (`/`): intro text and the most recent posts
//! - **listing** (`/blog/` by default): every post, newest first, with date
//!   and description
//! - **page**: a static `[[pages]]` entry from config
//! - **post**: a single content node, looked up by the `slug` context entry
//!
//! All templates share the same document shell: site header, navigation,
//! page content, footer. Navigation links and post summaries only appear for
//! routes that are actually rendered, so a suppressed page is never linked.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Every interpolated value is escaped; only transformer output (already
//! HTML) is inserted with `PreEscaped`.

use crate::config::{NavLink, SiteConfig};
use crate::derive::NodeSet;
use crate::filter::{FinalPages, normalize_route};
use crate::metadata::{format_date, resolve, title_from_path};
use crate::query::{QueryResult, node_date};
use crate::transform::render_markdown;
use crate::types::{ContentNode, PageSpec, TemplateId};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("{route}: missing `{key}` in page context")]
    MissingContext { route: String, key: &'static str },
    #[error("{route}: no content node with slug {slug}")]
    UnknownNode { route: String, slug: String },
    #[error("{route}: no [[pages]] entry for this route")]
    UnknownPage { route: String },
}

const CSS: &str = include_str!("../static/style.css");

/// Everything a template may read. Borrowed for the duration of a build.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub config: &'a SiteConfig,
    pub nodes: &'a NodeSet,
    /// All posts, newest first.
    pub listing: &'a QueryResult<'a>,
    /// The newest `home.recent_posts` posts.
    pub recent: &'a QueryResult<'a>,
    pub pages: &'a FinalPages,
}

/// Turns one planned page into an HTML document.
pub trait PageRenderer: Sync {
    fn render(&self, page: &PageSpec, ctx: &RenderContext<'_>) -> Result<String, RenderError>;
}

/// The built-in templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct SiteRenderer;

impl PageRenderer for SiteRenderer {
    fn render(&self, page: &PageSpec, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let markup = match page.template_id {
            TemplateId::Home => render_home(page, ctx),
            TemplateId::Listing => render_listing(page, ctx),
            TemplateId::Page => render_static_page(page, ctx)?,
            TemplateId::Post => render_post(page, ctx)?,
        };
        Ok(markup.into_string())
    }
}

// ============================================================================
// Field resolution
// ============================================================================

/// Front-matter `title`, else a title derived from the file name.
pub fn post_title(node: &ContentNode) -> String {
    let fallback = title_from_path(node.relative_path());
    resolve(&[node.field("title"), Some(fallback.as_str())]).unwrap_or(fallback)
}

/// Front-matter `description`, else the excerpt.
pub fn post_description(node: &ContentNode) -> Option<String> {
    resolve(&[node.field("description"), Some(node.excerpt())])
}

fn post_date(node: &ContentNode, pattern: &str) -> Option<(String, String)> {
    node_date(node)
        .ok()
        .map(|d| (d.format("%Y-%m-%d").to_string(), format_date(&d, pattern)))
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    ctx: &RenderContext<'_>,
    title: &str,
    description: Option<&str>,
    current_route: &str,
    content: Markup,
) -> Markup {
    let site = &ctx.config.site;
    let full_title = if title == site.title {
        title.to_string()
    } else {
        format!("{} | {}", title, site.title)
    };
    let description = description
        .filter(|d| !d.is_empty())
        .or(Some(site.description.as_str()).filter(|d| !d.is_empty()));

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (full_title) }
                @if let Some(description) = description {
                    meta name="description" content=(description);
                }
                style { (PreEscaped(CSS)) }
            }
            body {
                (site_header(&site.title, render_nav(&ctx.config.nav, current_route, ctx.pages)))
                main { (content) }
                footer.site-footer {
                    @if !site.author.is_empty() {
                        "© " (site.author)
                    }
                }
            }
        }
    }
}

/// Renders the site header with the site title and navigation
fn site_header(site_title: &str, nav: Markup) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (site_title) }
            nav.site-nav { (nav) }
        }
    }
}

/// Renders the navigation links that point at rendered pages
pub fn render_nav(links: &[NavLink], current_route: &str, pages: &FinalPages) -> Markup {
    html! {
        ul {
            @for link in links.iter().filter(|l| pages.contains_route(&l.route)) {
                @let current = is_current(&link.route, current_route);
                li class=[current.then_some("current")] {
                    a href=(link.route) { (link.title) }
                }
            }
        }
    }
}

fn is_current(link_route: &str, current_route: &str) -> bool {
    let link = normalize_route(link_route);
    let current = normalize_route(current_route);
    link == current
        || (link != "/"
            && current
                .strip_prefix(link)
                .is_some_and(|rest| rest.starts_with('/')))
}

/// A post entry as shown on the home and listing pages
fn post_summary(node: &ContentNode, date_format: &str) -> Markup {
    html! {
        article.post-summary {
            h2 { a href=(node.slug()) { (post_title(node)) } }
            @if let Some((iso, display)) = post_date(node, date_format) {
                time datetime=(iso) { (display) }
            }
            @if let Some(description) = post_description(node) {
                p { (description) }
            }
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

fn render_home(page: &PageSpec, ctx: &RenderContext<'_>) -> Markup {
    let home = &ctx.config.home;
    let listing = &ctx.config.listing;
    let content = html! {
        section.home-intro {
            h1 { (home.title) }
            @if !home.intro.is_empty() {
                (PreEscaped(render_markdown(&home.intro)))
            }
        }
        @if !ctx.recent.is_empty() {
            section.recent-posts {
                @for node in ctx.recent.iter().filter(|n| ctx.pages.contains_route(n.slug())) {
                    (post_summary(node, &listing.date_format))
                }
                @if ctx.pages.contains_route(&listing.route) {
                    p.more { a href=(listing.route) { (listing.title) " →" } }
                }
            }
        }
    };
    base_document(ctx, &home.title, None, &page.route_path, content)
}

fn render_listing(page: &PageSpec, ctx: &RenderContext<'_>) -> Markup {
    let listing = &ctx.config.listing;
    let content = html! {
        h1 { (listing.title) }
        @for node in ctx.listing.iter().filter(|n| ctx.pages.contains_route(n.slug())) {
            (post_summary(node, &listing.date_format))
        }
    };
    base_document(ctx, &listing.title, None, &page.route_path, content)
}

fn render_static_page(page: &PageSpec, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
    let route = context_value(page, "page")?;
    let entry = ctx
        .config
        .pages
        .iter()
        .find(|p| normalize_route(&p.route) == normalize_route(route))
        .ok_or_else(|| RenderError::UnknownPage {
            route: page.route_path.clone(),
        })?;
    let content = html! {
        article.static-page {
            h1 { (entry.title) }
            (PreEscaped(render_markdown(&entry.body)))
        }
    };
    Ok(base_document(
        ctx,
        &entry.title,
        None,
        &page.route_path,
        content,
    ))
}

fn render_post(page: &PageSpec, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
    let slug = context_value(page, "slug")?;
    let node = ctx.nodes.get(slug).ok_or_else(|| RenderError::UnknownNode {
        route: page.route_path.clone(),
        slug: slug.to_string(),
    })?;
    let title = post_title(node);
    let description = post_description(node);
    let date = post_date(node, &ctx.config.listing.date_format);

    let content = html! {
        article.post {
            header.post-header {
                h1 { (title) }
                @if let Some((iso, display)) = &date {
                    time datetime=(iso) { (display) }
                }
            }
            div.post-body { (PreEscaped(node.body())) }
        }
    };
    Ok(base_document(
        ctx,
        &title,
        description.as_deref(),
        &page.route_path,
        content,
    ))
}

fn context_value<'p>(page: &'p PageSpec, key: &'static str) -> Result<&'p str, RenderError> {
    page.context
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| RenderError::MissingContext {
            route: page.route_path.clone(),
            key,
        })
}

/// Date shown for a post on the listing page, if it has one.
pub fn display_date(node: &ContentNode, config: &SiteConfig) -> Option<String> {
    post_date(node, &config.listing.date_format).map(|(_, display)| display)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatePolicy, StaticPageConfig};
    use crate::derive::derive_fields;
    use crate::filter::RouteDenylist;
    use crate::plan::plan;
    use crate::query::ContentQuery;
    use crate::types::{DraftNode, FieldValue, PageContext, PageOrigin, RawFields, SourceFile};
    use std::path::PathBuf;

    fn draft(path: &str, fields: &[(&str, &str)], body: &str, index: usize) -> DraftNode {
        DraftNode {
            source: SourceFile {
                source_root: "blog".to_string(),
                relative_path: PathBuf::from(path),
                absolute_path: PathBuf::from(path),
                discovery_index: index,
            },
            raw_fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
                .collect::<RawFields>(),
            body: body.to_string(),
            excerpt: "An excerpt".to_string(),
        }
    }

    fn site_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.site.title = "Jane Doe".to_string();
        config.site.description = "Portfolio and blog".to_string();
        config.pages = vec![
            StaticPageConfig {
                route: "/about/".to_string(),
                title: "About".to_string(),
                body: "I write *code*.".to_string(),
            },
            StaticPageConfig {
                route: "/contact/".to_string(),
                title: "Contact".to_string(),
                body: String::new(),
            },
        ];
        config.nav = vec![
            NavLink {
                title: "Blog".to_string(),
                route: "/blog/".to_string(),
            },
            NavLink {
                title: "About".to_string(),
                route: "/about/".to_string(),
            },
            NavLink {
                title: "Contact".to_string(),
                route: "/contact/".to_string(),
            },
        ];
        config
    }

    /// Render every final page of a small site; returns `(route, html)`.
    fn render_site(
        config: &SiteConfig,
        drafts: Vec<DraftNode>,
        suppress: &[&str],
    ) -> Vec<(String, String)> {
        let nodes = derive_fields(drafts).unwrap();
        let listing = ContentQuery::by_date_desc(DatePolicy::SortLast)
            .run(&nodes)
            .unwrap();
        let recent = ContentQuery::by_date_desc(DatePolicy::SortLast)
            .limit(config.home.recent_posts)
            .run(&nodes)
            .unwrap();
        let pages = plan(config, &listing)
            .unwrap()
            .seal(&RouteDenylist::new(suppress).unwrap());
        let ctx = RenderContext {
            config,
            nodes: &nodes,
            listing: &listing,
            recent: &recent,
            pages: &pages,
        };
        pages
            .iter()
            .map(|p| (p.route_path.clone(), SiteRenderer.render(p, &ctx).unwrap()))
            .collect()
    }

    fn page_html<'a>(site: &'a [(String, String)], route: &str) -> &'a str {
        &site.iter().find(|(r, _)| r == route).unwrap().1
    }

    fn two_posts() -> Vec<DraftNode> {
        vec![
            draft(
                "2021-01-10-hello.md",
                &[("title", "Hello"), ("date", "2021-01-10"), ("description", "First post")],
                "<p>Hello body</p>",
                0,
            ),
            draft(
                "2021-02-01-world.md",
                &[("title", "World"), ("date", "2021-02-01")],
                "<p>World body</p>",
                1,
            ),
        ]
    }

    #[test]
    fn post_page_has_title_date_and_body() {
        let site = render_site(&site_config(), two_posts(), &[]);
        let html = page_html(&site, "/2021-01-10-hello/");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<title>Hello | Jane Doe</title>"));
        assert!(html.contains(r#"<meta name="description" content="First post">"#));
        assert!(html.contains(r#"<time datetime="2021-01-10">10 Jan, 2021</time>"#));
        assert!(html.contains("<p>Hello body</p>"));
    }

    #[test]
    fn post_description_falls_back_to_excerpt() {
        let site = render_site(&site_config(), two_posts(), &[]);
        let html = page_html(&site, "/2021-02-01-world/");
        assert!(html.contains(r#"content="An excerpt""#));
    }

    #[test]
    fn listing_orders_newest_first() {
        let site = render_site(&site_config(), two_posts(), &[]);
        let html = page_html(&site, "/blog/");
        let world = html.find("World").unwrap();
        let hello = html.find("Hello").unwrap();
        assert!(world < hello);
        assert!(html.contains(r#"href="/2021-02-01-world/""#));
        assert!(html.contains("First post"));
    }

    #[test]
    fn home_shows_limited_recent_posts() {
        let mut config = site_config();
        config.home.recent_posts = 1;
        config.home.intro = "Welcome **in**".to_string();
        let site = render_site(&config, two_posts(), &[]);
        let html = page_html(&site, "/");
        assert!(html.contains("World"));
        assert!(!html.contains("Hello body") && !html.contains(">Hello<"));
        assert!(html.contains("<strong>in</strong>"));
        assert!(html.contains(r#"href="/blog/""#));
    }

    #[test]
    fn static_page_renders_markdown_body() {
        let site = render_site(&site_config(), Vec::new(), &[]);
        let html = page_html(&site, "/about/");
        assert!(html.contains("<h1>About</h1>"));
        assert!(html.contains("<em>code</em>"));
    }

    #[test]
    fn nav_omits_suppressed_routes() {
        let site = render_site(&site_config(), two_posts(), &["/about"]);
        assert!(site.iter().all(|(route, _)| route != "/about/"));
        for (_, html) in &site {
            assert!(!html.contains(r#"href="/about/""#));
            assert!(html.contains(r#"href="/contact/""#));
        }
    }

    #[test]
    fn listing_skips_suppressed_posts() {
        let site = render_site(&site_config(), two_posts(), &["/2021-01-10-hello"]);
        let html = page_html(&site, "/blog/");
        assert!(html.contains(r#"href="/2021-02-01-world/""#));
        assert!(!html.contains(r#"href="/2021-01-10-hello/""#));
        assert!(!page_html(&site, "/").contains("/2021-01-10-hello/"));
    }

    #[test]
    fn nav_marks_current_section() {
        let site = render_site(&site_config(), two_posts(), &[]);
        let html = page_html(&site, "/contact/");
        assert!(html.contains(r#"<li class="current"><a href="/contact/">Contact</a></li>"#));
        assert!(is_current("/blog/", "/blog/page/2/"));
        assert!(!is_current("/", "/blog/"));
        assert!(!is_current("/blog/", "/blog-archive/"));
    }

    #[test]
    fn titles_are_escaped() {
        let drafts = vec![draft(
            "x.md",
            &[("title", "<script>alert(1)</script>"), ("date", "2021-01-01")],
            "",
            0,
        )];
        let site = render_site(&site_config(), drafts, &[]);
        let html = page_html(&site, "/x/");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn missing_title_derives_from_file_name() {
        let drafts = vec![draft(
            "2021-03-05-rust-tips/index.md",
            &[("date", "2021-03-05")],
            "",
            0,
        )];
        let nodes = derive_fields(drafts).unwrap();
        let node = nodes.get("/2021-03-05-rust-tips/").unwrap();
        assert_eq!(post_title(node), "rust tips");
    }

    #[test]
    fn undated_post_renders_without_time() {
        let drafts = vec![draft("notes.md", &[("title", "Notes")], "", 0)];
        let site = render_site(&site_config(), drafts, &[]);
        assert!(!page_html(&site, "/notes/").contains("<time"));
    }

    #[test]
    fn post_without_slug_context_is_error() {
        let config = site_config();
        let nodes = derive_fields(Vec::new()).unwrap();
        let listing = QueryResult::default();
        let pages = FinalPages::default();
        let ctx = RenderContext {
            config: &config,
            nodes: &nodes,
            listing: &listing,
            recent: &listing,
            pages: &pages,
        };
        let page = PageSpec {
            route_path: "/x/".to_string(),
            template_id: TemplateId::Post,
            context: PageContext::new(),
            origin: PageOrigin::Content,
        };
        assert_eq!(
            SiteRenderer.render(&page, &ctx),
            Err(RenderError::MissingContext {
                route: "/x/".to_string(),
                key: "slug",
            })
        );
    }

    #[test]
    fn post_with_unknown_slug_is_error() {
        let config = site_config();
        let nodes = derive_fields(Vec::new()).unwrap();
        let listing = QueryResult::default();
        let pages = FinalPages::default();
        let ctx = RenderContext {
            config: &config,
            nodes: &nodes,
            listing: &listing,
            recent: &listing,
            pages: &pages,
        };
        let page = PageSpec {
            route_path: "/gone/".to_string(),
            template_id: TemplateId::Post,
            context: PageContext::from([("slug".to_string(), "/gone/".to_string())]),
            origin: PageOrigin::Content,
        };
        assert!(matches!(
            SiteRenderer.render(&page, &ctx),
            Err(RenderError::UnknownNode { .. })
        ));
    }

    #[test]
    fn display_date_uses_listing_format() {
        let mut config = site_config();
        config.listing.date_format = "%Y/%m/%d".to_string();
        let nodes = derive_fields(two_posts()).unwrap();
        let node = nodes.get("/2021-01-10-hello/").unwrap();
        assert_eq!(display_date(node, &config).as_deref(), Some("2021/01/10"));
    }
}
