//! Build orchestration.
//!
//! Wires the stages together in their fixed order:
//!
//! ```text
//! collect → transform → derive → query → plan → filter → render/write
//! ```
//!
//! Each stage either completes for the whole site or fails the build; there
//! is no partial output. The two entry points differ only in the last step:
//! [`build`] writes the site, [`check`] stops after filtering.

use crate::collect::{self, CollectError};
use crate::config::{ConfigError, SiteConfig};
use crate::derive::{self, DerivationError, NodeSet};
use crate::filter::{FinalPages, RouteDenylist};
use crate::generate::{self, GenerateError, GeneratedPage};
use crate::plan::{self, PlanError};
use crate::query::{ContentQuery, QueryError, QueryResult};
use crate::render::{self, RenderContext, SiteRenderer};
use crate::transform::{self, MarkdownTransformer, TransformError};
use crate::types::{PageSpec, TemplateId};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Collect error: {0}")]
    Collect(#[from] CollectError),
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
    #[error("Derivation error: {0}")]
    Derive(#[from] DerivationError),
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),
}

/// Collect, transform and derive every content file of the site.
pub fn load_content(site_dir: &Path, config: &SiteConfig) -> Result<NodeSet, BuildError> {
    let files = collect::collect(&config.source_roots(site_dir))?;
    let drafts = transform::transform_all(&MarkdownTransformer::default(), &files)?;
    let nodes = derive::derive_fields(drafts)?;
    log::info!("loaded {} content node(s)", nodes.len());
    Ok(nodes)
}

/// Query results and final pages for one build.
#[derive(Debug)]
pub struct SitePlan<'a> {
    /// Every post, newest first.
    pub listing: QueryResult<'a>,
    /// The newest posts shown on the home page.
    pub recent: QueryResult<'a>,
    pub pages: FinalPages,
}

impl<'a> SitePlan<'a> {
    pub fn render_context(
        &'a self,
        config: &'a SiteConfig,
        nodes: &'a NodeSet,
    ) -> RenderContext<'a> {
        RenderContext {
            config,
            nodes,
            listing: &self.listing,
            recent: &self.recent,
            pages: &self.pages,
        }
    }
}

/// Query, plan and filter.
///
/// The config is validated again here since callers may build one by hand.
/// Undated nodes are logged once; under the `reject` policy the first one
/// fails the build instead.
pub fn plan_site<'a>(
    config: &SiteConfig,
    nodes: &'a NodeSet,
) -> Result<SitePlan<'a>, BuildError> {
    config.validate()?;
    let policy = config.query.missing_date;
    let listing = ContentQuery::by_date_desc(policy).run(nodes)?;
    for warning in listing.warnings() {
        log::warn!("{warning}; sorted after dated posts");
    }
    let recent = ContentQuery::by_date_desc(policy)
        .limit(config.home.recent_posts)
        .run(nodes)?;

    let denylist = RouteDenylist::new(&config.suppress)?;
    let pages = plan::plan(config, &listing)?.seal(&denylist);
    for route in pages.suppressed() {
        log::info!("suppressed route {route}");
    }
    Ok(SitePlan {
        listing,
        recent,
        pages,
    })
}

/// One row of a build report.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub route: String,
    pub template: TemplateId,
    pub title: String,
    /// Display date, for posts that have one.
    pub date: Option<String>,
}

/// What a `check` or `build` produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub node_count: usize,
    pub pages: Vec<PageSummary>,
    pub suppressed: Vec<String>,
    pub warnings: Vec<String>,
    /// Files written; empty for `check`.
    pub written: Vec<GeneratedPage>,
    /// SHA-256 over the final pages (see [`digest`]).
    pub digest: String,
}

/// Run everything up to and including the route filter.
pub fn check(site_dir: &Path, config: &SiteConfig) -> Result<BuildReport, BuildError> {
    let nodes = load_content(site_dir, config)?;
    let site = plan_site(config, &nodes)?;
    Ok(report(config, &nodes, &site, Vec::new()))
}

/// Run the full pipeline and write the site to `output_dir`.
pub fn build(
    site_dir: &Path,
    config: &SiteConfig,
    output_dir: &Path,
) -> Result<BuildReport, BuildError> {
    let nodes = load_content(site_dir, config)?;
    let site = plan_site(config, &nodes)?;
    let ctx = site.render_context(config, &nodes);
    let written = generate::generate(&SiteRenderer, &ctx, output_dir)?;
    Ok(report(config, &nodes, &site, written))
}

/// Summarize a planned site. `written` is empty unless the site was built.
pub fn report(
    config: &SiteConfig,
    nodes: &NodeSet,
    site: &SitePlan<'_>,
    written: Vec<GeneratedPage>,
) -> BuildReport {
    BuildReport {
        node_count: nodes.len(),
        pages: site
            .pages
            .iter()
            .map(|page| summarize(page, config, nodes))
            .collect(),
        suppressed: site.pages.suppressed().to_vec(),
        warnings: site
            .listing
            .warnings()
            .iter()
            .map(ToString::to_string)
            .collect(),
        written,
        digest: digest(&site.pages),
    }
}

fn summarize(page: &PageSpec, config: &SiteConfig, nodes: &NodeSet) -> PageSummary {
    let node = page.slug().and_then(|slug| nodes.get(slug));
    let title = match page.template_id {
        TemplateId::Home => config.home.title.clone(),
        TemplateId::Listing => config.listing.title.clone(),
        TemplateId::Page => config
            .pages
            .iter()
            .find(|p| p.route == page.route_path)
            .map(|p| p.title.clone())
            .unwrap_or_default(),
        TemplateId::Post => node.map(render::post_title).unwrap_or_default(),
    };
    PageSummary {
        route: page.route_path.clone(),
        template: page.template_id,
        title,
        date: node.and_then(|n| render::display_date(n, config)),
    }
}

/// SHA-256 over every final page's route, template and context, in order.
///
/// Two builds of the same input produce the same digest.
pub fn digest(pages: &FinalPages) -> String {
    let mut hasher = Sha256::new();
    for page in pages.iter() {
        hasher.update(page.route_path.as_bytes());
        hasher.update(b"\0");
        hasher.update(page.template_id.as_str().as_bytes());
        for (key, value) in &page.context {
            hasher.update(b"\0");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
