//! # Quire
//!
//! A minimal static site generator for a personal portfolio and blog.
//! Markdown files with YAML front matter are the data source: every file
//! becomes a post whose route is derived from where it lives, posts are
//! listed newest first, and a handful of static pages round out the site.
//!
//! # Architecture: Build Pipeline
//!
//! Content flows through seven stages, each a synchronization point over the
//! complete set of its inputs:
//!
//! ```text
//! 1. Collect     roots        →  SourceFile list   (walk content directories)
//! 2. Transform   SourceFile   →  DraftNode         (front matter + markdown, parallel)
//! 3. Derive      DraftNode    →  NodeSet           (slugs; collisions fail the build)
//! 4. Query       NodeSet      →  QueryResult       (date descending, stable)
//! 5. Plan        QueryResult  →  PageSet           (one page per post + config pages)
//! 6. Filter      PageSet      →  FinalPages        (route denylist, applied once)
//! 7. Render      FinalPages   →  dist/             (maud templates, sitemap)
//! ```
//!
//! Each stage hands the next an owned or borrowed value whose type only that
//! stage can produce. A `ContentNode` has no public constructor, so anything
//! holding one went through slug derivation; the renderer only accepts
//! `FinalPages`, so nothing reaches disk without passing the denylist.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`collect`] | Stage 1: walks source roots, returns content files in a deterministic order |
//! | [`transform`] | Stage 2: front matter parsing, markdown rendering, body stages, excerpts |
//! | [`derive`] | Stage 3: slug derivation and the immutable `NodeSet` |
//! | [`query`] | Stage 4: date-ordered content queries with a configurable missing-date policy |
//! | [`plan`] | Stage 5: `PageSpec` planning and the append-only `PageSet` |
//! | [`filter`] | Stage 6: route denylist and `FinalPages` |
//! | [`render`] | Stage 7: `PageRenderer` trait and the built-in maud templates |
//! | [`generate`] | Writes rendered pages and `sitemap.xml` to the output directory |
//! | [`pipeline`] | Runs the stages in order; `check` and `build` entry points |
//! | [`config`] | `config.toml` loading, merging over stock defaults, and validation |
//! | [`types`] | Data passed between stages (`SourceFile`, `ContentNode`, `PageSpec`) |
//! | [`naming`] | `YYYY-MM-DD-name` file name parser used for title fallbacks |
//! | [`metadata`] | Field resolution helpers: dates, titles |
//! | [`output`] | CLI output formatting for `check`, `plan`, and `build` |
//!
//! # Design Decisions
//!
//! ## Location Is Identity
//!
//! A post's route is a pure function of its source root and relative path.
//! Nothing in the front matter can change it, so renaming a file is the only
//! way to move a page, and two builds of the same tree always agree on
//! every URL. Adding a post is dropping a file in a directory; there is no
//! registry to update.
//!
//! ## Suppression Is Declarative
//!
//! Pages that exist in the tree but must not ship are listed once in
//! `suppress`. The list is validated up front and applied to every planned
//! page regardless of origin, then never consulted again.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. Malformed markup is a build error of this crate, not a
//! runtime surprise, and all interpolation is escaped.

pub mod collect;
pub mod config;
pub mod derive;
pub mod filter;
pub mod generate;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod plan;
pub mod query;
pub mod render;
pub mod transform;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
