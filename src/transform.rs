//! Markdown transformation: raw file bytes → [`DraftNode`].
//!
//! Stage 2 of the build pipeline. The pipeline only talks to the
//! [`ContentTransformer`] trait; [`MarkdownTransformer`] is the stock
//! implementation.
//!
//! ## File Format
//!
//! ```text
//! ---
//! title: Hello
//! date: 2021-01-10
//! description: First post
//! ---
//!
//! Body in **markdown**.
//! ```
//!
//! The front-matter block is optional. When present it must be a YAML
//! mapping fenced by `---` lines (the closing fence may also be `...`).
//! Every key is kept in [`RawFields`]; none is required here.
//!
//! ## Body Stages
//!
//! After markdown is rendered to HTML, the body passes through an ordered
//! list of [`BodyStage`]s. Each stage is a pure `html -> html` function and
//! documents what it assumes about its input. The stock order is:
//!
//! 1. [`HeadingAnchors`]
//! 2. [`CodeLanguageClass`]
//!
//! ## Parallelism
//!
//! Files are independent, so [`transform_all`] reads and transforms them on
//! the rayon pool. Results come back in discovery order and the first failure
//! fails the whole build: a partially transformed site is never produced.

use crate::types::{DraftNode, FieldValue, RawFields, SourceFile};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html as md_html};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: file is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },
    #[error("{}: front matter is not terminated by a closing `---`", path.display())]
    UnterminatedFrontMatter { path: PathBuf },
    #[error("{}: invalid front matter: {source}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
    #[error("{}: front matter must be a key/value mapping", path.display())]
    FrontMatterShape { path: PathBuf },
    #[error("{}: body stage '{stage}' failed: {source}", path.display())]
    Stage {
        path: PathBuf,
        stage: &'static str,
        #[source]
        source: StageError,
    },
}

/// Failure reported by a [`BodyStage`].
#[derive(Error, Debug)]
#[error("{0}")]
pub struct StageError(pub String);

/// Turns a content file into a draft node.
///
/// Implementations must be pure: the same `(source, bytes)` always yields
/// the same draft.
pub trait ContentTransformer: Send + Sync {
    fn transform(&self, source: &SourceFile, bytes: &[u8]) -> Result<DraftNode, TransformError>;
}

/// One step of HTML body post-processing.
pub trait BodyStage: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &'static str;
    fn apply(&self, html: String) -> Result<String, StageError>;
}

/// Default excerpt length in characters.
pub const EXCERPT_LENGTH: usize = 140;

/// Front matter (YAML) + CommonMark body, followed by body stages.
pub struct MarkdownTransformer {
    stages: Vec<Box<dyn BodyStage>>,
    excerpt_length: usize,
}

impl Default for MarkdownTransformer {
    fn default() -> Self {
        Self::with_stages(vec![Box::new(HeadingAnchors), Box::new(CodeLanguageClass)])
    }
}

impl MarkdownTransformer {
    pub fn with_stages(stages: Vec<Box<dyn BodyStage>>) -> Self {
        Self {
            stages,
            excerpt_length: EXCERPT_LENGTH,
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl ContentTransformer for MarkdownTransformer {
    fn transform(&self, source: &SourceFile, bytes: &[u8]) -> Result<DraftNode, TransformError> {
        let path = || source.absolute_path.clone();
        let text =
            std::str::from_utf8(bytes).map_err(|_| TransformError::Encoding { path: path() })?;

        let (front, markdown) = split_front_matter(text)
            .ok_or_else(|| TransformError::UnterminatedFrontMatter { path: path() })?;
        let raw_fields = match front {
            Some(yaml) => parse_front_matter(yaml).map_err(|e| match e {
                FrontMatterError::Yaml(source) => TransformError::FrontMatter {
                    path: path(),
                    source,
                },
                FrontMatterError::NotAMapping => {
                    TransformError::FrontMatterShape { path: path() }
                }
            })?,
            None => RawFields::new(),
        };

        let mut body = render_markdown(markdown);
        for stage in &self.stages {
            body = stage.apply(body).map_err(|source| TransformError::Stage {
                path: path(),
                stage: stage.name(),
                source,
            })?;
        }

        Ok(DraftNode {
            source: source.clone(),
            raw_fields,
            body,
            excerpt: excerpt(markdown, self.excerpt_length),
        })
    }
}

/// Read and transform every file, in parallel, preserving input order.
pub fn transform_all(
    transformer: &dyn ContentTransformer,
    files: &[SourceFile],
) -> Result<Vec<DraftNode>, TransformError> {
    files
        .par_iter()
        .map(|file| -> Result<DraftNode, TransformError> {
            let bytes = std::fs::read(&file.absolute_path).map_err(|source| {
                TransformError::Read {
                    path: file.absolute_path.clone(),
                    source,
                }
            })?;
            let draft = transformer.transform(file, &bytes)?;
            log::debug!("transformed {}", file.id());
            Ok(draft)
        })
        .collect()
}

// ============================================================================
// Front matter
// ============================================================================

/// Split `---` fenced front matter from the body.
///
/// Returns `None` when an opening fence has no closing fence.
pub(crate) fn split_front_matter(text: &str) -> Option<(Option<&str>, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (first_line, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (text, ""),
    };
    if first_line.trim_end() != "---" {
        return Some((None, text));
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((Some(&rest[..offset]), &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

enum FrontMatterError {
    Yaml(serde_yaml_ng::Error),
    NotAMapping,
}

fn parse_front_matter(yaml: &str) -> Result<RawFields, FrontMatterError> {
    let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml).map_err(FrontMatterError::Yaml)?;
    match value {
        serde_yaml_ng::Value::Null => Ok(RawFields::new()),
        serde_yaml_ng::Value::Mapping(map) => Ok(convert_mapping(map)),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

fn convert_mapping(map: serde_yaml_ng::Mapping) -> BTreeMap<String, FieldValue> {
    map.into_iter()
        .filter_map(|(key, value)| {
            let key = match key {
                serde_yaml_ng::Value::String(s) => s,
                serde_yaml_ng::Value::Number(n) => n.to_string(),
                serde_yaml_ng::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            convert_value(value).map(|v| (key, v))
        })
        .collect()
}

/// Null values are dropped, so `date:` with nothing after it reads as absent.
fn convert_value(value: serde_yaml_ng::Value) -> Option<FieldValue> {
    use serde_yaml_ng::Value;
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Bool(b)),
        Value::Number(n) => n.as_f64().map(FieldValue::Number),
        Value::String(s) => Some(FieldValue::Text(s)),
        Value::Sequence(items) => Some(FieldValue::List(
            items.into_iter().filter_map(convert_value).collect(),
        )),
        Value::Mapping(map) => Some(FieldValue::Map(convert_mapping(map))),
        Value::Tagged(tagged) => convert_value(tagged.value),
    }
}

// ============================================================================
// Markdown
// ============================================================================

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render CommonMark (plus tables, footnotes, strikethrough, task lists) to HTML.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

/// Plain-text excerpt of a markdown body, pruned on a word boundary.
pub fn excerpt(markdown: &str, max_chars: usize) -> String {
    let mut text = String::new();
    let mut in_code_block = false;
    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(t) | Event::Code(t) if !in_code_block => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => text.push(' '),
            _ => {}
        }
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    prune(&collapsed, max_chars)
}

fn prune(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out = String::new();
    for word in text.split(' ') {
        let needed = if out.is_empty() { 0 } else { 1 } + word.chars().count();
        if out.chars().count() + needed > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        out = text.chars().take(max_chars).collect();
    }
    out.push('…');
    out
}

// ============================================================================
// Body stages
// ============================================================================

/// Gives every `<h1>`–`<h6>` a unique `id` and a leading `#` anchor link.
///
/// Input contract: headings are emitted bare (`<h2>…</h2>`, no attributes),
/// which is what pulldown-cmark produces. Headings that already carry
/// attributes are left untouched.
pub struct HeadingAnchors;

impl BodyStage for HeadingAnchors {
    fn name(&self) -> &'static str {
        "heading-anchors"
    }

    fn apply(&self, html: String) -> Result<String, StageError> {
        let mut out = String::with_capacity(html.len() + 64);
        let mut used: HashSet<String> = HashSet::new();
        let mut rest = html.as_str();

        while let Some(start) = find_bare_heading(rest) {
            let level = rest.as_bytes()[start + 2] as char;
            let open_len = 4; // "<hN>"
            let close = format!("</h{level}>");
            let inner_start = start + open_len;
            let Some(inner_len) = rest[inner_start..].find(&close) else {
                return Err(StageError(format!("unclosed <h{level}>")));
            };
            let inner = &rest[inner_start..inner_start + inner_len];

            let base = heading_id(inner);
            let mut id = base.clone();
            let mut suffix = 1;
            while used.contains(&id) {
                id = format!("{base}-{suffix}");
                suffix += 1;
            }
            used.insert(id.clone());

            out.push_str(&rest[..start]);
            out.push_str(&format!(
                r##"<h{level} id="{id}"><a class="anchor" href="#{id}" aria-hidden="true">#</a>{inner}{close}"##
            ));
            rest = &rest[inner_start + inner_len + close.len()..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn find_bare_heading(html: &str) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut from = 0;
    while let Some(pos) = html[from..].find("<h") {
        let at = from + pos;
        if let (Some(level), Some(b'>')) = (bytes.get(at + 2).copied(), bytes.get(at + 3).copied())
            && (b'1'..=b'6').contains(&level)
        {
            return Some(at);
        }
        from = at + 2;
    }
    None
}

/// GitHub-style heading id: lower-case alphanumerics joined by dashes.
fn heading_id(inner_html: &str) -> String {
    let text = decode_entities(&strip_tags(inner_html));
    let mut id = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            id.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !id.ends_with('-') {
            id.push('-');
        }
    }
    let id = id.trim_matches('-').to_string();
    if id.is_empty() {
        "section".to_string()
    } else {
        id
    }
}

fn strip_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Copies a fenced block's `language-*` class from `<code>` onto its `<pre>`,
/// which is where syntax highlighters such as Prism look for it.
///
/// Input contract: fenced code renders as
/// `<pre><code class="language-X">`, as pulldown-cmark emits it.
pub struct CodeLanguageClass;

impl BodyStage for CodeLanguageClass {
    fn name(&self) -> &'static str {
        "code-language-class"
    }

    fn apply(&self, html: String) -> Result<String, StageError> {
        const MARKER: &str = r#"<pre><code class="language-"#;
        if !html.contains(MARKER) {
            return Ok(html);
        }
        let mut out = String::with_capacity(html.len() + 32);
        let mut rest = html.as_str();
        while let Some(pos) = rest.find(MARKER) {
            let lang_start = pos + MARKER.len();
            let Some(lang_len) = rest[lang_start..].find('"') else {
                return Err(StageError("unterminated code class attribute".to_string()));
            };
            let lang = &rest[lang_start..lang_start + lang_len];
            out.push_str(&rest[..pos]);
            out.push_str(&format!(
                r#"<pre class="language-{lang}"><code class="language-{lang}"#
            ));
            rest = &rest[lang_start + lang_len..];
        }
        out.push_str(rest);
        Ok(out)
    }
}
