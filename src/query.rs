//! Content queries over the derived node set.
//!
//! Stage 4 of the build pipeline. The site needs one query shape: "content
//! nodes, newest first by their `date` field", optionally limited to one
//! source root and/or the first N results. The listing page uses it
//! unrestricted; the home page adds a limit.
//!
//! ## Sort Contract
//!
//! - Nodes with a parseable `date` come first, newest to oldest.
//! - Nodes with a missing or unparseable `date` follow the configured
//!   [`DatePolicy`]: `SortLast` treats them as the earliest possible date
//!   and reports a warning; `Reject` fails the query.
//! - Equal dates (and all undated nodes) keep discovery order. The sort key
//!   includes the discovery index, so the order is total and identical on
//!   every build of the same input.
//!
//! Every build recomputes the result from the full node set; nothing is
//! cached between builds.

use crate::config::DatePolicy;
use crate::derive::NodeSet;
use crate::metadata::parse_date;
use crate::types::ContentNode;
use chrono::NaiveDateTime;
use std::cmp::Reverse;
use thiserror::Error;

/// The field posts are ordered by.
pub const DATE_FIELD: &str = "date";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("{node}: missing `{field}` field")]
    MissingField { field: &'static str, node: String },
    #[error("{node}: cannot parse `{field}` value {value:?}")]
    InvalidField {
        field: &'static str,
        node: String,
        value: String,
    },
}

/// A declared query shape.
#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    source_root: Option<String>,
    limit: Option<usize>,
    missing_date: DatePolicy,
}

impl ContentQuery {
    /// All nodes, newest first.
    pub fn by_date_desc(missing_date: DatePolicy) -> Self {
        Self {
            source_root: None,
            limit: None,
            missing_date,
        }
    }

    /// Only nodes discovered under `name`.
    pub fn from_root(mut self, name: impl Into<String>) -> Self {
        self.source_root = Some(name.into());
        self
    }

    /// Keep at most `n` results.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Run the query. Undated nodes are checked before the limit applies, so
    /// a `Reject` policy fails regardless of where the node would land.
    pub fn run<'a>(&self, nodes: &'a NodeSet) -> Result<QueryResult<'a>, QueryError> {
        let mut keyed: Vec<(Option<NaiveDateTime>, &'a ContentNode)> = Vec::new();
        let mut warnings = Vec::new();

        for node in nodes.iter().filter(|n| self.includes(n)) {
            let date = match node_date(node) {
                Ok(date) => Some(date),
                Err(problem) => match self.missing_date {
                    DatePolicy::Reject => return Err(problem),
                    DatePolicy::SortLast => {
                        warnings.push(problem);
                        None
                    }
                },
            };
            keyed.push((date, node));
        }

        // `None` orders below every `Some`, so reversing puts undated nodes last.
        keyed.sort_by_key(|(date, node)| (Reverse(*date), node.discovery_index()));

        let mut items: Vec<&'a ContentNode> = keyed.into_iter().map(|(_, node)| node).collect();
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
        Ok(QueryResult { items, warnings })
    }

    fn includes(&self, node: &ContentNode) -> bool {
        self.source_root
            .as_deref()
            .is_none_or(|root| node.source_root() == root)
    }
}

/// Parsed `date` of a node, or why it has none.
pub fn node_date(node: &ContentNode) -> Result<NaiveDateTime, QueryError> {
    let Some(value) = node.raw_fields().get(DATE_FIELD) else {
        return Err(QueryError::MissingField {
            field: DATE_FIELD,
            node: node.id(),
        });
    };
    let text = value.to_string();
    parse_date(&text).ok_or(QueryError::InvalidField {
        field: DATE_FIELD,
        node: node.id(),
        value: text,
    })
}

/// Ordered, borrowed view of the nodes a query selected.
#[derive(Debug, Clone, Default)]
pub struct QueryResult<'a> {
    items: Vec<&'a ContentNode>,
    warnings: Vec<QueryError>,
}

impl<'a> QueryResult<'a> {
    pub fn items(&self) -> &[&'a ContentNode] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a ContentNode> + '_ {
        self.items.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Undated nodes that were sorted last instead of rejected.
    pub fn warnings(&self) -> &[QueryError] {
        &self.warnings
    }
}
