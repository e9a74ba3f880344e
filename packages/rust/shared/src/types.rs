//! Core domain types for Adit content graphs and exports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AditError, Result};

/// Current schema version for the export manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ContentNode
// ---------------------------------------------------------------------------

/// The role a content node plays in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Grouping node; may or may not carry its own text.
    Passage,
    /// Node whose primary purpose is body text.
    LeafContent,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passage => "passage",
            Self::LeafContent => "leaf-content",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = AditError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "passage" => Ok(Self::Passage),
            "leaf-content" => Ok(Self::LeafContent),
            other => Err(AditError::validation(format!("unknown node kind `{other}`"))),
        }
    }
}

/// The atomic unit of content in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Stable unique identifier.
    pub key: String,
    /// Passage or leaf content.
    pub kind: NodeKind,
    /// Short human-readable title.
    pub label: String,
    /// Optional numeric rank among siblings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    /// Nesting level in the built tree (root = 0).
    #[serde(default)]
    pub depth: usize,
    /// Markdown body, possibly with its own headings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Keys aggregated into this node's composite chunk, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouped_keys: Option<Vec<String>>,
    /// Free-form attributes addressable by include/exclude predicates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Markdown fragments accumulated while paging.
    #[serde(skip)]
    pub chunks: Vec<String>,
}

impl ContentNode {
    /// Create a node with no body, order, or grouping.
    pub fn new(key: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            label: label.into(),
            order: None,
            depth: 0,
            body: None,
            grouped_keys: None,
            attributes: BTreeMap::new(),
            chunks: Vec::new(),
        }
    }

    /// Create a passage node.
    pub fn passage(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, NodeKind::Passage, label)
    }

    /// Create a leaf-content node carrying `body`.
    pub fn leaf(key: impl Into<String>, label: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(key, NodeKind::LeafContent, label).with_body(body)
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_grouped_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grouped_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Whether this node aggregates other nodes into one chunk.
    pub fn is_composite(&self) -> bool {
        self.grouped_keys.is_some()
    }

    /// The body, if present and not blank.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.trim().is_empty())
    }

    /// Render a named attribute as a string for predicate matching.
    ///
    /// Built-in fields shadow entries of the same name in `attributes`.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "key" => Some(self.key.clone()),
            "label" => Some(self.label.clone()),
            "kind" => Some(self.kind.as_str().to_string()),
            "order" => self.order.map(|o| o.to_string()),
            "body" => self.body.clone(),
            other => self.attributes.get(other).map(|value| match value {
                serde_json::Value::String(s) => s.clone(),
                v => v.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// A single `{attribute, value}` filter condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub attribute: String,
    pub value: String,
}

impl Predicate {
    /// Whether `node` carries `attribute` with exactly `value`.
    pub fn matches(&self, node: &ContentNode) -> bool {
        node.attribute(&self.attribute).as_deref() == Some(self.value.as_str())
    }
}

impl std::str::FromStr for Predicate {
    type Err = AditError;

    /// Parse `attribute=value`.
    fn from_str(s: &str) -> Result<Self> {
        let (attribute, value) = s.split_once('=').ok_or_else(|| {
            AditError::validation(format!("predicate `{s}` must have the form attribute=value"))
        })?;
        let attribute = attribute.trim();
        if attribute.is_empty() {
            return Err(AditError::validation(format!(
                "predicate `{s}` has an empty attribute name"
            )));
        }
        Ok(Self {
            attribute: attribute.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.attribute, self.value)
    }
}

/// Include/exclude predicates applied together.
///
/// A node survives if it matches every include and none of the excludes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateSet {
    pub include: Vec<Predicate>,
    pub exclude: Vec<Predicate>,
}

impl PredicateSet {
    /// Parse `attribute=value` strings, rejecting malformed entries.
    pub fn parse<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        let parse_all = |items: &[S]| {
            items
                .iter()
                .map(|s| s.as_ref().parse::<Predicate>())
                .collect::<Result<Vec<_>>>()
        };
        Ok(Self {
            include: parse_all(include)?,
            exclude: parse_all(exclude)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn admits(&self, node: &ContentNode) -> bool {
        self.include.iter().all(|p| p.matches(node)) && !self.exclude.iter().any(|p| p.matches(node))
    }
}

// ---------------------------------------------------------------------------
// Navigation & breadcrumbs
// ---------------------------------------------------------------------------

/// One node of the navigation map handed to site generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavEntry {
    pub key: String,
    pub label: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    pub depth: usize,
    /// Ordered child entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    /// Number of entries in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NavEntry::count).sum::<usize>()
    }
}

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub key: String,
    pub label: String,
}

/// Root-first intermediate nodes of one graph route, root and target excluded.
pub type BreadcrumbTrail = Vec<Breadcrumb>;

// ---------------------------------------------------------------------------
// Export manifest
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for export run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportId(pub Uuid);

impl ExportId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ExportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A page written by an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Path relative to the export directory.
    pub path: String,
    pub key: String,
    pub title: String,
    /// SHA-256 of the page content.
    pub sha256: String,
    pub size_bytes: usize,
}

/// The `manifest.json` written at the root of an export directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub schema_version: u32,
    pub id: ExportId,
    /// Root key the export was built from.
    pub root: String,
    /// Output flavour: `site`, `wiki`, or `linear`.
    pub format: String,
    pub tool_version: String,
    pub created_at: DateTime<Utc>,
    pub page_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageRecord>,
}
