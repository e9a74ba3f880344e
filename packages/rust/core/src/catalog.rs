//! Content catalog: turns a content graph into exportable markdown.
//!
//! The catalog loads every node reachable from the root, builds the document
//! tree, aggregates composite nodes, and hands out chunks either as a flat
//! ordered sequence ([`Catalog::get_ordered`]) or attached to a pruned tree
//! ([`Catalog::get_paged`]).
//!
//! Lifecycle: [`Catalog::new`] validates options without touching the graph,
//! [`Catalog::init`] snapshots the graph, and [`Catalog::populate_chunks`]
//! optionally precomputes composite chunks. Every retrieval before `init`
//! fails with [`AditError::IllegalState`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use adit_markdown::{content_len, label_heading, normalize_headings};
use adit_shared::{
    AditError, BreadcrumbTrail, CatalogOptions, ContentNode, NodeKind, PredicateSet, Result,
};

use crate::breadcrumbs::resolve_breadcrumbs;
use crate::graph::{Direction, GraphSource};
use crate::order::compare_nodes;
use crate::tree::{DocTree, NodeId, build_tree};

/// One exportable chunk in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub key: String,
    pub label: String,
    pub depth: usize,
    pub markdown: String,
}

/// Immediate neighbours of a node, each side sorted with [`compare_nodes`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjacency {
    pub inbound: Vec<ContentNode>,
    pub outbound: Vec<ContentNode>,
}

/// Graph state captured by [`Catalog::init`].
#[derive(Debug)]
struct Snapshot {
    root: ContentNode,
    /// Every reached node, root included.
    nodes: HashMap<String, ContentNode>,
    /// Reached keys rejected by the predicate set.
    filtered: HashSet<String>,
    /// Canonical root-first path per reached key, from the unfiltered traversal.
    paths: Vec<Vec<String>>,
    /// Populated chunk per key; takes precedence over the raw body.
    chunks: HashMap<String, String>,
    /// Keys folded into a composite chunk.
    consumed: HashSet<String>,
}

impl Snapshot {
    /// Exportable markdown for `node` at `depth`, or `None` when there is
    /// nothing worth exporting.
    fn resolve(
        &self,
        node: &ContentNode,
        depth: usize,
        min_content_length: usize,
        label_fallback: bool,
    ) -> Option<String> {
        if self.filtered.contains(&node.key) {
            debug!(key = %node.key, "filtered, skipping");
            return None;
        }
        if self.consumed.contains(&node.key) {
            return None;
        }

        let text = match (self.chunks.get(&node.key), node.body_text()) {
            (Some(chunk), _) => chunk.clone(),
            (None, Some(body)) => body.to_string(),
            (None, None) if label_fallback && node.kind == NodeKind::Passage => {
                label_heading(&node.label)
            }
            (None, None) => return None,
        };

        let markdown = normalize_headings(&text, depth.max(1));
        let len = content_len(&markdown);
        if len < min_content_length {
            debug!(key = %node.key, len, min = min_content_length, "below minimum length");
            return None;
        }
        Some(markdown)
    }
}

/// Flattens the graph reachable from one root into document chunks.
pub struct Catalog<G> {
    source: G,
    options: CatalogOptions,
    state: Option<Snapshot>,
}

impl<G: GraphSource> Catalog<G> {
    /// Create an uninitialized catalog. Options are validated here, before
    /// any graph access.
    pub fn new(source: G, options: CatalogOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            source,
            options,
            state: None,
        })
    }

    pub fn source(&self) -> &G {
        &self.source
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    fn snapshot(&self) -> Result<&Snapshot> {
        self.state
            .as_ref()
            .ok_or_else(|| AditError::illegal_state("catalog used before init()"))
    }

    /// Snapshot the graph reachable from the root.
    ///
    /// Re-running `init` starts from a fresh lookup and discards any
    /// populated chunks.
    #[instrument(skip_all, fields(root = %self.options.root, max_depth = self.options.max_depth))]
    pub async fn init(&mut self) -> Result<()> {
        self.state = None;

        let root = self
            .source
            .node(&self.options.root)
            .await?
            .ok_or_else(|| {
                AditError::reference(format!("root `{}` not found in graph", self.options.root))
            })?;

        let records = self
            .source
            .traverse(&root.key, self.options.max_depth, &PredicateSet::default())
            .await?;

        let mut nodes = HashMap::with_capacity(records.len() + 1);
        let mut paths = Vec::with_capacity(records.len());
        for record in records {
            nodes.insert(record.node.key.clone(), record.node);
            paths.push(record.path);
        }
        nodes.insert(root.key.clone(), root.clone());

        let filtered: HashSet<String> = nodes
            .values()
            .filter(|n| n.key != root.key && !self.options.predicates.admits(n))
            .map(|n| n.key.clone())
            .collect();

        info!(
            nodes = nodes.len(),
            filtered = filtered.len(),
            "catalog initialized"
        );

        self.state = Some(Snapshot {
            root,
            nodes,
            filtered,
            paths,
            chunks: HashMap::new(),
            consumed: HashSet::new(),
        });
        Ok(())
    }

    /// Build the document tree, restricted by the predicate set.
    ///
    /// With active predicates the traversal is re-run filtered, so nodes
    /// reachable only through a filtered vertex are left out and surviving
    /// nodes take the position the filtered traversal gives them.
    pub async fn tree(&self) -> Result<DocTree> {
        let snap = self.snapshot()?;
        if self.options.predicates.is_empty() {
            return build_tree(&snap.root, &snap.nodes, &snap.paths);
        }

        let records = self
            .source
            .traverse(&snap.root.key, self.options.max_depth, &self.options.predicates)
            .await?;
        build_tree(&snap.root, &snap.nodes, records.iter().map(|r| &r.path))
    }

    /// Every exportable chunk in document order.
    ///
    /// A passage with children but no body of its own contributes a heading
    /// built from its label.
    #[instrument(skip_all, fields(root = %self.options.root))]
    pub async fn get_ordered(&self) -> Result<Vec<Chunk>> {
        let tree = self.tree().await?;
        let snap = self.snapshot()?;

        let mut chunks = Vec::new();
        for id in tree.preorder() {
            let node = tree.node(id);
            let has_children = !tree.children(id).is_empty();
            if let Some(markdown) = snap.resolve(
                node,
                node.depth,
                self.options.min_content_length,
                has_children,
            ) {
                chunks.push(Chunk {
                    key: node.key.clone(),
                    label: node.label.clone(),
                    depth: node.depth,
                    markdown,
                });
            }
        }
        debug!(chunks = chunks.len(), "ordered chunks resolved");
        Ok(chunks)
    }

    /// The document tree with chunks attached, collated and pruned.
    ///
    /// Collation folds content into enclosing passages: every plain passage
    /// that received no chunk of its own takes over the chunks of its
    /// children, in sibling order. Leaves left without chunks are then pruned
    /// until none remain; the root always stays.
    #[instrument(skip_all, fields(root = %self.options.root))]
    pub async fn get_paged(&self) -> Result<DocTree> {
        let mut tree = self.tree().await?;
        let snap = self.snapshot()?;

        let order = tree.preorder();
        for &id in &order {
            let node = tree.node(id);
            if let Some(markdown) =
                snap.resolve(node, node.depth, self.options.min_content_length, false)
            {
                tree.node_mut(id).chunks.push(markdown);
            }
        }

        let receivers: HashSet<NodeId> = order
            .iter()
            .copied()
            .filter(|&id| {
                let node = tree.node(id);
                node.kind == NodeKind::Passage && !node.is_composite() && node.chunks.is_empty()
            })
            .collect();

        let mut collated = 0usize;
        for &id in &order {
            let Some(parent) = tree.parent(id) else {
                continue;
            };
            if !receivers.contains(&parent) || tree.node(id).chunks.is_empty() {
                continue;
            }
            let moved = std::mem::take(&mut tree.node_mut(id).chunks);
            tree.node_mut(parent).chunks.extend(moved);
            collated += 1;
        }

        let pruned = tree.prune_empty_leaves();
        debug!(collated, pruned, nodes = tree.len(), "paged tree ready");
        Ok(tree)
    }

    /// Precompute chunks: composites aggregate their own body followed by
    /// each grouped node's body, joined with newlines, and the grouped nodes
    /// are consumed. Every other node with a body gets that body.
    ///
    /// A composite named in another composite's grouped keys is a reference
    /// error. Filtered grouped keys are skipped; grouped keys outside the
    /// snapshot are skipped with a warning.
    #[instrument(skip_all, fields(root = %self.options.root))]
    pub fn populate_chunks(&mut self) -> Result<()> {
        let snap = self
            .state
            .as_mut()
            .ok_or_else(|| AditError::illegal_state("catalog used before init()"))?;
        let Snapshot {
            nodes,
            filtered,
            chunks,
            consumed,
            ..
        } = snap;
        chunks.clear();
        consumed.clear();

        let mut composites: Vec<&ContentNode> = nodes
            .values()
            .filter(|n| n.is_composite() && !filtered.contains(&n.key))
            .collect();
        composites.sort_by(|a, b| a.key.cmp(&b.key));

        for composite in composites {
            let mut parts: Vec<&str> = composite.body_text().into_iter().collect();
            for key in composite.grouped_keys.iter().flatten() {
                if filtered.contains(key) {
                    debug!(composite = %composite.key, %key, "grouped key filtered, skipping");
                    continue;
                }
                let Some(member) = nodes.get(key) else {
                    warn!(composite = %composite.key, %key, "grouped key not in catalog, skipping");
                    continue;
                };
                if member.is_composite() {
                    return Err(AditError::reference(format!(
                        "composite `{}` groups composite `{key}`",
                        composite.key
                    )));
                }
                parts.extend(member.body_text());
                consumed.insert(key.clone());
            }
            if !parts.is_empty() {
                chunks.insert(composite.key.clone(), parts.join("\n"));
            }
        }

        for node in nodes.values() {
            if node.is_composite() || consumed.contains(&node.key) || filtered.contains(&node.key)
            {
                continue;
            }
            if let Some(body) = node.body_text() {
                chunks.insert(node.key.clone(), body.to_string());
            }
        }

        debug!(
            chunks = chunks.len(),
            consumed = consumed.len(),
            "chunks populated"
        );
        Ok(())
    }

    /// Normalized markdown for one node at `depth`.
    ///
    /// `None` when the key is not in the catalog, is filtered or consumed, or
    /// has nothing to export.
    pub fn get_chunk(&self, key: &str, depth: usize) -> Result<Option<String>> {
        let snap = self.snapshot()?;
        Ok(snap
            .nodes
            .get(key)
            .and_then(|node| snap.resolve(node, depth, self.options.min_content_length, false)))
    }

    /// Inbound and outbound neighbours of `key`, filtered nodes removed.
    pub async fn adjacency(&self, key: &str) -> Result<Adjacency> {
        self.snapshot()?;
        let mut adjacency = Adjacency::default();
        for neighbor in self.source.neighbors(key).await? {
            if !self.options.predicates.admits(&neighbor.node) {
                continue;
            }
            match neighbor.direction {
                Direction::Inbound => adjacency.inbound.push(neighbor.node),
                Direction::Outbound => adjacency.outbound.push(neighbor.node),
            }
        }
        adjacency.inbound.sort_by(compare_nodes);
        adjacency.outbound.sort_by(compare_nodes);
        Ok(adjacency)
    }

    /// Every route from the catalog root to `key`, as breadcrumb trails.
    ///
    /// Routes through filtered nodes are left out, matching [`Catalog::tree`].
    pub async fn breadcrumbs(&self, key: &str) -> Result<Vec<BreadcrumbTrail>> {
        let snap = self.snapshot()?;
        resolve_breadcrumbs(
            &self.source,
            &snap.root.key,
            key,
            self.options.max_depth,
            &self.options.predicates,
        )
        .await
    }
}
