//! Graph collaborator interface and an in-memory implementation.
//!
//! The catalog never walks the graph itself; it asks a [`GraphSource`] for
//! already-enumerated paths. [`MemoryGraph`] answers those queries from
//! in-process maps and is what tests and fixtures use. The libSQL-backed
//! store lives in `adit-storage`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;

use serde::{Deserialize, Serialize};

use adit_shared::{ContentNode, PredicateSet, Result};

use crate::order::compare_nodes;

/// One vertex reached by a traversal, with the root-first key path to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalRecord {
    pub node: ContentNode,
    pub path: Vec<String>,
}

/// Edge direction relative to the queried vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// An immediate neighbour of a vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub node: ContentNode,
    pub direction: Direction,
}

/// Queries the catalog needs from a graph store.
///
/// Calls are awaited one at a time by the catalog.
pub trait GraphSource {
    /// Full attributes of one vertex.
    fn node(&self, key: &str) -> impl Future<Output = Result<Option<ContentNode>>>;

    /// Bounded outbound traversal from `root` with global vertex uniqueness.
    ///
    /// Returns one record per reached vertex (the root excluded), ordered by
    /// depth and then by [`compare_nodes`] along the path. Vertices rejected
    /// by `predicates` are neither returned nor traversed through.
    fn traverse(
        &self,
        root: &str,
        max_depth: u32,
        predicates: &PredicateSet,
    ) -> impl Future<Output = Result<Vec<TraversalRecord>>>;

    /// Immediate neighbours of `key` in both directions.
    fn neighbors(&self, key: &str) -> impl Future<Output = Result<Vec<Neighbor>>>;

    /// Every simple inbound path of at most `max_depth` edges from `target`
    /// back to `root`, each listed target-first.
    fn paths_to(
        &self,
        target: &str,
        root: &str,
        max_depth: u32,
    ) -> impl Future<Output = Result<Vec<Vec<ContentNode>>>>;
}

// ---------------------------------------------------------------------------
// MemoryGraph
// ---------------------------------------------------------------------------

/// In-process content graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    nodes: HashMap<String, ContentNode>,
    outbound: HashMap<String, Vec<String>>,
    inbound: HashMap<String, Vec<String>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node.
    pub fn insert_node(&mut self, node: ContentNode) {
        self.nodes.insert(node.key.clone(), node);
    }

    /// Add a directed edge; duplicate edges are ignored.
    pub fn insert_edge(&mut self, from: &str, to: &str) {
        let out = self.outbound.entry(from.to_string()).or_default();
        if out.iter().any(|k| k == to) {
            return;
        }
        out.push(to.to_string());
        self.inbound
            .entry(to.to_string())
            .or_default()
            .push(from.to_string());
    }

    pub fn with_node(mut self, node: ContentNode) -> Self {
        self.insert_node(node);
        self
    }

    pub fn with_edge(mut self, from: &str, to: &str) -> Self {
        self.insert_edge(from, to);
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve `keys` to nodes sorted by [`compare_nodes`], skipping dangling edges.
    fn sorted<'a>(&'a self, keys: Option<&'a Vec<String>>) -> Vec<&'a ContentNode> {
        let mut nodes: Vec<&ContentNode> = keys
            .into_iter()
            .flatten()
            .filter_map(|k| self.nodes.get(k))
            .collect();
        nodes.sort_by(|a, b| compare_nodes(a, b));
        nodes
    }
}

impl GraphSource for MemoryGraph {
    async fn node(&self, key: &str) -> Result<Option<ContentNode>> {
        Ok(self.nodes.get(key).cloned())
    }

    async fn traverse(
        &self,
        root: &str,
        max_depth: u32,
        predicates: &PredicateSet,
    ) -> Result<Vec<TraversalRecord>> {
        let mut records = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([root]);
        let mut queue: VecDeque<(&str, Vec<String>)> = VecDeque::new();
        queue.push_back((root, vec![root.to_string()]));

        // Breadth-first with sorted expansion: each vertex is claimed by its
        // shallowest path, ties going to the path that sorts first.
        while let Some((key, path)) = queue.pop_front() {
            if path.len() > max_depth as usize {
                continue;
            }
            for child in self.sorted(self.outbound.get(key)) {
                if !predicates.admits(child) || !visited.insert(child.key.as_str()) {
                    continue;
                }
                let mut child_path = path.clone();
                child_path.push(child.key.clone());
                records.push(TraversalRecord {
                    node: child.clone(),
                    path: child_path.clone(),
                });
                queue.push_back((child.key.as_str(), child_path));
            }
        }
        Ok(records)
    }

    async fn neighbors(&self, key: &str) -> Result<Vec<Neighbor>> {
        let outbound = self
            .sorted(self.outbound.get(key))
            .into_iter()
            .map(|n| Neighbor {
                node: n.clone(),
                direction: Direction::Outbound,
            });
        let inbound = self
            .sorted(self.inbound.get(key))
            .into_iter()
            .map(|n| Neighbor {
                node: n.clone(),
                direction: Direction::Inbound,
            });
        Ok(outbound.chain(inbound).collect())
    }

    async fn paths_to(
        &self,
        target: &str,
        root: &str,
        max_depth: u32,
    ) -> Result<Vec<Vec<ContentNode>>> {
        let Some(start) = self.nodes.get(target) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let mut stack: Vec<Vec<&ContentNode>> = vec![vec![start]];
        while let Some(path) = stack.pop() {
            let Some(last) = path.last() else { continue };
            if last.key == root && path.len() > 1 {
                found.push(path.iter().map(|&n| n.clone()).collect());
                continue;
            }
            if path.len() > max_depth as usize {
                continue;
            }
            for parent in self.sorted(self.inbound.get(&last.key)).into_iter().rev() {
                if path.iter().any(|n| n.key == parent.key) {
                    continue;
                }
                let mut next = path.clone();
                next.push(parent);
                stack.push(next);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root → a → x, root → b → x, a → y, with `b` ranked ahead of `a`.
    fn diamond() -> MemoryGraph {
        MemoryGraph::new()
            .with_node(ContentNode::passage("root", "Root"))
            .with_node(ContentNode::passage("a", "A"))
            .with_node(ContentNode::passage("b", "B").with_order(1.0))
            .with_node(ContentNode::leaf("x", "X", "x body"))
            .with_node(ContentNode::leaf("y", "Y", "y body"))
            .with_edge("root", "a")
            .with_edge("root", "b")
            .with_edge("a", "x")
            .with_edge("b", "x")
            .with_edge("a", "y")
    }

    fn paths(records: &[TraversalRecord]) -> Vec<String> {
        records.iter().map(|r| r.path.join("/")).collect()
    }

    #[tokio::test]
    async fn traverse_claims_each_vertex_once() {
        let graph = diamond();
        let records = graph
            .traverse("root", 5, &PredicateSet::default())
            .await
            .unwrap();
        assert_eq!(
            paths(&records),
            vec!["root/b", "root/a", "root/b/x", "root/a/y"]
        );
    }

    #[tokio::test]
    async fn traverse_respects_depth() {
        let graph = diamond();
        let records = graph
            .traverse("root", 1, &PredicateSet::default())
            .await
            .unwrap();
        assert_eq!(paths(&records), vec!["root/b", "root/a"]);
    }

    #[tokio::test]
    async fn traverse_does_not_pass_through_filtered_vertices() {
        let graph = diamond();
        let predicates = PredicateSet::parse(&[] as &[&str], &["key=b"]).unwrap();
        let records = graph.traverse("root", 5, &predicates).await.unwrap();
        assert_eq!(paths(&records), vec!["root/a", "root/a/x", "root/a/y"]);
    }

    #[tokio::test]
    async fn neighbors_report_direction() {
        let graph = diamond();
        let neighbors = graph.neighbors("x").await.unwrap();
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|n| n.direction == Direction::Inbound));
        assert_eq!(neighbors[0].node.key, "b");

        let neighbors = graph.neighbors("a").await.unwrap();
        let outbound: Vec<_> = neighbors
            .iter()
            .filter(|n| n.direction == Direction::Outbound)
            .map(|n| n.node.key.as_str())
            .collect();
        assert_eq!(outbound, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn paths_to_enumerates_every_route() {
        let graph = diamond();
        let routes = graph.paths_to("x", "root", 5).await.unwrap();
        let keys: Vec<Vec<&str>> = routes
            .iter()
            .map(|r| r.iter().map(|n| n.key.as_str()).collect())
            .collect();
        assert_eq!(keys, vec![vec!["x", "b", "root"], vec!["x", "a", "root"]]);

        assert!(graph.paths_to("x", "root", 1).await.unwrap().is_empty());
        assert!(graph.paths_to("ghost", "root", 5).await.unwrap().is_empty());
    }

    #[test]
    fn duplicate_edges_ignored() {
        let graph = diamond().with_edge("root", "a");
        assert_eq!(graph.outbound["root"].len(), 2);
        assert_eq!(graph.inbound["a"].len(), 1);
        assert_eq!(graph.len(), 5);
    }
}
