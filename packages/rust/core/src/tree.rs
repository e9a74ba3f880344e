//! Document tree built from root-to-node path sequences.
//!
//! Paths come from a graph traversal and share prefixes; folding them into a
//! [`DocTree`] materializes one tree node per distinct key. A key reached by a
//! later path keeps the position (and depth) of its first encounter.

use std::collections::HashMap;

use tracing::{debug, instrument, trace};

use adit_shared::{AditError, ContentNode, Result};

use crate::order::compare_nodes;

/// Index of a node in a [`DocTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct TreeNode {
    node: ContentNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Single-rooted ordered tree of content nodes, stored as an arena.
///
/// Pruned nodes stay in the arena but are detached from their parent and
/// dropped from the key index, so they are unreachable from the root.
#[derive(Debug, Clone)]
pub struct DocTree {
    nodes: Vec<TreeNode>,
    index: HashMap<String, NodeId>,
}

impl DocTree {
    /// Create a tree holding only `root`, at depth 0.
    pub fn new(root: &ContentNode) -> Self {
        let mut node = root.clone();
        node.depth = 0;
        node.chunks.clear();
        let mut index = HashMap::new();
        index.insert(node.key.clone(), NodeId(0));
        Self {
            nodes: vec![TreeNode {
                node,
                parent: None,
                children: Vec::new(),
            }],
            index,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &ContentNode {
        &self.nodes[id.0].node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ContentNode {
        &mut self.nodes[id.0].node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Look up an attached node by key.
    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Walk one root-first key path, materializing nodes that are not yet in
    /// the tree.
    pub fn insert_path(
        &mut self,
        path: &[String],
        lookup: &HashMap<String, ContentNode>,
    ) -> Result<()> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(());
        };
        let root_key = &self.nodes[0].node.key;
        if first != root_key {
            return Err(AditError::reference(format!(
                "path {path:?} does not start at root `{root_key}`"
            )));
        }

        let mut current = self.root();
        for key in rest {
            if let Some(&existing) = self.index.get(key) {
                if self.nodes[existing.0].parent != Some(current) && existing != current {
                    trace!(%key, "key already placed elsewhere, reusing first position");
                }
                current = existing;
                continue;
            }

            let data = lookup.get(key).ok_or_else(|| {
                AditError::reference(format!("path {path:?} references unknown key `{key}`"))
            })?;
            let mut node = data.clone();
            node.depth = self.nodes[current.0].node.depth + 1;
            node.chunks.clear();

            let id = NodeId(self.nodes.len());
            self.nodes.push(TreeNode {
                node,
                parent: Some(current),
                children: Vec::new(),
            });
            self.nodes[current.0].children.push(id);
            self.index.insert(key.clone(), id);
            current = id;
        }
        Ok(())
    }

    /// Sort every node's children with [`compare_nodes`].
    pub fn sort_children(&mut self) {
        for i in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[i].children);
            children.sort_by(|a, b| compare_nodes(&self.nodes[a.0].node, &self.nodes[b.0].node));
            self.nodes[i].children = children;
        }
    }

    /// Attached node ids in document order (parent before children).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        out
    }

    /// Attached node ids with every node after all of its descendants.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut out = self.preorder_mirrored();
        out.reverse();
        out
    }

    /// Pre-order walk visiting children last-to-first; reversed it is a
    /// post-order walk with children first-to-last.
    fn preorder_mirrored(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter());
        }
        out
    }

    /// Remove every non-root leaf with no chunks, repeating until none remain.
    ///
    /// A single post-order pass reaches the fixpoint: a parent is examined only
    /// after all of its children have been pruned or kept. Returns the number of
    /// nodes removed.
    pub fn prune_empty_leaves(&mut self) -> usize {
        let root = self.root();
        let mut removed = 0;
        for id in self.postorder() {
            if id == root {
                continue;
            }
            let entry = &self.nodes[id.0];
            if entry.children.is_empty() && entry.node.chunks.is_empty() {
                self.detach(id);
                removed += 1;
            }
        }
        removed
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
        let key = self.nodes[id.0].node.key.clone();
        self.index.remove(&key);
        trace!(%key, "pruned empty leaf");
    }
}

/// Fold root-first key paths into an ordered [`DocTree`].
///
/// Every key on a path must resolve through `lookup` (the root resolves from
/// `root`); an unresolvable key is a reference error since the caller's own
/// traversal supplied both. Paths must be given in a deterministic order for
/// the resulting depths to be stable.
#[instrument(skip_all, fields(root = %root.key))]
pub fn build_tree<I, P>(
    root: &ContentNode,
    lookup: &HashMap<String, ContentNode>,
    paths: I,
) -> Result<DocTree>
where
    I: IntoIterator<Item = P>,
    P: AsRef<[String]>,
{
    let mut tree = DocTree::new(root);
    let mut path_count = 0usize;
    for path in paths {
        tree.insert_path(path.as_ref(), lookup)?;
        path_count += 1;
    }
    tree.sort_children();
    debug!(paths = path_count, nodes = tree.len(), "tree built");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(nodes: &[ContentNode]) -> HashMap<String, ContentNode> {
        nodes.iter().map(|n| (n.key.clone(), n.clone())).collect()
    }

    fn path(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn child_keys(tree: &DocTree, id: NodeId) -> Vec<String> {
        tree.children(id)
            .iter()
            .map(|&c| tree.node(c).key.clone())
            .collect()
    }

    fn sample() -> (ContentNode, HashMap<String, ContentNode>) {
        let root = ContentNode::passage("root", "Root");
        let nodes = lookup(&[
            ContentNode::passage("a", "A"),
            ContentNode::leaf("b", "B", "b body"),
            ContentNode::leaf("c", "C", "c body"),
            ContentNode::leaf("d", "D", "d body").with_order(1.0),
        ]);
        (root, nodes)
    }

    #[test]
    fn shared_prefix_materializes_once() {
        let (root, nodes) = sample();
        let tree = build_tree(
            &root,
            &nodes,
            [path(&["root", "a", "b"]), path(&["root", "a", "c"])],
        )
        .unwrap();

        assert_eq!(tree.len(), 4);
        assert_eq!(child_keys(&tree, tree.root()), vec!["a"]);
        let a = tree.find("a").unwrap();
        assert_eq!(child_keys(&tree, a), vec!["b", "c"]);
        assert_eq!(tree.node(tree.find("b").unwrap()).depth, 2);
        assert_eq!(tree.node(tree.find("c").unwrap()).depth, 2);
    }

    #[test]
    fn first_encounter_fixes_depth() {
        let (root, nodes) = sample();
        let tree = build_tree(
            &root,
            &nodes,
            [
                path(&["root", "b"]),
                path(&["root", "a", "b", "c"]),
                path(&["root", "a"]),
            ],
        )
        .unwrap();

        let b = tree.find("b").unwrap();
        assert_eq!(tree.node(b).depth, 1);
        assert_eq!(tree.parent(b), Some(tree.root()));
        // `c` hangs under the canonical `b`, one level below it.
        let c = tree.find("c").unwrap();
        assert_eq!(tree.parent(c), Some(b));
        assert_eq!(tree.node(c).depth, 2);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn children_sorted_with_comparator() {
        let (root, nodes) = sample();
        let tree = build_tree(
            &root,
            &nodes,
            [
                path(&["root", "c"]),
                path(&["root", "b"]),
                path(&["root", "d"]),
                path(&["root", "a"]),
            ],
        )
        .unwrap();
        assert_eq!(child_keys(&tree, tree.root()), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn unknown_key_is_reference_error() {
        let (root, nodes) = sample();
        let err = build_tree(&root, &nodes, [path(&["root", "a", "ghost"])]).unwrap_err();
        assert!(matches!(err, AditError::Reference { .. }));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn path_not_starting_at_root_is_rejected() {
        let (root, nodes) = sample();
        let err = build_tree(&root, &nodes, [path(&["a", "b"])]).unwrap_err();
        assert!(err.to_string().contains("does not start at root"));
    }

    #[test]
    fn empty_paths_are_ignored() {
        let (root, nodes) = sample();
        let tree = build_tree(&root, &nodes, [path(&[]), path(&["root"])]).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn build_is_deterministic() {
        let (root, nodes) = sample();
        let paths = vec![
            path(&["root", "a", "c"]),
            path(&["root", "d"]),
            path(&["root", "a", "b"]),
        ];
        let first = build_tree(&root, &nodes, &paths).unwrap();
        let second = build_tree(&root, &nodes, &paths).unwrap();

        let shape = |tree: &DocTree| {
            tree.preorder()
                .into_iter()
                .map(|id| (tree.node(id).key.clone(), child_keys(tree, id)))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&first), shape(&second));
    }

    #[test]
    fn traversal_orders() {
        let (root, nodes) = sample();
        let tree = build_tree(
            &root,
            &nodes,
            [path(&["root", "a", "b"]), path(&["root", "a", "c"]), path(&["root", "d"])],
        )
        .unwrap();
        let keys = |ids: Vec<NodeId>| {
            ids.into_iter()
                .map(|id| tree.node(id).key.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(tree.preorder()), vec!["root", "d", "a", "b", "c"]);
        assert_eq!(keys(tree.postorder()), vec!["d", "b", "c", "a", "root"]);
    }

    #[test]
    fn pruning_cascades_and_is_idempotent() {
        let (root, nodes) = sample();
        let mut tree = build_tree(
            &root,
            &nodes,
            [path(&["root", "a", "b"]), path(&["root", "a", "c"]), path(&["root", "d"])],
        )
        .unwrap();
        let d = tree.find("d").unwrap();
        tree.node_mut(d).chunks.push("kept".into());

        // `b` and `c` are empty leaves; removing them exposes `a`.
        assert_eq!(tree.prune_empty_leaves(), 3);
        assert_eq!(child_keys(&tree, tree.root()), vec!["d"]);
        assert!(tree.find("a").is_none());

        assert_eq!(tree.prune_empty_leaves(), 0);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn root_is_never_pruned() {
        let (root, nodes) = sample();
        let mut tree = build_tree(&root, &nodes, [path(&["root", "b"])]).unwrap();
        assert_eq!(tree.prune_empty_leaves(), 1);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(tree.root()).key, "root");
    }
}
