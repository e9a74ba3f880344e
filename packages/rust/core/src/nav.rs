//! Navigation map export.
//!
//! Mirrors a [`DocTree`] as nested [`NavEntry`] values (structure only, no
//! body text) for site generators, serialized as `nav.json`.

use std::path::Path;

use tracing::{debug, instrument};

use adit_shared::{NavEntry, Result};

use crate::assembler::write_json;
use crate::tree::{DocTree, NodeId};

/// Build the navigation map rooted at the tree's root, preserving sibling order.
pub fn export_nav(tree: &DocTree) -> NavEntry {
    entry(tree, tree.root())
}

fn entry(tree: &DocTree, id: NodeId) -> NavEntry {
    let node = tree.node(id);
    NavEntry {
        key: node.key.clone(),
        label: node.label.clone(),
        kind: node.kind,
        order: node.order,
        depth: node.depth,
        children: tree.children(id).iter().map(|&c| entry(tree, c)).collect(),
    }
}

/// Write the navigation map for `tree` to `path` as pretty JSON.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_nav(tree: &DocTree, path: &Path) -> Result<NavEntry> {
    let nav = export_nav(tree);
    write_json(path, &nav)?;
    debug!(entries = nav.count(), "navigation map written");
    Ok(nav)
}
