//! Content graph flattening for Adit.
//!
//! This crate turns a content graph into documents: it orders siblings,
//! folds traversal paths into a document tree, aggregates composite chunks,
//! prunes emptied nodes, and writes site, wiki, and linear exports.

pub mod assembler;
pub mod breadcrumbs;
pub mod catalog;
pub mod graph;
pub mod nav;
pub mod order;
pub mod pipeline;
pub mod tree;

pub use catalog::{Adjacency, Catalog, Chunk};
pub use graph::{Direction, GraphSource, MemoryGraph, Neighbor, TraversalRecord};
pub use order::{compare_nodes, compare_sequences, sort_nodes};
pub use tree::{DocTree, NodeId, build_tree};
