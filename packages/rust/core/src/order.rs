//! Sibling ordering for content nodes.
//!
//! [`compare_nodes`] is the one ordering rule used for tree siblings,
//! adjacency lists and breadcrumb collation.

use std::cmp::Ordering;

use adit_shared::ContentNode;

/// Total order over content nodes.
///
/// Nodes with an `order` rank come first, ascending by rank. Unranked nodes
/// follow, ascending by `label` (code-point order). Remaining ties fall back
/// to `label`, then `key`.
pub fn compare_nodes(a: &ContentNode, b: &ContentNode) -> Ordering {
    let by_rank = match (a.order, b.order) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_rank
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.key.cmp(&b.key))
}

/// Sort a slice of nodes in place.
pub fn sort_nodes(nodes: &mut [ContentNode]) {
    nodes.sort_by(compare_nodes);
}

/// Lexicographic comparison of two node sequences using [`compare_nodes`]
/// element-wise; a proper prefix sorts first.
pub fn compare_sequences<'a, A, B>(a: A, b: B) -> Ordering
where
    A: IntoIterator<Item = &'a ContentNode>,
    B: IntoIterator<Item = &'a ContentNode>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) => match compare_nodes(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}
