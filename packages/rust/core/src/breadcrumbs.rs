//! Breadcrumb trails: every graph route from the root to a node.
//!
//! The document tree fixes one position per node; the other routes survive
//! only as breadcrumb trails, kept here as a separate data product.

use tracing::{debug, instrument};

use adit_shared::{Breadcrumb, BreadcrumbTrail, ContentNode, PredicateSet, Result};

use crate::graph::GraphSource;
use crate::order::compare_sequences;

/// Resolve one trail per distinct route from `root` to `target`.
///
/// Each trail lists the intermediate nodes root-first; the root and target
/// themselves are excluded, and routes with no intermediate node (target
/// directly under the root) yield no trail. Routes through a node that
/// `predicates` rejects are dropped, as is every route to a rejected target.
/// Trails are collated with the node comparator applied element-wise.
#[instrument(skip(source, predicates))]
pub async fn resolve_breadcrumbs<G: GraphSource>(
    source: &G,
    root: &str,
    target: &str,
    max_depth: u32,
    predicates: &PredicateSet,
) -> Result<Vec<BreadcrumbTrail>> {
    let routes = source.paths_to(target, root, max_depth).await?;
    let route_count = routes.len();

    let mut trails: Vec<Vec<ContentNode>> = routes
        .into_iter()
        .filter(|route| {
            route
                .iter()
                .all(|n| n.key == root || predicates.admits(n))
        })
        .filter_map(|route| intermediate_nodes(route, root, target))
        .collect();
    trails.sort_by(|a, b| compare_sequences(a, b));
    trails.dedup_by(|a, b| a.iter().map(|n| &n.key).eq(b.iter().map(|n| &n.key)));

    debug!(routes = route_count, trails = trails.len(), "breadcrumbs resolved");

    Ok(trails
        .into_iter()
        .map(|trail| {
            trail
                .into_iter()
                .map(|n| Breadcrumb {
                    key: n.key,
                    label: n.label,
                })
                .collect()
        })
        .collect())
}

/// Strip `root` and `target` from a target-first route and reverse it.
fn intermediate_nodes(
    route: Vec<ContentNode>,
    root: &str,
    target: &str,
) -> Option<Vec<ContentNode>> {
    let mut nodes: Vec<ContentNode> = route
        .into_iter()
        .filter(|n| n.key != root && n.key != target)
        .collect();
    nodes.reverse();
    (!nodes.is_empty()).then_some(nodes)
}
