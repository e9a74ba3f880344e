//! libSQL-backed content graph store (offline mode).
//!
//! The [`GraphStore`] struct wraps a libSQL database holding content nodes
//! and the directed edges between them, and answers the catalog's
//! [`GraphSource`] queries with recursive SQL.
//!
//! **Access rules:**
//! - `adit import`: read-write (sole writer) via [`GraphStore::open`]
//! - Exports: read-only via [`GraphStore::open_readonly`]

mod migrations;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use adit_core::{Direction, GraphSource, MemoryGraph, Neighbor, TraversalRecord, compare_nodes};
use adit_shared::{AditError, ContentNode, PredicateSet, Result};

const NODE_COLUMNS: &str = "n.key, n.kind, n.label, n.ord, n.body, n.grouped_keys, n.attributes";

/// Keys reachable from `?1` within `?2` edges.
const REACH_CTE: &str = "WITH RECURSIVE reach(key, depth) AS (
    SELECT ?1, 0
    UNION
    SELECT e.to_key, r.depth + 1
    FROM reach r JOIN edges e ON e.from_key = r.key
    WHERE r.depth < ?2
)";

/// A directed edge in an import document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// A whole graph as read by `adit import`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphImport {
    pub nodes: Vec<ContentNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Graph storage handle wrapping a libSQL database.
pub struct GraphStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

fn db_err(e: impl std::fmt::Display) -> AditError {
    AditError::Storage(e.to_string())
}

impl GraphStore {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AditError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;
        let conn = db.connect().map_err(db_err)?;

        let store = Self {
            db,
            conn,
            readonly: false,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AditError::Storage(format!(
                "graph database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;
        let conn = db.connect().map_err(db_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        AditError::Storage(format!("migration v{} failed: {e}", migration.version))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(AditError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert a node, or replace every attribute of an existing one.
    pub async fn upsert_node(&self, node: &ContentNode) -> Result<()> {
        self.check_writable()?;
        let grouped_keys = node
            .grouped_keys
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(db_err)?;
        let attributes = serde_json::to_string(&node.attributes).map_err(db_err)?;
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO nodes (key, kind, label, ord, body, grouped_keys, attributes, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(key) DO UPDATE SET
                   kind = excluded.kind,
                   label = excluded.label,
                   ord = excluded.ord,
                   body = excluded.body,
                   grouped_keys = excluded.grouped_keys,
                   attributes = excluded.attributes,
                   updated_at = excluded.updated_at",
                params![
                    node.key.as_str(),
                    node.kind.as_str(),
                    node.label.as_str(),
                    node.order,
                    node.body.as_deref(),
                    grouped_keys,
                    attributes,
                    now.as_str(),
                ],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Add a directed edge; existing edges are left as they are.
    pub async fn insert_edge(&self, from: &str, to: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO edges (from_key, to_key) VALUES (?1, ?2)",
                params![from, to],
            )
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Write every node, then every edge, of `graph`.
    ///
    /// An edge naming a node that is neither in `graph` nor already stored is
    /// rejected.
    #[instrument(skip_all, fields(nodes = graph.nodes.len(), edges = graph.edges.len()))]
    pub async fn import(&self, graph: &GraphImport) -> Result<()> {
        self.check_writable()?;
        for node in &graph.nodes {
            self.upsert_node(node).await?;
        }
        for edge in &graph.edges {
            for key in [&edge.from, &edge.to] {
                if self.node(key).await?.is_none() {
                    return Err(AditError::reference(format!(
                        "edge {} -> {} names unknown node `{key}`",
                        edge.from, edge.to
                    )));
                }
            }
            self.insert_edge(&edge.from, &edge.to).await?;
        }
        info!("graph imported");
        Ok(())
    }

    /// Number of stored nodes.
    pub async fn node_count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM nodes", params![])
            .await
            .map_err(db_err)?;
        match rows.next().await.map_err(db_err)? {
            Some(row) => row.get::<i64>(0).map(|n| n as u64).map_err(db_err),
            None => Ok(0),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    async fn query_nodes(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<ContentNode>> {
        let mut rows = self.conn.query(sql, params).await.map_err(db_err)?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            nodes.push(row_to_node(&row, 0)?);
        }
        Ok(nodes)
    }

    /// The depth-bounded subgraph reachable from `root`, loaded into memory.
    async fn reachable(&self, root: &str, max_depth: u32) -> Result<MemoryGraph> {
        let mut graph = MemoryGraph::new();
        let nodes = self
            .query_nodes(
                &format!(
                    "{REACH_CTE} SELECT {NODE_COLUMNS} FROM nodes n
                     WHERE n.key IN (SELECT key FROM reach)"
                ),
                params![root, i64::from(max_depth)],
            )
            .await?;
        for node in nodes {
            graph.insert_node(node);
        }

        let mut rows = self
            .conn
            .query(
                &format!(
                    "{REACH_CTE} SELECT e.from_key, e.to_key FROM edges e
                     WHERE e.from_key IN (SELECT key FROM reach)
                       AND e.to_key IN (SELECT key FROM reach)
                     ORDER BY e.from_key, e.to_key"
                ),
                params![root, i64::from(max_depth)],
            )
            .await
            .map_err(db_err)?;
        while let Some(row) = rows.next().await.map_err(db_err)? {
            let from: String = row.get(0).map_err(db_err)?;
            let to: String = row.get(1).map_err(db_err)?;
            graph.insert_edge(&from, &to);
        }

        debug!(nodes = graph.len(), "reachable subgraph loaded");
        Ok(graph)
    }
}

impl GraphSource for GraphStore {
    async fn node(&self, key: &str) -> Result<Option<ContentNode>> {
        let mut nodes = self
            .query_nodes(
                &format!("SELECT {NODE_COLUMNS} FROM nodes n WHERE n.key = ?1"),
                params![key],
            )
            .await?;
        Ok(nodes.pop())
    }

    /// Loads the reachable subgraph with one recursive query, then walks it
    /// breadth-first in memory so canonical positions match [`MemoryGraph`].
    #[instrument(skip(self, predicates))]
    async fn traverse(
        &self,
        root: &str,
        max_depth: u32,
        predicates: &PredicateSet,
    ) -> Result<Vec<TraversalRecord>> {
        let graph = self.reachable(root, max_depth).await?;
        graph.traverse(root, max_depth, predicates).await
    }

    async fn neighbors(&self, key: &str) -> Result<Vec<Neighbor>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT 'outbound', {NODE_COLUMNS} FROM edges e
                     JOIN nodes n ON n.key = e.to_key WHERE e.from_key = ?1
                     UNION ALL
                     SELECT 'inbound', {NODE_COLUMNS} FROM edges e
                     JOIN nodes n ON n.key = e.from_key WHERE e.to_key = ?1"
                ),
                params![key],
            )
            .await
            .map_err(db_err)?;

        let mut outbound = Vec::new();
        let mut inbound = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            let direction: String = row.get(0).map_err(db_err)?;
            let node = row_to_node(&row, 1)?;
            match direction.as_str() {
                "outbound" => outbound.push(node),
                _ => inbound.push(node),
            }
        }
        outbound.sort_by(compare_nodes);
        inbound.sort_by(compare_nodes);

        let outbound = outbound.into_iter().map(|node| Neighbor {
            node,
            direction: Direction::Outbound,
        });
        let inbound = inbound.into_iter().map(|node| Neighbor {
            node,
            direction: Direction::Inbound,
        });
        Ok(outbound.chain(inbound).collect())
    }

    #[instrument(skip(self))]
    async fn paths_to(
        &self,
        target: &str,
        root: &str,
        max_depth: u32,
    ) -> Result<Vec<Vec<ContentNode>>> {
        let mut rows = self
            .conn
            .query(
                "WITH RECURSIVE up(key, path, depth) AS (
                     SELECT ?1, json_array(?1), 0
                     UNION ALL
                     SELECT e.from_key, json_insert(u.path, '$[#]', e.from_key), u.depth + 1
                     FROM up u JOIN edges e ON e.to_key = u.key
                     WHERE u.depth < ?3
                       AND u.key != ?2
                       AND NOT EXISTS (
                           SELECT 1 FROM json_each(u.path) WHERE json_each.value = e.from_key
                       )
                 )
                 SELECT path FROM up WHERE key = ?2 AND depth > 0 ORDER BY path",
                params![target, root, i64::from(max_depth)],
            )
            .await
            .map_err(db_err)?;

        let mut key_paths: Vec<Vec<String>> = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            let json: String = row.get(0).map_err(db_err)?;
            key_paths.push(
                serde_json::from_str(&json)
                    .map_err(|e| AditError::Storage(format!("invalid path: {e}")))?,
            );
        }
        if key_paths.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<&str> = key_paths.iter().flatten().map(String::as_str).collect();
        keys.sort_unstable();
        keys.dedup();
        let keys_json = serde_json::to_string(&keys).map_err(db_err)?;
        let lookup: HashMap<String, ContentNode> = self
            .query_nodes(
                &format!(
                    "SELECT {NODE_COLUMNS} FROM nodes n
                     WHERE n.key IN (SELECT value FROM json_each(?1))"
                ),
                params![keys_json],
            )
            .await?
            .into_iter()
            .map(|n| (n.key.clone(), n))
            .collect();

        Ok(key_paths
            .into_iter()
            .filter_map(|path| {
                path.iter()
                    .map(|k| lookup.get(k).cloned())
                    .collect::<Option<Vec<_>>>()
            })
            .collect())
    }
}

/// Convert a database row to a [`ContentNode`], reading the node columns
/// starting at `offset`.
fn row_to_node(row: &libsql::Row, offset: i32) -> Result<ContentNode> {
    let kind: String = row.get(offset + 1).map_err(db_err)?;
    let grouped_keys = row
        .get::<String>(offset + 5)
        .ok()
        .map(|json| serde_json::from_str::<Vec<String>>(&json))
        .transpose()
        .map_err(|e| AditError::Storage(format!("invalid grouped_keys: {e}")))?;
    let attributes = match row.get::<String>(offset + 6).ok() {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| AditError::Storage(format!("invalid attributes: {e}")))?,
        None => BTreeMap::new(),
    };

    Ok(ContentNode {
        key: row.get(offset).map_err(db_err)?,
        kind: kind.parse()?,
        label: row.get(offset + 2).map_err(db_err)?,
        order: row.get::<f64>(offset + 3).ok(),
        depth: 0,
        body: row.get::<String>(offset + 4).ok(),
        grouped_keys,
        attributes,
        chunks: Vec::new(),
    })
}
