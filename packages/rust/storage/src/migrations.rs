//! SQL migration definitions for the Adit graph database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: nodes, edges",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Content nodes
CREATE TABLE IF NOT EXISTS nodes (
    key          TEXT PRIMARY KEY,
    kind         TEXT NOT NULL CHECK (kind IN ('passage', 'leaf-content')),
    label        TEXT NOT NULL,
    ord          REAL,
    body         TEXT,
    grouped_keys TEXT,
    attributes   TEXT NOT NULL DEFAULT '{}',
    updated_at   TEXT NOT NULL
);

-- Directed containment edges
CREATE TABLE IF NOT EXISTS edges (
    from_key TEXT NOT NULL REFERENCES nodes(key) ON DELETE CASCADE,
    to_key   TEXT NOT NULL REFERENCES nodes(key) ON DELETE CASCADE,
    PRIMARY KEY (from_key, to_key)
);

CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(to_key);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_ascend() {
        let versions: Vec<u32> = all_migrations().iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.first(), Some(&1));
    }
}
