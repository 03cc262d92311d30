//! SQL migration definitions for the proposal catalog.
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
        description: "Initial schema: resources, import_runs",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per imported proposal, keyed by resource id
CREATE TABLE IF NOT EXISTS resources (
    id             TEXT PRIMARY KEY,
    category       TEXT NOT NULL,
    name           TEXT NOT NULL,
    description    TEXT NOT NULL,
    meeting_focus  TEXT NOT NULL,
    accessibility  TEXT NOT NULL,
    fiscal_year    TEXT,
    status         TEXT NOT NULL,
    priority       INTEGER NOT NULL,
    is_active      INTEGER NOT NULL,
    file_path      TEXT NOT NULL,
    metadata_json  TEXT NOT NULL,
    import_run_id  TEXT,
    imported_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resources_fiscal_year ON resources(fiscal_year);
CREATE INDEX IF NOT EXISTS idx_resources_active ON resources(is_active);

-- Import run history
CREATE TABLE IF NOT EXISTS import_runs (
    id          TEXT PRIMARY KEY,
    source      TEXT NOT NULL,
    active_only INTEGER NOT NULL,
    started_at  TEXT NOT NULL,
    finished_at TEXT,
    total       INTEGER NOT NULL DEFAULT 0,
    imported    INTEGER NOT NULL DEFAULT 0,
    failed      INTEGER NOT NULL DEFAULT 0
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
