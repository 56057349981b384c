//! SQL schema for the SQLite backends.
//!
//! Both are executed at connection startup; idempotent thanks to
//! `IF NOT EXISTS`. Future migrations will be gated on `PRAGMA user_version`.

/// The document store creates collection tables on demand; only connection
/// settings are fixed.
pub const DOCUMENT_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

PRAGMA user_version = 1;
";

/// Relational system of record.
pub const RELATIONAL_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Qualified names, addressed by the tag handles the write path carries.
CREATE TABLE IF NOT EXISTS alf_qname (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    qname  TEXT NOT NULL UNIQUE
);

-- One row per node-aspect association. No UPDATE is ever issued here.
CREATE TABLE IF NOT EXISTS alf_node_aspects (
    node_id   INTEGER NOT NULL,
    qname_id  INTEGER NOT NULL REFERENCES alf_qname(id),
    PRIMARY KEY (node_id, qname_id)
);

PRAGMA user_version = 1;
";
