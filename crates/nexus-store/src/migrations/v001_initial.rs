//! v001 -- Initial schema creation.
//!
//! One document table per entity kind plus a `meta` key/value table.  Each
//! record is stored as a JSON document keyed by its id; the snapshot writer
//! rewrites whole tables inside one transaction, so no secondary indexes
//! are needed.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Entity kinds, one document table each
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id  TEXT PRIMARY KEY NOT NULL,            -- opaque entity id
    doc TEXT NOT NULL                         -- JSON document
);

CREATE TABLE IF NOT EXISTS groups (
    id  TEXT PRIMARY KEY NOT NULL,
    doc TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS missions (
    id  TEXT PRIMARY KEY NOT NULL,
    doc TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS broadcasts (
    id  TEXT PRIMARY KEY NOT NULL,
    doc TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS channels (
    id  TEXT PRIMARY KEY NOT NULL,
    doc TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS initiatives (
    id  TEXT PRIMARY KEY NOT NULL,
    doc TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id  TEXT PRIMARY KEY NOT NULL,
    doc TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS alerts (
    id  TEXT PRIMARY KEY NOT NULL,
    doc TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Store-level bookkeeping (message insertion counter, etc.)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
