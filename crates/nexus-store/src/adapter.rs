//! SQLite-backed [`PersistenceAdapter`].
//!
//! Every entity kind has its own document table; [`SqliteAdapter::save`]
//! rewrites all of them inside one transaction so the persisted snapshot is
//! always a complete, consistent store.  Malformed documents degrade their
//! kind to empty on load rather than failing the whole store.
//!
//! External-change detection rides on SQLite's `data_version` pragma, which
//! moves only when *another* connection modifies the database file — our
//! own saves do not disturb it.

use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

use nexus_core::{EntityStore, PersistenceAdapter};

use crate::database::Database;
use crate::error::Result;

/// Durable adapter over a local SQLite database.
pub struct SqliteAdapter {
    db: Database,
    last_version: Cell<u64>,
}

impl SqliteAdapter {
    /// Open the default application database.
    pub fn new() -> Result<Self> {
        Ok(Self::wrap(Database::new()?))
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::wrap(Database::open_at(path)?))
    }

    fn wrap(db: Database) -> Self {
        Self {
            db,
            last_version: Cell::new(0),
        }
    }

    /// Access the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn load_impl(&mut self) -> Result<EntityStore> {
        let conn = self.db.conn();

        let mut store = EntityStore {
            accounts: load_kind(conn, "accounts")?,
            groups: load_kind(conn, "groups")?,
            missions: load_kind(conn, "missions")?,
            broadcasts: load_kind(conn, "broadcasts")?,
            channels: load_kind(conn, "channels")?,
            initiatives: load_kind(conn, "initiatives")?,
            messages: load_kind(conn, "messages")?,
            alerts: load_kind(conn, "alerts")?,
            next_seq: 0,
        };

        let next_seq: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'next_seq'",
                [],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        store.next_seq = next_seq.and_then(|v| v.parse().ok()).unwrap_or(0);

        // The counter must stay ahead of every persisted message even if
        // the meta row was lost.
        if let Some(max_seq) = store.messages.values().map(|m| m.seq).max() {
            store.next_seq = store.next_seq.max(max_seq + 1);
        }

        tracing::info!(
            accounts = store.accounts.len(),
            messages = store.messages.len(),
            "snapshot loaded"
        );
        Ok(store)
    }

    fn save_impl(&mut self, store: &EntityStore) -> Result<()> {
        let tx = self.db.conn_mut().transaction()?;

        save_kind(&tx, "accounts", &store.accounts)?;
        save_kind(&tx, "groups", &store.groups)?;
        save_kind(&tx, "missions", &store.missions)?;
        save_kind(&tx, "broadcasts", &store.broadcasts)?;
        save_kind(&tx, "channels", &store.channels)?;
        save_kind(&tx, "initiatives", &store.initiatives)?;
        save_kind(&tx, "messages", &store.messages)?;
        save_kind(&tx, "alerts", &store.alerts)?;

        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('next_seq', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![store.next_seq.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }
}

impl PersistenceAdapter for SqliteAdapter {
    fn load_all(&mut self) -> nexus_core::Result<EntityStore> {
        self.load_impl().map_err(Into::into)
    }

    fn save(&mut self, store: &EntityStore) -> nexus_core::Result<()> {
        self.save_impl(store).map_err(Into::into)
    }

    fn external_version(&self) -> u64 {
        match self
            .db
            .conn()
            .pragma_query_value(None, "data_version", |row| row.get::<_, i64>(0))
        {
            Ok(version) => {
                self.last_version.set(version as u64);
                version as u64
            }
            Err(e) => {
                tracing::warn!(error = %e, "data_version pragma failed");
                self.last_version.get()
            }
        }
    }
}

/// Load one kind's table into a map; any malformed document degrades the
/// whole kind to empty.
fn load_kind<T: DeserializeOwned>(
    conn: &rusqlite::Connection,
    table: &str,
) -> Result<HashMap<String, T>> {
    let mut stmt = conn.prepare(&format!("SELECT id, doc FROM {table}"))?;
    let rows = stmt.query_map([], |row| {
        let id: String = row.get(0)?;
        let doc: String = row.get(1)?;
        Ok((id, doc))
    })?;

    let mut map = HashMap::new();
    for row in rows {
        let (id, doc) = row?;
        match serde_json::from_str(&doc) {
            Ok(record) => {
                map.insert(id, record);
            }
            Err(e) => {
                tracing::warn!(table, id = %id, error = %e, "malformed document; degrading kind to empty");
                return Ok(HashMap::new());
            }
        }
    }
    Ok(map)
}

/// Rewrite one kind's table from the in-memory map.
fn save_kind<T: Serialize>(
    tx: &Transaction<'_>,
    table: &str,
    map: &HashMap<String, T>,
) -> Result<()> {
    tx.execute(&format!("DELETE FROM {table}"), [])?;

    let mut stmt = tx.prepare(&format!("INSERT INTO {table} (id, doc) VALUES (?1, ?2)"))?;
    for (id, record) in map {
        stmt.execute(params![id, serde_json::to_string(record)?])?;
    }
    Ok(())
}
