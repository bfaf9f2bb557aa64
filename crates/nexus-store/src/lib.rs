//! # nexus-store
//!
//! Durable SQLite persistence for the Nexus hub.
//!
//! The crate exposes a synchronous `Database` handle wrapping a
//! `rusqlite::Connection`, plus [`SqliteAdapter`], an implementation of
//! `nexus_core::PersistenceAdapter` that snapshots the whole entity store
//! as JSON documents.  Saves rewrite every kind table inside a single
//! transaction; loads tolerate malformed documents by degrading the
//! affected kind to empty.

pub mod adapter;
pub mod database;
pub mod migrations;

mod error;

pub use adapter::SqliteAdapter;
pub use database::Database;
pub use error::StoreError;
