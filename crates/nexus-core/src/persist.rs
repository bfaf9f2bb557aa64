//! Persistence adapter contract and the in-memory implementation.
//!
//! The hub persists a full snapshot after every successful mutation and
//! loads one snapshot at startup.  Adapters targeting a shared durable
//! medium (a database file another process may also write) expose a
//! monotone version marker so the hub can detect externally-originated
//! changes and reload conservatively.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::Result;
use crate::store::EntityStore;

/// Durable storage behind the hub.
///
/// Implementations must tolerate malformed or missing persisted data by
/// degrading the affected entity kind to empty rather than failing the
/// whole load.
pub trait PersistenceAdapter: Send {
    /// Load the persisted snapshot at startup.
    fn load_all(&mut self) -> Result<EntityStore>;

    /// Persist a full snapshot.  Called once per successful mutation.
    fn save(&mut self, store: &EntityStore) -> Result<()>;

    /// Marker that changes whenever another writer modified the durable
    /// medium since this adapter last touched it.  Adapters without a
    /// shared medium return a constant.
    fn external_version(&self) -> u64 {
        0
    }
}

/// Ephemeral adapter holding the snapshot in memory.
///
/// Used in tests and wherever durability is not required.  The external
/// version can be bumped manually to simulate a concurrent writer.
#[derive(Default)]
pub struct MemoryAdapter {
    snapshot: Mutex<Option<EntityStore>>,
    external: AtomicU64,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held snapshot and bump the external version, as a
    /// concurrent process writing the shared medium would.
    pub fn write_externally(&self, store: EntityStore) {
        *self.snapshot.lock().expect("snapshot lock poisoned") = Some(store);
        self.external.fetch_add(1, Ordering::SeqCst);
    }
}

// A shared handle works as an adapter too: the hub holds one clone while a
// test or supervising task injects external writes through another.
impl PersistenceAdapter for std::sync::Arc<MemoryAdapter> {
    fn load_all(&mut self) -> Result<EntityStore> {
        Ok(self
            .snapshot
            .lock()
            .expect("snapshot lock poisoned")
            .clone()
            .unwrap_or_default())
    }

    fn save(&mut self, store: &EntityStore) -> Result<()> {
        *self.snapshot.lock().expect("snapshot lock poisoned") = Some(store.clone());
        Ok(())
    }

    fn external_version(&self) -> u64 {
        self.external.load(Ordering::SeqCst)
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load_all(&mut self) -> Result<EntityStore> {
        Ok(self
            .snapshot
            .lock()
            .expect("snapshot lock poisoned")
            .clone()
            .unwrap_or_default())
    }

    fn save(&mut self, store: &EntityStore) -> Result<()> {
        *self.snapshot.lock().expect("snapshot lock poisoned") = Some(store.clone());
        Ok(())
    }

    fn external_version(&self) -> u64 {
        self.external.load(Ordering::SeqCst)
    }
}
