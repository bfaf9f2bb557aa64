//! The hub: single-writer mutation engine over the entity store.
//!
//! A [`Hub`] owns the entity store, the subscription registry and the
//! persistence adapter behind one mutex, so every mutation is applied as an
//! atomic unit from the caller's perspective: no other mutation, read or
//! replay can observe a partially applied change.
//!
//! Mutations run against a working copy of the store.  The copy is
//! persisted first and only then swapped in, so a validation error or a
//! strict-policy persistence failure leaves the live store untouched.
//!
//! A hub is constructed explicitly at application start ([`Hub::open`]) and
//! passed to callers; there is no ambient global instance.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::config::{DurabilityPolicy, HubConfig};
use crate::error::Result;
use crate::keys::ViewKey;
use crate::persist::PersistenceAdapter;
use crate::query::{self, View};
use crate::registry::{SubscriptionRegistry, ViewCallback};
use crate::store::EntityStore;

pub(crate) struct Inner {
    pub(crate) store: EntityStore,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) adapter: Box<dyn PersistenceAdapter>,
    pub(crate) config: HubConfig,
    last_external: u64,
}

/// View keys a mutation may have affected.
pub(crate) struct Touched {
    keys: Vec<ViewKey>,
    /// Set when account records changed: also refreshes every active
    /// account-bearing view (leaderboard, mentors, partner lists), whose
    /// membership cannot be attributed to individual keys cheaply.
    accounts: bool,
}

impl Touched {
    pub(crate) fn keys(keys: Vec<ViewKey>) -> Self {
        Self {
            keys,
            accounts: false,
        }
    }

    pub(crate) fn with_accounts(keys: Vec<ViewKey>) -> Self {
        Self {
            keys,
            accounts: true,
        }
    }
}

/// Handle to the community store.  Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<Mutex<Inner>>,
}

impl Hub {
    /// Load persisted state through `adapter` and start an empty
    /// subscription registry.
    pub fn open(mut adapter: Box<dyn PersistenceAdapter>, config: HubConfig) -> Result<Self> {
        let store = adapter.load_all()?;
        let last_external = adapter.external_version();
        tracing::info!(
            accounts = store.accounts.len(),
            groups = store.groups.len(),
            messages = store.messages.len(),
            "hub opened"
        );
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                store,
                registry: SubscriptionRegistry::new(),
                adapter,
                config,
                last_external,
            })),
        })
    }

    /// Flush a final snapshot and release every subscription.
    pub fn close(self) -> Result<()> {
        let mut inner = self.lock();
        let Inner {
            store,
            registry,
            adapter,
            ..
        } = &mut *inner;
        registry.clear();
        adapter.save(store)?;
        tracing::info!("hub closed");
        Ok(())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poisoning only happens after a panic in core code, which is a
        // programming error; propagating it as a panic is intended.
        self.inner.lock().expect("hub state lock poisoned")
    }

    /// Run a read against a consistent snapshot of the store.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&EntityStore, &HubConfig) -> T) -> T {
        let inner = self.lock();
        f(&inner.store, &inner.config)
    }

    /// Apply one named mutation as an atomic unit: validate and mutate a
    /// working copy, persist it, swap it in, then notify affected views.
    pub(crate) fn commit<T>(
        &self,
        op: &'static str,
        mutate: impl FnOnce(&mut EntityStore) -> Result<(T, Touched)>,
    ) -> Result<T> {
        let mut inner = self.lock();
        let inner = &mut *inner;

        let mut work = inner.store.clone();
        let (value, touched) = mutate(&mut work)?;

        if let Err(e) = inner.adapter.save(&work) {
            match inner.config.durability {
                DurabilityPolicy::Strict => {
                    tracing::warn!(op, error = %e, "snapshot save failed; mutation rejected");
                    return Err(e);
                }
                DurabilityPolicy::BestEffort => {
                    tracing::warn!(op, error = %e, "snapshot save failed; committing in memory");
                }
            }
        }

        inner.store = work;
        for key in &touched.keys {
            inner.registry.invalidate(key, &inner.store, &inner.config);
        }
        if touched.accounts {
            let account_views = |key: &ViewKey| {
                matches!(
                    key,
                    ViewKey::Leaderboard | ViewKey::Mentors | ViewKey::Partners(_)
                )
            };
            inner
                .registry
                .invalidate_matching(account_views, &inner.store, &inner.config);
        }
        tracing::debug!(op, views = touched.keys.len(), "mutation committed");
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register a callback for a view key.
    ///
    /// The callback is invoked synchronously with the current projection
    /// before this method returns, then again on every mutation affecting
    /// the key.  Dropping the returned [`Subscription`] unsubscribes; it
    /// must not be dropped from inside a callback.
    pub fn subscribe(&self, key: ViewKey, callback: ViewCallback) -> Subscription {
        let mut inner = self.lock();
        let inner = &mut *inner;
        let id = inner
            .registry
            .subscribe(key.clone(), callback, &inner.store, &inner.config);
        Subscription {
            inner: Arc::downgrade(&self.inner),
            key,
            id,
            detached: false,
        }
    }

    /// One-shot projection for any view key.
    pub fn view(&self, key: &ViewKey) -> View {
        self.read(|store, config| query::project(store, key, config))
    }

    // ------------------------------------------------------------------
    // External change detection
    // ------------------------------------------------------------------

    /// Check the adapter's external version marker; when another writer
    /// changed the durable medium, reload everything and re-deliver every
    /// active view.  Returns whether a reload happened.
    ///
    /// Cross-process change attribution is not tracked, so the reload is
    /// conservative: all keys, full recomputation.
    pub fn poll_external_changes(&self) -> Result<bool> {
        let mut inner = self.lock();
        let inner = &mut *inner;

        let version = inner.adapter.external_version();
        if version == inner.last_external {
            return Ok(false);
        }

        tracing::info!(version, "external change detected; reloading store");
        inner.store = inner.adapter.load_all()?;
        inner.last_external = version;
        inner.registry.notify_all(&inner.store, &inner.config);
        Ok(true)
    }
}

/// Live subscription handle.  Unsubscribes on drop or via
/// [`Subscription::unsubscribe`]; each handle removes exactly one callback.
pub struct Subscription {
    inner: Weak<Mutex<Inner>>,
    key: ViewKey,
    id: u64,
    detached: bool,
}

impl Subscription {
    /// Explicitly remove this subscription's callback.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        if let Some(inner) = self.inner.upgrade() {
            let mut guard = inner.lock().expect("hub state lock poisoned");
            guard.registry.unsubscribe(&self.key, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::HubError;
    use crate::models::Role;
    use crate::persist::MemoryAdapter;

    /// Adapter whose saves can be made to fail on demand.
    struct FlakyAdapter {
        inner: MemoryAdapter,
        fail_saves: Arc<AtomicBool>,
    }

    impl PersistenceAdapter for FlakyAdapter {
        fn load_all(&mut self) -> Result<EntityStore> {
            self.inner.load_all()
        }

        fn save(&mut self, store: &EntityStore) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(HubError::Persistence("disk on fire".into()));
            }
            self.inner.save(store)
        }
    }

    fn recording_callback(log: Arc<Mutex<Vec<View>>>) -> ViewCallback {
        Box::new(move |view| {
            log.lock().unwrap().push(view.clone());
        })
    }

    fn hub_with(policy: DurabilityPolicy, fail_saves: Arc<AtomicBool>) -> Hub {
        let adapter = FlakyAdapter {
            inner: MemoryAdapter::new(),
            fail_saves,
        };
        let config = HubConfig {
            durability: policy,
            ..HubConfig::default()
        };
        Hub::open(Box::new(adapter), config).unwrap()
    }

    fn seeded_hub() -> (Hub, String, String) {
        let hub = Hub::open(Box::new(MemoryAdapter::new()), HubConfig::default()).unwrap();
        for (id, email) in [("A", "a@campus.test"), ("B", "b@campus.test")] {
            hub.ensure_account(id, email, None, Role::Student).unwrap();
        }
        let group = hub
            .create_group("A", "Tech Wizards", "", "Technology", None)
            .unwrap();
        let channel = hub.channels(&group.id).remove(0);
        (hub, group.id, channel.id)
    }

    #[test]
    fn replay_matches_a_one_shot_query_at_the_same_instant() {
        let (hub, gid, cid) = seeded_hub();
        hub.send_message(&gid, &cid, "B", "b", "hello").unwrap();

        let key = ViewKey::Messages(gid.clone(), cid.clone());
        let snapshot = hub.view(&key);

        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = hub.subscribe(key, recording_callback(log.clone()));

        let replayed = log.lock().unwrap();
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0], snapshot);
        match &replayed[0] {
            View::Messages(messages) => {
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].body, "hello");
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn mutations_notify_live_subscribers() {
        let (hub, gid, cid) = seeded_hub();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = hub.subscribe(
            ViewKey::Messages(gid.clone(), cid.clone()),
            recording_callback(log.clone()),
        );

        hub.send_message(&gid, &cid, "A", "a", "one").unwrap();
        hub.send_message(&gid, &cid, "A", "a", "two").unwrap();

        let views = log.lock().unwrap();
        // Replay plus one delivery per send.
        assert_eq!(views.len(), 3);
        match &views[2] {
            View::Messages(messages) => {
                let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
                assert_eq!(bodies, vec!["one", "two"]);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn dropped_subscriptions_stop_receiving() {
        let (hub, gid, cid) = seeded_hub();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sub = hub.subscribe(
            ViewKey::Messages(gid.clone(), cid.clone()),
            recording_callback(log.clone()),
        );

        drop(sub);
        hub.send_message(&gid, &cid, "A", "a", "unseen").unwrap();
        assert_eq!(log.lock().unwrap().len(), 1); // replay only
    }

    #[test]
    fn strict_policy_rejects_and_rolls_back_on_save_failure() {
        let fail = Arc::new(AtomicBool::new(false));
        let hub = hub_with(DurabilityPolicy::Strict, fail.clone());
        hub.ensure_account("A", "a@campus.test", None, Role::Student)
            .unwrap();

        fail.store(true, Ordering::SeqCst);
        let err = hub.award_points("A", 10, "reason").unwrap_err();
        assert!(matches!(err, HubError::Persistence(_)));

        // Pre-mutation state, not a partial patch.
        let account = hub.account("A").unwrap();
        assert_eq!(account.points, 0);
        assert!(account.achievements.is_empty());

        fail.store(false, Ordering::SeqCst);
        hub.award_points("A", 10, "reason").unwrap();
        assert_eq!(hub.account("A").unwrap().points, 10);
    }

    #[test]
    fn best_effort_policy_commits_in_memory_on_save_failure() {
        let fail = Arc::new(AtomicBool::new(false));
        let hub = hub_with(DurabilityPolicy::BestEffort, fail.clone());
        hub.ensure_account("A", "a@campus.test", None, Role::Student)
            .unwrap();

        fail.store(true, Ordering::SeqCst);
        hub.award_points("A", 10, "reason").unwrap();
        assert_eq!(hub.account("A").unwrap().points, 10);
    }

    #[test]
    fn sequential_mutations_are_visible_in_issue_order() {
        let (hub, gid, cid) = seeded_hub();
        hub.send_message(&gid, &cid, "A", "a", "M1").unwrap();
        hub.send_message(&gid, &cid, "A", "a", "M2").unwrap();

        let bodies: Vec<String> = hub
            .messages(&gid, &cid)
            .into_iter()
            .map(|m| m.body)
            .collect();
        // Never M2 without M1.
        assert_eq!(bodies, vec!["M1", "M2"]);
    }

    #[test]
    fn external_writes_trigger_reload_and_full_renotification() {
        let adapter = Arc::new(MemoryAdapter::new());
        let hub = Hub::open(Box::new(adapter.clone()), HubConfig::default()).unwrap();
        hub.ensure_account("A", "a@campus.test", None, Role::Student)
            .unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = hub.subscribe(ViewKey::Leaderboard, recording_callback(log.clone()));

        assert!(!hub.poll_external_changes().unwrap());

        // Another process rewrites the shared medium.
        let mut foreign = EntityStore::new();
        foreign.put_account(crate::models::Account {
            id: "Z".into(),
            email: "z@campus.test".into(),
            display_name: "Z".into(),
            role: Role::Student,
            points: 999,
            joined_group_ids: Default::default(),
            skill_tags: Default::default(),
            interest_tags: Default::default(),
            badge_ids: Default::default(),
            achievements: Vec::new(),
            verified: true,
        });
        adapter.write_externally(foreign);

        assert!(hub.poll_external_changes().unwrap());
        assert!(!hub.poll_external_changes().unwrap());

        let views = log.lock().unwrap();
        assert_eq!(views.len(), 2); // replay + reload delivery
        match &views[1] {
            View::Accounts(accounts) => {
                assert_eq!(accounts.len(), 1);
                assert_eq!(accounts[0].id, "Z");
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn close_flushes_a_final_snapshot() {
        let adapter = Arc::new(MemoryAdapter::new());
        let hub = Hub::open(Box::new(adapter.clone()), HubConfig::default()).unwrap();
        hub.ensure_account("A", "a@campus.test", None, Role::Student)
            .unwrap();
        hub.close().unwrap();

        let reopened = Hub::open(Box::new(adapter), HubConfig::default()).unwrap();
        assert!(reopened.account("A").is_some());
    }
}
