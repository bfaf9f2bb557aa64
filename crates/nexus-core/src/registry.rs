//! Subscription registry: view-key buckets of live callbacks.
//!
//! The registry maps each [`ViewKey`] to its registered callbacks and fans
//! a freshly computed projection out to them on invalidation.  Buckets are
//! created on first subscribe and released when the last callback leaves,
//! so an idle key costs nothing.

use std::collections::HashMap;

use crate::config::HubConfig;
use crate::keys::ViewKey;
use crate::query::{self, View};
use crate::store::EntityStore;

/// Callback invoked with the new projection value on replay and on every
/// invalidation of its key.
pub type ViewCallback = Box<dyn FnMut(&View) + Send>;

#[derive(Default)]
pub struct SubscriptionRegistry {
    next_id: u64,
    buckets: HashMap<ViewKey, Vec<(u64, ViewCallback)>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback and immediately replay the current projection to
    /// it, so no initial state is missed.  Returns the token needed to
    /// unsubscribe.
    pub fn subscribe(
        &mut self,
        key: ViewKey,
        mut callback: ViewCallback,
        store: &EntityStore,
        config: &HubConfig,
    ) -> u64 {
        let view = query::project(store, &key, config);
        callback(&view);

        let id = self.next_id;
        self.next_id += 1;
        self.buckets.entry(key).or_default().push((id, callback));
        id
    }

    /// Remove exactly one callback.  Releases the key's bucket when it was
    /// the last one.
    pub fn unsubscribe(&mut self, key: &ViewKey, id: u64) {
        if let Some(bucket) = self.buckets.get_mut(key) {
            bucket.retain(|(sub_id, _)| *sub_id != id);
            if bucket.is_empty() {
                self.buckets.remove(key);
            }
        }
    }

    /// Recompute the projection for `key` and deliver it to every
    /// subscriber.  A key with no subscribers is a cheap no-op.
    pub fn invalidate(&mut self, key: &ViewKey, store: &EntityStore, config: &HubConfig) {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return;
        };
        tracing::debug!(key = %key, subscribers = bucket.len(), "invalidating view");
        let view = query::project(store, key, config);
        for (_, callback) in bucket.iter_mut() {
            callback(&view);
        }
    }

    /// Recompute and deliver every active view matching `pred`.
    pub fn invalidate_matching(
        &mut self,
        pred: impl Fn(&ViewKey) -> bool,
        store: &EntityStore,
        config: &HubConfig,
    ) {
        let keys: Vec<ViewKey> = self.buckets.keys().filter(|k| pred(k)).cloned().collect();
        for key in keys {
            self.invalidate(&key, store, config);
        }
    }

    /// Re-deliver every active view.  Used after a full reload triggered by
    /// an externally-originated change, where per-key attribution is not
    /// tracked.
    pub fn notify_all(&mut self, store: &EntityStore, config: &HubConfig) {
        let keys: Vec<ViewKey> = self.buckets.keys().cloned().collect();
        for key in keys {
            self.invalidate(&key, store, config);
        }
    }

    /// Drop every subscription.  Used on hub shutdown.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_callback(counter: Arc<AtomicUsize>) -> ViewCallback {
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn subscribe_replays_immediately() {
        let mut registry = SubscriptionRegistry::new();
        let store = EntityStore::new();
        let config = HubConfig::default();
        let hits = Arc::new(AtomicUsize::new(0));

        registry.subscribe(
            ViewKey::Leaderboard,
            counting_callback(hits.clone()),
            &store,
            &config,
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_without_subscribers_is_noop() {
        let mut registry = SubscriptionRegistry::new();
        let store = EntityStore::new();
        registry.invalidate(&ViewKey::Mentors, &store, &HubConfig::default());
        assert_eq!(registry.bucket_count(), 0);
    }

    #[test]
    fn unsubscribe_removes_exactly_one_and_releases_bucket() {
        let mut registry = SubscriptionRegistry::new();
        let store = EntityStore::new();
        let config = HubConfig::default();
        let hits_a = Arc::new(AtomicUsize::new(0));
        let hits_b = Arc::new(AtomicUsize::new(0));

        let key = ViewKey::Channels("g1".into());
        let a = registry.subscribe(key.clone(), counting_callback(hits_a.clone()), &store, &config);
        let b = registry.subscribe(key.clone(), counting_callback(hits_b.clone()), &store, &config);

        registry.unsubscribe(&key, a);
        registry.invalidate(&key, &store, &config);
        assert_eq!(hits_a.load(Ordering::SeqCst), 1); // replay only
        assert_eq!(hits_b.load(Ordering::SeqCst), 2);

        registry.unsubscribe(&key, b);
        assert_eq!(registry.bucket_count(), 0);
    }

    #[test]
    fn equal_keys_share_a_bucket() {
        let mut registry = SubscriptionRegistry::new();
        let store = EntityStore::new();
        let config = HubConfig::default();
        let hits = Arc::new(AtomicUsize::new(0));

        registry.subscribe(
            ViewKey::Messages("g1".into(), "c1".into()),
            counting_callback(hits.clone()),
            &store,
            &config,
        );
        registry.subscribe(
            ViewKey::Messages("g1".into(), "c1".into()),
            counting_callback(hits.clone()),
            &store,
            &config,
        );
        assert_eq!(registry.bucket_count(), 1);
    }
}
