//! Process-wide cache of fetched collections, keyed by query signature.
//!
//! One fetch per signature is ever in flight; concurrent readers share it.
//! Invalidation bumps the entry's generation, so a fetch that started before
//! the invalidation can never overwrite what came after it.

mod entry;
mod subscription;
#[cfg(test)]
mod tests;

pub use entry::{CacheStatus, CollectionCacheEntry};
pub use subscription::{CollectionSubscription, SubscriptionId};

use crate::collections::domain::{
    CollectionPage, QuerySignature, ResourceClass, ResourceId, ResourceRecord,
};
use crate::ports::outbound::{Clock, CollectionTransport, Notification, Notifier};
use crate::shared::error::FetchError;
use chrono::TimeDelta;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use subscription::SubscriberRegistry;
use tracing::{debug, warn};

/// Default freshness window of a fetched collection
pub const DEFAULT_TTL_SECONDS: i64 = 20;

/// Default number of signatures kept before least-recently-used eviction
pub const DEFAULT_CAPACITY: usize = 64;

/// Cache tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entries older than this are served stale while a refetch runs
    pub ttl: TimeDelta,
    /// Soft bound; entries with subscribers or an in-flight fetch are never evicted
    pub capacity: usize,
}

impl CacheConfig {
    pub fn new(ttl: TimeDelta, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_TTL_SECONDS), DEFAULT_CAPACITY)
    }
}

type SharedFetch = Shared<BoxFuture<'static, CollectionCacheEntry>>;

struct Slot {
    entry: CollectionCacheEntry,
    in_flight: Option<SharedFetch>,
    last_access: u64,
}

impl Slot {
    fn new(signature: QuerySignature) -> Self {
        Self {
            entry: CollectionCacheEntry::pending(signature),
            in_flight: None,
            last_access: 0,
        }
    }
}

struct CacheInner<T> {
    transport: T,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    slots: DashMap<QuerySignature, Slot>,
    subscribers: Arc<SubscriberRegistry>,
    access_tick: AtomicU64,
    revision: AtomicU64,
}

/// CollectionCache - signature-keyed, deduplicating, invalidatable store
///
/// Cloning is cheap and every clone shares the same entries.
///
/// `get`, `fetch` and `subscribe` start fetches on the ambient tokio runtime.
/// Outside a runtime a started fetch only progresses while someone awaits
/// `fetch`.
pub struct CollectionCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for CollectionCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: CollectionTransport + 'static> CollectionCache<T> {
    pub fn new(
        transport: T,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: CacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                transport,
                notifier,
                clock,
                config,
                slots: DashMap::new(),
                subscribers: Arc::new(SubscriberRegistry::default()),
                access_tick: AtomicU64::new(0),
                revision: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Returns the current snapshot immediately, starting a fetch when the
    /// entry is missing, pending, failed or older than the TTL
    ///
    /// A stale entry is returned with its old records and `is_fetching` set.
    pub fn get(&self, signature: &QuerySignature) -> CollectionCacheEntry {
        self.inner.acquire(signature).0
    }

    /// Like `get`, but waits for the outstanding fetch (if any) to settle
    ///
    /// A fetch superseded by an invalidation is followed to the newer one,
    /// so the returned entry is never the product of a discarded fetch.
    pub async fn fetch(&self, signature: &QuerySignature) -> CollectionCacheEntry {
        loop {
            let (snapshot, in_flight) = self.inner.acquire(signature);
            let Some(fetch) = in_flight else {
                return snapshot;
            };
            let settled = fetch.await;
            if settled.is_fetching || settled.status == CacheStatus::Pending {
                continue;
            }
            return settled;
        }
    }

    /// Current snapshot without starting anything
    pub fn peek(&self, signature: &QuerySignature) -> Option<CollectionCacheEntry> {
        self.inner
            .slots
            .get(signature)
            .map(|slot| slot.entry.clone())
    }

    /// Marks every entry whose signature satisfies `predicate` as pending
    ///
    /// Entries keep their records so readers can show them while the refetch
    /// runs. In-flight fetches for them are detached and their results will
    /// be discarded. Entries with live subscribers are refetched right away;
    /// the rest refetch on their next `get`.
    ///
    /// # Returns
    /// The number of entries invalidated
    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QuerySignature) -> bool,
    {
        let mut invalidated = Vec::new();
        for mut slot in self.inner.slots.iter_mut() {
            if !predicate(slot.key()) {
                continue;
            }
            let revision = self.inner.next_revision();
            let slot = slot.value_mut();
            slot.in_flight = None;
            let entry = &mut slot.entry;
            entry.generation += 1;
            entry.revision = revision;
            entry.status = CacheStatus::Pending;
            entry.is_fetching = false;
            entry.is_stale = entry.has_data();
            invalidated.push(entry.clone());
        }

        for entry in &invalidated {
            debug!(signature = %entry.signature, generation = entry.generation, "invalidated");
            self.inner.subscribers.publish(entry);
            if self.inner.subscribers.has_live(&entry.signature) {
                self.inner.acquire(&entry.signature);
            }
        }
        invalidated.len()
    }

    /// Invalidates every cached page, search and filter of one class
    pub fn invalidate_class(&self, resource_class: &ResourceClass) -> usize {
        self.invalidate(|signature| signature.resource_class() == resource_class)
    }

    /// Registers for updates of one signature and makes sure it is loading
    ///
    /// Delivery stops when the returned subscription is dropped.
    pub fn subscribe(&self, signature: &QuerySignature) -> CollectionSubscription {
        let subscription = CollectionSubscription::register(
            Arc::clone(&self.inner.subscribers),
            signature.clone(),
        );
        let snapshot = self.get(signature);
        self.inner.subscribers.publish(&snapshot);
        subscription
    }

    pub fn subscriber_count(&self, signature: &QuerySignature) -> usize {
        self.inner.subscribers.count(signature)
    }

    /// Looks a record up in any cached page of its class
    pub fn find_record(&self, resource_class: &ResourceClass, id: &ResourceId) -> Option<ResourceRecord> {
        self.inner
            .slots
            .iter()
            .filter(|slot| slot.key().resource_class() == resource_class)
            .find_map(|slot| slot.entry.records.iter().find(|r| &r.id == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }
}

impl<T: CollectionTransport + 'static> CacheInner<T> {
    fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Touches (or creates) the slot and starts a fetch when one is due
    fn acquire(self: &Arc<Self>, signature: &QuerySignature) -> (CollectionCacheEntry, Option<SharedFetch>) {
        let now = self.clock.now();
        let tick = self.access_tick.fetch_add(1, Ordering::Relaxed);
        let mut inserted = false;

        let (snapshot, in_flight, started) = {
            let mut slot = self.slots.entry(signature.clone()).or_insert_with(|| {
                inserted = true;
                Slot::new(signature.clone())
            });
            let slot = slot.value_mut();
            slot.last_access = tick;

            let due = match slot.entry.status {
                CacheStatus::Pending | CacheStatus::Error => true,
                CacheStatus::Ready => slot.entry.is_expired(now, self.config.ttl),
            };
            let started = if due && slot.in_flight.is_none() {
                Some(self.start_fetch(slot))
            } else {
                None
            };
            (slot.entry.clone(), slot.in_flight.clone(), started)
        };

        if let Some(fetch) = started {
            self.subscribers.publish(&snapshot);
            drive(fetch);
        }
        if inserted {
            self.evict_over_capacity();
        }
        (snapshot, in_flight)
    }

    fn start_fetch(self: &Arc<Self>, slot: &mut Slot) -> SharedFetch {
        let entry = &mut slot.entry;
        entry.generation += 1;
        entry.revision = self.next_revision();
        entry.is_fetching = true;
        entry.is_stale = entry.has_data();

        let generation = entry.generation;
        let signature = entry.signature.clone();
        let inner = Arc::clone(self);
        let fetch = async move {
            debug!(signature = %signature, generation, "fetching collection");
            let result = inner.transport.fetch_collection(&signature).await;
            inner.settle(&signature, generation, result)
        }
        .boxed()
        .shared();

        slot.in_flight = Some(fetch.clone());
        fetch
    }

    /// Applies a fetch result if its generation is still current
    fn settle(
        &self,
        signature: &QuerySignature,
        generation: u64,
        result: Result<CollectionPage, FetchError>,
    ) -> CollectionCacheEntry {
        let now = self.clock.now();
        let mut warning = None;

        let snapshot = {
            let Some(mut slot) = self.slots.get_mut(signature) else {
                debug!(signature = %signature, "entry evicted before its fetch settled");
                return CollectionCacheEntry::pending(signature.clone());
            };
            if slot.entry.generation != generation {
                debug!(
                    signature = %signature,
                    generation,
                    current = slot.entry.generation,
                    "discarding superseded fetch result"
                );
                return slot.entry.clone();
            }

            let revision = self.next_revision();
            let slot = slot.value_mut();
            slot.in_flight = None;
            let entry = &mut slot.entry;
            entry.is_fetching = false;
            entry.revision = revision;

            match result {
                Ok(page) => {
                    debug!(signature = %signature, records = page.records.len(), "collection fetched");
                    entry.status = CacheStatus::Ready;
                    entry.records = page.records;
                    entry.pagination = Some(page.pagination);
                    entry.fetched_at = Some(now);
                    entry.is_stale = false;
                    entry.last_error = None;
                }
                Err(error) => {
                    warn!(signature = %signature, error = %error, "collection fetch failed");
                    entry.status = CacheStatus::Error;
                    entry.is_stale = entry.has_data();
                    warning = Some(format!(
                        "Could not load {}: {}",
                        signature.resource_class(),
                        error
                    ));
                    entry.last_error = Some(error);
                }
            }
            entry.clone()
        };

        self.subscribers.publish(&snapshot);
        if let Some(message) = warning {
            self.notifier.notify(Notification::warning(message));
        }
        snapshot
    }

    /// Drops least-recently-used entries until back under capacity
    fn evict_over_capacity(&self) {
        while self.slots.len() > self.config.capacity {
            let victim = self
                .slots
                .iter()
                .filter(|slot| slot.in_flight.is_none() && !self.subscribers.has_live(slot.key()))
                .min_by_key(|slot| slot.last_access)
                .map(|slot| slot.key().clone());

            let Some(victim) = victim else {
                debug!(len = self.slots.len(), "over capacity, every entry is pinned");
                break;
            };
            if self
                .slots
                .remove_if(&victim, |_, slot| slot.in_flight.is_none())
                .is_none()
            {
                break;
            }
            debug!(signature = %victim, "evicted");
        }
    }
}

/// Runs a started fetch to completion even if nobody awaits it
fn drive(fetch: SharedFetch) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(fetch);
        }
        Err(_) => debug!("no runtime available, fetch will run when awaited"),
    }
}
