use super::*;
use crate::collections::domain::Pagination;
use crate::ports::outbound::DeleteTarget;
use crate::shared::error::DeleteRejection;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Answers fetch number `n` with `responses[n]` (or a one-record page),
/// optionally holding it until `gates[n]` is notified
#[derive(Default)]
struct ScriptedTransport {
    calls: AtomicUsize,
    responses: Mutex<HashMap<usize, Result<CollectionPage, FetchError>>>,
    gates: Mutex<HashMap<usize, Arc<Notify>>>,
}

impl ScriptedTransport {
    fn respond(&self, call: usize, response: Result<CollectionPage, FetchError>) {
        self.responses.lock().unwrap().insert(call, response);
    }

    fn gate(&self, call: usize) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(call, Arc::clone(&gate));
        gate
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CollectionTransport for ScriptedTransport {
    async fn fetch_collection(
        &self,
        _signature: &QuerySignature,
    ) -> Result<CollectionPage, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(&call).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .remove(&call)
            .unwrap_or_else(|| Ok(page(&[format!("record-{}", call).as_str()])))
    }

    async fn delete_resources(
        &self,
        _resource_class: &ResourceClass,
        _target: &DeleteTarget,
    ) -> Result<(), DeleteRejection> {
        Ok(())
    }
}

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn new() -> Self {
        Self(Mutex::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()))
    }

    fn advance(&self, seconds: i64) {
        *self.0.lock().unwrap() += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<Notification>>);

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

fn page(names: &[&str]) -> CollectionPage {
    let records = names
        .iter()
        .enumerate()
        .map(|(i, name)| ResourceRecord::new(ResourceId::from(i as u64 + 1), *name))
        .collect::<Vec<_>>();
    let total = records.len() as u64;
    CollectionPage::new(records, Pagination::new(total, 1, 10))
}

fn names(entry: &CollectionCacheEntry) -> Vec<&str> {
    entry.records.iter().map(|r| r.name.as_str()).collect()
}

fn roles() -> QuerySignature {
    QuerySignature::new(ResourceClass::new("roles").unwrap())
}

fn users() -> QuerySignature {
    QuerySignature::new(ResourceClass::new("users").unwrap())
}

struct Fixture {
    cache: CollectionCache<Arc<ScriptedTransport>>,
    transport: Arc<ScriptedTransport>,
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
}

fn fixture(capacity: usize) -> Fixture {
    let transport = Arc::new(ScriptedTransport::default());
    let clock = Arc::new(ManualClock::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let cache = CollectionCache::new(
        Arc::clone(&transport),
        notifier.clone(),
        clock.clone(),
        CacheConfig::new(TimeDelta::seconds(20), capacity),
    );
    Fixture {
        cache,
        transport,
        clock,
        notifier,
    }
}

#[tokio::test]
async fn test_first_get_is_pending_without_data() {
    let f = fixture(8);
    let gate = f.transport.gate(0);

    let entry = f.cache.get(&roles());
    assert_eq!(entry.status, CacheStatus::Pending);
    assert!(entry.is_fetching);
    assert!(entry.records.is_empty());
    assert!(entry.fetched_at.is_none());

    gate.notify_one();
    let settled = f.cache.fetch(&roles()).await;
    assert_eq!(settled.status, CacheStatus::Ready);
    assert_eq!(names(&settled), vec!["record-0"]);
}

#[tokio::test]
async fn test_concurrent_readers_share_one_fetch() {
    let f = fixture(8);
    let gate = f.transport.gate(0);

    let first = f.cache.get(&roles());
    let second = f.cache.get(&roles());
    assert!(first.is_fetching && second.is_fetching);

    let waiting = {
        let cache = f.cache.clone();
        tokio::spawn(async move { cache.fetch(&roles()).await })
    };
    let waiting_too = {
        let cache = f.cache.clone();
        tokio::spawn(async move { cache.fetch(&roles()).await })
    };

    gate.notify_one();
    let a = waiting.await.unwrap();
    let b = waiting_too.await.unwrap();
    assert_eq!(a, b);
    assert_eq!(f.transport.call_count(), 1);
}

#[tokio::test]
async fn test_fresh_entry_is_served_without_refetch() {
    let f = fixture(8);
    f.cache.fetch(&roles()).await;
    f.clock.advance(19);

    let entry = f.cache.get(&roles());
    assert_eq!(entry.status, CacheStatus::Ready);
    assert!(!entry.is_fetching);
    assert_eq!(f.transport.call_count(), 1);
}

#[tokio::test]
async fn test_expired_entry_is_served_stale_while_revalidating() {
    let f = fixture(8);
    f.cache.fetch(&roles()).await;
    f.clock.advance(20);
    let gate = f.transport.gate(1);

    let stale = f.cache.get(&roles());
    assert_eq!(stale.status, CacheStatus::Ready);
    assert!(stale.is_fetching);
    assert!(stale.is_stale);
    assert_eq!(names(&stale), vec!["record-0"]);

    gate.notify_one();
    let fresh = f.cache.fetch(&roles()).await;
    assert!(!fresh.is_stale);
    assert_eq!(names(&fresh), vec!["record-1"]);
    assert_eq!(f.transport.call_count(), 2);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_data_and_warns() {
    let f = fixture(8);
    f.cache.fetch(&roles()).await;
    f.clock.advance(30);
    f.transport
        .respond(1, Err(FetchError::Transport("connection reset".to_string())));

    let failed = f.cache.fetch(&roles()).await;
    assert_eq!(failed.status, CacheStatus::Error);
    assert_eq!(names(&failed), vec!["record-0"]);
    assert!(failed.is_stale);
    assert_eq!(
        failed.last_error,
        Some(FetchError::Transport("connection reset".to_string()))
    );

    let notes = f.notifier.0.lock().unwrap().clone();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, crate::ports::outbound::NotificationKind::Warning);
    assert!(notes[0].message.contains("connection reset"));
}

#[tokio::test]
async fn test_failed_fetch_is_retried_on_next_get_only() {
    let f = fixture(8);
    f.transport
        .respond(0, Err(FetchError::Status { status: 503, message: "unavailable".to_string() }));

    let failed = f.cache.fetch(&roles()).await;
    assert_eq!(failed.status, CacheStatus::Error);
    assert!(!failed.has_data());
    assert_eq!(f.transport.call_count(), 1);

    tokio::task::yield_now().await;
    assert_eq!(f.transport.call_count(), 1);

    let retried = f.cache.fetch(&roles()).await;
    assert_eq!(retried.status, CacheStatus::Ready);
    assert_eq!(f.transport.call_count(), 2);
}

#[tokio::test]
async fn test_invalidate_only_touches_matching_signatures() {
    let f = fixture(8);
    f.cache.fetch(&roles()).await;
    f.cache.fetch(&roles().with_page(2)).await;
    f.cache.fetch(&users()).await;

    let count = f.cache.invalidate_class(&ResourceClass::new("roles").unwrap());
    assert_eq!(count, 2);

    let invalidated = f.cache.peek(&roles()).unwrap();
    assert_eq!(invalidated.status, CacheStatus::Pending);
    assert!(invalidated.is_stale);
    assert_eq!(names(&invalidated), vec!["record-0"]);
    assert!(f.cache.peek(&users()).unwrap().is_ready());

    // nobody is subscribed, so nothing refetches until someone asks
    assert_eq!(f.transport.call_count(), 3);
    f.cache.fetch(&roles()).await;
    assert_eq!(f.transport.call_count(), 4);
}

#[tokio::test]
async fn test_invalidate_refetches_subscribed_entries() {
    let f = fixture(8);
    let mut subscription = f.cache.subscribe(&roles());
    let ready = subscription.wait_for(|e| e.is_ready()).await.unwrap();
    assert_eq!(names(&ready), vec!["record-0"]);

    f.cache.invalidate(|s| s.resource_class().as_str() == "roles");
    let refreshed = subscription
        .wait_for(|e| e.is_ready() && e.generation > ready.generation)
        .await
        .unwrap();
    assert_eq!(names(&refreshed), vec!["record-1"]);
    assert_eq!(f.transport.call_count(), 2);
}

#[tokio::test]
async fn test_fetch_started_before_invalidation_is_discarded() {
    let f = fixture(8);
    let old_gate = f.transport.gate(0);
    let new_gate = f.transport.gate(1);
    f.transport.respond(0, Ok(page(&["Editor", "Author"])));
    f.transport.respond(1, Ok(page(&["Editor"])));

    let _subscription = f.cache.subscribe(&roles());

    // a delete of "Author" succeeded while the first fetch was in flight
    f.cache.invalidate_class(&ResourceClass::new("roles").unwrap());
    tokio::task::yield_now().await;

    let waiter = {
        let cache = f.cache.clone();
        tokio::spawn(async move { cache.fetch(&roles()).await })
    };

    new_gate.notify_one();
    let settled = waiter.await.unwrap();
    assert_eq!(names(&settled), vec!["Editor"]);

    old_gate.notify_one();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    let current = f.cache.peek(&roles()).unwrap();
    assert_eq!(names(&current), vec!["Editor"]);
    assert_eq!(current.status, CacheStatus::Ready);
}

#[tokio::test]
async fn test_dropped_subscription_stops_delivery() {
    let f = fixture(8);
    let subscription = f.cache.subscribe(&roles());
    assert_eq!(f.cache.subscriber_count(&roles()), 1);

    subscription.unsubscribe();
    assert_eq!(f.cache.subscriber_count(&roles()), 0);

    f.cache.fetch(&roles()).await;
    f.cache.invalidate_class(&ResourceClass::new("roles").unwrap());
    // no live subscriber: the invalidation does not trigger a refetch
    assert_eq!(f.transport.call_count(), 1);
}

#[tokio::test]
async fn test_subscriber_sees_revisions_in_order() {
    let f = fixture(8);
    let mut subscription = f.cache.subscribe(&roles());
    let mut seen = Vec::new();
    while let Some(entry) = subscription.changed().await {
        seen.push(entry.revision);
        if entry.is_ready() {
            break;
        }
    }
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_least_recently_used_entry_is_evicted() {
    let f = fixture(2);
    f.cache.fetch(&roles()).await;
    f.cache.fetch(&users()).await;
    f.cache.get(&roles());

    f.cache.fetch(&roles().with_page(2)).await;
    assert_eq!(f.cache.len(), 2);
    assert!(f.cache.peek(&users()).is_none());
    assert!(f.cache.peek(&roles()).is_some());
}

#[tokio::test]
async fn test_subscribed_entries_are_never_evicted() {
    let f = fixture(1);
    let mut subscription = f.cache.subscribe(&roles());
    subscription.wait_for(|e| e.is_ready()).await.unwrap();

    f.cache.fetch(&users()).await;
    f.cache.fetch(&roles().with_page(3)).await;
    assert!(f.cache.peek(&roles()).is_some());
}

#[tokio::test]
async fn test_find_record_scans_class_pages() {
    let f = fixture(8);
    f.transport.respond(0, Ok(page(&["Editor", "Author"])));
    f.cache.fetch(&roles()).await;

    let class = ResourceClass::new("roles").unwrap();
    let found = f.cache.find_record(&class, &ResourceId::from("2")).unwrap();
    assert_eq!(found.name, "Author");
    assert!(f
        .cache
        .find_record(&ResourceClass::new("users").unwrap(), &ResourceId::from("2"))
        .is_none());
}
