use super::CollectionCacheEntry;
use crate::collections::domain::QuerySignature;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Identifies one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Channels = HashMap<SubscriptionId, watch::Sender<CollectionCacheEntry>>;

#[derive(Default)]
pub(super) struct SubscriberRegistry {
    channels: DashMap<QuerySignature, Channels>,
}

impl SubscriberRegistry {
    fn register(
        &self,
        signature: QuerySignature,
        id: SubscriptionId,
        sender: watch::Sender<CollectionCacheEntry>,
    ) {
        self.channels.entry(signature).or_default().insert(id, sender);
    }

    fn remove(&self, signature: &QuerySignature, id: SubscriptionId) {
        if let Some(mut senders) = self.channels.get_mut(signature) {
            senders.remove(&id);
        }
        self.channels
            .remove_if(signature, |_, senders| senders.is_empty());
    }

    pub(super) fn has_live(&self, signature: &QuerySignature) -> bool {
        self.channels
            .get(signature)
            .is_some_and(|senders| senders.values().any(|s| !s.is_closed()))
    }

    pub(super) fn count(&self, signature: &QuerySignature) -> usize {
        self.channels
            .get(signature)
            .map(|senders| senders.len())
            .unwrap_or(0)
    }

    /// Delivers `entry` to every subscriber of its signature that has not
    /// already seen a newer revision
    pub(super) fn publish(&self, entry: &CollectionCacheEntry) {
        let Some(senders) = self.channels.get(&entry.signature) else {
            return;
        };
        for sender in senders.values() {
            sender.send_if_modified(|current| {
                if entry.revision > current.revision {
                    *current = entry.clone();
                    true
                } else {
                    false
                }
            });
        }
    }
}

/// A live registration for one signature's updates
///
/// Dropping it (or calling `unsubscribe`) stops delivery.
pub struct CollectionSubscription {
    id: SubscriptionId,
    signature: QuerySignature,
    receiver: watch::Receiver<CollectionCacheEntry>,
    registry: Arc<SubscriberRegistry>,
}

impl CollectionSubscription {
    pub(super) fn register(registry: Arc<SubscriberRegistry>, signature: QuerySignature) -> Self {
        let id = SubscriptionId::new();
        let (sender, receiver) = watch::channel(CollectionCacheEntry::pending(signature.clone()));
        registry.register(signature.clone(), id, sender);
        Self {
            id,
            signature,
            receiver,
            registry,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn signature(&self) -> &QuerySignature {
        &self.signature
    }

    /// Latest delivered snapshot
    pub fn current(&self) -> CollectionCacheEntry {
        self.receiver.borrow().clone()
    }

    /// Waits for the next delivery
    ///
    /// Returns `None` once the subscription can no longer receive updates.
    pub async fn changed(&mut self) -> Option<CollectionCacheEntry> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits until a delivered snapshot satisfies `predicate`
    pub async fn wait_for<P>(&mut self, predicate: P) -> Option<CollectionCacheEntry>
    where
        P: FnMut(&CollectionCacheEntry) -> bool,
    {
        self.receiver
            .wait_for(predicate)
            .await
            .ok()
            .map(|entry| entry.clone())
    }

    pub fn unsubscribe(self) {}
}

impl Drop for CollectionSubscription {
    fn drop(&mut self) {
        self.registry.remove(&self.signature, self.id);
    }
}

impl fmt::Debug for CollectionSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSubscription")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .finish()
    }
}
