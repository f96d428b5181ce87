use admin_collections::prelude::*;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Mock CollectionTransport backed by in-memory records
///
/// Fetches read the records when they start. A fetch can be held back with
/// `hold_next_fetch`, which makes it possible to line up a stale settlement.
/// Server-side search is emulated with a case-insensitive name match on `_q`.
/// With `with_per_id_deletes`, ids are deleted one by one and a refusal leaves
/// the earlier ones deleted, like a backend without a batch endpoint.
pub struct MockCollectionTransport {
    records: Mutex<HashMap<ResourceClass, Vec<ResourceRecord>>>,
    rejections: Mutex<HashMap<ResourceId, String>>,
    gates: Mutex<VecDeque<Arc<Notify>>>,
    deletes: Mutex<Vec<(ResourceClass, DeleteTarget)>>,
    fail_fetches: Mutex<bool>,
    per_id_deletes: bool,
    fetch_calls: AtomicUsize,
    completed_fetches: AtomicUsize,
}

impl MockCollectionTransport {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            rejections: Mutex::new(HashMap::new()),
            gates: Mutex::new(VecDeque::new()),
            deletes: Mutex::new(Vec::new()),
            fail_fetches: Mutex::new(false),
            per_id_deletes: false,
            fetch_calls: AtomicUsize::new(0),
            completed_fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_records(self, class: &str, records: Vec<ResourceRecord>) -> Self {
        self.set_records(class, records);
        self
    }

    /// Rejects any delete that includes `id` with a validation message
    pub fn with_rejection(self, id: &str, message: &str) -> Self {
        self.rejections
            .lock()
            .unwrap()
            .insert(ResourceId::from(id), message.to_string());
        self
    }

    pub fn with_per_id_deletes(mut self) -> Self {
        self.per_id_deletes = true;
        self
    }

    pub fn set_records(&self, class: &str, records: Vec<ResourceRecord>) {
        self.records
            .lock()
            .unwrap()
            .insert(ResourceClass::new(class).unwrap(), records);
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_fetches.lock().unwrap() = failing;
    }

    /// The next fetch waits until the returned handle is notified
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().push_back(Arc::clone(&gate));
        gate
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn completed_fetches(&self) -> usize {
        self.completed_fetches.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> Vec<(ResourceClass, DeleteTarget)> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn names(&self, class: &str) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .get(&ResourceClass::new(class).unwrap())
            .map(|records| records.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl MockCollectionTransport {
    fn delete_one_by_one(
        &self,
        resource_class: &ResourceClass,
        ids: &[ResourceId],
    ) -> std::result::Result<(), DeleteRejection> {
        let mut applied = Vec::new();
        for id in ids {
            let refusal = self.rejections.lock().unwrap().get(id).cloned();
            if let Some(message) = refusal {
                let rejection =
                    DeleteRejection::Validation(vec![FieldMessage::new(Some(id.clone()), message)]);
                if applied.is_empty() {
                    return Err(rejection);
                }
                return Err(DeleteRejection::Partial {
                    applied,
                    rejection: Box::new(rejection),
                });
            }
            if let Some(records) = self.records.lock().unwrap().get_mut(resource_class) {
                records.retain(|r| &r.id != id);
            }
            applied.push(id.clone());
        }
        Ok(())
    }
}

impl Default for MockCollectionTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollectionTransport for MockCollectionTransport {
    async fn fetch_collection(
        &self,
        signature: &QuerySignature,
    ) -> std::result::Result<CollectionPage, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let failing = *self.fail_fetches.lock().unwrap();
        let mut records = self
            .records
            .lock()
            .unwrap()
            .get(signature.resource_class())
            .cloned()
            .unwrap_or_default();
        let gate = self.gates.lock().unwrap().pop_front();

        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.completed_fetches.fetch_add(1, Ordering::SeqCst);

        if failing {
            return Err(FetchError::Status {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }

        if let Some(query) = signature.search_text() {
            let query = query.to_lowercase();
            records.retain(|r| r.name.to_lowercase().contains(&query));
        }

        let total = records.len() as u64;
        let size = signature.page_size() as usize;
        let start = (signature.page() as usize - 1) * size;
        let page: Vec<ResourceRecord> = records.into_iter().skip(start).take(size).collect();
        Ok(CollectionPage::new(
            page,
            Pagination::new(total, signature.page(), signature.page_size()),
        ))
    }

    async fn delete_resources(
        &self,
        resource_class: &ResourceClass,
        target: &DeleteTarget,
    ) -> std::result::Result<(), DeleteRejection> {
        self.deletes
            .lock()
            .unwrap()
            .push((resource_class.clone(), target.clone()));

        let ids = target.ids();
        if self.per_id_deletes {
            return self.delete_one_by_one(resource_class, &ids);
        }

        let rejected: Vec<FieldMessage> = {
            let rejections = self.rejections.lock().unwrap();
            ids.iter()
                .filter_map(|id| {
                    rejections
                        .get(id)
                        .map(|message| FieldMessage::new(Some(id.clone()), message.clone()))
                })
                .collect()
        };
        if !rejected.is_empty() {
            return Err(DeleteRejection::Validation(rejected));
        }

        if let Some(records) = self.records.lock().unwrap().get_mut(resource_class) {
            records.retain(|r| !ids.contains(&r.id));
        }
        Ok(())
    }
}
