//! Permission-gated list view controller.
//!
//! Holds the per-view state (current signature, search text, selection) and
//! turns intents into cache reads, gate transitions and deletes. Rendering
//! reads `snapshot()`; it never sees the cache or the transport.


use crate::application::collection_cache::{
    CacheStatus, CollectionCache, CollectionSubscription,
};
use crate::application::read_models::{
    ContentState, ListProjection, ListReadModelBuilder, ListViewSnapshot,
};
use crate::application::use_cases::{MutationCoordinator, PermissionResolver};
use crate::collections::domain::{
    CallerIdentity, PermissionSet, QuerySignature, ResourceDescriptor, ResourceId, SearchMode,
};
use crate::collections::services::{ConfirmationGate, ConfirmationState};
use crate::ports::inbound::{CollectionViewPort, ViewIntent};
use crate::ports::outbound::{CollectionTransport, GrantProvider, Notifier};
use crate::shared::error::ConfirmError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct ViewState {
    /// Signature the view fetches; never carries search text in client mode
    signature: QuerySignature,
    search_text: String,
    /// `None` until the first resolution finished
    permissions: Option<PermissionSet>,
    selection: BTreeSet<ResourceId>,
    subscription: Option<CollectionSubscription>,
}

/// ListViewModel - One mounted list view of one resource class
///
/// # Type Parameters
/// * `T` - CollectionTransport implementation behind the shared cache
/// * `G` - GrantProvider implementation behind the shared resolver
pub struct ListViewModel<T, G> {
    descriptor: ResourceDescriptor,
    caller: CallerIdentity,
    resolver: Arc<PermissionResolver<G>>,
    cache: CollectionCache<T>,
    coordinator: MutationCoordinator<T>,
    gate: ConfirmationGate,
    state: Mutex<ViewState>,
}

impl<T, G> ListViewModel<T, G>
where
    T: CollectionTransport + 'static,
    G: GrantProvider,
{
    pub fn new(
        descriptor: ResourceDescriptor,
        caller: CallerIdentity,
        resolver: Arc<PermissionResolver<G>>,
        cache: CollectionCache<T>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let signature = QuerySignature::new(descriptor.class.clone());
        let coordinator = MutationCoordinator::new(descriptor.clone(), cache.clone(), notifier);
        Self {
            descriptor,
            caller,
            resolver,
            cache,
            coordinator,
            gate: ConfirmationGate::new(),
            state: Mutex::new(ViewState {
                signature,
                search_text: String::new(),
                permissions: None,
                selection: BTreeSet::new(),
                subscription: None,
            }),
        }
    }

    /// Starts from a given query (e.g. parsed from a location string)
    ///
    /// In client search mode the search text is moved out of the signature
    /// and applied locally.
    pub fn with_signature(self, signature: QuerySignature) -> Self {
        {
            let mut state = self.lock();
            state.search_text = signature.search_text().unwrap_or_default().to_string();
            state.signature = match self.descriptor.search_mode {
                SearchMode::Client => signature.with_search(""),
                SearchMode::Server => signature,
            };
        }
        self
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn confirmation(&self) -> ConfirmationState {
        self.gate.state()
    }

    /// Resolves permissions, then loads the first page if reading is allowed
    pub async fn mount(&self) -> ListViewSnapshot {
        let permissions = self
            .resolver
            .resolve(&self.caller, &self.descriptor.capabilities)
            .await;
        self.lock().permissions = Some(permissions);
        self.load().await;
        self.snapshot()
    }

    /// Stops receiving updates. Fetches already started still settle into the cache.
    pub fn unmount(&self) {
        self.lock().subscription = None;
    }

    pub fn snapshot(&self) -> ListViewSnapshot {
        let state = self.lock();
        let permissions_loading = state.permissions.is_none();
        let permissions = state.permissions.unwrap_or_default();
        let entry = permissions
            .can_read
            .then(|| self.cache.peek(&state.signature))
            .flatten();

        let projection = entry.as_ref().map(|entry| {
            ListReadModelBuilder::project(
                &self.descriptor,
                entry,
                &permissions,
                &state.search_text,
                &state.selection,
            )
        });

        let content = if permissions_loading {
            ContentState::Loading
        } else if !permissions.can_read {
            ContentState::Forbidden
        } else {
            match (&entry, &projection) {
                (Some(_), Some(p)) if !p.rows.is_empty() => ContentState::Rows,
                (
                    Some(_),
                    Some(ListProjection {
                        empty_state: Some(empty),
                        ..
                    }),
                ) => ContentState::Empty(*empty),
                (Some(e), _) if e.status == CacheStatus::Error => ContentState::Unavailable,
                _ => ContentState::Loading,
            }
        };

        let is_loading = permissions_loading
            || (permissions.can_read && entry.as_ref().map_or(true, |e| e.is_fetching));

        ListViewSnapshot {
            resource_class: self.descriptor.class.clone(),
            signature: state.signature.clone(),
            search_mode: self.descriptor.search_mode,
            search_text: state.search_text.clone(),
            content,
            rows: projection.map(|p| p.rows).unwrap_or_default(),
            pagination: entry.as_ref().and_then(|e| e.pagination),
            permissions,
            can_create: permissions.can_create,
            is_loading,
            is_stale: entry.as_ref().is_some_and(|e| e.is_stale),
            last_error: entry
                .as_ref()
                .and_then(|e| e.last_error.as_ref())
                .map(ToString::to_string),
            confirmation: self.gate.state(),
            selected: state.selection.clone(),
        }
    }

    /// Fetches the current signature, keeping the view subscribed to it
    async fn load(&self) {
        let signature = {
            let mut state = self.lock();
            if !state.permissions.is_some_and(|p| p.can_read) {
                debug!(class = %self.descriptor.class, "read not permitted, skipping fetch");
                state.subscription = None;
                return;
            }
            let subscribed = state
                .subscription
                .as_ref()
                .is_some_and(|s| s.signature() == &state.signature);
            if !subscribed {
                let subscription = self.cache.subscribe(&state.signature);
                state.subscription = Some(subscription);
            }
            state.signature.clone()
        };

        let entry = self.cache.fetch(&signature).await;

        let mut state = self.lock();
        if state.signature == signature {
            state
                .selection
                .retain(|id| entry.records.iter().any(|r| &r.id == id));
        }
    }

    async fn navigate<F>(&self, change: F)
    where
        F: FnOnce(QuerySignature) -> QuerySignature,
    {
        let changed = {
            let mut state = self.lock();
            let next = change(state.signature.clone());
            let changed = next != state.signature;
            if changed {
                state.signature = next;
                state.selection.clear();
            }
            changed
        };
        if changed {
            self.load().await;
        }
    }

    async fn change_search(&self, text: String) {
        let refetch = {
            let mut state = self.lock();
            state.search_text = text.clone();
            match self.descriptor.search_mode {
                SearchMode::Client => false,
                SearchMode::Server => {
                    let next = state.signature.clone().with_search(text).with_page(1);
                    let changed = next != state.signature;
                    state.signature = next;
                    changed
                }
            }
        };
        if refetch {
            self.load().await;
        }
        self.prune_selection();
    }

    async fn confirm(&self) -> Result<(), ConfirmError> {
        let permissions = self.lock().permissions.unwrap_or_default();
        self.gate
            .confirm(|ids| async move {
                self.coordinator
                    .delete_many(&permissions, ids.into_iter().collect())
                    .await
            })
            .await?;

        self.lock().selection.clear();
        self.load().await;
        Ok(())
    }

    /// Ids of visible rows the caller may delete
    fn selectable_ids(&self, state: &ViewState) -> Vec<ResourceId> {
        let permissions = state.permissions.unwrap_or_default();
        let Some(entry) = self.cache.peek(&state.signature) else {
            return Vec::new();
        };
        ListReadModelBuilder::project(
            &self.descriptor,
            &entry,
            &permissions,
            &state.search_text,
            &state.selection,
        )
        .rows
        .into_iter()
        .filter(|row| row.can_delete)
        .map(|row| row.id)
        .collect()
    }

    fn toggle_row(&self, id: ResourceId) {
        let mut state = self.lock();
        if !self.selectable_ids(&state).contains(&id) {
            debug!(id = %id, "row is not selectable");
            return;
        }
        if !state.selection.remove(&id) {
            state.selection.insert(id);
        }
    }

    fn toggle_all(&self) {
        let mut state = self.lock();
        let ids = self.selectable_ids(&state);
        if !ids.is_empty() && ids.iter().all(|id| state.selection.contains(id)) {
            state.selection.clear();
        } else {
            state.selection = ids.into_iter().collect();
        }
    }

    fn prune_selection(&self) {
        let mut state = self.lock();
        let ids = self.selectable_ids(&state);
        state.selection.retain(|id| ids.contains(id));
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<T, G> CollectionViewPort for ListViewModel<T, G>
where
    T: CollectionTransport + 'static,
    G: GrantProvider,
{
    async fn dispatch(&self, intent: ViewIntent) -> Result<(), ConfirmError> {
        debug!(class = %self.descriptor.class, ?intent, "intent");
        match intent {
            ViewIntent::SearchChanged(text) => self.change_search(text).await,
            ViewIntent::GoToPage(page) => self.navigate(|s| s.with_page(page)).await,
            ViewIntent::SetPageSize(size) => {
                self.navigate(|s| s.with_page_size(size).with_page(1)).await
            }
            ViewIntent::SetFilter { key, value } => {
                self.navigate(|s| s.with_filter(key, value).with_page(1)).await
            }
            ViewIntent::ClearFilter(key) => {
                self.navigate(|s| s.without_filter(&key).with_page(1)).await
            }
            ViewIntent::ToggleRow(id) => self.toggle_row(id),
            ViewIntent::ToggleAll => self.toggle_all(),
            ViewIntent::RequestDelete(ids) => self.gate.request_delete(ids)?,
            ViewIntent::RequestBulkDelete => {
                let ids = self.lock().selection.clone();
                self.gate.request_delete(ids)?
            }
            ViewIntent::Confirm => self.confirm().await?,
            ViewIntent::Cancel => self.gate.cancel()?,
            ViewIntent::Refresh => self.load().await,
        }
        Ok(())
    }

    fn snapshot(&self) -> ListViewSnapshot {
        ListViewModel::snapshot(self)
    }
}
