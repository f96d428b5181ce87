//! admin-collections - Permission-gated list views for admin resource collections
//!
//! This library resolves what a caller may do with a resource class, fetches
//! and caches collection pages keyed by query, searches them, and runs deletes
//! through an explicit confirmation step, following hexagonal architecture and
//! Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`collections`): Records, queries, permissions, search and the confirmation gate
//! - **Application Layer** (`application`): Collection cache, permission resolver, delete use case, list view
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use admin_collections::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let api = Arc::new(AdminApiClient::new("http://localhost:1337", None, 10)?);
//! let transport = HttpCollectionTransport::new(api.clone())
//!     .with_endpoint(ResourceDescriptor::roles().class, ResourceEndpoint::roles());
//! let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier::default());
//! let cache = CollectionCache::new(
//!     Arc::new(transport),
//!     notifier.clone(),
//!     Arc::new(SystemClock),
//!     CacheConfig::default(),
//! );
//! let resolver = Arc::new(PermissionResolver::new(Arc::new(HttpGrantProvider::new(api))));
//!
//! let view = ListViewModel::new(
//!     ResourceDescriptor::roles(),
//!     CallerIdentity::new("me"),
//!     resolver,
//!     cache,
//!     notifier,
//! );
//! let snapshot = view.mount().await;
//! TablePresenter::new().present(&snapshot)?;
//! view.dispatch(ViewIntent::SearchChanged("edit".to_string())).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod collections;
pub mod config;
pub mod observability;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::{LoadingSpinner, StderrNotifier, TablePresenter};
    pub use crate::adapters::outbound::network::{
        AdminApiClient, DeleteEndpoint, HttpCollectionTransport, HttpGrantProvider,
        ResourceEndpoint,
    };
    pub use crate::adapters::outbound::system::SystemClock;
    pub use crate::application::collection_cache::{
        CacheConfig, CacheStatus, CollectionCache, CollectionCacheEntry, CollectionSubscription,
    };
    pub use crate::application::list_view::ListViewModel;
    pub use crate::application::read_models::{
        ContentState, EmptyState, ListReadModelBuilder, ListViewSnapshot, RowViewModel,
        UsersCount,
    };
    pub use crate::application::use_cases::{
        MutationCoordinator, PermissionResolver, PermissionState,
    };
    pub use crate::collections::domain::{
        CallerIdentity, CapabilityAction, CapabilitySpec, CollectionPage, GrantedCapability,
        Pagination, PermissionSet, PolicyDescriptor, QuerySignature, ResourceClass,
        ResourceDescriptor, ResourceId, ResourceRecord, SearchField, SearchMode,
    };
    pub use crate::collections::policies::ImmutabilityRule;
    pub use crate::collections::services::{
        ConfirmationGate, ConfirmationPhase, ConfirmationState, SearchMatcher,
    };
    pub use crate::ports::inbound::{CollectionViewPort, ViewIntent};
    pub use crate::ports::outbound::{
        Clock, CollectionTransport, DeleteTarget, GrantProvider, Notification, NotificationKind,
        Notifier, SilentNotifier, ViewPresenter,
    };
    pub use crate::shared::error::{
        ConfirmError, DeleteRejection, FetchError, FieldMessage, GateError, MutationError,
        PermissionResolutionError,
    };
    pub use crate::shared::Result;
}
