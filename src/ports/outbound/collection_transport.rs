use crate::collections::domain::{CollectionPage, QuerySignature, ResourceClass, ResourceId};
use crate::shared::error::{DeleteRejection, FetchError};
use async_trait::async_trait;
use std::sync::Arc;

/// What a delete call targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    One(ResourceId),
    Many(Vec<ResourceId>),
}

impl DeleteTarget {
    /// Picks the single-id form when there is exactly one id
    pub fn from_ids(mut ids: Vec<ResourceId>) -> Self {
        if ids.len() == 1 {
            if let Some(id) = ids.pop() {
                return DeleteTarget::One(id);
            }
        }
        DeleteTarget::Many(ids)
    }

    pub fn ids(&self) -> Vec<ResourceId> {
        match self {
            DeleteTarget::One(id) => vec![id.clone()],
            DeleteTarget::Many(ids) => ids.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DeleteTarget::One(_) => 1,
            DeleteTarget::Many(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// CollectionTransport port for the backing store of resource collections
///
/// Method, path and payload shape are resource-class specific and owned by the
/// implementation. Implementations must turn "no response" into an error
/// (typically `FetchError::Timeout`) rather than hang.
///
/// # Async Support
/// Implementations must be `Send + Sync`; the cache drives fetches from spawned tasks.
#[async_trait]
pub trait CollectionTransport: Send + Sync {
    /// Fetches one page of a collection
    ///
    /// # Arguments
    /// * `signature` - Resource class plus filters, search and pagination
    ///
    /// # Errors
    /// Returns a `FetchError` for network, status or decoding failures
    async fn fetch_collection(&self, signature: &QuerySignature)
        -> Result<CollectionPage, FetchError>;

    /// Deletes one or many records of a class
    ///
    /// # Errors
    /// Returns `DeleteRejection::Validation` when the backend names the
    /// records or fields it refused, `DeleteRejection::Generic` otherwise
    async fn delete_resources(
        &self,
        resource_class: &ResourceClass,
        target: &DeleteTarget,
    ) -> Result<(), DeleteRejection>;
}

#[async_trait]
impl<T: CollectionTransport + ?Sized> CollectionTransport for Arc<T> {
    async fn fetch_collection(
        &self,
        signature: &QuerySignature,
    ) -> Result<CollectionPage, FetchError> {
        (**self).fetch_collection(signature).await
    }

    async fn delete_resources(
        &self,
        resource_class: &ResourceClass,
        target: &DeleteTarget,
    ) -> Result<(), DeleteRejection> {
        (**self).delete_resources(resource_class, target).await
    }
}
