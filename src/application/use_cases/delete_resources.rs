use crate::application::collection_cache::CollectionCache;
use crate::collections::domain::{PermissionSet, ResourceDescriptor, ResourceId};
use crate::ports::outbound::{CollectionTransport, DeleteTarget, Notification, Notifier};
use crate::shared::error::{DeleteRejection, MutationError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// MutationCoordinator - Delete use case for one resource class
///
/// Checks the local preconditions (delete permission, immutability), sends
/// the delete through the transport, and on success invalidates every cached
/// query of the class. A failure is reported to the notifier before being
/// returned; it invalidates nothing unless the backend deleted part of the
/// target before refusing the rest.
///
/// # Type Parameters
/// * `T` - CollectionTransport implementation shared with the cache
pub struct MutationCoordinator<T> {
    descriptor: ResourceDescriptor,
    cache: CollectionCache<T>,
    notifier: Arc<dyn Notifier>,
}

impl<T: CollectionTransport + 'static> MutationCoordinator<T> {
    pub fn new(
        descriptor: ResourceDescriptor,
        cache: CollectionCache<T>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            descriptor,
            cache,
            notifier,
        }
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Deletes a single record
    ///
    /// # Errors
    /// See `delete_many`
    pub async fn delete_one(
        &self,
        permissions: &PermissionSet,
        id: ResourceId,
    ) -> Result<(), MutationError> {
        self.delete_many(permissions, vec![id]).await
    }

    /// Deletes a set of records in one backend call
    ///
    /// # Errors
    /// * `EmptyTarget` - no ids given
    /// * `PermissionDenied` - `permissions.can_delete` is false
    /// * `ImmutableTarget` - a target is protected by the class's immutability rule
    /// * `Validation` / `Generic` - the backend refused the request
    pub async fn delete_many(
        &self,
        permissions: &PermissionSet,
        ids: Vec<ResourceId>,
    ) -> Result<(), MutationError> {
        let ids: Vec<ResourceId> = ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.check_preconditions(permissions, &ids)?;

        let class = &self.descriptor.class;
        let target = DeleteTarget::from_ids(ids);
        debug!(class = %class, targets = target.len(), "sending delete");

        match self.cache.transport().delete_resources(class, &target).await {
            Ok(()) => {
                let invalidated = self.cache.invalidate_class(class);
                info!(class = %class, deleted = target.len(), invalidated, "delete succeeded");
                Ok(())
            }
            Err(rejection) => {
                warn!(class = %class, ?rejection, "delete rejected");
                let applied = rejection.applied();
                if !applied.is_empty() {
                    let invalidated = self.cache.invalidate_class(class);
                    info!(class = %class, deleted = applied.len(), invalidated, "delete partially applied");
                }
                self.report(rejection.cause());
                Err(rejection.into())
            }
        }
    }

    fn check_preconditions(
        &self,
        permissions: &PermissionSet,
        ids: &[ResourceId],
    ) -> Result<(), MutationError> {
        if ids.is_empty() {
            return Err(MutationError::EmptyTarget);
        }
        if !permissions.can_delete {
            debug!(class = %self.descriptor.class, "delete refused: no delete capability");
            return Err(MutationError::PermissionDenied);
        }

        // Ids not present in any cached page are left to the backend's own rules.
        let immutable: Vec<ResourceId> = ids
            .iter()
            .filter(|id| {
                self.cache
                    .find_record(&self.descriptor.class, id)
                    .is_some_and(|record| self.descriptor.is_immutable(&record))
            })
            .cloned()
            .collect();
        if !immutable.is_empty() {
            debug!(class = %self.descriptor.class, ?immutable, "delete refused: immutable targets");
            return Err(MutationError::ImmutableTarget { ids: immutable });
        }
        Ok(())
    }

    fn report(&self, rejection: &DeleteRejection) {
        match rejection {
            DeleteRejection::Validation(messages) if !messages.is_empty() => {
                for message in messages {
                    self.notifier
                        .notify(Notification::warning(message.message.clone()));
                }
            }
            DeleteRejection::Validation(_) => self
                .notifier
                .notify(Notification::error("The delete was rejected")),
            DeleteRejection::Generic(message) => {
                self.notifier.notify(Notification::error(message.clone()))
            }
            DeleteRejection::Partial { rejection, .. } => self.report(rejection),
        }
    }
}
