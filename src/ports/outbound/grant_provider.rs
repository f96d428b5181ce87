use crate::collections::domain::{CallerIdentity, GrantedCapability};
use crate::shared::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// GrantProvider port for the session collaborator
///
/// Supplies the raw capability list held by a caller. Authentication and token
/// handling live behind this port; the core only consumes its answer.
#[async_trait]
pub trait GrantProvider: Send + Sync {
    /// Lists the capabilities granted to `caller`
    ///
    /// # Errors
    /// Returns an error if the session cannot be queried; callers degrade to
    /// "no access" rather than propagating it
    async fn granted_capabilities(&self, caller: &CallerIdentity)
        -> Result<Vec<GrantedCapability>>;
}

#[async_trait]
impl<G: GrantProvider + ?Sized> GrantProvider for Arc<G> {
    async fn granted_capabilities(
        &self,
        caller: &CallerIdentity,
    ) -> Result<Vec<GrantedCapability>> {
        (**self).granted_capabilities(caller).await
    }
}
