use crate::collections::domain::{CallerIdentity, CapabilitySpec, PermissionSet};
use crate::ports::outbound::GrantProvider;
use crate::shared::error::PermissionResolutionError;
use dashmap::{DashMap, DashSet};
use tracing::{debug, warn};

/// Where a permission decision stands for one `(caller, spec)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Loading,
    Ready(PermissionSet),
    /// The last attempt failed; every action is denied until a retry succeeds
    Failed,
}

impl PermissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PermissionState::Loading)
    }

    /// The resolved set, or fully denied while loading or after a failure
    pub fn permissions(&self) -> PermissionSet {
        match self {
            PermissionState::Loading | PermissionState::Failed => PermissionSet::denied(),
            PermissionState::Ready(permissions) => *permissions,
        }
    }
}

/// PermissionResolver - Turns a caller's raw grants into a PermissionSet
///
/// Resolution is memoized per `(caller identity, capability spec)`, so asking
/// again with the same pair never reaches the grant provider. A different
/// caller or a different spec resolves afresh.
///
/// Failures degrade to `PermissionSet::denied()` and are not memoized; the
/// next `resolve` for that pair tries again. `state` reports them as `Failed`
/// so a polling caller does not wait forever.
///
/// # Type Parameters
/// * `G` - GrantProvider implementation
pub struct PermissionResolver<G> {
    grants: G,
    resolved: DashMap<(CallerIdentity, CapabilitySpec), PermissionSet>,
    failed: DashSet<(CallerIdentity, CapabilitySpec)>,
}

impl<G: GrantProvider> PermissionResolver<G> {
    pub fn new(grants: G) -> Self {
        Self {
            grants,
            resolved: DashMap::new(),
            failed: DashSet::new(),
        }
    }

    /// Resolves, failing closed
    pub async fn resolve(&self, caller: &CallerIdentity, spec: &CapabilitySpec) -> PermissionSet {
        match self.try_resolve(caller, spec).await {
            Ok(permissions) => permissions,
            Err(error) => {
                warn!(caller = %caller.as_str(), error = %error, "permission resolution failed, denying all actions");
                PermissionSet::denied()
            }
        }
    }

    /// Resolves, reporting why a decision could not be made
    ///
    /// # Errors
    /// Returns `PermissionResolutionError` if the grant provider fails
    pub async fn try_resolve(
        &self,
        caller: &CallerIdentity,
        spec: &CapabilitySpec,
    ) -> Result<PermissionSet, PermissionResolutionError> {
        let key = (caller.clone(), spec.clone());
        if let Some(permissions) = self.resolved.get(&key) {
            return Ok(*permissions);
        }

        let grants = match self.grants.granted_capabilities(caller).await {
            Ok(grants) => grants,
            Err(e) => {
                self.failed.insert(key);
                return Err(PermissionResolutionError {
                    caller: caller.as_str().to_string(),
                    details: format!("{:#}", e),
                });
            }
        };

        let permissions = spec.evaluate(&grants);
        debug!(
            caller = %caller.as_str(),
            grants = grants.len(),
            ?permissions,
            "permissions resolved"
        );
        self.failed.remove(&key);
        self.resolved.insert(key, permissions);
        Ok(permissions)
    }

    /// Non-blocking peek for the rendering side
    pub fn state(&self, caller: &CallerIdentity, spec: &CapabilitySpec) -> PermissionState {
        let key = (caller.clone(), spec.clone());
        if let Some(permissions) = self.resolved.get(&key) {
            return PermissionState::Ready(*permissions);
        }
        if self.failed.contains(&key) {
            return PermissionState::Failed;
        }
        PermissionState::Loading
    }

    /// Drops every decision held for `caller` (e.g. after the session changed)
    pub fn forget(&self, caller: &CallerIdentity) {
        self.resolved.retain(|(who, _), _| who != caller);
        self.failed.retain(|(who, _)| who != caller);
    }
}
