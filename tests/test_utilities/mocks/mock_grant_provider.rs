use admin_collections::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock GrantProvider returning a fixed grant list, or failing
pub struct MockGrantProvider {
    grants: Vec<GrantedCapability>,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockGrantProvider {
    pub fn new(actions: &[&str]) -> Self {
        Self {
            grants: actions.iter().map(|a| GrantedCapability::new(*a)).collect(),
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every CRUD action of the users-permissions roles
    pub fn roles_admin() -> Self {
        Self::new(&[
            "plugin::users-permissions.roles.create",
            "plugin::users-permissions.roles.read",
            "plugin::users-permissions.roles.update",
            "plugin::users-permissions.roles.delete",
        ])
    }

    pub fn with_failure() -> Self {
        Self {
            grants: Vec::new(),
            should_fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GrantProvider for MockGrantProvider {
    async fn granted_capabilities(
        &self,
        _caller: &CallerIdentity,
    ) -> Result<Vec<GrantedCapability>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            anyhow::bail!("Mock session failure");
        }
        Ok(self.grants.clone())
    }
}
