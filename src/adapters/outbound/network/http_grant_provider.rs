use super::api_client::AdminApiClient;
use crate::collections::domain::{CallerIdentity, GrantedCapability};
use crate::ports::outbound::GrantProvider;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Path answering the current session's permissions
pub const PERMISSIONS_PATH: &str = "/admin/users/me/permissions";

#[derive(Debug, Deserialize)]
struct PermissionsResponse {
    data: Vec<GrantedCapability>,
}

/// HttpGrantProvider adapter reading the session's permissions from the admin API
///
/// The token configured on the client identifies the caller; `CallerIdentity`
/// only keys the resolver's memo.
pub struct HttpGrantProvider {
    api: Arc<AdminApiClient>,
}

impl HttpGrantProvider {
    pub fn new(api: Arc<AdminApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl GrantProvider for HttpGrantProvider {
    async fn granted_capabilities(
        &self,
        caller: &CallerIdentity,
    ) -> Result<Vec<GrantedCapability>> {
        tracing::debug!(%caller, "fetching granted permissions");
        let body = self
            .api
            .get_json(PERMISSIONS_PATH, &[])
            .await
            .map_err(|e| anyhow::anyhow!("permission lookup failed: {}", e))?;
        let response: PermissionsResponse = serde_json::from_value(body)?;
        Ok(response.data)
    }
}
