use crate::shared::security::validate_base_url;
use crate::shared::Result;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A request that did not produce a successful JSON answer
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("no response within {0} seconds")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Transport(String),

    /// Non-2xx answer; `body` is `Null` when it was not JSON
    #[error("status {status}")]
    Status { status: u16, body: Value },

    #[error("invalid JSON body: {0}")]
    Decode(String),
}

/// AdminApiClient - Thin JSON client for the admin REST API
///
/// Owns the base URL and the bearer token so the transport and the grant
/// provider send identical requests.
pub struct AdminApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
}

impl AdminApiClient {
    /// Creates a client for `base_url`
    ///
    /// # Errors
    /// Returns an error for a malformed base URL or if the HTTP client cannot be built
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        validate_base_url(base_url)?;

        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("admin-collections/{}", version);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> std::result::Result<Value, RequestFailure> {
        let url = with_query(self.url(path), query);
        self.send(self.client.get(url)).await
    }

    pub async fn delete(&self, path: &str) -> std::result::Result<Value, RequestFailure> {
        let request = self.client.delete(self.url(path));
        self.send(request).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<Value, RequestFailure> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(request).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<Value, RequestFailure> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            return Err(RequestFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        // 204 and friends
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| RequestFailure::Decode(e.to_string()))
    }

    fn classify(&self, error: reqwest::Error) -> RequestFailure {
        if error.is_timeout() {
            RequestFailure::Timeout(self.timeout_secs)
        } else {
            RequestFailure::Transport(error.to_string())
        }
    }
}

fn with_query(url: String, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url;
    }
    let encoded = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", url, encoded)
}
