use super::api_client::{AdminApiClient, RequestFailure};
use super::endpoint::{DeleteEndpoint, ResourceEndpoint};
use crate::collections::domain::{CollectionPage, QuerySignature, ResourceClass, ResourceId};
use crate::ports::outbound::{CollectionTransport, DeleteTarget};
use crate::shared::error::{DeleteRejection, FetchError, FieldMessage};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Message used when the backend gives no usable explanation
const GENERIC_FAILURE: &str = "An error occurred";

/// HttpCollectionTransport adapter for the admin REST API
///
/// Implements the CollectionTransport port. Each resource class is mapped to a
/// `ResourceEndpoint` describing its paths and response layout.
pub struct HttpCollectionTransport {
    api: Arc<AdminApiClient>,
    endpoints: HashMap<ResourceClass, ResourceEndpoint>,
}

impl HttpCollectionTransport {
    pub fn new(api: Arc<AdminApiClient>) -> Self {
        Self {
            api,
            endpoints: HashMap::new(),
        }
    }

    pub fn with_endpoint(mut self, class: ResourceClass, endpoint: ResourceEndpoint) -> Self {
        self.endpoints.insert(class, endpoint);
        self
    }

    fn endpoint(&self, class: &ResourceClass) -> Option<&ResourceEndpoint> {
        self.endpoints.get(class)
    }

    async fn delete_each(
        &self,
        delete: &DeleteEndpoint,
        ids: &[ResourceId],
    ) -> Result<(), DeleteRejection> {
        // Stops at the first refusal; earlier ids are already gone on the backend.
        let mut applied = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = match delete.path_for(id) {
                Ok(path) => self
                    .api
                    .delete(&path)
                    .await
                    .map_err(|failure| rejection_from(failure, std::slice::from_ref(id))),
                Err(e) => Err(DeleteRejection::Generic(e.to_string())),
            };
            if let Err(rejection) = outcome {
                if applied.is_empty() {
                    return Err(rejection);
                }
                debug!(applied = applied.len(), failed = %id, "per-id delete stopped part way");
                return Err(DeleteRejection::Partial {
                    applied,
                    rejection: Box::new(rejection),
                });
            }
            applied.push(id.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionTransport for HttpCollectionTransport {
    async fn fetch_collection(
        &self,
        signature: &QuerySignature,
    ) -> Result<CollectionPage, FetchError> {
        let endpoint = self.endpoint(signature.resource_class()).ok_or_else(|| {
            FetchError::Transport(format!(
                "no endpoint configured for '{}'",
                signature.resource_class()
            ))
        })?;

        debug!(%signature, path = %endpoint.list_path, "GET collection");
        let body = self
            .api
            .get_json(&endpoint.list_path, &endpoint.query_pairs(signature))
            .await
            .map_err(fetch_error_from)?;

        endpoint.decode_page(&body)
    }

    async fn delete_resources(
        &self,
        resource_class: &ResourceClass,
        target: &DeleteTarget,
    ) -> Result<(), DeleteRejection> {
        let endpoint = self.endpoint(resource_class).ok_or_else(|| {
            DeleteRejection::Generic(format!("no endpoint configured for '{}'", resource_class))
        })?;
        let ids = target.ids();

        match &endpoint.delete {
            DeleteEndpoint::PerId(_) => self.delete_each(&endpoint.delete, &ids).await,
            DeleteEndpoint::Batch(path) => {
                debug!(class = %resource_class, count = ids.len(), %path, "POST batch delete");
                let body = json!({ "ids": ids.iter().map(ResourceId::as_str).collect::<Vec<_>>() });
                self.api
                    .post_json(path, &body)
                    .await
                    .map(|_| ())
                    .map_err(|failure| rejection_from(failure, &ids))
            }
        }
    }
}

fn fetch_error_from(failure: RequestFailure) -> FetchError {
    match failure {
        RequestFailure::Timeout(secs) => FetchError::Timeout(secs),
        RequestFailure::Transport(message) => FetchError::Transport(message),
        RequestFailure::Decode(message) => FetchError::Decode(message),
        RequestFailure::Status { status, body } => FetchError::Status {
            status,
            message: error_message(&body).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        },
    }
}

/// Classifies a failed delete
///
/// * `{"data": "<message>"}`: one validation message, shown verbatim
/// * `{"error": {"details": {"errors": [{"path": [...], "message": ...}]}}}`:
///   one message per entry; a numeric path element is read as an index into `ids`
/// * `{"error": {"name": "ValidationError", "message": ...}}`: one validation message
/// * anything else is generic
fn rejection_from(failure: RequestFailure, ids: &[ResourceId]) -> DeleteRejection {
    let body = match failure {
        RequestFailure::Status { body, .. } => body,
        other => return DeleteRejection::Generic(other.to_string()),
    };

    if let Some(message) = body.get("data").and_then(Value::as_str) {
        return DeleteRejection::Validation(vec![FieldMessage::new(
            single_id(ids),
            message,
        )]);
    }

    let Some(error) = body.get("error") else {
        return DeleteRejection::Generic(GENERIC_FAILURE.to_string());
    };

    let details: Vec<FieldMessage> = error
        .pointer("/details/errors")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let message = entry.get("message").and_then(Value::as_str)?;
                    let id = entry
                        .get("path")
                        .and_then(Value::as_array)
                        .and_then(|path| path.iter().rev().find_map(Value::as_u64))
                        .and_then(|index| ids.get(usize::try_from(index).ok()?).cloned())
                        .or_else(|| single_id(ids));
                    Some(FieldMessage::new(id, message))
                })
                .collect()
        })
        .unwrap_or_default();
    if !details.is_empty() {
        return DeleteRejection::Validation(details);
    }

    let message = error.get("message").and_then(Value::as_str);
    match (error.get("name").and_then(Value::as_str), message) {
        (Some("ValidationError"), Some(message)) => {
            DeleteRejection::Validation(vec![FieldMessage::new(single_id(ids), message)])
        }
        (_, Some(message)) => DeleteRejection::Generic(message.to_string()),
        _ => DeleteRejection::Generic(GENERIC_FAILURE.to_string()),
    }
}

fn single_id(ids: &[ResourceId]) -> Option<ResourceId> {
    match ids {
        [id] => Some(id.clone()),
        _ => None,
    }
}

fn error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("message"))
        .or_else(|| body.get("data"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
