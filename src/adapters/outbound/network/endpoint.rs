use crate::collections::domain::{
    CollectionPage, Pagination, QuerySignature, ResourceId, ResourceRecord, USERS_COUNT_KEY,
};
use crate::shared::error::FetchError;
use crate::shared::security::validate_path_segment;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Placeholder substituted with the record id in per-id delete paths
pub const ID_PLACEHOLDER: &str = "{id}";

/// How a class deletes records on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteEndpoint {
    /// `DELETE <path>` once per id; `path` contains `{id}`
    PerId(String),
    /// `POST <path>` with `{"ids": [...]}`
    Batch(String),
}

impl DeleteEndpoint {
    /// Resolves a per-id path for `id`
    ///
    /// # Errors
    /// Returns an error when the id could escape the path segment, or when
    /// called on a batch endpoint
    pub fn path_for(&self, id: &ResourceId) -> Result<String> {
        match self {
            DeleteEndpoint::PerId(template) => {
                validate_path_segment(id.as_str(), "Resource id")?;
                Ok(template.replace(ID_PLACEHOLDER, &urlencoding::encode(id.as_str())))
            }
            DeleteEndpoint::Batch(path) => {
                anyhow::bail!("Batch endpoint '{}' has no per-id path", path)
            }
        }
    }
}

/// Wire layout of one resource class on the admin API
///
/// Response bodies are navigated with JSON pointers so one transport serves
/// every class: roles answer `{"roles": [...]}`, admin users answer
/// `{"data": {"results": [...], "pagination": {...}}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEndpoint {
    pub list_path: String,
    pub delete: DeleteEndpoint,
    pub records_pointer: String,
    /// `None` for classes the backend returns in one piece
    pub pagination_pointer: Option<String>,
    pub id_field: String,
    /// Joined with a space to form the display name
    pub name_fields: Vec<String>,
    pub description_field: Option<String>,
    /// Backend field name -> metadata key
    pub metadata_renames: BTreeMap<String, String>,
}

impl ResourceEndpoint {
    pub fn new(list_path: impl Into<String>, delete: DeleteEndpoint) -> Self {
        Self {
            list_path: list_path.into(),
            delete,
            records_pointer: String::new(),
            pagination_pointer: None,
            id_field: "id".to_string(),
            name_fields: vec!["name".to_string()],
            description_field: Some("description".to_string()),
            metadata_renames: BTreeMap::new(),
        }
    }

    /// Users-permissions roles: unpaginated, deleted one at a time
    pub fn roles() -> Self {
        let mut endpoint = Self::new(
            "/users-permissions/roles",
            DeleteEndpoint::PerId("/users-permissions/roles/{id}".to_string()),
        );
        endpoint.records_pointer = "/roles".to_string();
        endpoint
            .metadata_renames
            .insert("nb_users".to_string(), USERS_COUNT_KEY.to_string());
        endpoint
    }

    /// Admin users: paginated, searched server-side, deleted in batches
    pub fn users() -> Self {
        let mut endpoint = Self::new(
            "/admin/users",
            DeleteEndpoint::Batch("/admin/users/batch-delete".to_string()),
        );
        endpoint.records_pointer = "/data/results".to_string();
        endpoint.pagination_pointer = Some("/data/pagination".to_string());
        endpoint.name_fields = vec!["firstname".to_string(), "lastname".to_string()];
        endpoint.description_field = Some("email".to_string());
        endpoint
    }

    pub fn is_paginated(&self) -> bool {
        self.pagination_pointer.is_some()
    }

    /// Query parameters to send for `signature`
    ///
    /// Unpaginated endpoints ignore `page`/`pageSize`; sending them would only
    /// confuse backends that reject unknown parameters.
    pub fn query_pairs(&self, signature: &QuerySignature) -> Vec<(String, String)> {
        let pairs = signature.query_pairs();
        if self.is_paginated() {
            return pairs;
        }
        pairs
            .into_iter()
            .filter(|(key, _)| key != "page" && key != "pageSize")
            .collect()
    }

    /// Decodes one list response body
    ///
    /// # Errors
    /// Returns `FetchError::Decode` when the records array is missing or a
    /// record has no usable id
    pub fn decode_page(&self, body: &Value) -> std::result::Result<CollectionPage, FetchError> {
        let items = body
            .pointer(&self.records_pointer)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                FetchError::Decode(format!(
                    "no records array at '{}'",
                    pointer_label(&self.records_pointer)
                ))
            })?;

        let records = items
            .iter()
            .map(|item| self.decode_record(item))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let Some(pointer) = &self.pagination_pointer else {
            return Ok(CollectionPage::unpaginated(records));
        };

        let pagination = body
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| FetchError::Decode(format!("no pagination at '{}'", pointer)))
            .and_then(|value| {
                serde_json::from_value::<Pagination>(value)
                    .map_err(|e| FetchError::Decode(format!("invalid pagination: {}", e)))
            })?;

        Ok(CollectionPage::new(records, pagination))
    }

    fn decode_record(&self, item: &Value) -> std::result::Result<ResourceRecord, FetchError> {
        let object = item
            .as_object()
            .ok_or_else(|| FetchError::Decode("record is not an object".to_string()))?;

        let id = object
            .get(&self.id_field)
            .and_then(ResourceId::from_json)
            .ok_or_else(|| {
                FetchError::Decode(format!("record without '{}' field", self.id_field))
            })?;

        let name = self
            .name_fields
            .iter()
            .filter_map(|field| object.get(field).and_then(Value::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let description = self
            .description_field
            .as_ref()
            .and_then(|field| object.get(field))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut record = ResourceRecord::new(id, name).with_description(description);
        record.metadata = self.metadata_of(object);
        Ok(record)
    }

    /// Everything but the id, under its renamed key where one is configured
    fn metadata_of(&self, object: &Map<String, Value>) -> BTreeMap<String, Value> {
        object
            .iter()
            .filter(|(key, _)| **key != self.id_field)
            .map(|(key, value)| {
                let key = self.metadata_renames.get(key).unwrap_or(key);
                (key.clone(), value.clone())
            })
            .collect()
    }
}

fn pointer_label(pointer: &str) -> &str {
    if pointer.is_empty() {
        "<root>"
    } else {
        pointer
    }
}
