use crate::shared::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maximum length for resource class names (security limit)
const MAX_CLASS_NAME_LENGTH: usize = 64;

/// Metadata key carrying the number of users attached to a role
pub const USERS_COUNT_KEY: &str = "usersCount";

/// Metadata key carrying the built-in role type
pub const ROLE_TYPE_KEY: &str = "type";

/// NewType wrapper for a resource class name (e.g. "roles", "users")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceClass(String);

impl ResourceClass {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            anyhow::bail!("Resource class name cannot be empty");
        }

        if name.len() > MAX_CLASS_NAME_LENGTH {
            anyhow::bail!(
                "Resource class name is too long ({} bytes). Maximum allowed: {} bytes",
                name.len(),
                MAX_CLASS_NAME_LENGTH
            );
        }

        // Class names end up in cache keys and log fields; keep them plain.
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            anyhow::bail!(
                "Resource class name contains invalid characters. Only ASCII alphanumerics, hyphens, underscores, and dots are allowed."
            );
        }

        Ok(Self(name))
    }

    /// Names of the built-in presets, known to be valid
    pub(crate) fn builtin(name: &'static str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceClass {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ResourceClass> for String {
    fn from(class: ResourceClass) -> Self {
        class.0
    }
}

impl std::fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single record within its class.
///
/// Backends hand out numeric or string ids; both are kept as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id out of a JSON value, accepting numbers and strings
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single row of a resource collection as delivered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Class-specific fields (e.g. `usersCount` and `type` for roles)
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ResourceRecord {
    pub fn new(id: impl Into<ResourceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns a metadata value rendered as text, if it is a scalar
    pub fn metadata_text(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn users_count(&self) -> Option<u64> {
        self.metadata.get(USERS_COUNT_KEY).and_then(Value::as_u64)
    }

    pub fn role_type(&self) -> Option<&str> {
        self.metadata.get(ROLE_TYPE_KEY).and_then(Value::as_str)
    }
}
