use super::permission::CapabilitySpec;
use super::resource::{ResourceClass, ResourceRecord};
use crate::collections::policies::ImmutabilityRule;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A record field that free-text search looks at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchField {
    Name,
    Description,
    Metadata(String),
}

impl SearchField {
    pub fn read<'a>(&self, record: &'a ResourceRecord) -> Option<Cow<'a, str>> {
        match self {
            SearchField::Name => Some(Cow::Borrowed(record.name.as_str())),
            SearchField::Description => Some(Cow::Borrowed(record.description.as_str())),
            SearchField::Metadata(key) => record.metadata_text(key).map(Cow::Owned),
        }
    }
}

impl From<String> for SearchField {
    fn from(value: String) -> Self {
        match value.as_str() {
            "name" => SearchField::Name,
            "description" => SearchField::Description,
            _ => SearchField::Metadata(value),
        }
    }
}

impl From<SearchField> for String {
    fn from(field: SearchField) -> Self {
        match field {
            SearchField::Name => "name".to_string(),
            SearchField::Description => "description".to_string(),
            SearchField::Metadata(key) => key,
        }
    }
}

/// Where search text is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Fetch the whole collection once and filter locally
    #[default]
    Client,
    /// Send the text to the backend as `_q`; each search is its own cache entry
    Server,
}

/// Everything the core needs to know about one resource class
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub class: ResourceClass,
    pub capabilities: CapabilitySpec,
    pub searchable_fields: Vec<SearchField>,
    pub search_mode: SearchMode,
    pub immutability: ImmutabilityRule,
}

impl ResourceDescriptor {
    pub fn new(class: ResourceClass, capabilities: CapabilitySpec) -> Self {
        Self {
            class,
            capabilities,
            searchable_fields: vec![SearchField::Name, SearchField::Description],
            search_mode: SearchMode::Client,
            immutability: ImmutabilityRule::Never,
        }
    }

    pub fn with_searchable_fields(mut self, fields: Vec<SearchField>) -> Self {
        self.searchable_fields = fields;
        self
    }

    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    pub fn with_immutability(mut self, rule: ImmutabilityRule) -> Self {
        self.immutability = rule;
        self
    }

    pub fn is_immutable(&self, record: &ResourceRecord) -> bool {
        self.immutability.is_immutable(record)
    }

    /// End-user roles of the users-permissions plugin
    pub fn roles() -> Self {
        Self::new(
            ResourceClass::builtin("roles"),
            CapabilitySpec::crud("plugin::users-permissions.roles"),
        )
        .with_immutability(ImmutabilityRule::built_in_roles())
    }

    /// Administrator accounts
    pub fn users() -> Self {
        Self::new(
            ResourceClass::builtin("users"),
            CapabilitySpec::crud("admin::users"),
        )
        .with_searchable_fields(vec![
            SearchField::Name,
            SearchField::Metadata("email".to_string()),
            SearchField::Metadata("username".to_string()),
        ])
        .with_search_mode(SearchMode::Server)
    }

    /// Built-in descriptors, in display order
    pub fn presets() -> Vec<Self> {
        vec![Self::roles(), Self::users()]
    }
}
