//! Configuration file support for admin-collections.
//!
//! Provides YAML or TOML configuration through `admin-collections.config.yml`
//! files: the schema, file loading, validation, and resolution against the
//! built-in resource presets and command-line overrides.

use anyhow::Context;
use chrono::TimeDelta;
use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::adapters::outbound::network::{
    DeleteEndpoint, ResourceEndpoint, DEFAULT_TIMEOUT_SECS, ID_PLACEHOLDER,
};
use crate::application::collection_cache::{CacheConfig, DEFAULT_CAPACITY, DEFAULT_TTL_SECONDS};
use crate::collections::domain::{
    CallerIdentity, CapabilitySpec, ResourceClass, ResourceDescriptor, SearchField, SearchMode, DEFAULT_PAGE_SIZE,
};
use crate::collections::policies::ImmutabilityRule;
use crate::shared::error::AdminError;
use crate::shared::security::{validate_base_url, validate_config_file};
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "admin-collections.config.yml";

/// Environment variable holding the API token
pub const TOKEN_ENV_VAR: &str = "ADMIN_API_TOKEN";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub cache: Option<CacheSection>,
    pub default_page_size: Option<u32>,
    pub request_timeout_seconds: Option<u64>,
    pub resources: Option<Vec<ResourceConfig>>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CacheSection {
    pub ttl_seconds: Option<i64>,
    pub capacity: Option<usize>,
}

/// A custom resource class, or an override of a preset with the same class
#[derive(Debug, Deserialize)]
pub struct ResourceConfig {
    pub class: String,
    pub list_path: String,
    pub delete: DeleteEndpoint,
    #[serde(default)]
    pub records_pointer: String,
    pub pagination_pointer: Option<String>,
    pub id_field: Option<String>,
    pub name_fields: Option<Vec<String>>,
    pub description_field: Option<String>,
    #[serde(default)]
    pub metadata_renames: BTreeMap<String, String>,
    pub searchable_fields: Option<Vec<SearchField>>,
    #[serde(default)]
    pub search_mode: SearchMode,
    pub immutable_when: Option<ImmutableWhen>,
    /// Defaults to `<class>.create`, `<class>.read`, ...
    pub capabilities: Option<CapabilitySpec>,
}

#[derive(Debug, Deserialize)]
pub struct ImmutableWhen {
    pub key: String,
    pub values: Vec<String>,
}

/// Values given on the command line; they win over the file
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

/// Descriptor and wire layout of one resource class
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBinding {
    pub descriptor: ResourceDescriptor,
    pub endpoint: ResourceEndpoint,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub cache: CacheConfig,
    pub default_page_size: u32,
    pub request_timeout_secs: u64,
    /// Presets first, then custom classes in file order
    pub resources: Vec<ResourceBinding>,
}

impl AppConfig {
    /// Merges the file (if any) over the defaults, then applies overrides.
    ///
    /// Token precedence: `--token`, then `env_token`, then `api_token` in the file.
    pub fn resolve(
        file: Option<ConfigFile>,
        overrides: ConfigOverrides,
        env_token: Option<String>,
    ) -> Result<Self> {
        let file = file.unwrap_or_default();
        let cache = file.cache.unwrap_or_default();

        let ttl_seconds = cache.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS);
        let capacity = cache.capacity.unwrap_or(DEFAULT_CAPACITY);

        let mut resources: Vec<ResourceBinding> = ResourceDescriptor::presets()
            .into_iter()
            .filter_map(|descriptor| {
                let endpoint = match descriptor.class.as_str() {
                    "roles" => ResourceEndpoint::roles(),
                    "users" => ResourceEndpoint::users(),
                    _ => return None,
                };
                Some(ResourceBinding {
                    descriptor,
                    endpoint,
                })
            })
            .collect();

        for config in file.resources.unwrap_or_default() {
            let binding = config.into_binding()?;
            match resources
                .iter_mut()
                .find(|existing| existing.descriptor.class == binding.descriptor.class)
            {
                Some(existing) => *existing = binding,
                None => resources.push(binding),
            }
        }

        let base_url = overrides.base_url.or(file.base_url);
        if let Some(url) = &base_url {
            validate_base_url(url).map_err(|e| AdminError::InvalidConfig {
                message: e.to_string(),
                hint: "Use a URL such as http://localhost:1337".to_string(),
            })?;
        }

        Ok(Self {
            base_url,
            api_token: overrides
                .token
                .or(env_token)
                .or(file.api_token)
                .filter(|t| !t.is_empty()),
            cache: CacheConfig::new(TimeDelta::seconds(ttl_seconds), capacity),
            default_page_size: file.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            request_timeout_secs: file.request_timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
            resources,
        })
    }

    /// Looks up a class by name
    ///
    /// # Errors
    /// Returns `AdminError::UnknownResourceClass` listing the known classes
    pub fn binding(&self, class: &str) -> Result<&ResourceBinding> {
        self.resources
            .iter()
            .find(|binding| binding.descriptor.class.as_str() == class)
            .ok_or_else(|| {
                AdminError::UnknownResourceClass {
                    class: class.to_string(),
                    known: self.class_names().join(", "),
                }
                .into()
            })
    }

    pub fn class_names(&self) -> Vec<&str> {
        self.resources
            .iter()
            .map(|binding| binding.descriptor.class.as_str())
            .collect()
    }

    /// Identity of the session that grants are resolved for.
    ///
    /// Distinct tokens against the same backend are distinct callers. The
    /// token itself is only kept as a digest.
    pub fn caller_identity(&self) -> CallerIdentity {
        let backend = self.base_url.as_deref().unwrap_or_default();
        match &self.api_token {
            Some(token) => {
                let mut hasher = DefaultHasher::new();
                token.hash(&mut hasher);
                CallerIdentity::new(format!("{}#{:016x}", backend, hasher.finish()))
            }
            None => CallerIdentity::new(format!("{}#anonymous", backend)),
        }
    }
}

impl ResourceConfig {
    fn into_binding(self) -> Result<ResourceBinding> {
        let class = ResourceClass::new(self.class.clone()).map_err(|e| AdminError::InvalidConfig {
            message: format!("resources: invalid class '{}': {}", self.class, e),
            hint: "Class names are short identifiers such as \"articles\"".to_string(),
        })?;

        let capabilities = self
            .capabilities
            .unwrap_or_else(|| CapabilitySpec::crud(class.as_str()));

        let mut descriptor = ResourceDescriptor::new(class, capabilities)
            .with_search_mode(self.search_mode);
        if let Some(fields) = self.searchable_fields {
            descriptor = descriptor.with_searchable_fields(fields);
        }
        if let Some(rule) = self.immutable_when {
            descriptor = descriptor.with_immutability(ImmutabilityRule::metadata_in(
                rule.key,
                rule.values,
            ));
        }

        let mut endpoint = ResourceEndpoint::new(self.list_path, self.delete);
        endpoint.records_pointer = self.records_pointer;
        endpoint.pagination_pointer = self.pagination_pointer;
        if let Some(id_field) = self.id_field {
            endpoint.id_field = id_field;
        }
        if let Some(name_fields) = self.name_fields {
            endpoint.name_fields = name_fields;
        }
        if self.description_field.is_some() {
            endpoint.description_field = self.description_field;
        }
        endpoint.metadata_renames = self.metadata_renames;

        Ok(ResourceBinding {
            descriptor,
            endpoint,
        })
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    validate_config_file(path)?;

    let content = std::fs::read_to_string(path).map_err(|e| AdminError::ConfigReadError {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let parsed = match extension.as_deref() {
        Some("toml") => toml::from_str::<ConfigFile>(&content).map_err(|e| e.to_string()),
        Some("yml") | Some("yaml") => {
            serde_yaml_ng::from_str::<ConfigFile>(&content).map_err(|e| e.to_string())
        }
        _ => Err("unsupported extension (expected .yml, .yaml or .toml)".to_string()),
    };
    let config = parsed.map_err(|details| AdminError::ConfigParseError {
        path: path.to_path_buf(),
        details,
    })?;

    validate_config(&config)
        .with_context(|| format!("Config file: {}", path.display()))?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

fn invalid(message: impl Into<String>, hint: impl Into<String>) -> anyhow::Error {
    AdminError::InvalidConfig {
        message: message.into(),
        hint: hint.into(),
    }
    .into()
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(cache) = &config.cache {
        if cache.ttl_seconds.is_some_and(|ttl| ttl <= 0) {
            return Err(invalid(
                "cache.ttl_seconds must be greater than 0",
                "Use the number of seconds an entry stays fresh, e.g. 20",
            ));
        }
        if cache.capacity == Some(0) {
            return Err(invalid(
                "cache.capacity must be greater than 0",
                "Use the number of query results to keep, e.g. 64",
            ));
        }
    }

    if config.default_page_size == Some(0) {
        return Err(invalid(
            "default_page_size must be greater than 0",
            "Use a page size such as 10",
        ));
    }

    if config.request_timeout_seconds == Some(0) {
        return Err(invalid(
            "request_timeout_seconds must be greater than 0",
            "Use a timeout in seconds, e.g. 10",
        ));
    }

    let mut seen = HashSet::new();
    for (i, resource) in config.resources.iter().flatten().enumerate() {
        if resource.class.trim().is_empty() {
            return Err(invalid(
                format!("resources[{}].class must not be empty", i),
                "Each resource must have a non-empty 'class' field (e.g., \"articles\")",
            ));
        }
        if !seen.insert(resource.class.as_str()) {
            return Err(invalid(
                format!("resources[{}].class '{}' is defined twice", i, resource.class),
                "Merge the two definitions into one",
            ));
        }
        if resource.list_path.trim().is_empty() {
            return Err(invalid(
                format!("resources[{}].list_path must not be empty", i),
                "Use the collection path, e.g. \"/api/articles\"",
            ));
        }
        if let DeleteEndpoint::PerId(template) = &resource.delete {
            if !template.contains(ID_PLACEHOLDER) {
                return Err(invalid(
                    format!(
                        "resources[{}].delete.per_id '{}' has no {} placeholder",
                        i, template, ID_PLACEHOLDER
                    ),
                    "Write the path as e.g. \"/api/articles/{id}\"",
                ));
            }
        }
    }

    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    let mut keys: Vec<&String> = config.unknown_fields.keys().collect();
    keys.sort();
    for key in keys {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}
