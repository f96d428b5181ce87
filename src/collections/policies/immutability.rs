use crate::collections::domain::ResourceRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// ImmutabilityRule policy for records that may never be edited or deleted
///
/// The rule is a domain fact about the record, independent of what the caller
/// is allowed to do. Built-in roles are the canonical case: a role whose `type`
/// is `public` or `authenticated` ships with the backend and must survive.
///
/// Matching is exact on the metadata value rendered as text. A record that lacks
/// the key is mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum ImmutabilityRule {
    /// Every record of the class is mutable
    #[default]
    Never,
    /// Records whose metadata `key` is one of `values` are immutable
    MetadataIn { key: String, values: BTreeSet<String> },
}

impl ImmutabilityRule {
    pub fn metadata_in<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ImmutabilityRule::MetadataIn {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-in users-permissions roles
    pub fn built_in_roles() -> Self {
        Self::metadata_in("type", ["public", "authenticated"])
    }

    pub fn is_immutable(&self, record: &ResourceRecord) -> bool {
        match self {
            ImmutabilityRule::Never => false,
            ImmutabilityRule::MetadataIn { key, values } => record
                .metadata_text(key)
                .map(|value| values.contains(&value))
                .unwrap_or(false),
        }
    }

    /// Short human-readable form for listings
    pub fn describe(&self) -> String {
        match self {
            ImmutabilityRule::Never => "none".to_string(),
            ImmutabilityRule::MetadataIn { key, values } => format!(
                "{} in [{}]",
                key,
                values.iter().cloned().collect::<Vec<_>>().join(", ")
            ),
        }
    }
}
