//! Row view structs for the list read model
//!
//! One `RowViewModel` per visible record, carrying display fields and the
//! per-row affordances the rendering side may offer.

use crate::collections::domain::ResourceId;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Singular/plural classification of a role's user count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "count")]
pub enum UsersCount {
    None,
    One,
    Many(u64),
}

impl From<u64> for UsersCount {
    fn from(count: u64) -> Self {
        match count {
            0 => UsersCount::None,
            1 => UsersCount::One,
            n => UsersCount::Many(n),
        }
    }
}

impl UsersCount {
    pub fn count(&self) -> u64 {
        match self {
            UsersCount::None => 0,
            UsersCount::One => 1,
            UsersCount::Many(n) => *n,
        }
    }

    /// English label, e.g. "1 user" or "4 users"
    pub fn label(&self) -> String {
        match self {
            UsersCount::One => "1 user".to_string(),
            other => format!("{} users", other.count()),
        }
    }
}

/// View representation of one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowViewModel {
    pub id: ResourceId,
    pub name: String,
    pub description: String,
    /// Class-specific fields, passed through for display
    pub metadata: BTreeMap<String, Value>,
    /// Present when the record reports how many users it has
    pub users_count: Option<UsersCount>,
    pub is_immutable: bool,
    /// `can_update` and not immutable
    pub can_edit: bool,
    /// `can_delete` and not immutable
    pub can_delete: bool,
    pub is_selected: bool,
}
