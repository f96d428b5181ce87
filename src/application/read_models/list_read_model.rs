//! List read model handed to the rendering side

use super::row_view::RowViewModel;
use crate::collections::domain::{
    Pagination, PermissionSet, QuerySignature, ResourceClass, ResourceId, SearchMode,
};
use crate::collections::services::ConfirmationState;
use serde::Serialize;
use std::collections::BTreeSet;

/// Why a list with data shows no rows. The two drive different messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyState {
    /// The collection itself is empty
    NoData,
    /// The collection has records but the search matched none of them
    NoMatches,
}

/// What the content area of a list view should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "state", content = "reason")]
pub enum ContentState {
    /// Permissions or the first page are still loading
    Loading,
    /// The caller may not read this class; nothing was fetched
    Forbidden,
    /// The first fetch failed and there is no earlier data to fall back on
    Unavailable,
    Rows,
    Empty(EmptyState),
}

/// Full projection of one list view at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListViewSnapshot {
    pub resource_class: ResourceClass,
    /// Signature currently backing the view
    #[serde(skip)]
    pub signature: QuerySignature,
    pub search_mode: SearchMode,
    pub search_text: String,
    pub content: ContentState,
    pub rows: Vec<RowViewModel>,
    pub pagination: Option<Pagination>,
    pub permissions: PermissionSet,
    /// Show the "add new" action
    pub can_create: bool,
    /// Permissions loading, first load, or a background refetch
    pub is_loading: bool,
    /// Rows come from an entry known to be out of date
    pub is_stale: bool,
    /// Message of the last failed fetch, kept while old rows are shown
    pub last_error: Option<String>,
    pub confirmation: ConfirmationState,
    pub selected: BTreeSet<ResourceId>,
}

impl ListViewSnapshot {
    pub fn empty_state(&self) -> Option<EmptyState> {
        match self.content {
            ContentState::Empty(state) => Some(state),
            _ => None,
        }
    }

    /// Whether the bulk action bar should be offered
    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }
}
