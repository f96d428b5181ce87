//! Builder projecting a cache entry into rows
//!
//! Search is applied here for both search modes: in server mode the backend
//! already narrowed the page, and running the matcher again only re-ranks.

use super::list_read_model::EmptyState;
use super::row_view::{RowViewModel, UsersCount};
use crate::application::collection_cache::CollectionCacheEntry;
use crate::collections::domain::{PermissionSet, ResourceDescriptor, ResourceId, ResourceRecord};
use crate::collections::services::SearchMatcher;
use std::collections::BTreeSet;

/// Rows plus the empty-state classification for one projection
#[derive(Debug, Clone, PartialEq)]
pub struct ListProjection {
    pub rows: Vec<RowViewModel>,
    /// `None` while there are rows, or while nothing has loaded yet
    pub empty_state: Option<EmptyState>,
}

pub struct ListReadModelBuilder;

impl ListReadModelBuilder {
    /// Projects `entry` through the search and the caller's permissions
    ///
    /// # Arguments
    /// * `descriptor` - Searchable fields and immutability rule of the class
    /// * `entry` - Current cache snapshot for the view's signature
    /// * `permissions` - Resolved permissions of the caller
    /// * `search_text` - Text in the search box; blank keeps backend order
    /// * `selected` - Ids currently ticked in the view
    pub fn project(
        descriptor: &ResourceDescriptor,
        entry: &CollectionCacheEntry,
        permissions: &PermissionSet,
        search_text: &str,
        selected: &BTreeSet<ResourceId>,
    ) -> ListProjection {
        let matches =
            SearchMatcher::filter(&entry.records, search_text, &descriptor.searchable_fields);
        let rows: Vec<RowViewModel> = matches
            .iter()
            .map(|record| {
                let mut row = Self::build_row(descriptor, record, permissions);
                row.is_selected = selected.contains(&record.id);
                row
            })
            .collect();

        let empty_state = if !rows.is_empty() || !entry.has_data() {
            None
        } else if entry.records.is_empty() && entry.signature.search_text().is_none() {
            Some(EmptyState::NoData)
        } else {
            Some(EmptyState::NoMatches)
        };

        ListProjection { rows, empty_state }
    }

    /// Builds the row of one record. Immutability overrides permissions.
    pub fn build_row(
        descriptor: &ResourceDescriptor,
        record: &ResourceRecord,
        permissions: &PermissionSet,
    ) -> RowViewModel {
        let is_immutable = descriptor.is_immutable(record);
        RowViewModel {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            metadata: record.metadata.clone(),
            users_count: record.users_count().map(UsersCount::from),
            is_immutable,
            can_edit: permissions.can_update && !is_immutable,
            can_delete: permissions.can_delete && !is_immutable,
            is_selected: false,
        }
    }
}
