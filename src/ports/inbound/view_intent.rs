use crate::application::read_models::ListViewSnapshot;
use crate::collections::domain::ResourceId;
use crate::shared::error::ConfirmError;
use async_trait::async_trait;

/// User intents emitted by the rendering collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewIntent {
    /// Search box content changed
    SearchChanged(String),
    /// Pagination footer navigation (1-based)
    GoToPage(u32),
    SetPageSize(u32),
    SetFilter { key: String, value: String },
    ClearFilter(String),
    /// Row checkbox
    ToggleRow(ResourceId),
    /// Header checkbox: select every deletable visible row, or clear
    ToggleAll,
    /// Trash icon on one or more explicit rows
    RequestDelete(Vec<ResourceId>),
    /// Bulk action bar: delete the current selection
    RequestBulkDelete,
    Confirm,
    Cancel,
    /// Explicit reload (retry after an error)
    Refresh,
}

/// CollectionViewPort - Inbound port of a permission-gated list view
///
/// The rendering side feeds intents in and reads snapshots out; it never
/// touches the cache, the gate or the transport directly.
#[async_trait]
pub trait CollectionViewPort: Send + Sync {
    /// Applies one intent
    ///
    /// # Errors
    /// Returns `ConfirmError::Gate` when the intent does not fit the
    /// confirmation phase, `ConfirmError::Mutation` when a confirmed delete fails
    async fn dispatch(&self, intent: ViewIntent) -> Result<(), ConfirmError>;

    /// Current projection of the view
    fn snapshot(&self) -> ListViewSnapshot;
}
