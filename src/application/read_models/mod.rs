//! Read models for the list view
//!
//! View-optimized structs built from cache entries and permission sets.
//! Nothing here fetches or mutates; projection is pure.

pub mod list_read_model;
pub mod list_read_model_builder;
pub mod row_view;

pub use list_read_model::{ContentState, EmptyState, ListViewSnapshot};
pub use list_read_model_builder::{ListProjection, ListReadModelBuilder};
pub use row_view::{RowViewModel, UsersCount};
