/// Use cases module containing application business logic orchestration
mod delete_resources;
mod resolve_permissions;

pub use delete_resources::MutationCoordinator;
pub use resolve_permissions::{PermissionResolver, PermissionState};
