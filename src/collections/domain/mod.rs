pub mod descriptor;
pub mod permission;
pub mod query;
pub mod resource;

pub use descriptor::{ResourceDescriptor, SearchField, SearchMode};
pub use permission::{
    CallerIdentity, CapabilityAction, CapabilitySpec, GrantedCapability, PermissionSet,
    PolicyDescriptor,
};
pub use query::{CollectionPage, Pagination, QuerySignature, DEFAULT_PAGE_SIZE, SEARCH_PARAM};
pub use resource::{ResourceClass, ResourceId, ResourceRecord, ROLE_TYPE_KEY, USERS_COUNT_KEY};
