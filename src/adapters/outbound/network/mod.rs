/// Network adapters for the admin REST API
mod api_client;
mod endpoint;
mod http_grant_provider;
mod http_transport;

pub use api_client::{AdminApiClient, RequestFailure, DEFAULT_TIMEOUT_SECS};
pub use endpoint::{DeleteEndpoint, ResourceEndpoint, ID_PLACEHOLDER};
pub use http_grant_provider::{HttpGrantProvider, PERMISSIONS_PATH};
pub use http_transport::HttpCollectionTransport;
