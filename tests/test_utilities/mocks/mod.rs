/// Mock implementations for testing
mod manual_clock;
mod mock_collection_transport;
mod mock_grant_provider;
mod mock_notifier;

pub use manual_clock::ManualClock;
pub use mock_collection_transport::MockCollectionTransport;
pub use mock_grant_provider::MockGrantProvider;
pub use mock_notifier::MockNotifier;
