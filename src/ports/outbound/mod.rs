/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the list-view core uses
/// to reach the backend, the session, the user and the wall clock.
pub mod clock;
pub mod collection_transport;
pub mod grant_provider;
pub mod notifier;
pub mod view_presenter;

pub use clock::Clock;
pub use collection_transport::{CollectionTransport, DeleteTarget};
pub use grant_provider::GrantProvider;
pub use notifier::{Notification, NotificationKind, Notifier, SilentNotifier};
pub use view_presenter::ViewPresenter;
