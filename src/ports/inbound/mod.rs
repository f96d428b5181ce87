/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (a UI, the CLI)
/// use to drive a list view.
pub mod view_intent;

pub use view_intent::{CollectionViewPort, ViewIntent};
