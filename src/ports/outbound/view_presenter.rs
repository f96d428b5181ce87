use crate::application::read_models::ListViewSnapshot;
use crate::shared::Result;

/// ViewPresenter port for the rendering collaborator
///
/// Receives fully projected snapshots; it decides nothing about permissions
/// or immutability, it only draws what it is given.
pub trait ViewPresenter {
    /// Presents one snapshot of a list view
    ///
    /// # Errors
    /// Returns an error if writing to the output destination fails
    fn present(&self, snapshot: &ListViewSnapshot) -> Result<()>;
}
