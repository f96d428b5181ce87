/// Console adapters: stderr notifications, spinner and the stdout table
mod loading_spinner;
mod stderr_notifier;
mod table_presenter;

pub use loading_spinner::LoadingSpinner;
pub use stderr_notifier::StderrNotifier;
pub use table_presenter::TablePresenter;
