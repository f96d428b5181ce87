use crate::ports::outbound::{Notification, NotificationKind, Notifier};
use owo_colors::OwoColorize;

/// StderrNotifier adapter printing notifications to stderr
///
/// Keeps stdout clean for the listing itself.
pub struct StderrNotifier {
    colored: bool,
}

impl StderrNotifier {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// Single line as it will be printed
    pub fn format(&self, notification: &Notification) -> String {
        let (icon, label) = match notification.kind {
            NotificationKind::Warning => ("⚠️", "warning"),
            NotificationKind::Error => ("❌", "error"),
        };
        if !self.colored {
            return format!("{} {}: {}", icon, label, notification.message);
        }
        match notification.kind {
            NotificationKind::Warning => {
                format!("{} {}: {}", icon, label.yellow().bold(), notification.message)
            }
            NotificationKind::Error => {
                format!("{} {}: {}", icon, label.red().bold(), notification.message)
            }
        }
    }
}

impl Default for StderrNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", self.format(&notification));
    }
}
