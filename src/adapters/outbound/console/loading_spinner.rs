use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// LoadingSpinner adapter shown on stderr while a collection is loading
///
/// Drawn by indicatif's own ticker, so the async task awaiting the fetch
/// does not have to poll it.
pub struct LoadingSpinner {
    bar: ProgressBar,
}

impl LoadingSpinner {
    pub fn start(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("   {spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// A spinner that never draws, for non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for LoadingSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let spinner = LoadingSpinner::hidden();
        spinner.set_message("Loading roles...");
        spinner.finish();
    }

    #[test]
    fn test_drop_clears_unfinished_spinner() {
        let spinner = LoadingSpinner::start("Loading users...");
        drop(spinner);
    }
}
