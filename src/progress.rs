//! Progress indicators for m365dsc CLI.

use declarative::ExportProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for indeterminate operations
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Export progress: a spinner while enumerating, then a bar over the objects
pub struct ExportSpinner {
    pb: ProgressBar,
}

impl ExportSpinner {
    pub fn new(resource_type: &str, quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            spinner(&format!("Enumerating {resource_type}..."))
        };
        Self { pb }
    }
}

impl ExportProgress for ExportSpinner {
    fn on_start(&mut self, resource_type: &str, total: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {prefix} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        self.pb.set_prefix(resource_type.to_string());
    }

    fn on_object(&mut self, index: usize, key: &str) {
        self.pb.set_position(index.saturating_sub(1) as u64);
        self.pb.set_message(key.to_string());
    }

    fn on_complete(&mut self) {
        self.pb.finish_and_clear();
    }
}

impl Drop for ExportSpinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
