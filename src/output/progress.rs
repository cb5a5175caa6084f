//! Progress reporting functionality
//!
//! A spinner counting files as the walk reads them, fed through the
//! walk's notifications.

use crate::core::events::WalkObserver;
use crate::models::WalkStats;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Progress reporter for a running walk
pub struct ProgressReporter {
    quiet: bool,
    spinner: Option<ProgressBar>,
    files: AtomicUsize,
    missing: AtomicUsize,
}

impl ProgressReporter {
    /// Create a new progress reporter; `enabled = false` or `quiet` hides the spinner
    pub fn new(enabled: bool, quiet: bool) -> Self {
        let spinner = if quiet || !enabled {
            None
        } else {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} files {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            Some(spinner)
        };

        Self {
            quiet,
            spinner,
            files: AtomicUsize::new(0),
            missing: AtomicUsize::new(0),
        }
    }

    /// Files seen so far
    pub fn files(&self) -> usize {
        self.files.load(Ordering::Relaxed)
    }

    /// Tolerated missing references seen so far
    pub fn missing(&self) -> usize {
        self.missing.load(Ordering::Relaxed)
    }

    /// Stop the spinner, leaving a one-line summary behind
    pub fn finish(&self, stats: &WalkStats) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(format!(
                "done: {} modules, {} missing",
                stats.modules, stats.missing
            ));
        }
    }

    /// Stop the spinner after a failed walk
    pub fn abandon(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.abandon_with_message("failed");
        }
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl WalkObserver for ProgressReporter {
    fn on_file(&self, file: &Path, _id: &str) {
        self.files.fetch_add(1, Ordering::Relaxed);
        if let Some(spinner) = &self.spinner {
            spinner.inc(1);
            spinner.set_message(file.display().to_string());
        }
    }

    fn on_missing(&self, reference: &str, _parent: &Path) {
        self.missing.fetch_add(1, Ordering::Relaxed);
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!("missing {}", reference));
        }
    }
}
