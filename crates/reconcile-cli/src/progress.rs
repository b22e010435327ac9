use indicatif::{ProgressBar, ProgressStyle};
use reconcile_core::{ProgressReporter, ReconcileReport};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress reporter using an indicatif spinner.
///
/// Neither a comparison nor an import knows its total upfront, so both phases
/// show a spinner with the current folder or file count.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn start_spinner(&self, message: String) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn set_message(&self, message: String) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(message);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_compare_start(&self, root_a: &Path, root_b: &Path) {
        self.start_spinner(format!(
            "Comparing {} with {}...",
            root_a.display(),
            root_b.display()
        ));
    }

    fn on_directory(&self, relative: &Path) {
        self.set_message(format!("Comparing ./{}", relative.display()));
    }

    fn on_compare_complete(&self, report: &ReconcileReport) {
        self.finish();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Compare complete: {} folders in {:.2}s",
            report.directories_compared,
            report.duration.as_secs_f64()
        );
    }

    fn on_import_start(&self, source: &str) {
        self.start_spinner(format!("Importing from {}...", source));
    }

    fn on_import_progress(&self, downloaded: usize, current: &Path) {
        self.set_message(format!(
            "Importing... {} files ({})",
            downloaded,
            current.display()
        ));
    }

    fn on_import_complete(&self, downloaded: usize, failures: usize, duration_secs: f64) {
        self.finish();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Import complete: {} files, {} failures in {:.2}s",
            downloaded, failures, duration_secs
        );
    }
}
