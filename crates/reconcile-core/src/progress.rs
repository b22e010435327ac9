use crate::engine::ReconcileReport;
use std::path::Path;

/// Trait for reporting comparison and import progress.
///
/// The CLI implements it with indicatif; tests and library callers can use
/// [`SilentReporter`]. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_compare_start(&self, _root_a: &Path, _root_b: &Path) {}
    /// Called once per directory pair visited, with the path relative to root A.
    fn on_directory(&self, _relative: &Path) {}
    fn on_compare_complete(&self, _report: &ReconcileReport) {}
    fn on_import_start(&self, _source: &str) {}
    fn on_import_progress(&self, _downloaded: usize, _current: &Path) {}
    fn on_import_complete(&self, _downloaded: usize, _failures: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
