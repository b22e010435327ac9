use crate::config::ReconcileConfig;
use crate::error::Error;
use crate::hasher::ContentHasher;
use crate::progress::ProgressReporter;
use crate::replicate::{self, copy_preserving_structure, copy_whole_subtree};
use crate::scanner::{self, DirectorySnapshot, EntryFilter, ReconciliationOutcome};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// Root-relative paths of two files with identical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    pub a: PathBuf,
    pub b: PathBuf,
}

/// Everything one comparison found. Paths are relative to the comparison
/// root of their side, except `shadowed` which holds full paths.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub only_in_a: Vec<PathBuf>,
    pub only_in_b: Vec<PathBuf>,
    pub matched: Vec<MatchedPair>,
    pub subtrees_only_in_a: Vec<PathBuf>,
    pub subtrees_only_in_b: Vec<PathBuf>,
    /// Files hidden by a same-content file in the same directory.
    pub shadowed: Vec<PathBuf>,
    pub directories_compared: usize,
    pub files_copied: usize,
    pub failures: Vec<Error>,
    pub duration: Duration,
}

impl ReconcileReport {
    pub fn only_in(&self, side: Side) -> &[PathBuf] {
        match side {
            Side::A => &self.only_in_a,
            Side::B => &self.only_in_b,
        }
    }

    pub fn subtrees_only_in(&self, side: Side) -> &[PathBuf] {
        match side {
            Side::A => &self.subtrees_only_in_a,
            Side::B => &self.subtrees_only_in_b,
        }
    }

    /// True when neither side holds anything the other lacks.
    pub fn is_identical(&self) -> bool {
        self.only_in_a.is_empty()
            && self.only_in_b.is_empty()
            && self.subtrees_only_in_a.is_empty()
            && self.subtrees_only_in_b.is_empty()
    }

    fn only_in_mut(&mut self, side: Side) -> &mut Vec<PathBuf> {
        match side {
            Side::A => &mut self.only_in_a,
            Side::B => &mut self.only_in_b,
        }
    }

    fn subtrees_only_in_mut(&mut self, side: Side) -> &mut Vec<PathBuf> {
        match side {
            Side::A => &mut self.subtrees_only_in_a,
            Side::B => &mut self.subtrees_only_in_b,
        }
    }

    fn fail(&mut self, failure: Error) {
        error!("{}", failure);
        self.failures.push(failure);
    }
}

/// The two directories handed to `compare`. Every relative path is taken
/// against these, whatever the recursion depth.
struct ComparisonRoots<'a> {
    a: &'a Path,
    b: &'a Path,
}

impl ComparisonRoots<'_> {
    fn root(&self, side: Side) -> &Path {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    /// Falls back to the full path, which `safe_join` then refuses to copy.
    fn relative(&self, side: Side, path: &Path) -> PathBuf {
        path.strip_prefix(self.root(side))
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Compares two directory trees by file content.
pub struct TreeReconciler {
    config: ReconcileConfig,
    hasher: Box<dyn ContentHasher>,
}

impl TreeReconciler {
    pub fn new(config: ReconcileConfig, hasher: Box<dyn ContentHasher>) -> Self {
        Self { config, hasher }
    }

    /// Walk both trees in lock-step:
    /// 1. Fingerprint the immediate files of each directory pair
    /// 2. Partition them into only-in-A, only-in-B and matched
    /// 3. Recurse into subdirectories both sides share
    /// 4. Mirror subdirectories only one side has into its unique area
    ///
    /// Only a missing root aborts; every other failure is logged, recorded in
    /// the report and skipped.
    pub fn compare(
        &self,
        root_a: &Path,
        root_b: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<ReconcileReport, Error> {
        for root in [root_a, root_b] {
            if !root.is_dir() {
                return Err(Error::RootNotFound(root.to_path_buf()));
            }
        }

        let start = Instant::now();
        let layout = &self.config.layout;

        if self.config.materialize {
            fs::create_dir_all(&layout.results_root)?;
            info!("Results will be saved to {}", layout.results_root.display());
        }

        let mut filter = EntryFilter::new(self.config.ignore_patterns.clone());
        filter.exclude_dir(&layout.results_root);

        info!(
            "Comparing {} with {} using {}",
            root_a.display(),
            root_b.display(),
            self.hasher.name()
        );
        reporter.on_compare_start(root_a, root_b);

        let roots = ComparisonRoots { a: root_a, b: root_b };
        let mut report = ReconcileReport::default();
        self.compare_level(&roots, root_a, root_b, &filter, &mut report, reporter);
        report.duration = start.elapsed();

        info!(
            "Compared {} directories in {:.2}s: {} matched, {} only in A, {} only in B, {} folders only in A, {} folders only in B, {} failures",
            report.directories_compared,
            report.duration.as_secs_f64(),
            report.matched.len(),
            report.only_in_a.len(),
            report.only_in_b.len(),
            report.subtrees_only_in_a.len(),
            report.subtrees_only_in_b.len(),
            report.failures.len(),
        );
        reporter.on_compare_complete(&report);

        Ok(report)
    }

    fn compare_level(
        &self,
        roots: &ComparisonRoots<'_>,
        current_a: &Path,
        current_b: &Path,
        filter: &EntryFilter,
        report: &mut ReconcileReport,
        reporter: &dyn ProgressReporter,
    ) {
        report.directories_compared += 1;
        reporter.on_directory(&roots.relative(Side::A, current_a));
        debug!("Comparing {} with {}", current_a.display(), current_b.display());

        // An unreadable directory on either side ends this branch only.
        let level_a = match scanner::read_level(current_a, filter) {
            Ok(level) => level,
            Err(e) => return report.fail(e),
        };
        let level_b = match scanner::read_level(current_b, filter) {
            Ok(level) => level,
            Err(e) => return report.fail(e),
        };

        debug!("Fingerprinting {} files in {}", level_a.files.len(), current_a.display());
        let mut snapshot_a = DirectorySnapshot::build(&level_a.files, self.hasher.as_ref());
        debug!("Fingerprinting {} files in {}", level_b.files.len(), current_b.display());
        let mut snapshot_b = DirectorySnapshot::build(&level_b.files, self.hasher.as_ref());

        for snapshot in [&mut snapshot_a, &mut snapshot_b] {
            report.failures.extend(snapshot.take_failures());
            report.shadowed.extend_from_slice(snapshot.shadowed());
        }

        let outcome = ReconciliationOutcome::between(&snapshot_a, &snapshot_b);

        for path in &outcome.only_in_a {
            self.record_unique(roots, Side::A, path, report);
        }
        for (path_a, path_b) in &outcome.matched {
            self.record_match(roots, path_a, path_b, report);
        }
        for path in &outcome.only_in_b {
            self.record_unique(roots, Side::B, path, report);
        }

        let in_a: BTreeSet<&OsString> = level_a.directories.iter().collect();
        let in_b: BTreeSet<&OsString> = level_b.directories.iter().collect();

        for name in in_a.union(&in_b) {
            let sub_a = current_a.join(name);
            let sub_b = current_b.join(name);

            match (in_a.contains(name), in_b.contains(name)) {
                (true, true) => {
                    self.compare_level(roots, &sub_a, &sub_b, filter, report, reporter)
                }
                (true, false) => self.replicate_subtree(roots, Side::A, &sub_a, filter, report),
                (false, true) => self.replicate_subtree(roots, Side::B, &sub_b, filter, report),
                (false, false) => {}
            }
        }
    }

    fn record_unique(
        &self,
        roots: &ComparisonRoots<'_>,
        side: Side,
        path: &Path,
        report: &mut ReconcileReport,
    ) {
        let relative = roots.relative(side, path);
        error!("File only in {}: {}", side, relative.display());

        if self.config.materialize {
            let destination_root = self.config.layout.unique_root(side);
            match copy_preserving_structure(path, &destination_root, &relative) {
                Ok(_) => report.files_copied += 1,
                Err(e) => report.fail(e),
            }
        }

        report.only_in_mut(side).push(relative);
    }

    fn record_match(
        &self,
        roots: &ComparisonRoots<'_>,
        path_a: &Path,
        path_b: &Path,
        report: &mut ReconcileReport,
    ) {
        let pair = MatchedPair {
            a: roots.relative(Side::A, path_a),
            b: roots.relative(Side::B, path_b),
        };
        debug!("Match: {} (A) = {} (B)", pair.a.display(), pair.b.display());

        if self.config.materialize {
            let policy = self.config.duplicate_policy;
            for (side, source, relative) in [(Side::A, path_a, &pair.a), (Side::B, path_b, &pair.b)] {
                if !policy.archives(side) {
                    continue;
                }
                let duplicates_root = self.config.layout.duplicates_root_for(side, policy);
                match copy_preserving_structure(source, &duplicates_root, relative) {
                    Ok(_) => report.files_copied += 1,
                    Err(e) => report.fail(e),
                }
            }
        }

        report.matched.push(pair);
    }

    /// Mirrors a folder only `side` has, without comparing anything inside it.
    fn replicate_subtree(
        &self,
        roots: &ComparisonRoots<'_>,
        side: Side,
        dir: &Path,
        filter: &EntryFilter,
        report: &mut ReconcileReport,
    ) {
        let relative = roots.relative(side, dir);
        error!("Folder only in {}: {}", side, relative.display());

        let destination = match replicate::safe_join(&self.config.layout.unique_root(side), &relative)
        {
            Ok(destination) => destination,
            Err(e) => return report.fail(e),
        };

        let copy = copy_whole_subtree(dir, &destination, filter, !self.config.materialize);
        report.files_copied += copy.files_copied;
        report.failures.extend(copy.failures);
        report
            .only_in_mut(side)
            .extend(copy.files.into_iter().map(|file| relative.join(file)));
        report.subtrees_only_in_mut(side).push(relative);
    }
}
