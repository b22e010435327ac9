use crate::error::Error;
use crate::hasher::{ContentHasher, Fingerprint};
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Fingerprint -> path for the immediate files of one directory.
///
/// Built fresh on every visit. Two files with the same content on the same
/// side collide: the later one (in name order) keeps the slot and the earlier
/// path is recorded in `shadowed`.
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    entries: AHashMap<Fingerprint, PathBuf>,
    shadowed: Vec<PathBuf>,
    failures: Vec<Error>,
}

impl DirectorySnapshot {
    /// Fingerprints every file. Unreadable files are logged and left out.
    pub fn build(files: &[PathBuf], hasher: &dyn ContentHasher) -> Self {
        let mut snapshot = DirectorySnapshot::default();

        for file in files {
            match hasher.fingerprint_file(file) {
                Ok(fingerprint) => snapshot.insert(fingerprint, file.clone()),
                Err(e) => {
                    error!("{}", e);
                    snapshot.failures.push(e);
                }
            }
        }

        snapshot
    }

    pub fn insert(&mut self, fingerprint: Fingerprint, path: PathBuf) {
        if let Some(previous) = self.entries.insert(fingerprint, path) {
            info!(
                "{} has the same content as a later file in its directory, only the later one is compared",
                previous.display()
            );
            self.shadowed.push(previous);
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&Path> {
        self.entries.get(fingerprint).map(PathBuf::as_path)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &Path)> {
        self.entries.iter().map(|(fp, path)| (fp, path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shadowed(&self) -> &[PathBuf] {
        &self.shadowed
    }

    /// Moves the per-file failures out, leaving the snapshot usable.
    pub fn take_failures(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.failures)
    }
}

/// Partition of two snapshots: every entry lands in exactly one of the three sets.
#[derive(Debug, Default)]
pub struct ReconciliationOutcome {
    pub only_in_a: Vec<PathBuf>,
    pub only_in_b: Vec<PathBuf>,
    /// (path in A, path in B)
    pub matched: Vec<(PathBuf, PathBuf)>,
}

impl ReconciliationOutcome {
    /// Set difference both ways plus intersection, each sorted by path.
    pub fn between(a: &DirectorySnapshot, b: &DirectorySnapshot) -> Self {
        let mut outcome = ReconciliationOutcome::default();

        for (fingerprint, path_a) in a.iter() {
            match b.get(fingerprint) {
                Some(path_b) => outcome
                    .matched
                    .push((path_a.to_path_buf(), path_b.to_path_buf())),
                None => outcome.only_in_a.push(path_a.to_path_buf()),
            }
        }

        for (fingerprint, path_b) in b.iter() {
            if !a.contains(fingerprint) {
                outcome.only_in_b.push(path_b.to_path_buf());
            }
        }

        outcome.only_in_a.sort();
        outcome.only_in_b.sort();
        outcome.matched.sort();
        outcome
    }
}
