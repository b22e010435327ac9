mod snapshot;

pub use snapshot::{DirectorySnapshot, ReconciliationOutcome};

use crate::error::Error;
use glob::Pattern;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decides which entries take part in a comparison: anything matching an
/// ignore glob is skipped, as is any directory listed in `excluded` (the
/// results root, when it lives inside one of the compared trees).
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    patterns: Vec<Pattern>,
    excluded: Vec<PathBuf>,
}

impl EntryFilter {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self {
            patterns,
            excluded: Vec::new(),
        }
    }

    /// Excludes `dir` and everything beneath it. Non-existent paths are ignored.
    pub fn exclude_dir(&mut self, dir: &Path) {
        if let Ok(canonical) = fs::canonicalize(dir) {
            self.excluded.push(canonical);
        }
    }

    pub fn admits_file(&self, path: &Path) -> bool {
        !self.is_ignored(path)
    }

    pub fn admits_dir(&self, path: &Path) -> bool {
        if self.is_ignored(path) {
            return false;
        }
        if self.excluded.is_empty() {
            return true;
        }
        match fs::canonicalize(path) {
            Ok(canonical) => !self.excluded.iter().any(|ex| *ex == canonical),
            Err(_) => true,
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches_path(path))
    }
}

/// Immediate contents of one directory.
#[derive(Debug, Default)]
pub struct Level {
    pub files: Vec<PathBuf>,
    pub directories: Vec<OsString>,
}

/// Lists the files and subdirectory names directly inside `dir`, sorted by name.
/// Symlinks to files count as files; symlinked directories are skipped so a
/// link cycle can never recurse.
pub fn read_level(dir: &Path, filter: &EntryFilter) -> Result<Level, Error> {
    let enumeration = |source: io::Error| Error::Enumeration {
        path: dir.to_path_buf(),
        source,
    };

    let mut level = Level::default();

    for entry_result in fs::read_dir(dir).map_err(enumeration)? {
        let entry = entry_result.map_err(enumeration)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(enumeration)?;

        let is_dir = if file_type.is_symlink() {
            match fs::metadata(&path) {
                Ok(target) if target.is_dir() => {
                    debug!("Skipping symlinked directory {}", path.display());
                    continue;
                }
                Ok(_) => false,
                Err(err) => {
                    debug!("Skipping dangling symlink {}: {}", path.display(), err);
                    continue;
                }
            }
        } else {
            file_type.is_dir()
        };

        if is_dir {
            if filter.admits_dir(&path) {
                level.directories.push(entry.file_name());
            } else {
                debug!("Skipping excluded directory {}", path.display());
            }
        } else if filter.admits_file(&path) {
            level.files.push(path);
        }
    }

    level.files.sort();
    level.directories.sort();
    Ok(level)
}
