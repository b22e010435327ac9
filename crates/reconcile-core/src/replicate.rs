use crate::error::Error;
use crate::scanner::EntryFilter;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};
use walkdir::WalkDir;

/// Joins `relative` under `root`, refusing anything that could climb out of it
/// (absolute paths, drive prefixes, `..`).
pub fn safe_join(root: &Path, relative: &Path) -> Result<PathBuf, Error> {
    let mut joined = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::UnsafePath(relative.to_path_buf()));
            }
        }
    }
    Ok(joined)
}

/// Copies `source_file` to `destination_root/relative_path`, creating missing
/// parent directories and overwriting an existing destination.
pub fn copy_preserving_structure(
    source_file: &Path,
    destination_root: &Path,
    relative_path: &Path,
) -> Result<PathBuf, Error> {
    let destination = safe_join(destination_root, relative_path)?;
    if destination == destination_root {
        return Err(Error::UnsafePath(relative_path.to_path_buf()));
    }

    let copy_error = |source: io::Error| Error::Copy {
        from: source_file.to_path_buf(),
        to: destination.clone(),
        source,
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(copy_error)?;
    }
    fs::copy(source_file, &destination).map_err(copy_error)?;
    debug!(
        "Copied {} to {}",
        source_file.display(),
        destination.display()
    );
    Ok(destination)
}

/// Result of mirroring one subtree.
#[derive(Debug, Default)]
pub struct SubtreeCopy {
    /// Every file found, relative to the subtree root.
    pub files: Vec<PathBuf>,
    pub files_copied: usize,
    pub failures: Vec<Error>,
}

/// Mirrors every directory and file under `source_dir` into `destination_dir`.
///
/// Failures are collected per entry and the walk carries on. With `dry_run`
/// the subtree is only listed.
pub fn copy_whole_subtree(
    source_dir: &Path,
    destination_dir: &Path,
    filter: &EntryFilter,
    dry_run: bool,
) -> SubtreeCopy {
    let mut result = SubtreeCopy::default();

    let walker = WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                true
            } else if entry.file_type().is_dir() {
                filter.admits_dir(entry.path())
            } else {
                filter.admits_file(entry.path())
            }
        });

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| source_dir.to_path_buf());
                let message = err.to_string();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message));
                let failure = Error::Enumeration { path, source };
                error!("{}", failure);
                result.failures.push(failure);
                continue;
            }
        };

        let relative = match entry.path().strip_prefix(source_dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };

        let is_dir = if entry.path_is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(target) => target.is_dir(),
                Err(err) => {
                    debug!("Skipping dangling symlink {}: {}", entry.path().display(), err);
                    continue;
                }
            }
        } else {
            entry.file_type().is_dir()
        };

        if is_dir {
            if entry.path_is_symlink() {
                debug!("Skipping symlinked directory {}", entry.path().display());
                continue;
            }
            if dry_run {
                continue;
            }
            let destination = match safe_join(destination_dir, &relative) {
                Ok(destination) => destination,
                Err(e) => {
                    error!("{}", e);
                    result.failures.push(e);
                    continue;
                }
            };
            if let Err(source) = fs::create_dir_all(&destination) {
                let failure = Error::Copy {
                    from: entry.path().to_path_buf(),
                    to: destination,
                    source,
                };
                error!("{}", failure);
                result.failures.push(failure);
            }
            continue;
        }

        if !dry_run {
            match copy_preserving_structure(entry.path(), destination_dir, &relative) {
                Ok(_) => result.files_copied += 1,
                Err(e) => {
                    error!("{}", e);
                    result.failures.push(e);
                }
            }
        }
        result.files.push(relative);
    }

    result
}
