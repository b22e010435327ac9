use super::{RemoteFileInfo, RemoteFileSource};
use crate::error::Error;
use crate::replicate::safe_join;
use crate::scanner::{read_level, EntryFilter};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A device exposed as a local directory, e.g. a phone's DCIM folder mounted
/// over MTP or a camera card.
#[derive(Debug, Clone)]
pub struct MountedSource {
    root: PathBuf,
    name: String,
}

impl MountedSource {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::RootNotFound(root));
        }
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        debug!("Opened mounted source {} at {}", name, root.display());
        Ok(Self { root, name })
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, Error> {
        safe_join(&self.root, path)
    }
}

impl RemoteFileSource for MountedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        debug!("Getting files from {}", dir.display());
        let level = read_level(&self.resolve(dir)?, &EntryFilter::default())?;
        Ok(level
            .files
            .iter()
            .filter_map(|file| file.file_name())
            .map(|name| dir.join(name))
            .collect())
    }

    fn list_directories(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        debug!("Getting directories from {}", dir.display());
        let level = read_level(&self.resolve(dir)?, &EntryFilter::default())?;
        Ok(level.directories.iter().map(|name| dir.join(name)).collect())
    }

    fn file_info(&self, path: &Path) -> Result<RemoteFileInfo, Error> {
        let metadata = fs::metadata(self.resolve(path)?)?;
        Ok(RemoteFileInfo {
            path: path.to_path_buf(),
            size: metadata.len(),
            created: metadata.created().ok().map(DateTime::<Local>::from),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        })
    }

    fn download(&self, path: &Path, destination: &Path) -> Result<(), Error> {
        let source = self.resolve(path)?;
        fs::copy(&source, destination).map_err(|e| Error::Copy {
            from: source.clone(),
            to: destination.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}
