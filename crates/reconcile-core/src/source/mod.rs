mod mounted;

pub use mounted::MountedSource;

use crate::error::Error;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Metadata a source can report about one of its files.
#[derive(Debug, Clone)]
pub struct RemoteFileInfo {
    /// Path relative to the source root.
    pub path: PathBuf,
    pub size: u64,
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
}

impl RemoteFileInfo {
    /// Creation time when the source knows it, modification time otherwise.
    pub fn timestamp(&self) -> Option<DateTime<Local>> {
        self.created.or(self.modified)
    }
}

/// A device or mount that files can be listed on and downloaded from.
///
/// Paths are relative to the source root; the root itself is the empty path.
/// Implementations decide the transport, callers only see these operations.
pub trait RemoteFileSource {
    fn name(&self) -> &str;
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, Error>;
    fn list_directories(&self, dir: &Path) -> Result<Vec<PathBuf>, Error>;
    fn file_info(&self, path: &Path) -> Result<RemoteFileInfo, Error>;
    /// Writes the file's bytes to `destination`, replacing it if present.
    fn download(&self, path: &Path, destination: &Path) -> Result<(), Error>;
}
