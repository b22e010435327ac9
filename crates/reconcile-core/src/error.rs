use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Error reading directory {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error hashing file {}: {source}", path.display())]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error copying {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error renaming {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to write outside the results area: {}", .0.display())]
    UnsafePath(PathBuf),

    #[error("Error importing {}: {message}", path.display())]
    Import { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Whether this error ends a whole comparison rather than one file or subtree.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::RootNotFound(_) | Error::Io(_) | Error::Config(_)
        )
    }
}
