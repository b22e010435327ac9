pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod import;
pub mod progress;
pub mod rename;
pub mod replicate;
pub mod scanner;
pub mod severity;
pub mod source;

pub use crate::config::{AppConfig, DuplicatePolicy, OutputLayout, ReconcileConfig};
pub use engine::{MatchedPair, ReconcileReport, TreeReconciler};
pub use error::Error;
pub use hasher::{ContentHasher, Fingerprint, HashAlgorithm};
pub use progress::{ProgressReporter, SilentReporter};
pub use severity::Severity;
