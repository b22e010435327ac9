use crate::error::Error;
use crate::scanner::{read_level, EntryFilter};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Default)]
pub struct RenameOutcome {
    pub renamed: usize,
    pub failures: Vec<Error>,
}

/// Renames the files of one folder (not recursive) after their modification
/// time, e.g. `2024-05-01_18-30-12.jpg`, adding `_1`, `_2`... on clashes.
pub struct PhotoRenamer {
    folder: PathBuf,
}

impl PhotoRenamer {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Computes the new names without touching the disk. Files already
    /// carrying their target name are left out.
    pub fn plan(&self) -> Result<Vec<RenamePlan>, Error> {
        if !self.folder.is_dir() {
            return Err(Error::RootNotFound(self.folder.clone()));
        }
        let files = read_level(&self.folder, &EntryFilter::default())?.files;

        let mut taken: HashSet<PathBuf> = files.iter().cloned().collect();
        let mut plans = Vec::new();

        for file in &files {
            let modified = match fs::metadata(file).and_then(|m| m.modified()) {
                Ok(modified) => DateTime::<Local>::from(modified),
                Err(e) => {
                    error!("Cannot read modification time of {}: {}", file.display(), e);
                    continue;
                }
            };

            if let Some(target) = self.unique_target(file, &modified, &taken) {
                taken.insert(target.clone());
                plans.push(RenamePlan {
                    from: file.clone(),
                    to: target,
                });
            }
        }

        Ok(plans)
    }

    /// Applies `plans` in order. Never overwrites an existing file.
    pub fn apply(&self, plans: &[RenamePlan]) -> RenameOutcome {
        let mut outcome = RenameOutcome::default();

        for plan in plans {
            if plan.to.exists() {
                let failure = Error::Rename {
                    from: plan.from.clone(),
                    to: plan.to.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "destination already exists",
                    ),
                };
                error!("{}", failure);
                outcome.failures.push(failure);
                continue;
            }

            match fs::rename(&plan.from, &plan.to) {
                Ok(()) => {
                    info!("Renamed: {} -> {}", display_name(&plan.from), display_name(&plan.to));
                    outcome.renamed += 1;
                }
                Err(source) => {
                    let failure = Error::Rename {
                        from: plan.from.clone(),
                        to: plan.to.clone(),
                        source,
                    };
                    error!("{}", failure);
                    outcome.failures.push(failure);
                }
            }
        }

        outcome
    }

    fn unique_target(
        &self,
        file: &Path,
        modified: &DateTime<Local>,
        taken: &HashSet<PathBuf>,
    ) -> Option<PathBuf> {
        let stem = modified.format(NAME_FORMAT).to_string();
        let extension = file
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut candidate = self.folder.join(format!("{}{}", stem, extension));
        let mut counter = 1;
        loop {
            if candidate == file {
                return None;
            }
            if !taken.contains(&candidate) {
                return Some(candidate);
            }
            candidate = self
                .folder
                .join(format!("{}_{}{}", stem, counter, extension));
            counter += 1;
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
