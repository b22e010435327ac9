use clap::{Parser, Subcommand};
use reconcile_core::{DuplicatePolicy, HashAlgorithm, Severity};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "reconcile")]
#[command(about = "Compare two folder trees by content and sort out what differs", long_about = None)]
pub struct Cli {
    /// Log verbosity: error, info or verbose (overrides the config file)
    #[arg(long, global = true)]
    pub log_level: Option<Severity>,

    /// Read settings from this file instead of ./Config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two folders and copy unique files and duplicates into the results area
    Compare(CompareArgs),
    /// Download every file from a mounted device folder, prefixed with its capture time
    Import(ImportArgs),
    /// Rename the files of a folder after their modification time
    Rename(RenameArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, clap::Args)]
pub struct CompareArgs {
    /// First folder (side A)
    pub folder_a: PathBuf,
    /// Second folder (side B)
    pub folder_b: PathBuf,
    /// Results root, created if absent
    #[arg(long)]
    pub results: Option<PathBuf>,
    /// Which matched files to archive: none, side-a, side-b or both
    #[arg(long)]
    pub duplicates: Option<DuplicatePolicy>,
    /// Content hash: blake3 or xxhash64
    #[arg(long)]
    pub hash: Option<HashAlgorithm>,
    /// Classify and log only, write nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, clap::Args)]
pub struct ImportArgs {
    /// Folder the device is mounted at
    pub source: PathBuf,
    /// Where downloaded files go
    #[arg(long)]
    pub destination: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct RenameArgs {
    /// Folder whose files are renamed (not recursive)
    pub folder: PathBuf,
    /// Perform the renames instead of only listing them
    #[arg(long)]
    pub apply: bool,
}
