mod commands;
mod logging;
mod progress;

use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, CompareArgs, ImportArgs, RenameArgs};
use dotenv::dotenv;
use progress::CliReporter;
use reconcile_core::config::{load_configuration, load_configuration_from};
use reconcile_core::engine::Side;
use reconcile_core::import::import_all;
use reconcile_core::rename::PhotoRenamer;
use reconcile_core::source::MountedSource;
use reconcile_core::{AppConfig, Severity, TreeReconciler};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let args = Cli::parse();
    let config = match &args.config {
        Some(path) => load_configuration_from(path),
        None => load_configuration(),
    };

    let level = args
        .log_level
        .or_else(|| config.as_ref().ok().map(|c| c.log_level))
        .unwrap_or(Severity::Info);
    let _guard = logging::init_logger(level);

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let result = match args.command {
        Some(Commands::Compare(compare)) => run_compare(&config, compare),
        Some(Commands::Import(import)) => run_import(&config, import),
        Some(Commands::Rename(rename)) => run_rename(rename),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run_compare(config: &AppConfig, args: CompareArgs) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(results) = args.results {
        config.results_root = results;
    }
    if let Some(policy) = args.duplicates {
        config.duplicate_policy = policy;
    }
    if let Some(algorithm) = args.hash {
        config.hash_algorithm = algorithm;
    }

    let mut reconcile_config = config.reconcile_config();
    if args.dry_run {
        reconcile_config = reconcile_config.dry_run();
    }

    let reconciler = TreeReconciler::new(reconcile_config, config.hash_algorithm.hasher());
    let reporter = CliReporter::new();
    let report = reconciler
        .compare(&args.folder_a, &args.folder_b, &reporter)
        .context("Comparison aborted")?;

    println!();
    info!(
        "{} matched, {} same-folder duplicates",
        format!("{}", report.matched.len()).green(),
        format!("{}", report.shadowed.len()).cyan(),
    );
    for side in [Side::A, Side::B] {
        info!(
            "{} files and {} folders only in {}",
            format!("{}", report.only_in(side).len()).red(),
            format!("{}", report.subtrees_only_in(side).len()).cyan(),
            side,
        );
    }
    if !args.dry_run {
        info!(
            "{} files copied to {}",
            format!("{}", report.files_copied).green(),
            config.results_root.display()
        );
    }
    if !report.failures.is_empty() {
        error!(
            "{} entries could not be processed, see the log above",
            format!("{}", report.failures.len()).red()
        );
    }

    Ok(())
}

fn run_import(config: &AppConfig, args: ImportArgs) -> anyhow::Result<()> {
    let destination = args
        .destination
        .unwrap_or_else(|| config.import.destination.clone());

    let source = MountedSource::open(&args.source)
        .with_context(|| format!("Cannot open device folder {}", args.source.display()))?;
    let reporter = CliReporter::new();
    let report = import_all(
        &source,
        &destination,
        Duration::from_millis(config.import.pause_ms),
        &reporter,
    )?;

    info!(
        "{} files imported, {} failures",
        format!("{}", report.downloaded.len()).green(),
        format!("{}", report.failures.len()).red(),
    );
    Ok(())
}

fn run_rename(args: RenameArgs) -> anyhow::Result<()> {
    let renamer = PhotoRenamer::new(&args.folder);
    let plans = renamer.plan()?;

    if !args.apply {
        for plan in &plans {
            println!(
                "Would rename: {} -> {}",
                plan.from.display(),
                plan.to.display()
            );
        }
        info!("{} files would be renamed, pass --apply to rename", plans.len());
        return Ok(());
    }

    let outcome = renamer.apply(&plans);
    info!(
        "{} files renamed, {} failures",
        format!("{}", outcome.renamed).green(),
        format!("{}", outcome.failures.len()).red(),
    );
    Ok(())
}
