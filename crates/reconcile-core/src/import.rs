use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::replicate::safe_join;
use crate::source::{RemoteFileInfo, RemoteFileSource};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, Default)]
pub struct ImportReport {
    /// Local paths written.
    pub downloaded: Vec<PathBuf>,
    pub failures: Vec<Error>,
    pub duration: Duration,
}

/// Downloads every file of `source` into `destination`, keeping the folder
/// structure and prefixing each name with its capture time.
///
/// Per-file failures are logged and skipped.
pub fn import_all(
    source: &dyn RemoteFileSource,
    destination: &Path,
    pause: Duration,
    reporter: &dyn ProgressReporter,
) -> Result<ImportReport, Error> {
    fs::create_dir_all(destination)?;
    info!("Files will be saved to {}", destination.display());

    let start = Instant::now();
    reporter.on_import_start(source.name());

    let mut report = ImportReport::default();
    import_folder(source, Path::new(""), destination, pause, &mut report, reporter);
    report.duration = start.elapsed();

    info!(
        "Imported {} files from {} in {:.2}s, {} failures",
        report.downloaded.len(),
        source.name(),
        report.duration.as_secs_f64(),
        report.failures.len()
    );
    reporter.on_import_complete(
        report.downloaded.len(),
        report.failures.len(),
        report.duration.as_secs_f64(),
    );
    Ok(report)
}

fn import_folder(
    source: &dyn RemoteFileSource,
    folder: &Path,
    destination: &Path,
    pause: Duration,
    report: &mut ImportReport,
    reporter: &dyn ProgressReporter,
) {
    debug!("Current folder: {}", folder.display());

    match source.list_files(folder) {
        Ok(files) => {
            for file in files {
                match import_file(source, &file, destination) {
                    Ok(target) => {
                        debug!("Downloaded {} to {}", file.display(), target.display());
                        report.downloaded.push(target);
                        reporter.on_import_progress(report.downloaded.len(), &file);
                    }
                    Err(e) => {
                        error!("{}", e);
                        report.failures.push(e);
                    }
                }
                if !pause.is_zero() {
                    thread::sleep(pause);
                }
            }
        }
        Err(e) => {
            error!("{}", e);
            report.failures.push(e);
        }
    }

    match source.list_directories(folder) {
        Ok(dirs) => {
            for dir in dirs {
                import_folder(source, &dir, destination, pause, report, reporter);
            }
        }
        Err(e) => {
            error!("{}", e);
            report.failures.push(e);
        }
    }
}

fn import_file(
    source: &dyn RemoteFileSource,
    file: &Path,
    destination: &Path,
) -> Result<PathBuf, Error> {
    let info = source.file_info(file)?;
    let file_name = timestamped_name(&info)?;

    let folder = safe_join(destination, file.parent().unwrap_or(Path::new("")))?;
    fs::create_dir_all(&folder)?;

    let target = folder.join(file_name);
    source.download(file, &target)?;
    Ok(target)
}

/// `YYYYMMDD_HHMMSS <original name>`.
pub fn timestamped_name(info: &RemoteFileInfo) -> Result<String, Error> {
    let timestamp = info.timestamp().ok_or_else(|| Error::Import {
        path: info.path.clone(),
        message: "cannot determine creation time".to_string(),
    })?;
    let name = info.path.file_name().ok_or_else(|| Error::Import {
        path: info.path.clone(),
        message: "path has no file name".to_string(),
    })?;
    Ok(format!(
        "{} {}",
        timestamp.format("%Y%m%d_%H%M%S"),
        name.to_string_lossy()
    ))
}
