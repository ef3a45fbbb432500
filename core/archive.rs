use crate::config::ArchiveConfig;
use crate::error::{AppError, Result};
use log;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Bundles `files` into `<output_dir>/<file_name>` with the configured
/// archiving program (`zip -j -q` by default). An existing archive is
/// replaced. The input files are left untouched whatever the outcome.
pub fn archive_parts(files: &[PathBuf], output_dir: &Path, config: &ArchiveConfig) -> Result<PathBuf> {
    if files.is_empty() {
        return Err(AppError::Archive("No files to archive".to_string()));
    }
    let archive_path = output_dir.join(&config.file_name);

    match fs::remove_file(&archive_path) {
        Ok(()) => log::debug!("Removed previous archive: {}", archive_path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(AppError::Archive(format!(
                "Cannot replace existing archive '{}': {}",
                archive_path.display(),
                e
            )));
        }
    }

    log::debug!(
        "Running '{}' to archive {} files into {}",
        config.program,
        files.len(),
        archive_path.display()
    );
    let output = Command::new(&config.program)
        .arg("-j")
        .arg("-q")
        .arg(&archive_path)
        .args(files)
        .output()
        .map_err(|e| {
            AppError::Archive(format!(
                "Failed to run '{}' (is it installed?): {}",
                config.program, e
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Archive(format!(
            "'{}' exited with {}: {}",
            config.program,
            output.status,
            stderr.trim()
        )));
    }

    log::info!("Created archive: {}", archive_path.display());
    Ok(archive_path)
}
