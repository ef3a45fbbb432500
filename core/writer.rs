use crate::chunking::Part;
use crate::error::{AppError, Result};
use log;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub warnings: Vec<AppError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    pub dir: PathBuf,
    pub base_name: String,
    pub archive_name: String,
}

impl OutputLocation {
    pub fn new(dir: PathBuf, base_name: impl Into<String>, archive_name: impl Into<String>) -> Self {
        Self {
            dir,
            base_name: base_name.into(),
            archive_name: archive_name.into(),
        }
    }

    fn owns_name(&self, file_name: &str) -> bool {
        is_part_file_name(file_name, &self.base_name) || file_name == self.archive_name
    }

    /// True for part files and the archive directly inside `dir`, whether
    /// or not they exist yet.
    pub fn is_output_file(&self, path: &Path) -> bool {
        path.parent() == Some(self.dir.as_path())
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.owns_name(n))
    }
}

pub fn part_file_name(base_name: &str, number: usize, total: usize) -> String {
    if total == 1 {
        format!("{}.txt", base_name)
    } else {
        format!("{}-part-{}.txt", base_name, number)
    }
}

fn is_part_file_name(file_name: &str, base_name: &str) -> bool {
    if file_name == format!("{}.txt", base_name) {
        return true;
    }
    file_name
        .strip_prefix(base_name)
        .and_then(|rest| rest.strip_prefix("-part-"))
        .and_then(|rest| rest.strip_suffix(".txt"))
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

// Parts and the archive from an earlier run; other files are left alone.
fn remove_stale_outputs(output: &OutputLocation, warnings: &mut Vec<AppError>) {
    let entries = match fs::read_dir(&output.dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Could not list {}: {}", output.dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !output.owns_name(name) {
            continue;
        }
        let path = entry.path();
        log::debug!("Removing stale output: {}", path.display());
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                let warning = AppError::FileWrite { path, source: e };
                log::debug!("{}", warning);
                warnings.push(warning);
            }
        }
    }
}

/// Writes each part into `output.dir`, creating it if needed.
///
/// Failing to create the directory is fatal. A part that cannot be written
/// is reported in `WriteReport::warnings` and the remaining parts are still
/// written.
pub fn write_parts(parts: &[Part], output: &OutputLocation) -> Result<WriteReport> {
    fs::create_dir_all(&output.dir).map_err(|e| AppError::DirCreation {
        path: output.dir.clone(),
        source: e,
    })?;

    let mut report = WriteReport::default();
    remove_stale_outputs(output, &mut report.warnings);

    let total = parts.len();
    for part in parts {
        let path = output
            .dir
            .join(part_file_name(&output.base_name, part.number, total));
        match fs::write(&path, part.content.as_bytes()) {
            Ok(()) => {
                log::info!("Created: {} ({} bytes)", path.display(), part.size());
                report.written.push(path);
            }
            Err(e) => {
                let warning = AppError::FileWrite { path, source: e };
                log::debug!("{}", warning);
                report.warnings.push(warning);
            }
        }
    }
    Ok(report)
}
