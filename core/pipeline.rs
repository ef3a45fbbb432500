use crate::archive::archive_parts;
use crate::chunking::{Part, parse_size, split_into_parts};
use crate::config::{ArchiveConfig, Config};
use crate::error::{AppError, Result};
use crate::filter::IgnoreRules;
use crate::merge::{MergeOptions, merge_entries};
use crate::walker::{FileEntry, FileWalker};
use crate::writer::{OutputLocation, write_parts};
use log;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MergePlan {
    pub project_root: PathBuf,
    pub scan_root: PathBuf,
    pub output_dir: PathBuf,
    pub rules: IgnoreRules,
    pub options: MergeOptions,
    pub max_part_size: usize,
    pub base_name: String,
    pub archive: ArchiveConfig,
}

impl MergePlan {
    pub fn from_config(project_root: &Path, config: &Config) -> Result<Self> {
        let rules = IgnoreRules::from_config(&config.filter)?;
        let max_part_size = parse_size(&config.merge.max_part_size)?;
        let base_name = config.output.base_name.trim().to_string();
        if base_name.is_empty() || base_name.contains(['/', '\\']) {
            return Err(AppError::InvalidArgument(format!(
                "Invalid output base name '{}'",
                config.output.base_name
            )));
        }
        Ok(Self {
            project_root: project_root.to_path_buf(),
            scan_root: config.scan_root(project_root),
            output_dir: config.output_dir(project_root),
            rules,
            options: MergeOptions::from(&config.merge),
            max_part_size,
            base_name,
            archive: config.archive.clone(),
        })
    }

    pub fn output(&self) -> OutputLocation {
        OutputLocation::new(
            self.output_dir.clone(),
            self.base_name.as_str(),
            self.archive.file_name.as_str(),
        )
    }

    pub fn walker(&self) -> FileWalker<'_> {
        FileWalker::new(&self.project_root, &self.rules)
            .scan_root(&self.scan_root)
            .skip_output(self.output())
    }
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub merged_files: Vec<String>,
    pub parts: Vec<Part>,
    pub written: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
    pub warnings: Vec<AppError>,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Merge, split, write and optionally archive `entries`.
///
/// Only output directory creation and invalid sizes are fatal. Unreadable
/// files, failed part writes and archive failures end up in
/// `MergeOutcome::warnings`, which callers report once.
pub fn run_merge<I>(plan: &MergePlan, entries: I) -> Result<MergeOutcome>
where
    I: IntoIterator<Item = FileEntry>,
{
    let mut buffer = merge_entries(entries, plan.options);
    let mut outcome = MergeOutcome {
        merged_files: buffer.merged_files().to_vec(),
        warnings: buffer.take_warnings(),
        ..MergeOutcome::default()
    };

    if buffer.is_blank() {
        log::info!("No files to merge.");
        return Ok(outcome);
    }

    let parts = split_into_parts(buffer.into_string(), plan.max_part_size)?;
    let report = write_parts(&parts, &plan.output())?;
    outcome.warnings.extend(report.warnings);
    outcome.written = report.written;
    outcome.parts = parts;

    if plan.archive.enabled && !outcome.written.is_empty() {
        match archive_parts(&outcome.written, &plan.output_dir, &plan.archive) {
            Ok(path) => outcome.archive = Some(path),
            Err(e) => {
                log::debug!("{}", e);
                outcome.warnings.push(e);
            }
        }
    }

    Ok(outcome)
}
