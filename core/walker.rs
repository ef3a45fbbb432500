use crate::filter::IgnoreRules;
use crate::writer::OutputLocation;
use log;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    pub path: PathBuf,
    pub relative_path: PathBuf,
}

impl FileEntry {
    pub fn new(path: PathBuf, project_root: &Path) -> Self {
        let relative_path = pathdiff::diff_paths(&path, project_root).unwrap_or_else(|| path.clone());
        Self {
            path,
            relative_path,
        }
    }

    pub fn display_path(&self) -> String {
        to_slash_path(&self.relative_path)
    }
}

pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Recursive, pruned traversal of a project tree.
///
/// `walk` returns a fresh lazy iterator on every call. Entries are sorted by
/// file name within each directory, so two walks over an unchanged tree
/// yield the same sequence.
#[derive(Debug, Clone)]
pub struct FileWalker<'a> {
    project_root: PathBuf,
    scan_root: PathBuf,
    rules: &'a IgnoreRules,
    output: Option<OutputLocation>,
}

impl<'a> FileWalker<'a> {
    pub fn new(project_root: &Path, rules: &'a IgnoreRules) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            scan_root: project_root.to_path_buf(),
            rules,
            output: None,
        }
    }

    pub fn scan_root(mut self, dir: &Path) -> Self {
        self.scan_root = dir.to_path_buf();
        self
    }

    /// Never enter the output directory and never yield files a merge run
    /// writes, even when the output directory is the scan root itself.
    pub fn skip_output(mut self, output: OutputLocation) -> Self {
        self.output = Some(output);
        self
    }

    pub fn walk(&self) -> impl Iterator<Item = FileEntry> + '_ {
        log::debug!("Walking directory: {}", self.scan_root.display());
        WalkDir::new(&self.scan_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.should_visit(entry))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) if entry.file_type().is_file() => {
                    let file = FileEntry::new(entry.into_path(), &self.project_root);
                    log::trace!("Walked file: {}", file.relative_path.display());
                    Some(file)
                }
                Ok(_) => None,
                Err(e) => {
                    log::warn!(
                        "Error walking directory: {} (at {})",
                        e,
                        e.path()
                            .map_or_else(|| "unknown path".into(), |p| p.display().to_string())
                    );
                    None
                }
            })
    }

    fn should_visit(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let is_dir = entry.file_type().is_dir();
        if let Some(output) = &self.output {
            if is_dir && entry.path() == output.dir {
                log::trace!("Skipping output directory: {}", entry.path().display());
                return false;
            }
            if !is_dir && output.is_output_file(entry.path()) {
                log::trace!("Skipping previous output: {}", entry.path().display());
                return false;
            }
        }
        let name = entry.file_name().to_string_lossy();
        let relative_path =
            pathdiff::diff_paths(entry.path(), &self.project_root).unwrap_or_else(|| entry.path().to_path_buf());
        if is_dir {
            self.rules.allows_dir(&name, &relative_path)
        } else {
            self.rules.allows_file(&name, &relative_path)
        }
    }
}
