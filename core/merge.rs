use crate::config::MergeConfig;
use crate::error::{AppError, Result};
use crate::language::language_for_path;
use crate::walker::FileEntry;
use log;
use std::collections::HashSet;
use std::fs;

pub const FILE_HEADER_PREFIX: &str = "--- FILE: ";
pub const FILE_HEADER_SUFFIX: &str = " ---";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub fenced: bool,
}

impl From<&MergeConfig> for MergeOptions {
    fn from(config: &MergeConfig) -> Self {
        Self {
            fenced: config.fenced,
        }
    }
}

#[derive(Debug, Default)]
pub struct MergedBuffer {
    content: String,
    merged_files: Vec<String>,
    warnings: Vec<AppError>,
}

impl MergedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_file(&mut self, entry: &FileEntry, content: &str, options: MergeOptions) {
        let display_path = entry.display_path();
        self.content.push_str("\n\n");
        self.content.push_str(FILE_HEADER_PREFIX);
        self.content.push_str(&display_path);
        self.content.push_str(FILE_HEADER_SUFFIX);
        self.content.push('\n');
        if options.fenced {
            self.content.push_str("```");
            self.content
                .push_str(language_for_path(&entry.relative_path).unwrap_or_default());
            self.content.push('\n');
            self.content.push_str(content);
            self.content.push_str("\n```\n");
        } else {
            self.content.push_str(content);
            self.content.push('\n');
        }
        self.merged_files.push(display_path);
    }

    pub fn push_warning(&mut self, warning: AppError) {
        log::debug!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn merged_files(&self) -> &[String] {
        &self.merged_files
    }

    pub fn warnings(&self) -> &[AppError] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<AppError> {
        std::mem::take(&mut self.warnings)
    }

    pub fn into_string(self) -> String {
        self.content
    }
}

pub fn read_text_file(entry: &FileEntry) -> Result<String> {
    let bytes = fs::read(&entry.path).map_err(|e| AppError::FileRead {
        path: entry.path.clone(),
        source: e,
    })?;
    String::from_utf8(bytes).map_err(|_| AppError::NonUtf8(entry.path.clone()))
}

/// Reads every entry in order and appends its record. Unreadable files are
/// recorded as warnings and skipped; a path seen twice is merged once.
pub fn merge_entries<I>(entries: I, options: MergeOptions) -> MergedBuffer
where
    I: IntoIterator<Item = FileEntry>,
{
    let mut buffer = MergedBuffer::new();
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.path.clone()) {
            log::debug!("Already merged, skipping: {}", entry.relative_path.display());
            continue;
        }
        match read_text_file(&entry) {
            Ok(content) => {
                log::trace!(
                    "Merging {} ({} bytes)",
                    entry.relative_path.display(),
                    content.len()
                );
                buffer.append_file(&entry, &content, options);
            }
            Err(e) => buffer.push_warning(e),
        }
    }
    log::info!(
        "Merged {} files into {} bytes ({} skipped).",
        buffer.merged_files().len(),
        buffer.len(),
        buffer.warnings().len()
    );
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::tempdir;

    fn entry(root: &Path, rel: &str) -> FileEntry {
        FileEntry::new(root.join(rel), root)
    }

    #[test]
    fn plain_record_layout() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("a.txt"), "hello").unwrap();

        let buffer = merge_entries(vec![entry(root, "a.txt")], MergeOptions::default());

        assert_eq!(buffer.as_str(), "\n\n--- FILE: a.txt ---\nhello\n");
        assert_eq!(buffer.merged_files(), ["a.txt".to_string()]);
    }

    #[test]
    fn fenced_record_carries_language_tag() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/lib.rs"), "pub fn x() {}").unwrap();
        fs::write(root.join("notes.txt"), "n").unwrap();

        let buffer = merge_entries(
            vec![entry(root, "src/lib.rs"), entry(root, "notes.txt")],
            MergeOptions { fenced: true },
        );

        assert_eq!(
            buffer.as_str(),
            "\n\n--- FILE: src/lib.rs ---\n```rust\npub fn x() {}\n```\n\
             \n\n--- FILE: notes.txt ---\n```\nn\n```\n"
        );
    }

    #[test]
    fn unreadable_and_binary_files_become_warnings() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("ok.txt"), "fine").unwrap();
        fs::write(root.join("blob.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let buffer = merge_entries(
            vec![
                entry(root, "missing.txt"),
                entry(root, "blob.bin"),
                entry(root, "ok.txt"),
            ],
            MergeOptions::default(),
        );

        assert_eq!(buffer.merged_files(), ["ok.txt".to_string()]);
        assert_eq!(buffer.warnings().len(), 2);
        assert!(matches!(buffer.warnings()[0], AppError::FileRead { .. }));
        assert!(matches!(buffer.warnings()[1], AppError::NonUtf8(_)));
    }

    #[test]
    fn duplicate_entries_are_merged_once() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("a.txt"), "a").unwrap();

        let buffer = merge_entries(
            vec![entry(root, "a.txt"), entry(root, "a.txt")],
            MergeOptions::default(),
        );

        assert_eq!(buffer.merged_files().len(), 1);
    }

    #[test]
    fn empty_input_is_blank() {
        let buffer = merge_entries(Vec::new(), MergeOptions::default());
        assert!(buffer.is_blank());
        assert!(buffer.is_empty());
    }
}
