//! Interactive file/folder selection, modelled as a state machine.
//!
//! The machine never talks to a terminal. Each step it exposes a menu for
//! the current state; a [`Prompter`] picks one entry and [`Selector::apply`]
//! performs the transition:
//!
//! * `Browsing(dir)`: children of `dir`, then "Go back" (below the root only)
//!   and "Done". A file is selected immediately; a folder leads to
//!   `AwaitingFolderAction`.
//! * `AwaitingFolderAction(dir)`: "Enter", "Select whole folder" or "Cancel".
//! * `Done`: terminal.
//!
//! Selections cannot be undone. Choosing the same path twice keeps the first.

use crate::error::{AppError, Result};
use crate::filter::IgnoreRules;
use crate::walker::{FileEntry, FileWalker, to_slash_path};
use crate::writer::OutputLocation;
use log;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorState {
    Browsing(PathBuf),
    AwaitingFolderAction(PathBuf),
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection {
    File(PathBuf),
    Directory(PathBuf),
}

impl Selection {
    pub fn path(&self) -> &Path {
        match self {
            Selection::File(p) | Selection::Directory(p) => p,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Directory { name: String, path: PathBuf },
    File { name: String, path: PathBuf },
    GoBack,
    Done,
    Enter,
    SelectFolder,
    Cancel,
}

impl MenuChoice {
    pub fn label(&self) -> &str {
        match self {
            MenuChoice::Directory { name, .. } | MenuChoice::File { name, .. } => name,
            MenuChoice::GoBack => "..",
            MenuChoice::Done => "done",
            MenuChoice::Enter => "enter",
            MenuChoice::SelectFolder => "select",
            MenuChoice::Cancel => "cancel",
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuChoice::Directory { name, .. } => write!(f, "📁 {}/", name),
            MenuChoice::File { name, .. } => write!(f, "📄 {}", name),
            MenuChoice::GoBack => write!(f, "⬅️  Go back"),
            MenuChoice::Done => write!(f, "✅ Done"),
            MenuChoice::Enter => write!(f, "Enter folder"),
            MenuChoice::SelectFolder => write!(f, "Select whole folder"),
            MenuChoice::Cancel => write!(f, "Cancel"),
        }
    }
}

pub trait Prompter {
    // `None` means the operator aborted the prompt.
    fn choose(&mut self, message: &str, options: &[MenuChoice]) -> Result<Option<MenuChoice>>;
}

#[derive(Debug)]
pub struct Selector<'a> {
    root: PathBuf,
    rules: &'a IgnoreRules,
    state: SelectorState,
    selections: Vec<Selection>,
}

impl<'a> Selector<'a> {
    pub fn new(root: &Path, rules: &'a IgnoreRules) -> Self {
        Self {
            root: root.to_path_buf(),
            rules,
            state: SelectorState::Browsing(root.to_path_buf()),
            selections: Vec::new(),
        }
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == SelectorState::Done
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn into_selections(self) -> Vec<Selection> {
        self.selections
    }

    pub fn menu(&self) -> Result<(String, Vec<MenuChoice>)> {
        match &self.state {
            SelectorState::Browsing(dir) => {
                let mut options = self.list_children(dir);
                if dir != &self.root {
                    options.push(MenuChoice::GoBack);
                }
                options.push(MenuChoice::Done);
                let message = format!(
                    "Browsing {} ({} selected)",
                    self.display_dir(dir),
                    self.selections.len()
                );
                Ok((message, options))
            }
            SelectorState::AwaitingFolderAction(dir) => Ok((
                format!("Folder {}", self.display_dir(dir)),
                vec![MenuChoice::Enter, MenuChoice::SelectFolder, MenuChoice::Cancel],
            )),
            SelectorState::Done => Err(AppError::InvalidArgument(
                "Selection is already complete".to_string(),
            )),
        }
    }

    pub fn apply(&mut self, choice: MenuChoice) -> Result<()> {
        let next = match (self.state.clone(), choice) {
            (SelectorState::Browsing(dir), MenuChoice::File { path, .. }) => {
                self.select(Selection::File(path));
                SelectorState::Browsing(dir)
            }
            (SelectorState::Browsing(_), MenuChoice::Directory { path, .. }) => {
                SelectorState::AwaitingFolderAction(path)
            }
            (SelectorState::Browsing(dir), MenuChoice::GoBack) if dir != self.root => {
                SelectorState::Browsing(self.parent_of(&dir))
            }
            (SelectorState::Browsing(_), MenuChoice::Done) => SelectorState::Done,
            (SelectorState::AwaitingFolderAction(dir), MenuChoice::Enter) => {
                SelectorState::Browsing(dir)
            }
            (SelectorState::AwaitingFolderAction(dir), MenuChoice::SelectFolder) => {
                let parent = self.parent_of(&dir);
                self.select(Selection::Directory(dir));
                SelectorState::Browsing(parent)
            }
            (SelectorState::AwaitingFolderAction(dir), MenuChoice::Cancel) => {
                SelectorState::Browsing(self.parent_of(&dir))
            }
            (state, choice) => {
                return Err(AppError::InvalidArgument(format!(
                    "Choice '{}' is not valid in state {:?}",
                    choice.label(),
                    state
                )));
            }
        };
        log::trace!("Selector transition: {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn select(&mut self, selection: Selection) {
        if self.selections.contains(&selection) {
            log::debug!("Already selected: {}", selection.path().display());
            return;
        }
        log::debug!("Selected: {:?}", selection);
        self.selections.push(selection);
    }

    fn parent_of(&self, dir: &Path) -> PathBuf {
        match dir.parent() {
            Some(parent) if parent.starts_with(&self.root) => parent.to_path_buf(),
            _ => self.root.clone(),
        }
    }

    fn display_dir(&self, dir: &Path) -> String {
        let relative = pathdiff::diff_paths(dir, &self.root).unwrap_or_default();
        format!("./{}", to_slash_path(&relative))
    }

    // Folders first, then files.
    fn list_children(&self, dir: &Path) -> Vec<MenuChoice> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry_result in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Error listing {}: {}", dir.display(), e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let relative_path =
                pathdiff::diff_paths(entry.path(), &self.root).unwrap_or_else(|| entry.path().to_path_buf());
            let file_type = entry.file_type();
            if file_type.is_dir() && self.rules.allows_dir(&name, &relative_path) {
                dirs.push(MenuChoice::Directory {
                    name,
                    path: entry.into_path(),
                });
            } else if file_type.is_file() && self.rules.allows_file(&name, &relative_path) {
                files.push(MenuChoice::File {
                    name,
                    path: entry.into_path(),
                });
            }
        }
        dirs.extend(files);
        dirs
    }
}

pub fn run_selector<P: Prompter>(
    root: &Path,
    rules: &IgnoreRules,
    prompter: &mut P,
) -> Result<Vec<Selection>> {
    let mut selector = Selector::new(root, rules);
    while !selector.is_done() {
        let (message, options) = selector.menu()?;
        match prompter.choose(&message, &options)? {
            Some(choice) => selector.apply(choice)?,
            None => {
                log::info!("Selection prompt aborted; keeping current selection.");
                break;
            }
        }
    }
    log::info!("{} items selected.", selector.selections().len());
    Ok(selector.into_selections())
}

/// Turns selections into file entries, in selection order. Directories
/// expand through the walker; repeated files keep their first position.
/// Files written by a previous run are never returned.
pub fn expand_selections(
    selections: &[Selection],
    project_root: &Path,
    rules: &IgnoreRules,
    output: Option<&OutputLocation>,
) -> Vec<FileEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for selection in selections {
        match selection {
            Selection::File(path) => {
                if output.is_some_and(|o| o.is_output_file(path)) {
                    log::debug!("Skipping previous output: {}", path.display());
                    continue;
                }
                let entry = FileEntry::new(path.clone(), project_root);
                if seen.insert(entry.path.clone()) {
                    entries.push(entry);
                }
            }
            Selection::Directory(dir) => {
                let mut walker = FileWalker::new(project_root, rules).scan_root(dir);
                if let Some(output) = output {
                    walker = walker.skip_output(output.clone());
                }
                for entry in walker.walk() {
                    if seen.insert(entry.path.clone()) {
                        entries.push(entry);
                    }
                }
            }
        }
    }
    entries
}
