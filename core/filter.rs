use crate::config::FilterConfig;
use crate::error::{AppError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const DIR_PROBE: &str = "__dir_probe__";

#[derive(Debug, Default, Deserialize)]
pub struct BuiltinIgnores {
    #[serde(default)]
    pub dirs: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

static BUILTIN_IGNORES: Lazy<BuiltinIgnores> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/builtin_ignores.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/builtin_ignores.yaml")
});

pub fn get_builtin_ignores() -> &'static BuiltinIgnores {
    &BUILTIN_IGNORES
}

/// Names and patterns excluded from a walk.
///
/// Directory and file names are matched exactly against the last path
/// component. Extension allow-lists and glob excludes are optional; when
/// absent they accept everything.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    dirs: HashSet<String>,
    files: HashSet<String>,
    extensions: Option<HashSet<String>>,
    excludes: GlobSet,
    has_excludes: bool,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl IgnoreRules {
    pub fn new<D, F, S, T>(dirs: D, files: F) -> Self
    where
        D: IntoIterator<Item = S>,
        F: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
            files: files.into_iter().map(Into::into).collect(),
            extensions: None,
            excludes: GlobSet::empty(),
            has_excludes: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new(), Vec::<String>::new())
    }

    pub fn builtin() -> Self {
        let builtin = get_builtin_ignores();
        Self::new(builtin.dirs.iter().cloned(), builtin.files.iter().cloned())
    }

    pub fn from_config(filter: &FilterConfig) -> Result<Self> {
        let base = if filter.use_builtin_ignores {
            Self::builtin()
        } else {
            log::debug!("Built-in ignores disabled by configuration.");
            Self::empty()
        };
        let rules = base
            .with_dirs(filter.ignore_dirs.iter().cloned())
            .with_files(filter.ignore_files.iter().cloned())
            .with_extensions(filter.extensions.iter().cloned())
            .with_excludes(&filter.exclude)?;
        log::debug!(
            "Ignore rules: {} dirs, {} files, extensions: {:?}, {} exclude patterns",
            rules.dirs.len(),
            rules.files.len(),
            rules.extensions,
            filter.exclude.len()
        );
        Ok(rules)
    }

    pub fn with_dirs<I: IntoIterator<Item = String>>(mut self, dirs: I) -> Self {
        self.dirs.extend(dirs);
        self
    }

    pub fn with_files<I: IntoIterator<Item = String>>(mut self, files: I) -> Self {
        self.files.extend(files);
        self
    }

    // An empty list leaves the filter open.
    pub fn with_extensions<I: IntoIterator<Item = String>>(mut self, extensions: I) -> Self {
        let normalized: HashSet<String> = extensions
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if !normalized.is_empty() {
            self.extensions
                .get_or_insert_with(HashSet::new)
                .extend(normalized);
        }
        self
    }

    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(self);
        }
        self.excludes = build_glob_set(patterns)?;
        self.has_excludes = true;
        Ok(self)
    }

    pub fn is_dir_ignored(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    pub fn is_file_ignored(&self, name: &str) -> bool {
        self.files.contains(name)
    }

    pub fn accepts_extension(&self, path: &Path) -> bool {
        let Some(allowed) = &self.extensions else {
            return true;
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| allowed.contains(&ext.to_lowercase()))
    }

    pub fn is_path_excluded(&self, relative_path: &Path, is_dir: bool) -> bool {
        if !self.has_excludes {
            return false;
        }
        self.excludes.is_match(relative_path)
            || (is_dir && self.excludes.is_match(relative_path.join(DIR_PROBE)))
    }

    pub fn allows_dir(&self, name: &str, relative_path: &Path) -> bool {
        if self.is_dir_ignored(name) {
            log::trace!("Skipping ignored directory: {}", relative_path.display());
            return false;
        }
        if self.is_path_excluded(relative_path, true) {
            log::trace!("Directory excluded by pattern: {}", relative_path.display());
            return false;
        }
        true
    }

    pub fn allows_file(&self, name: &str, relative_path: &Path) -> bool {
        if self.is_file_ignored(name) {
            log::trace!("Skipping ignored file: {}", relative_path.display());
            return false;
        }
        if !self.accepts_extension(relative_path) {
            log::trace!("Extension not selected: {}", relative_path.display());
            return false;
        }
        if self.is_path_excluded(relative_path, false) {
            log::trace!("File excluded by pattern: {}", relative_path.display());
            return false;
        }
        true
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern_str in patterns {
        let mut processed_pattern = pattern_str.trim().to_string();
        if processed_pattern.ends_with('/') && processed_pattern.len() > 1 {
            processed_pattern.push_str("**");
        }
        match Glob::new(&processed_pattern) {
            Ok(glob) => {
                log::trace!(
                    "Adding exclude pattern: {} (processed as {})",
                    pattern_str,
                    processed_pattern
                );
                builder.add(glob);
            }
            Err(e) => {
                return Err(AppError::Glob(format!(
                    "Invalid glob pattern \"{}\" (processed as \"{}\"): {}",
                    pattern_str, processed_pattern, e
                )));
            }
        }
    }
    builder.build().map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_cover_dependency_and_vcs_dirs() {
        let rules = IgnoreRules::builtin();
        for dir in ["node_modules", "dist", "build", ".git", ".next", "out", "ai-merged"] {
            assert!(rules.is_dir_ignored(dir), "{dir} should be ignored");
        }
        for file in [".env", ".DS_Store", "package-lock.json", "yarn.lock"] {
            assert!(rules.is_file_ignored(file), "{file} should be ignored");
        }
        assert!(!rules.is_dir_ignored("src"));
        assert!(!rules.is_file_ignored("main.rs"));
    }

    #[test]
    fn names_match_exactly() {
        let rules = IgnoreRules::new(["vendor"], ["secret.txt"]);
        assert!(rules.is_dir_ignored("vendor"));
        assert!(!rules.is_dir_ignored("vendors"));
        assert!(!rules.is_file_ignored("secret.txt.bak"));
    }

    #[test]
    fn extension_filter_is_case_insensitive_and_dot_tolerant() {
        let rules = IgnoreRules::empty().with_extensions(vec![".RS".to_string(), "ts".to_string()]);
        assert!(rules.accepts_extension(Path::new("src/lib.rs")));
        assert!(rules.accepts_extension(Path::new("web/App.TS")));
        assert!(!rules.accepts_extension(Path::new("README.md")));
        assert!(!rules.accepts_extension(Path::new("Makefile")));
    }

    #[test]
    fn empty_extension_list_accepts_everything() {
        let rules = IgnoreRules::empty().with_extensions(vec![String::new()]);
        assert!(rules.accepts_extension(Path::new("Makefile")));
    }

    #[test]
    fn trailing_slash_pattern_excludes_directory_contents() {
        let rules = IgnoreRules::empty()
            .with_excludes(&["fixtures/".to_string(), "**/*.snap".to_string()])
            .unwrap();
        assert!(rules.is_path_excluded(Path::new("fixtures"), true));
        assert!(rules.is_path_excluded(Path::new("fixtures/a.txt"), false));
        assert!(rules.is_path_excluded(Path::new("src/x.snap"), false));
        assert!(!rules.is_path_excluded(Path::new("src/x.rs"), false));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = IgnoreRules::empty()
            .with_excludes(&["a[".to_string()])
            .unwrap_err();
        assert!(matches!(err, AppError::Glob(_)));
    }

    #[test]
    fn config_can_disable_builtin_sets() {
        let filter = FilterConfig {
            use_builtin_ignores: false,
            ignore_dirs: vec!["custom".to_string()],
            ..FilterConfig::default()
        };
        let rules = IgnoreRules::from_config(&filter).unwrap();
        assert!(!rules.is_dir_ignored("node_modules"));
        assert!(rules.is_dir_ignored("custom"));
    }
}
