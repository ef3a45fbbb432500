use crate::error::{AppError, Result};
use log;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = ".xtools/code-merge";
pub const DEFAULT_CONFIG_FILENAME: &str = "code-merge.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "ai-merged";
pub const DEFAULT_BASE_NAME: &str = "merged";
pub const DEFAULT_MAX_PART_SIZE: &str = "900000";
pub const DEFAULT_ARCHIVE_PROGRAM: &str = "zip";
pub const DEFAULT_ARCHIVE_NAME: &str = "merged.zip";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default = "default_true")]
    pub prefer_src: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub use_builtin_ignores: bool,
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
    #[serde(default)]
    pub ignore_files: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default = "default_false")]
    pub fenced: bool,
    #[serde(default = "default_max_part_size")]
    pub max_part_size: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_base_name")]
    pub base_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,
    #[serde(default = "default_archive_program")]
    pub program: String,
    #[serde(default = "default_archive_name")]
    pub file_name: String,
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_max_part_size() -> String {
    DEFAULT_MAX_PART_SIZE.to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}
fn default_base_name() -> String {
    DEFAULT_BASE_NAME.to_string()
}
fn default_archive_program() -> String {
    DEFAULT_ARCHIVE_PROGRAM.to_string()
}
fn default_archive_name() -> String {
    DEFAULT_ARCHIVE_NAME.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            prefer_src: default_true(),
        }
    }
}
impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            use_builtin_ignores: default_true(),
            ignore_dirs: Vec::new(),
            ignore_files: Vec::new(),
            extensions: Vec::new(),
            exclude: Vec::new(),
        }
    }
}
impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            fenced: default_false(),
            max_part_size: default_max_part_size(),
        }
    }
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            base_name: default_base_name(),
        }
    }
}
impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: default_false(),
            program: default_archive_program(),
            file_name: default_archive_name(),
        }
    }
}

impl Config {
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_to_resolve = match cli_project_root {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        if !path_to_resolve.is_dir() {
            return Err(AppError::MissingRoot(path_to_resolve));
        }

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&PathBuf>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p) => {
                let path = PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref());
                if !path.is_file() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = project_root
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME);
                if default_path.is_file() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str::<Config>(content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(AppError::from)
    }

    pub fn scan_root(&self, project_root: &Path) -> PathBuf {
        let src = project_root.join("src");
        if self.general.prefer_src && src.is_dir() {
            log::info!("Found 'src' folder. Merging files from: {}", src.display());
            src
        } else {
            log::info!(
                "Merging files from the project folder: {}",
                project_root.display()
            );
            project_root.to_path_buf()
        }
    }

    // Absolute paths resolve through their deepest existing ancestor so they
    // compare equal to walked paths under the canonical project root.
    pub fn output_dir(&self, project_root: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&self.output.dir.to_string_lossy()).as_ref());
        if expanded.is_absolute() {
            resolve_existing_prefix(&normalize_lexically(&expanded))
        } else {
            normalize_lexically(&project_root.join(expanded))
        }
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(canonical) = current.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.merge.max_part_size, "900000");
        assert_eq!(config.output.dir, PathBuf::from("ai-merged"));
        assert!(config.general.prefer_src);
        assert!(!config.archive.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
[merge]
fenced = true

[filter]
extensions = ["rs"]
"#,
        )
        .unwrap();
        assert!(config.merge.fenced);
        assert_eq!(config.merge.max_part_size, DEFAULT_MAX_PART_SIZE);
        assert_eq!(config.filter.extensions, vec!["rs".to_string()]);
        assert!(config.filter.use_builtin_ignores);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::from_toml_str("[merge]\nfenced_blocks = true\n").is_err());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = Config::default().to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&rendered).unwrap(), Config::default());
    }

    #[test]
    fn missing_project_root_is_fatal() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("nope");
        let err = Config::determine_project_root(Some(&missing)).unwrap_err();
        assert!(matches!(err, AppError::MissingRoot(_)));
    }

    #[test]
    fn scan_root_prefers_src_when_present() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let mut config = Config::default();
        assert_eq!(config.scan_root(root), root.to_path_buf());

        fs::create_dir(root.join("src")).unwrap();
        assert_eq!(config.scan_root(root), root.join("src"));

        config.general.prefer_src = false;
        assert_eq!(config.scan_root(root), root.to_path_buf());
    }

    #[test]
    fn output_dir_collapses_dot_components() {
        let root = Path::new("/work/app");
        let mut config = Config::default();
        assert_eq!(config.output_dir(root), root.join("ai-merged"));

        config.output.dir = ".".into();
        assert_eq!(config.output_dir(root).as_os_str(), root.as_os_str());

        config.output.dir = "./out/../bundle".into();
        assert_eq!(config.output_dir(root).as_os_str(), root.join("bundle").as_os_str());
    }

    #[cfg(unix)]
    #[test]
    fn absolute_output_dir_resolves_symlinks() {
        let temp = tempdir().unwrap();
        let real = temp.path().join("real");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, temp.path().join("link")).unwrap();

        let mut config = Config::default();
        config.output.dir = temp.path().join("link/out");

        assert_eq!(
            config.output_dir(Path::new("/unused")),
            real.canonicalize().unwrap().join("out")
        );
    }

    #[test]
    fn default_config_file_is_discovered() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        assert_eq!(Config::resolve_config_path(root, None, false).unwrap(), None);

        let dir = root.join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DEFAULT_CONFIG_FILENAME), "[merge]\nfenced = true\n").unwrap();

        let found = Config::resolve_config_path(root, None, false).unwrap().unwrap();
        assert!(Config::load_from_path(&found).unwrap().merge.fenced);
        assert_eq!(Config::resolve_config_path(root, None, true).unwrap(), None);
    }
}
