use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Path of the TOML config file (default: .xtools/code-merge/code-merge.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Project Setup"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Do not load any TOML config file.",
        conflicts_with = "config",
        help_heading = "Project Setup"
    )]
    pub no_config: bool,

    #[arg(
        long,
        help = "Scan the whole project even when a 'src' folder exists.",
        help_heading = "Project Setup"
    )]
    pub whole_project: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputOpts {
    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Output directory, relative to the project [default: ai-merged].",
        help_heading = "Output Control"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "BASE",
        help = "Base name of the written files [default: merged].",
        help_heading = "Output Control"
    )]
    pub name: Option<String>,

    #[arg(
        short = 'm',
        long,
        value_name = "SIZE_STRING",
        help = "Maximum size of each part (e.g. '900000', '900KB', '2MiB').",
        help_heading = "Output Control"
    )]
    pub max_size: Option<String>,

    #[arg(
        long,
        help = "Wrap each file in a fenced code block with a language tag.",
        help_heading = "Output Control"
    )]
    pub fenced: bool,

    #[arg(
        short = 'z',
        long,
        help = "Bundle the written parts into a zip archive (needs the 'zip' utility).",
        help_heading = "Output Control"
    )]
    pub zip: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterOpts {
    #[arg(short = 'e', long = "ext", value_name = "EXT", value_delimiter = ',', action = clap::ArgAction::Append, help = "Only merge files with these extensions (e.g. 'rs,ts').", help_heading = "Content Filtering")]
    pub extensions: Vec<String>,

    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append, help = "Exclude paths matching this glob (relative to the project).", help_heading = "Content Filtering")]
    pub exclude: Vec<String>,

    #[arg(long = "ignore-dir", value_name = "NAME", action = clap::ArgAction::Append, help = "Additional directory name to skip.", help_heading = "Content Filtering")]
    pub ignore_dirs: Vec<String>,

    #[arg(long = "ignore-file", value_name = "NAME", action = clap::ArgAction::Append, help = "Additional file name to skip.", help_heading = "Content Filtering")]
    pub ignore_files: Vec<String>,

    #[arg(
        long,
        help = "Disable the built-in ignore lists (node_modules, .git, lockfiles, ...).",
        help_heading = "Content Filtering"
    )]
    pub disable_builtin_ignore: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MergeArgs {
    #[arg(
        value_name = "PROJECT_DIR",
        help = "Project directory to merge (default: current dir)."
    )]
    pub project_dir: Option<PathBuf>,

    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub output: OutputOpts,
    #[clap(flatten)]
    pub filters: FilterOpts,
}

#[derive(Parser, Debug)]
#[command(
    name = "code-merge",
    author,
    version,
    about = "Merge project source files into text parts for AI context windows.",
    long_about = "code-merge walks a project directory, skips dependency/build/VCS folders and secrets, \nand concatenates the remaining text files into size-bounded parts under an output directory.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  code-merge\n  code-merge ~/work/app --fenced -m 500KB --zip\n  code-merge select . -e rs,toml\n  code-merge config --save",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[clap(flatten)]
    pub merge: MergeArgs,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "s",
        visible_alias = "i",
        about = "Interactively pick files and folders, then merge them."
    )]
    Select(MergeArgs),

    #[command(about = "Show or save the default configuration file.")]
    Config(ConfigArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        value_name = "PROJECT_DIR",
        help = "Project whose config path is used with --save (default: current dir)."
    )]
    pub project_dir: Option<PathBuf>,

    #[arg(
        long,
        help = "Save the default config to the project's default path (prompts overwrite)."
    )]
    pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (fish, bash, zsh) [default: fish]"
    )]
    pub shell: Option<String>,
    #[arg(
        long,
        help = "Save completion script to default location (prompts overwrite)."
    )]
    pub save: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_merges_current_dir() {
        let cli = Cli::try_parse_from(["code-merge"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.merge.project_dir.is_none());
    }

    #[test]
    fn positional_dir_and_flags() {
        let cli = Cli::try_parse_from([
            "code-merge",
            "proj",
            "--fenced",
            "-e",
            "rs,ts",
            "--ext",
            "md",
            "-m",
            "500KB",
            "--zip",
        ])
        .unwrap();
        assert_eq!(cli.merge.project_dir, Some(PathBuf::from("proj")));
        assert!(cli.merge.output.fenced);
        assert!(cli.merge.output.zip);
        assert_eq!(cli.merge.output.max_size.as_deref(), Some("500KB"));
        assert_eq!(cli.merge.filters.extensions, vec!["rs", "ts", "md"]);
    }

    #[test]
    fn select_subcommand_takes_merge_args() {
        let cli = Cli::try_parse_from(["code-merge", "-v", "select", "proj", "--fenced"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Some(Commands::Select(args)) => {
                assert_eq!(args.project_dir, Some(PathBuf::from("proj")));
                assert!(args.output.fenced);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_and_no_config_conflict() {
        assert!(Cli::try_parse_from(["code-merge", "--config", "a.toml", "--no-config"]).is_err());
    }
}
