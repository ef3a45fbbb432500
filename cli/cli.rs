mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use code_merge_core::{AppError, Config};
use colored::*;
use log;
use std::path::Path;
use std::process;

use cli_args::{Cli, Commands, MergeArgs};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);
    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(()) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(&e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

/// 2 for a missing project root, 3 when the output directory cannot be
/// created, 1 for everything else.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::MissingRoot(_)) => 2,
        Some(AppError::DirCreation { .. }) => 3,
        Some(_) => 1,
        None => 1,
    }
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    match cli.command {
        None => {
            log::debug!("Executing default merge...");
            commands::merge::handle_merge_command(&cli.merge, quiet)?;
        }
        Some(Commands::Select(args)) => {
            log::debug!("Executing 'select' command...");
            commands::select::handle_select_command(&args, quiet)?;
        }
        Some(Commands::Config(args)) => {
            log::debug!("Executing 'config' command...");
            commands::config::handle_config_command(&args, quiet)?;
        }
        Some(Commands::Completion(args)) => {
            log::debug!("Executing 'completion' command...");
            commands::completion::handle_completion_command(&args, quiet)?;
        }
    }
    Ok(())
}

fn merge_config_with_cli_overrides(mut config: Config, args: &MergeArgs) -> Config {
    log::trace!("Applying CLI overrides to config...");

    if args.project_config.whole_project {
        config.general.prefer_src = false;
    }

    if let Some(dir) = &args.output.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(name) = &args.output.name {
        config.output.base_name = name.clone();
    }
    if let Some(size) = &args.output.max_size {
        config.merge.max_part_size = size.clone();
    }
    if args.output.fenced {
        config.merge.fenced = true;
    }
    if args.output.zip {
        config.archive.enabled = true;
    }

    if args.filters.disable_builtin_ignore {
        config.filter.use_builtin_ignores = false;
    }
    if !args.filters.extensions.is_empty() {
        config.filter.extensions = args.filters.extensions.clone();
    }
    config
        .filter
        .exclude
        .extend(args.filters.exclude.iter().cloned());
    config
        .filter
        .ignore_dirs
        .extend(args.filters.ignore_dirs.iter().cloned());
    config
        .filter
        .ignore_files
        .extend(args.filters.ignore_files.iter().cloned());

    log::trace!("Config after CLI overrides: {:?}", config);
    config
}

/// Loads the project's config file (unless disabled) and layers the CLI
/// flags on top of it.
pub fn load_config_for_command(project_root: &Path, args: &MergeArgs) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        project_root,
        args.project_config.config.as_ref(),
        args.project_config.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    Ok(merge_config_with_cli_overrides(config, args))
}
