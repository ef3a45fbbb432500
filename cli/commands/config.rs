use crate::cli_args::ConfigArgs;
use anyhow::{Context, Result};
use code_merge_core::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME};
use code_merge_core::{AppError, Config};
use colored::*;
use inquire::Confirm;
use std::fs;

pub fn handle_config_command(args: &ConfigArgs, quiet: bool) -> Result<()> {
    let default_toml = Config::default()
        .to_toml_string()
        .context("Failed to serialize default configuration")?;

    if !args.save {
        print!("{}", default_toml);
        return Ok(());
    }

    let project_root = Config::determine_project_root(args.project_dir.as_ref())
        .context("Failed to determine project root for config command")?;
    let save_dir = project_root.join(DEFAULT_CONFIG_DIR);
    let save_path = save_dir.join(DEFAULT_CONFIG_FILENAME);

    if save_path.exists() {
        if quiet {
            anyhow::bail!(
                "Target file '{}' exists. Overwrite prevented in quiet mode.",
                save_path.display()
            );
        }
        let overwrite = Confirm::new(&format!(
            "Config file already exists at '{}'. Overwrite?",
            save_path.display()
        ))
        .with_default(false)
        .prompt()
        .unwrap_or(false);
        if !overwrite {
            println!("Save cancelled.");
            return Ok(());
        }
    }

    fs::create_dir_all(&save_dir).map_err(|e| AppError::DirCreation {
        path: save_dir.clone(),
        source: e,
    })?;
    fs::write(&save_path, default_toml).map_err(|e| AppError::FileWrite {
        path: save_path.clone(),
        source: e,
    })?;

    if !quiet {
        println!(
            "{} Default config saved to: {}",
            "✅".green(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}
