use crate::cli_args::MergeArgs;
use crate::commands::merge::{prepare_plan, report_run};
use anyhow::{Context, Result};
use code_merge_core::{self as merge_core, AppError, MenuChoice, Prompter, expand_selections, run_merge, run_selector};
use colored::*;
use inquire::InquireError;
use inquire::ui::{RenderConfig, Styled};
use log;

/// Terminal prompter backed by `inquire::Select`.
pub struct InquirePrompter;

impl InquirePrompter {
    fn render_config() -> RenderConfig<'static> {
        RenderConfig::default()
            .with_scroll_up_prefix(Styled::new("⇡"))
            .with_scroll_down_prefix(Styled::new("⇣"))
            .with_highlighted_option_prefix(Styled::new("➤"))
    }
}

impl Prompter for InquirePrompter {
    fn choose(&mut self, message: &str, options: &[MenuChoice]) -> merge_core::Result<Option<MenuChoice>> {
        let answer = inquire::Select::new(message, options.to_vec())
            .with_render_config(Self::render_config())
            .with_help_message("Use arrow keys to navigate, type to filter, Enter to select, Esc to finish")
            .with_page_size(15)
            .prompt();

        match answer {
            Ok(choice) => Ok(Some(choice)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(e) => Err(AppError::Prompt(e.to_string())),
        }
    }
}

pub fn handle_select_command(args: &MergeArgs, quiet: bool) -> Result<()> {
    let plan = prepare_plan(args)?;

    let mut prompter = InquirePrompter;
    let selections = run_selector(&plan.project_root, &plan.rules, &mut prompter)
        .context("Interactive selection failed")?;

    if selections.is_empty() {
        if !quiet {
            println!("{} Nothing selected.", "ℹ️".blue());
        }
        return Ok(());
    }
    log::debug!("Selections: {:?}", selections);

    let output = plan.output();
    let entries = expand_selections(&selections, &plan.project_root, &plan.rules, Some(&output));
    log::info!("{} files resolved from the selection.", entries.len());

    let outcome = run_merge(&plan, entries).context("Failed to merge selected files")?;
    report_run(&outcome, quiet)
}
