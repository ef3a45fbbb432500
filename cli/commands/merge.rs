use crate::cli_args::MergeArgs;
use crate::load_config_for_command;
use crate::output::{print_outcome, print_warnings};
use anyhow::{Context, Result};
use code_merge_core::{Config, MergeOutcome, MergePlan, run_merge};
use log;

/// Resolves the project root and configuration shared by `merge` and
/// `select` into a ready-to-run plan.
pub fn prepare_plan(args: &MergeArgs) -> Result<MergePlan> {
    let project_root = Config::determine_project_root(args.project_dir.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(&project_root, args)
        .context("Failed to load configuration")?;
    let plan = MergePlan::from_config(&project_root, &config).context("Invalid merge settings")?;
    log::debug!(
        "Merge plan: scan root {}, output {}, max part size {} bytes",
        plan.scan_root.display(),
        plan.output_dir.display(),
        plan.max_part_size
    );
    Ok(plan)
}

pub fn handle_merge_command(args: &MergeArgs, quiet: bool) -> Result<()> {
    let plan = prepare_plan(args)?;
    let walker = plan.walker();
    let outcome = run_merge(&plan, walker.walk()).context("Failed to merge project files")?;
    report_run(&outcome, quiet)
}

pub fn report_run(outcome: &MergeOutcome, quiet: bool) -> Result<()> {
    if !quiet {
        print_warnings(&outcome.warnings);
    }
    print_outcome(outcome, quiet)
}
