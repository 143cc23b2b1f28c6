//! `crane stack` commands.

use super::{run_plan, Context};
use crate::render;
use anyhow::Result;
use colored::Colorize;
use crane_core::{
    aggregate, CommandPlanner, Domain, Executor, OptionBag, PlanRequest, Verb,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

fn passthrough_bag(options: &str) -> OptionBag {
    let mut args = OptionBag::new();
    args.push_raw(OptionBag::split_raw(options));
    args
}

/// Deploy a stack; the compose file comes from `--file` or the profile.
pub async fn deploy(
    ctx: &Context,
    stack: &str,
    file: Option<PathBuf>,
    options: &str,
) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;
    let compose = file.unwrap_or_else(|| profile.config_path().clone());

    let plan = CommandPlanner::plan(
        PlanRequest::new(Domain::Stack, Verb::Deploy)
            .stack(stack)
            .compose_file(compose)
            .args(passthrough_bag(options)),
    )?;

    if ctx.dry_run {
        render::print_plan(&plan);
        return Ok(0);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("static spinner template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(format!("Deploying stack '{stack}'..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = Executor::new(&backend).execute(&plan).await;
    spinner.finish_and_clear();

    let halted = report.halted;
    let result = aggregate(report.outcomes);
    render::print_result(&result);

    if let Some(err) = halted {
        eprintln!("{} {}", "✗".red().bold(), err);
        return Ok(3);
    }
    if result.exit_code() == 0 {
        println!("{} Stack deployed: {}", "✓".green().bold(), stack.bold());
    }
    Ok(result.exit_code())
}

/// List the tasks in a stack (`ls` and `ps` are the same primitive).
pub async fn tasks(ctx: &Context, stack: &str, quiet: bool, options: &str) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let mut args = OptionBag::new();
    if quiet {
        args.set_flag("quiet");
    }
    let args = OptionBag::merge(&OptionBag::new(), &args, &OptionBag::split_raw(options));

    let plan =
        CommandPlanner::plan(PlanRequest::new(Domain::Stack, Verb::Ps).stack(stack).args(args))?;
    run_plan(ctx, &backend, &plan).await
}

pub async fn rm(ctx: &Context, stack: &str, options: &str) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let plan = CommandPlanner::plan(
        PlanRequest::new(Domain::Stack, Verb::Rm).stack(stack).args(passthrough_bag(options)),
    )?;
    run_plan(ctx, &backend, &plan).await
}
