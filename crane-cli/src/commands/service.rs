//! `crane service` commands.

use super::{run_plan, run_plan_with, Context};
use crate::{LogsOpts, SelectorOpts, UpdateOpts};
use anyhow::{bail, Result};
use crane_core::{
    push_pair_list, resolve_with_backend, CommandPlanner, Domain, InvocationOutcome, OptionBag,
    PlanRequest, Profile, ResolvedTargetSet, SwarmBackend, TargetSelector, Verb,
};

fn entity_names(set: &ResolvedTargetSet) -> Vec<String> {
    set.iter().map(ToString::to_string).collect()
}

fn passthrough_bag(options: &str) -> OptionBag {
    let mut args = OptionBag::new();
    args.push_raw(OptionBag::split_raw(options));
    args
}

async fn resolve_targets(
    profile: &Profile,
    backend: &dyn SwarmBackend,
    selector: &TargetSelector,
) -> Result<Vec<String>> {
    let set = resolve_with_backend(selector, profile, backend).await?;
    Ok(entity_names(&set))
}

/// `service create`: pure pass-through, everything lives in `--options`.
pub async fn create(ctx: &Context, options: &str) -> Result<i32> {
    if options.trim().is_empty() {
        bail!("options must be provided for 'create' (include --name, image, etc. inside --options)");
    }
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let plan = CommandPlanner::plan(
        PlanRequest::new(Domain::Service, Verb::Create).args(passthrough_bag(options)),
    )?;
    run_plan(ctx, &backend, &plan).await
}

/// `service ls`: no targets.
pub async fn ls(ctx: &Context, options: &str) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;
    let plan = CommandPlanner::plan(
        PlanRequest::new(Domain::Service, Verb::Ls).args(passthrough_bag(options)),
    )?;
    run_plan(ctx, &backend, &plan).await
}

/// Shared shape of `inspect`, `ps` and `rm`: resolve targets, forward
/// options.
pub async fn targeted(
    ctx: &Context,
    verb: Verb,
    selector: &SelectorOpts,
    options: &str,
) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let selector = TargetSelector::from_flags(selector.services.as_deref(), selector.all)?;
    let targets = resolve_targets(&profile, &backend, &selector).await?;

    let plan = CommandPlanner::plan(
        PlanRequest::new(Domain::Service, verb)
            .entities(targets)
            .args(passthrough_bag(options)),
    )?;
    run_plan(ctx, &backend, &plan).await
}

pub async fn logs(
    ctx: &Context,
    selector: &SelectorOpts,
    opts: &LogsOpts,
    options: &str,
) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let selector = TargetSelector::from_flags(selector.services.as_deref(), selector.all)?;
    let targets = resolve_targets(&profile, &backend, &selector).await?;

    let mut args = OptionBag::new();
    if opts.details {
        args.set_flag("details");
    }
    if opts.follow {
        args.set_flag("follow");
    }
    if opts.no_resolve {
        args.set_flag("no-resolve");
    }
    if opts.no_task_ids {
        args.set_flag("no-task-ids");
    }
    if opts.no_trunc {
        args.set_flag("no-trunc");
    }
    if opts.raw {
        args.set_flag("raw");
    }
    if opts.timestamps {
        args.set_flag("timestamps");
    }
    if let Some(since) = opts.since.as_deref() {
        args.set("since", since);
    }
    if let Some(tail) = opts.tail.as_deref() {
        args.set("tail", tail);
    }
    let args = OptionBag::merge(&OptionBag::new(), &args, &OptionBag::split_raw(options));

    let mut request =
        PlanRequest::new(Domain::Service, Verb::Logs).entities(targets).args(args);
    if let Some(stack) = opts.stack.as_deref() {
        request = request.stack(stack);
    }
    let plan = CommandPlanner::plan(request)?;
    run_plan(ctx, &backend, &plan).await
}

pub async fn rollback(
    ctx: &Context,
    selector: &SelectorOpts,
    stack: Option<&str>,
    detach: bool,
    quiet: bool,
    options: &str,
) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    // With a stack in scope, explicit services stay explicit (prefixed
    // below); anything else means "whatever is deployed under the stack".
    let mut selector = TargetSelector::from_flags(selector.services.as_deref(), selector.all)?;
    if let Some(stack) = stack {
        if !matches!(selector, TargetSelector::Explicit(_)) {
            selector = TargetSelector::AllDeployed { stack: stack.to_string() };
        }
    }
    let targets = resolve_targets(&profile, &backend, &selector).await?;

    let mut args = OptionBag::new();
    if detach {
        args.set_flag("detach");
    }
    if quiet {
        args.set_flag("quiet");
    }
    let args = OptionBag::merge(&OptionBag::new(), &args, &OptionBag::split_raw(options));

    let mut request =
        PlanRequest::new(Domain::Service, Verb::Rollback).entities(targets).args(args);
    if let Some(stack) = stack {
        request = request.stack(stack);
    }
    let plan = CommandPlanner::plan(request)?;

    // Docker reports a missing previous spec on stderr without a failing
    // exit status; count it as a failed target anyway.
    run_plan_with(ctx, &backend, &plan, |outcome: &InvocationOutcome| {
        outcome.succeeded() && !outcome.stderr.contains("does not have a previous spec")
    })
    .await
}

pub async fn scale(
    ctx: &Context,
    selector: &SelectorOpts,
    stack: Option<&str>,
    replicas: &str,
    detach: bool,
    options: &str,
) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let selector = TargetSelector::from_flags(selector.services.as_deref(), selector.all)?;
    let targets = resolve_targets(&profile, &backend, &selector).await?;

    let mut args = OptionBag::new();
    if detach {
        args.set_flag("detach");
    }
    let args = OptionBag::merge(&OptionBag::new(), &args, &OptionBag::split_raw(options));

    let mut request = PlanRequest::new(Domain::Service, Verb::Scale)
        .entities(targets)
        .replica_spec(replicas)
        .args(args);
    if let Some(stack) = stack {
        request = request.stack(stack);
    }
    let plan = CommandPlanner::plan(request)?;
    run_plan(ctx, &backend, &plan).await
}

pub async fn update(
    ctx: &Context,
    selector: &SelectorOpts,
    opts: &UpdateOpts,
    options: &str,
) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let selector = TargetSelector::from_flags(selector.services.as_deref(), selector.all)?;
    let targets = resolve_targets(&profile, &backend, &selector).await?;

    let mut args = OptionBag::new();
    if opts.detach {
        args.set_flag("detach");
    }
    if opts.quiet {
        args.set_flag("quiet");
    }
    if opts.force {
        args.set_flag("force");
    }
    if opts.rollback {
        args.set_flag("rollback");
    }
    if let Some(image) = opts.image.as_deref() {
        args.set("image", image);
    }
    if let Some(replicas) = opts.replicas.as_deref() {
        args.set("replicas", replicas);
    }
    if let Some(pairs) = &opts.env_add {
        push_pair_list(&mut args, "env-add", pairs);
    }
    if let Some(pairs) = &opts.label_add {
        push_pair_list(&mut args, "label-add", pairs);
    }
    let args = OptionBag::merge(&OptionBag::new(), &args, &OptionBag::split_raw(options));

    let plan = CommandPlanner::plan(
        PlanRequest::new(Domain::Service, Verb::Update).entities(targets).args(args),
    )?;
    run_plan(ctx, &backend, &plan).await
}
