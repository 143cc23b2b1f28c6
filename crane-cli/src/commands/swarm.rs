//! `crane swarm` commands: init and join.

use super::{run_plan, Context};
use anyhow::Result;
use crane_core::{CommandPlanner, Domain, OptionBag, PlanRequest, Verb};

/// Run a swarm-level verb; all parameters travel in `--options`.
pub async fn run(ctx: &Context, verb: Verb, options: &str) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let mut args = OptionBag::new();
    args.push_raw(OptionBag::split_raw(options));

    let plan = CommandPlanner::plan(PlanRequest::new(Domain::Swarm, verb).args(args))?;
    run_plan(ctx, &backend, &plan).await
}
