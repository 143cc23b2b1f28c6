//! `crane node` commands.
//!
//! Node names come straight from `--nodes`; there is no profile catalog to
//! validate them against.

use super::{run_plan, Context};
use crate::NodeSelectorOpt;
use anyhow::{bail, Result};
use crane_core::{CommandPlanner, Domain, OptionBag, PlanRequest, Verb};

fn node_names(selector: &NodeSelectorOpt) -> Result<Vec<String>> {
    let names: Vec<String> = selector
        .nodes
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        bail!("node name(s) must be provided (use --nodes node1,node2)");
    }
    Ok(names)
}

fn passthrough_bag(options: &str) -> OptionBag {
    let mut args = OptionBag::new();
    args.push_raw(OptionBag::split_raw(options));
    args
}

/// Run a node verb against the named nodes.
pub async fn targeted(
    ctx: &Context,
    verb: Verb,
    selector: &NodeSelectorOpt,
    options: &str,
) -> Result<i32> {
    let nodes = node_names(selector)?;
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let plan = CommandPlanner::plan(
        PlanRequest::new(Domain::Node, verb).entities(nodes).args(passthrough_bag(options)),
    )?;
    run_plan(ctx, &backend, &plan).await
}

pub async fn ls(ctx: &Context, options: &str) -> Result<i32> {
    let profile = ctx.active_profile()?;
    let backend = ctx.backend(&profile)?;

    let plan = CommandPlanner::plan(
        PlanRequest::new(Domain::Node, Verb::Ls).args(passthrough_bag(options)),
    )?;
    run_plan(ctx, &backend, &plan).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_names_split_and_trim() {
        let selector = NodeSelectorOpt { nodes: Some("node-1, node-2,,node-3".to_string()) };
        assert_eq!(node_names(&selector).unwrap(), vec!["node-1", "node-2", "node-3"]);
    }

    #[test]
    fn test_node_names_required() {
        assert!(node_names(&NodeSelectorOpt { nodes: None }).is_err());
        assert!(node_names(&NodeSelectorOpt { nodes: Some(" , ".to_string()) }).is_err());
    }
}
