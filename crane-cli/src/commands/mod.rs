//! Command implementations: build a plan, run it, render the result.

pub mod node;
pub mod service;
pub mod stack;
pub mod swarm;

use crate::render;
use anyhow::{Context as _, Result};
use colored::Colorize;
use crane_core::{
    aggregate_with, config, DockerBackend, Executor, InvocationOutcome, InvocationPlan, Profile,
    ProfileCatalog, SwarmBackend,
};
use std::path::PathBuf;
use tracing::warn;

/// Per-invocation context shared by every command.
pub struct Context {
    pub config_path: PathBuf,
    pub profile: Option<String>,
    pub dry_run: bool,
}

impl Context {
    fn catalog(&self) -> Result<ProfileCatalog> {
        config::load(&self.config_path)
            .with_context(|| format!("failed to load {}", self.config_path.display()))
    }

    /// Resolve the active profile: `--profile`, then `$CRANE_PROFILE`, then
    /// the configured default.
    pub fn active_profile(&self) -> Result<Profile> {
        let explicit =
            self.profile.clone().or_else(|| std::env::var("CRANE_PROFILE").ok());
        Ok(self.catalog()?.resolve_active(explicit.as_deref())?.clone())
    }

    /// Docker backend with the profile's env file injected into spawned
    /// processes.
    pub fn backend(&self, profile: &Profile) -> Result<DockerBackend> {
        let mut env = Vec::new();
        if let Some(path) = profile.env_file() {
            if path.exists() {
                env = config::load_env_file(path)?;
            } else {
                warn!(path = %path.display(), "profile env file does not exist, skipping");
            }
        }
        Ok(DockerBackend::new().env(env))
    }
}

/// Execute a plan (or print it under `--dry-run`) and return the process
/// exit code.
pub async fn run_plan(
    ctx: &Context,
    backend: &dyn SwarmBackend,
    plan: &InvocationPlan,
) -> Result<i32> {
    run_plan_with(ctx, backend, plan, InvocationOutcome::succeeded).await
}

/// Like [`run_plan`], with a custom per-outcome success predicate.
pub async fn run_plan_with<F>(
    ctx: &Context,
    backend: &dyn SwarmBackend,
    plan: &InvocationPlan,
    is_success: F,
) -> Result<i32>
where
    F: Fn(&InvocationOutcome) -> bool,
{
    if ctx.dry_run {
        render::print_plan(plan);
        return Ok(0);
    }

    let report = Executor::new(backend).execute(plan).await;
    let halted = report.halted;
    let result = aggregate_with(report.outcomes, is_success);
    render::print_result(&result);

    if let Some(err) = halted {
        eprintln!("{} {}", "✗".red().bold(), err);
        return Ok(3);
    }
    Ok(result.exit_code())
}
