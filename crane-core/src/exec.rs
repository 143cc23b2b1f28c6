//! Plan execution against the docker CLI.
//!
//! The backend sits behind the narrow [`SwarmBackend`] trait so tests can
//! mock it and a future implementation could fan out concurrently without
//! touching the planner or aggregator. The shipped executor is strictly
//! sequential: swarm serializes access to its consistency store anyway, and
//! sequential runs keep output and failure attribution deterministic.

use crate::error::{CraneError, Result};
use crate::plan::{Invocation, InvocationPlan};
use crate::report::InvocationOutcome;
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// The subprocess seam to the orchestrator CLI.
#[async_trait]
pub trait SwarmBackend: Send + Sync {
    /// Run one invocation to completion, capturing status and output.
    ///
    /// A non-zero exit is an `Ok` outcome; `Err` is reserved for the
    /// backend itself being unusable.
    async fn run(&self, invocation: &Invocation) -> Result<InvocationOutcome>;

    /// Names of the services currently deployed under `stack`.
    async fn stack_services(&self, stack: &str) -> Result<Vec<String>>;
}

/// Backend that shells out to the `docker` binary.
pub struct DockerBackend {
    program: String,
    env: Vec<(String, String)>,
}

impl Default for DockerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerBackend {
    pub fn new() -> Self {
        Self { program: "docker".to_string(), env: Vec::new() }
    }

    /// Override the binary name/path (e.g. `podman`, or a test stub).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into(), env: Vec::new() }
    }

    /// Extra environment variables for every spawned process, typically
    /// from the profile's env file.
    pub fn env(mut self, vars: Vec<(String, String)>) -> Self {
        self.env = vars;
        self
    }

    async fn output(&self, args: &[String]) -> Result<std::process::Output> {
        Command::new(&self.program)
            .args(args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                let reason = if e.kind() == ErrorKind::NotFound {
                    format!("'{}' binary not found on PATH", self.program)
                } else {
                    format!("failed to launch '{}': {}", self.program, e)
                };
                CraneError::EnvironmentUnavailable { reason }
            })
    }
}

#[async_trait]
impl SwarmBackend for DockerBackend {
    #[instrument(skip(self, invocation), fields(target = %invocation.label()))]
    async fn run(&self, invocation: &Invocation) -> Result<InvocationOutcome> {
        let argv = invocation.argv();
        debug!(command = %invocation, "running backend command");
        let output = self.output(&argv).await?;
        let exit_code = output.status.code();
        if exit_code != Some(0) {
            warn!(target = %invocation.label(), ?exit_code, "backend command failed");
        }
        Ok(InvocationOutcome {
            target: invocation.label().to_string(),
            argv,
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn stack_services(&self, stack: &str) -> Result<Vec<String>> {
        let args: Vec<String> =
            ["stack", "services", stack, "--format", "{{.Name}}"].map(String::from).into();
        let output = self.output(&args).await?;
        if output.status.code() != Some(0) {
            return Err(CraneError::Internal(format!(
                "failed to query services of stack '{}': {}",
                stack,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Result of running a plan: the outcomes gathered so far, plus the fatal
/// error when execution halted early.
#[derive(Debug)]
pub struct ExecutionReport {
    /// One outcome per attempted invocation, in plan order.
    pub outcomes: Vec<InvocationOutcome>,
    /// Set when the backend became unavailable mid-plan; the remaining
    /// invocations were never attempted.
    pub halted: Option<CraneError>,
}

/// Sequential plan executor.
pub struct Executor<'a> {
    backend: &'a dyn SwarmBackend,
}

impl<'a> Executor<'a> {
    pub fn new(backend: &'a dyn SwarmBackend) -> Self {
        Self { backend }
    }

    /// Run each invocation in plan order.
    ///
    /// A failing invocation does not abort the rest: unrelated entities
    /// still get attempted. An unusable backend does, since every
    /// subsequent invocation would fail identically; the invocation that
    /// hit it yields one synthesized outcome and the plan stops there.
    pub async fn execute(&self, plan: &InvocationPlan) -> ExecutionReport {
        let mut outcomes = Vec::with_capacity(plan.len());
        for invocation in plan.steps() {
            match self.backend.run(invocation).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err @ CraneError::EnvironmentUnavailable { .. }) => {
                    warn!(error = %err, "backend unavailable, abandoning remaining plan");
                    outcomes.push(InvocationOutcome {
                        target: invocation.label().to_string(),
                        argv: invocation.argv(),
                        exit_code: None,
                        stdout: String::new(),
                        stderr: err.to_string(),
                    });
                    return ExecutionReport { outcomes, halted: Some(err) };
                }
                Err(err) => {
                    return ExecutionReport { outcomes, halted: Some(err) };
                }
            }
        }
        ExecutionReport { outcomes, halted: None }
    }
}
