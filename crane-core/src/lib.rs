//! crane core library
//!
//! The resolution and translation engine behind the `crane` CLI: profiles,
//! target selection, option merging, command planning, sequential
//! execution against the docker CLI, and result aggregation.

pub mod config;
pub mod error;
pub mod exec;
pub mod options;
pub mod plan;
pub mod profile;
pub mod report;
pub mod selector;

// Re-export commonly used items
pub use error::{CraneError, Result};
pub use exec::{DockerBackend, ExecutionReport, Executor, SwarmBackend};
pub use options::{push_pair_list, OptionBag};
pub use plan::{CommandPlanner, Domain, Invocation, InvocationPlan, PlanRequest, Verb};
pub use profile::{Profile, ProfileCatalog, ServiceName};
pub use report::{aggregate, aggregate_with, CommandResult, InvocationOutcome, OverallStatus};
pub use selector::{
    qualify_for_stack, resolve, resolve_with_backend, ResolvedTargetSet, TargetSelector,
};
