//! Command planning: turning a verb and a resolved target set into an
//! ordered list of backend CLI invocations.
//!
//! Planning is pure: no subprocess runs here, so a plan can be printed
//! (dry-run) or logged before any side effect occurs. A plan either builds
//! completely or not at all.

use crate::error::{CraneError, Result};
use crate::options::OptionBag;
use crate::selector::qualify_for_stack;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Top-level docker management command the invocation runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Swarm,
    Service,
    Stack,
    Node,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swarm => "swarm",
            Self::Service => "service",
            Self::Stack => "stack",
            Self::Node => "node",
        }
    }
}

/// Primitive verb within a domain (`docker service scale`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Init,
    Join,
    Create,
    Deploy,
    Ls,
    Ps,
    Inspect,
    Logs,
    Rm,
    Rollback,
    Scale,
    Update,
    Promote,
    Demote,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Join => "join",
            Self::Create => "create",
            Self::Deploy => "deploy",
            Self::Ls => "ls",
            Self::Ps => "ps",
            Self::Inspect => "inspect",
            Self::Logs => "logs",
            Self::Rm => "rm",
            Self::Rollback => "rollback",
            Self::Scale => "scale",
            Self::Update => "update",
            Self::Promote => "promote",
            Self::Demote => "demote",
        }
    }

    /// Planning shape for this verb inside a domain.
    fn class(&self, domain: Domain) -> VerbClass {
        match (domain, self) {
            (Domain::Stack, _) => VerbClass::StackScoped,
            (Domain::Swarm, _) | (_, Verb::Create) => VerbClass::Solo,
            (_, Verb::Scale) => VerbClass::Scale,
            // One docker call per entity: the partially-failable commands.
            (_, Verb::Rm | Verb::Rollback | Verb::Update | Verb::Promote | Verb::Demote) => {
                VerbClass::PerEntity
            }
            // One docker call for the whole set.
            (_, Verb::Ls | Verb::Ps | Verb::Inspect | Verb::Logs | Verb::Init | Verb::Join
                | Verb::Deploy) => VerbClass::Batch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerbClass {
    /// One invocation, no entity target (swarm init/join, service create).
    Solo,
    /// One invocation carrying the whole target set.
    Batch,
    /// One invocation per entity, in resolver order.
    PerEntity,
    /// Per-entity with `service=replicas` pairing.
    Scale,
    /// One invocation targeting the stack name.
    StackScoped,
}

/// Entity argument(s) of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationTarget {
    None,
    Single(String),
    Many(Vec<String>),
}

/// One planned backend CLI call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    domain: Domain,
    verb: Verb,
    args: OptionBag,
    target: InvocationTarget,
    // Entity name used in failure attribution; for scale this is the
    // service, not the service=N pair.
    label: String,
}

impl Invocation {
    fn new(domain: Domain, verb: Verb, target: InvocationTarget, args: OptionBag) -> Self {
        let label = match &target {
            InvocationTarget::None => format!("{} {}", domain.as_str(), verb.as_str()),
            InvocationTarget::Single(name) => name.clone(),
            InvocationTarget::Many(names) => names.join(","),
        };
        Self { domain, verb, args, target, label }
    }

    fn with_label(
        domain: Domain,
        verb: Verb,
        target: InvocationTarget,
        args: OptionBag,
        label: impl Into<String>,
    ) -> Self {
        Self { domain, verb, args, target, label: label.into() }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Entity name this invocation is attributed to in reports.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Arguments after the program name: `<domain> <verb> [flags] [targets]`.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.domain.as_str().to_string(), self.verb.as_str().to_string()];
        argv.extend(self.args.render());
        match &self.target {
            InvocationTarget::None => {}
            InvocationTarget::Single(name) => argv.push(name.clone()),
            InvocationTarget::Many(names) => argv.extend(names.iter().cloned()),
        }
        argv
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "docker {}", self.argv().join(" "))
    }
}

/// Ordered, build-once/run-once sequence of invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    steps: Vec<Invocation>,
}

impl InvocationPlan {
    pub fn steps(&self) -> &[Invocation] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Rendered command lines, one per step (dry-run output).
    pub fn render(&self) -> Vec<String> {
        self.steps.iter().map(Invocation::to_string).collect()
    }
}

/// Everything the planner needs for one user command.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    domain: Domain,
    verb: Verb,
    entities: Vec<String>,
    args: OptionBag,
    stack: Option<String>,
    compose_file: Option<PathBuf>,
    replica_spec: Option<String>,
}

impl PlanRequest {
    pub fn new(domain: Domain, verb: Verb) -> Self {
        Self {
            domain,
            verb,
            entities: Vec::new(),
            args: OptionBag::new(),
            stack: None,
            compose_file: None,
            replica_spec: None,
        }
    }

    /// Resolved entity names, in resolver order.
    pub fn entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    pub fn args(mut self, args: OptionBag) -> Self {
        self.args = args;
        self
    }

    /// Stack in scope: the target of stack-scoped verbs, the name prefix
    /// for service entities otherwise.
    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn compose_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.compose_file = Some(path.into());
        self
    }

    /// `name=N[,name=N]*` replica mapping for the scale verb.
    pub fn replica_spec(mut self, spec: impl Into<String>) -> Self {
        self.replica_spec = Some(spec.into());
        self
    }
}

/// The planning core. Stateless; all context travels in the request.
pub struct CommandPlanner;

impl CommandPlanner {
    /// Build the ordered invocation plan for one user command.
    pub fn plan(request: PlanRequest) -> Result<InvocationPlan> {
        let class = request.verb.class(request.domain);
        debug!(
            domain = request.domain.as_str(),
            verb = request.verb.as_str(),
            entities = request.entities.len(),
            ?class,
            "planning invocations"
        );
        let steps = match class {
            VerbClass::Solo => {
                vec![Invocation::new(
                    request.domain,
                    request.verb,
                    InvocationTarget::None,
                    request.args,
                )]
            }
            VerbClass::Batch => {
                let target = if request.entities.is_empty() {
                    InvocationTarget::None
                } else {
                    InvocationTarget::Many(Self::qualified(&request))
                };
                vec![Invocation::new(request.domain, request.verb, target, request.args)]
            }
            VerbClass::PerEntity => {
                if request.entities.is_empty() {
                    return Err(CraneError::EmptyTargetSet {
                        reason: format!(
                            "{} {} needs at least one target",
                            request.domain.as_str(),
                            request.verb.as_str()
                        ),
                    });
                }
                Self::qualified(&request)
                    .into_iter()
                    .map(|name| {
                        Invocation::new(
                            request.domain,
                            request.verb,
                            InvocationTarget::Single(name),
                            request.args.clone(),
                        )
                    })
                    .collect()
            }
            VerbClass::Scale => Self::plan_scale(&request)?,
            VerbClass::StackScoped => vec![Self::plan_stack_scoped(request)?],
        };
        Ok(InvocationPlan { steps })
    }

    fn qualified(request: &PlanRequest) -> Vec<String> {
        match &request.stack {
            Some(stack) => {
                request.entities.iter().map(|name| qualify_for_stack(stack, name)).collect()
            }
            None => request.entities.clone(),
        }
    }

    fn plan_scale(request: &PlanRequest) -> Result<Vec<Invocation>> {
        let spec = request.replica_spec.as_deref().unwrap_or("");
        let pairs = parse_replica_spec(spec)?;

        // Every resolved target needs exactly one count, and every count a
        // target. Report the first discrepancy by name.
        for (name, _) in &pairs {
            if !request.entities.iter().any(|entity| entity == name) {
                return Err(CraneError::ScaleSpecMismatch {
                    reason: format!("replica count given for '{name}', which is not a target"),
                });
            }
        }

        request
            .entities
            .iter()
            .map(|entity| {
                let (_, count) = pairs
                    .iter()
                    .find(|(name, _)| name == entity)
                    .ok_or_else(|| CraneError::ScaleSpecMismatch {
                        reason: format!("no replica count for target '{entity}'"),
                    })?;
                let qualified = match &request.stack {
                    Some(stack) => qualify_for_stack(stack, entity),
                    None => entity.clone(),
                };
                Ok(Invocation::with_label(
                    request.domain,
                    request.verb,
                    InvocationTarget::Single(format!("{qualified}={count}")),
                    request.args.clone(),
                    entity.clone(),
                ))
            })
            .collect()
    }

    fn plan_stack_scoped(request: PlanRequest) -> Result<Invocation> {
        let stack = request.stack.clone().ok_or_else(|| CraneError::InvalidConfig {
            reason: "stack name must be provided".to_string(),
        })?;
        let mut args = request.args;
        if request.verb == Verb::Deploy {
            let compose = request.compose_file.ok_or_else(|| CraneError::InvalidConfig {
                reason: "compose file not specified and not found in profile configuration"
                    .to_string(),
            })?;
            let mut with_compose = OptionBag::new();
            with_compose.set("compose-file", compose.to_string_lossy());
            args = OptionBag::merge(&with_compose, &args, &[]);
        }
        Ok(Invocation::new(
            request.domain,
            request.verb,
            InvocationTarget::Single(stack),
            args,
        ))
    }
}

/// Parse a `name=N[,name=N]*` replica mapping.
fn parse_replica_spec(spec: &str) -> Result<Vec<(String, u64)>> {
    let mut pairs: Vec<(String, u64)> = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, count) = part.split_once('=').ok_or_else(|| CraneError::ScaleSpecMismatch {
            reason: format!("'{part}' is not a service=replicas pair"),
        })?;
        let name = name.trim();
        let count: u64 =
            count.trim().parse().map_err(|_| CraneError::ScaleSpecMismatch {
                reason: format!("'{part}': replica count must be a non-negative integer"),
            })?;
        if pairs.iter().any(|(existing, _)| existing == name) {
            return Err(CraneError::ScaleSpecMismatch {
                reason: format!("service '{name}' appears twice in the replica spec"),
            });
        }
        pairs.push((name.to_string(), count));
    }
    if pairs.is_empty() {
        return Err(CraneError::ScaleSpecMismatch {
            reason: "replica spec is empty (use --replicas name=count[,name=count])".to_string(),
        });
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_per_entity_one_invocation_per_target_in_order() {
        let plan = CommandPlanner::plan(
            PlanRequest::new(Domain::Service, Verb::Rm).entities(names(&["a", "b", "c"])),
        )
        .unwrap();
        assert_eq!(plan.len(), 3);
        let targets: Vec<&str> = plan.steps().iter().map(Invocation::label).collect();
        assert_eq!(targets, vec!["a", "b", "c"]);
        assert_eq!(plan.steps()[0].argv(), vec!["service", "rm", "a"]);
    }

    #[test]
    fn test_per_entity_requires_targets() {
        let err = CommandPlanner::plan(PlanRequest::new(Domain::Node, Verb::Promote));
        assert!(matches!(err, Err(CraneError::EmptyTargetSet { .. })));
    }

    #[test]
    fn test_batch_single_invocation_regardless_of_size() {
        for set in [&["a"][..], &["a", "b", "c"][..]] {
            let plan = CommandPlanner::plan(
                PlanRequest::new(Domain::Service, Verb::Inspect).entities(names(set)),
            )
            .unwrap();
            assert_eq!(plan.len(), 1);
        }
    }

    #[test]
    fn test_batch_without_targets() {
        let plan =
            CommandPlanner::plan(PlanRequest::new(Domain::Service, Verb::Ls)).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps()[0].argv(), vec!["service", "ls"]);
    }

    #[test]
    fn test_batch_stack_qualification() {
        let plan = CommandPlanner::plan(
            PlanRequest::new(Domain::Service, Verb::Logs)
                .entities(names(&["api", "prod_worker"]))
                .stack("prod"),
        )
        .unwrap();
        assert_eq!(plan.steps()[0].argv(), vec!["service", "logs", "prod_api", "prod_worker"]);
    }

    #[test]
    fn test_scale_pairs_targets_with_counts() {
        let plan = CommandPlanner::plan(
            PlanRequest::new(Domain::Service, Verb::Scale)
                .entities(names(&["a", "b"]))
                .replica_spec("a=3,b=5"),
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps()[0].argv(), vec!["service", "scale", "a=3"]);
        assert_eq!(plan.steps()[1].argv(), vec!["service", "scale", "b=5"]);
        assert_eq!(plan.steps()[0].label(), "a");
    }

    #[test]
    fn test_scale_missing_count_fails() {
        let err = CommandPlanner::plan(
            PlanRequest::new(Domain::Service, Verb::Scale)
                .entities(names(&["a", "b"]))
                .replica_spec("a=3"),
        );
        assert!(matches!(err, Err(CraneError::ScaleSpecMismatch { .. })));
    }

    #[test]
    fn test_scale_extra_count_fails() {
        let err = CommandPlanner::plan(
            PlanRequest::new(Domain::Service, Verb::Scale)
                .entities(names(&["a"]))
                .replica_spec("a=3,b=5"),
        );
        assert!(matches!(err, Err(CraneError::ScaleSpecMismatch { .. })));
    }

    #[test]
    fn test_scale_qualifies_but_labels_short_name() {
        let plan = CommandPlanner::plan(
            PlanRequest::new(Domain::Service, Verb::Scale)
                .entities(names(&["api"]))
                .replica_spec("api=2")
                .stack("prod"),
        )
        .unwrap();
        assert_eq!(plan.steps()[0].argv(), vec!["service", "scale", "prod_api=2"]);
        assert_eq!(plan.steps()[0].label(), "api");
    }

    #[test]
    fn test_replica_spec_parse_errors() {
        assert!(parse_replica_spec("").is_err());
        assert!(parse_replica_spec("api").is_err());
        assert!(parse_replica_spec("api=x").is_err());
        assert!(parse_replica_spec("api=1,api=2").is_err());
        assert_eq!(parse_replica_spec("api=1, worker=2").unwrap().len(), 2);
    }

    #[test]
    fn test_stack_deploy_includes_compose_file() {
        let plan = CommandPlanner::plan(
            PlanRequest::new(Domain::Stack, Verb::Deploy)
                .stack("prod")
                .compose_file("containers/compose.yaml"),
        )
        .unwrap();
        assert_eq!(
            plan.steps()[0].argv(),
            vec!["stack", "deploy", "--compose-file", "containers/compose.yaml", "prod"]
        );
    }

    #[test]
    fn test_stack_deploy_without_compose_fails() {
        let err =
            CommandPlanner::plan(PlanRequest::new(Domain::Stack, Verb::Deploy).stack("prod"));
        assert!(matches!(err, Err(CraneError::InvalidConfig { .. })));
    }

    #[test]
    fn test_stack_scoped_single_invocation() {
        let mut quiet = OptionBag::new();
        quiet.set_flag("quiet");
        let plan = CommandPlanner::plan(
            PlanRequest::new(Domain::Stack, Verb::Ps).stack("prod").args(quiet),
        )
        .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps()[0].argv(), vec!["stack", "ps", "--quiet", "prod"]);
    }

    #[test]
    fn test_solo_swarm_init_passes_raw_options() {
        let mut args = OptionBag::new();
        args.push_raw(OptionBag::split_raw("--advertise-addr 192.168.1.1"));
        let plan =
            CommandPlanner::plan(PlanRequest::new(Domain::Swarm, Verb::Init).args(args)).unwrap();
        assert_eq!(plan.steps()[0].argv(), vec!["swarm", "init", "--advertise-addr", "192.168.1.1"]);
    }

    #[test]
    fn test_plan_display_renders_docker_lines() {
        let plan = CommandPlanner::plan(
            PlanRequest::new(Domain::Service, Verb::Rollback).entities(names(&["prod_api"])),
        )
        .unwrap();
        assert_eq!(plan.render(), vec!["docker service rollback prod_api"]);
    }
}
