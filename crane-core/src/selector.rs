//! Target selection: expanding user selectors into concrete service sets.
//!
//! A selector is resolved exactly once per invocation, before any planning
//! or execution. Resolution either produces a complete, ordered,
//! duplicate-free target set or fails without partial output.

use crate::error::{CraneError, Result};
use crate::exec::SwarmBackend;
use crate::profile::{Profile, ServiceName};
use tracing::debug;

/// How the user picked the targets for a command.
///
/// Modeled as a sum type so that conflicting selector flags become an
/// explicit validation error instead of an implicit precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    /// Services named on the command line.
    Explicit(Vec<ServiceName>),
    /// Every service declared by the active profile.
    All,
    /// The profile's default service list.
    ProfileDefault,
    /// Every service currently deployed under a stack, as reported by the
    /// orchestrator. Distinct from `All`: the deployed set and the declared
    /// catalog can differ.
    AllDeployed { stack: String },
}

impl TargetSelector {
    /// Build a selector from the conventional flag pair
    /// (`--services name1,name2` / `--all`).
    ///
    /// Giving both is a `ConflictingSelectors` error; giving neither falls
    /// back to the profile default.
    pub fn from_flags(services: Option<&str>, all: bool) -> Result<Self> {
        match (services, all) {
            (Some(_), true) => Err(CraneError::ConflictingSelectors {
                reason: "--services and --all cannot be combined".to_string(),
            }),
            (Some(list), false) => {
                let names = list
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(ServiceName::new)
                    .collect::<Result<Vec<_>>>()?;
                if names.is_empty() {
                    return Err(CraneError::EmptyTargetSet {
                        reason: "--services was given but named no services".to_string(),
                    });
                }
                Ok(Self::Explicit(names))
            }
            (None, true) => Ok(Self::All),
            (None, false) => Ok(Self::ProfileDefault),
        }
    }
}

/// A non-empty, ordered, duplicate-free set of resolved targets.
///
/// Downstream planning and failure reporting both follow this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTargetSet(Vec<ServiceName>);

impl ResolvedTargetSet {
    fn from_names(names: Vec<ServiceName>, empty_reason: &str) -> Result<Self> {
        if names.is_empty() {
            return Err(CraneError::EmptyTargetSet { reason: empty_reason.to_string() });
        }
        Ok(Self(names))
    }

    pub fn names(&self) -> &[ServiceName] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false // non-empty by construction
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceName> {
        self.0.iter()
    }
}

/// Resolve a selector against the active profile.
///
/// Pure function of its inputs: identical inputs yield identical sets.
/// `AllDeployed` needs a live backend query; use [`resolve_with_backend`].
pub fn resolve(selector: &TargetSelector, profile: &Profile) -> Result<ResolvedTargetSet> {
    match selector {
        TargetSelector::All => ResolvedTargetSet::from_names(
            profile.declared_services().to_vec(),
            &format!("profile '{}' declares no services", profile.name()),
        ),
        TargetSelector::ProfileDefault => ResolvedTargetSet::from_names(
            profile.default_services().to_vec(),
            &format!("profile '{}' has no default services", profile.name()),
        ),
        TargetSelector::Explicit(requested) => {
            let mut names: Vec<ServiceName> = Vec::with_capacity(requested.len());
            for name in requested {
                // Fail fast on the first unknown name: no partial resolution.
                if !profile.declares(name) {
                    return Err(CraneError::UnknownService {
                        name: name.to_string(),
                        profile: profile.name().to_string(),
                    });
                }
                // Dedup preserving first occurrence.
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            ResolvedTargetSet::from_names(names, "no services requested")
        }
        TargetSelector::AllDeployed { .. } => Err(CraneError::Internal(
            "AllDeployed requires a backend query; use resolve_with_backend".to_string(),
        )),
    }
}

/// Resolve a selector, querying the backend for the deployed set when the
/// selector is `AllDeployed`.
pub async fn resolve_with_backend(
    selector: &TargetSelector,
    profile: &Profile,
    backend: &dyn SwarmBackend,
) -> Result<ResolvedTargetSet> {
    match selector {
        TargetSelector::AllDeployed { stack } => {
            let deployed = backend.stack_services(stack).await?;
            debug!(stack = %stack, count = deployed.len(), "deployed services queried");
            let names = deployed
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .map(ServiceName::new)
                .collect::<Result<Vec<_>>>()?;
            ResolvedTargetSet::from_names(
                names,
                &format!("no services deployed under stack '{}'", stack),
            )
        }
        other => resolve(other, profile),
    }
}

/// Prefix a service name with `<stack>_` unless it already carries it.
///
/// Swarm names deployed services `<stack>_<service>`; users refer to them
/// by their short compose name.
pub fn qualify_for_stack(stack: &str, name: &str) -> String {
    let prefix = format!("{stack}_");
    if name.starts_with(&prefix) {
        name.to_string()
    } else {
        format!("{prefix}{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::test_profile;

    fn svc(name: &str) -> ServiceName {
        ServiceName::new(name).unwrap()
    }

    #[test]
    fn test_from_flags_conflict() {
        let err = TargetSelector::from_flags(Some("api"), true);
        assert!(matches!(err, Err(CraneError::ConflictingSelectors { .. })));
    }

    #[test]
    fn test_from_flags_variants() {
        assert_eq!(
            TargetSelector::from_flags(Some("api,worker"), false).unwrap(),
            TargetSelector::Explicit(vec![svc("api"), svc("worker")])
        );
        assert_eq!(TargetSelector::from_flags(None, true).unwrap(), TargetSelector::All);
        assert_eq!(
            TargetSelector::from_flags(None, false).unwrap(),
            TargetSelector::ProfileDefault
        );
        assert!(matches!(
            TargetSelector::from_flags(Some(" , "), false),
            Err(CraneError::EmptyTargetSet { .. })
        ));
    }

    #[test]
    fn test_resolve_all_is_declaration_order() {
        let profile = test_profile("dev", &["api", "worker", "redis"], &["api"]);
        let set = resolve(&TargetSelector::All, &profile).unwrap();
        assert_eq!(set.names(), &[svc("api"), svc("worker"), svc("redis")]);
    }

    #[test]
    fn test_resolve_default_empty_fails() {
        let profile = test_profile("dev", &["api"], &[]);
        let err = resolve(&TargetSelector::ProfileDefault, &profile);
        assert!(matches!(err, Err(CraneError::EmptyTargetSet { .. })));
    }

    #[test]
    fn test_resolve_explicit_unknown_fails_fast() {
        let profile = test_profile("dev", &["api", "worker"], &[]);
        let selector = TargetSelector::Explicit(vec![svc("api"), svc("ghost"), svc("worker")]);
        match resolve(&selector, &profile) {
            Err(CraneError::UnknownService { name, .. }) => assert_eq!(name, "ghost"),
            other => panic!("expected UnknownService, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_explicit_dedups_preserving_order() {
        let profile = test_profile("dev", &["api", "worker"], &[]);
        let selector =
            TargetSelector::Explicit(vec![svc("worker"), svc("api"), svc("worker")]);
        let set = resolve(&selector, &profile).unwrap();
        assert_eq!(set.names(), &[svc("worker"), svc("api")]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let profile = test_profile("dev", &["api", "worker"], &["worker"]);
        let selector = TargetSelector::ProfileDefault;
        let first = resolve(&selector, &profile).unwrap();
        let second = resolve(&selector, &profile).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_qualify_for_stack() {
        assert_eq!(qualify_for_stack("prod", "api"), "prod_api");
        assert_eq!(qualify_for_stack("prod", "prod_api"), "prod_api");
    }
}
