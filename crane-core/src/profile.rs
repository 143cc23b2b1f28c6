//! Profiles and the profile catalog.
//!
//! A profile bundles project settings (compose file, env file, service
//! catalog) selectable at invocation time. Profiles are built once from
//! configuration and immutable for the process lifetime.

use crate::error::{CraneError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// A validated service name, unique within a profile's declared set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Validate and wrap a service name.
    ///
    /// Names must be non-empty and free of whitespace and commas, since
    /// commas separate names in selector syntax.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CraneError::InvalidConfig { reason: "empty service name".to_string() });
        }
        if trimmed.contains(',') || trimmed.chars().any(char::is_whitespace) {
            return Err(CraneError::InvalidConfig {
                reason: format!("invalid service name '{}'", name),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ServiceName {
    type Error = CraneError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ServiceName> for String {
    fn from(value: ServiceName) -> Self {
        value.0
    }
}

/// A named bundle of project settings.
///
/// Invariants enforced at construction: declared services are unique, and
/// every default service is declared.
#[derive(Debug, Clone)]
pub struct Profile {
    name: String,
    project_name: String,
    config_path: PathBuf,
    env_file: Option<PathBuf>,
    declared: Vec<ServiceName>,
    defaults: Vec<ServiceName>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        project_name: impl Into<String>,
        config_path: impl Into<PathBuf>,
        env_file: Option<PathBuf>,
        declared: Vec<ServiceName>,
        defaults: Vec<ServiceName>,
    ) -> Result<Self> {
        let name = name.into();
        for (i, svc) in declared.iter().enumerate() {
            if declared[..i].contains(svc) {
                return Err(CraneError::InvalidConfig {
                    reason: format!("profile '{}' declares service '{}' twice", name, svc),
                });
            }
        }
        for svc in &defaults {
            if !declared.contains(svc) {
                return Err(CraneError::InvalidConfig {
                    reason: format!(
                        "profile '{}': default service '{}' is not declared",
                        name, svc
                    ),
                });
            }
        }
        Ok(Self {
            name,
            project_name: project_name.into(),
            config_path: config_path.into(),
            env_file,
            declared,
            defaults,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Path to the compose file used by `stack deploy`.
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn env_file(&self) -> Option<&PathBuf> {
        self.env_file.as_ref()
    }

    /// Declared services, in declaration order.
    pub fn declared_services(&self) -> &[ServiceName] {
        &self.declared
    }

    /// Default targets when no selector is given.
    pub fn default_services(&self) -> &[ServiceName] {
        &self.defaults
    }

    pub fn declares(&self, name: &ServiceName) -> bool {
        self.declared.contains(name)
    }
}

/// The loaded profile catalog: name -> profile, plus an optional default.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: HashMap<String, Profile>,
    default: Option<String>,
}

impl ProfileCatalog {
    pub fn new(profiles: Vec<Profile>, default: Option<String>) -> Result<Self> {
        let mut map = HashMap::new();
        for profile in profiles {
            if map.insert(profile.name().to_string(), profile).is_some() {
                return Err(CraneError::InvalidConfig {
                    reason: "duplicate profile name".to_string(),
                });
            }
        }
        if let Some(name) = &default {
            if !map.contains_key(name) {
                return Err(CraneError::InvalidConfig {
                    reason: format!("default profile '{}' is not defined", name),
                });
            }
        }
        Ok(Self { profiles: map, default })
    }

    /// Resolve the active profile for this invocation.
    ///
    /// An explicit name must match a declared profile exactly
    /// (case-sensitive); otherwise the configured default applies.
    pub fn resolve_active(&self, explicit: Option<&str>) -> Result<&Profile> {
        let name = match explicit {
            Some(name) => name,
            None => self.default.as_deref().ok_or(CraneError::NoDefaultProfile)?,
        };
        debug!(profile = name, "resolving active profile");
        self.profiles
            .get(name)
            .ok_or_else(|| CraneError::ProfileNotFound { name: name.to_string() })
    }

    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
pub(crate) fn test_profile(name: &str, declared: &[&str], defaults: &[&str]) -> Profile {
    let declared = declared.iter().map(|s| ServiceName::new(*s).unwrap()).collect();
    let defaults = defaults.iter().map(|s| ServiceName::new(*s).unwrap()).collect();
    Profile::new(name, name, format!("{name}/compose.yaml"), None, declared, defaults).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_validation() {
        assert!(ServiceName::new("api").is_ok());
        assert_eq!(ServiceName::new("  api ").unwrap().as_str(), "api");
        assert!(ServiceName::new("").is_err());
        assert!(ServiceName::new("a,b").is_err());
        assert!(ServiceName::new("a b").is_err());
    }

    #[test]
    fn test_profile_rejects_duplicate_declared() {
        let declared = vec![ServiceName::new("api").unwrap(), ServiceName::new("api").unwrap()];
        let err = Profile::new("p", "p", "compose.yaml", None, declared, vec![]);
        assert!(matches!(err, Err(CraneError::InvalidConfig { .. })));
    }

    #[test]
    fn test_profile_rejects_undeclared_default() {
        let declared = vec![ServiceName::new("api").unwrap()];
        let defaults = vec![ServiceName::new("worker").unwrap()];
        let err = Profile::new("p", "p", "compose.yaml", None, declared, defaults);
        assert!(matches!(err, Err(CraneError::InvalidConfig { .. })));
    }

    #[test]
    fn test_resolve_active_explicit() {
        let catalog =
            ProfileCatalog::new(vec![test_profile("dev", &["api"], &[])], None).unwrap();
        assert_eq!(catalog.resolve_active(Some("dev")).unwrap().name(), "dev");
        assert!(matches!(
            catalog.resolve_active(Some("prod")),
            Err(CraneError::ProfileNotFound { .. })
        ));
        // Case-sensitive match.
        assert!(catalog.resolve_active(Some("Dev")).is_err());
    }

    #[test]
    fn test_resolve_active_default() {
        let catalog = ProfileCatalog::new(
            vec![test_profile("dev", &["api"], &[])],
            Some("dev".to_string()),
        )
        .unwrap();
        assert_eq!(catalog.resolve_active(None).unwrap().name(), "dev");
    }

    #[test]
    fn test_resolve_active_no_default() {
        let catalog =
            ProfileCatalog::new(vec![test_profile("dev", &["api"], &[])], None).unwrap();
        assert!(matches!(catalog.resolve_active(None), Err(CraneError::NoDefaultProfile)));
    }

    #[test]
    fn test_catalog_rejects_unknown_default() {
        let err = ProfileCatalog::new(
            vec![test_profile("dev", &["api"], &[])],
            Some("prod".to_string()),
        );
        assert!(matches!(err, Err(CraneError::InvalidConfig { .. })));
    }
}
