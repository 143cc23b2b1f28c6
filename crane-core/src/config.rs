//! Project configuration loading.
//!
//! `.crane.yaml` declares the profile catalog:
//!
//! ```yaml
//! default-profile: dev
//! profiles:
//!   dev:
//!     project-name: myapp
//!     config-path: containers/compose.yaml
//!     env-file: .env
//!     services:
//!       available: [api, worker, redis]
//!       default: [api, worker]
//! ```
//!
//! Loading validates the schema and the profile invariants up front, so the
//! rest of the system only ever sees well-formed profiles.

use crate::error::{CraneError, Result};
use crate::profile::{Profile, ProfileCatalog, ServiceName};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".crane.yaml";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    default_profile: Option<String>,
    profiles: HashMap<String, RawProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawProfile {
    #[serde(default)]
    project_name: Option<String>,
    config_path: OneOrMany,
    #[serde(default)]
    env_file: Option<PathBuf>,
    #[serde(default)]
    services: RawServices,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawServices {
    #[serde(default)]
    available: Vec<ServiceName>,
    #[serde(default)]
    default: Vec<ServiceName>,
}

/// `config-path` accepts a single path or a list; the first entry wins.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl OneOrMany {
    fn first(self) -> Option<PathBuf> {
        match self {
            Self::One(path) => Some(path),
            Self::Many(paths) => paths.into_iter().next(),
        }
    }
}

/// Load and validate the profile catalog from a `.crane.yaml` file.
pub fn load(path: &Path) -> Result<ProfileCatalog> {
    info!(path = %path.display(), "loading configuration");
    let content = std::fs::read_to_string(path)
        .map_err(|e| CraneError::Io { path: path.to_path_buf(), source: e })?;
    parse(&content)
}

/// Parse configuration from a YAML string.
pub fn parse(content: &str) -> Result<ProfileCatalog> {
    let raw: RawConfig = serde_yaml::from_str(content)
        .map_err(|e| CraneError::InvalidConfig { reason: e.to_string() })?;

    let mut profiles = Vec::with_capacity(raw.profiles.len());
    for (name, profile) in raw.profiles {
        let config_path =
            profile.config_path.first().ok_or_else(|| CraneError::InvalidConfig {
                reason: format!("profile '{name}': config-path is empty"),
            })?;
        let project_name = profile.project_name.unwrap_or_else(|| name.clone());
        profiles.push(Profile::new(
            name,
            project_name,
            config_path,
            profile.env_file,
            profile.services.available,
            profile.services.default,
        )?);
    }
    ProfileCatalog::new(profiles, raw.default_profile)
}

/// Parse a dotenv-style file into key/value pairs for subprocess
/// environments.
pub fn load_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    debug!(path = %path.display(), "loading env file");
    dotenvy::from_path_iter(path)
        .map_err(|e| CraneError::InvalidConfig {
            reason: format!("env file {}: {}", path.display(), e),
        })?
        .map(|entry| {
            entry.map_err(|e| CraneError::InvalidConfig {
                reason: format!("env file {}: {}", path.display(), e),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
default-profile: dev
profiles:
  dev:
    project-name: myapp
    config-path: containers/compose.yaml
    env-file: .env
    services:
      available: [api, worker, redis]
      default: [api, worker]
  prod:
    config-path:
      - containers/compose.prod.yaml
      - containers/compose.extra.yaml
    services:
      available: [api]
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = parse(SAMPLE).unwrap();
        let dev = catalog.resolve_active(None).unwrap();
        assert_eq!(dev.name(), "dev");
        assert_eq!(dev.project_name(), "myapp");
        assert_eq!(dev.declared_services().len(), 3);
        assert_eq!(dev.default_services().len(), 2);

        // List-valued config-path uses the first entry; project name
        // defaults to the profile name.
        let prod = catalog.resolve_active(Some("prod")).unwrap();
        assert_eq!(prod.project_name(), "prod");
        assert_eq!(prod.config_path(), &PathBuf::from("containers/compose.prod.yaml"));
    }

    #[test]
    fn test_parse_rejects_default_outside_available() {
        let content = r#"
profiles:
  dev:
    config-path: compose.yaml
    services:
      available: [api]
      default: [ghost]
"#;
        assert!(matches!(parse(content), Err(CraneError::InvalidConfig { .. })));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let content = r#"
profiles:
  dev:
    config-path: compose.yaml
    compose-path: other.yaml
"#;
        assert!(matches!(parse(content), Err(CraneError::InvalidConfig { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/nonexistent/.crane.yaml"));
        assert!(matches!(err, Err(CraneError::Io { .. })));
    }

    #[test]
    fn test_load_env_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "API_KEY=secret\n# comment\nPORT=8080").unwrap();
        let vars = load_env_file(file.path()).unwrap();
        assert!(vars.contains(&("API_KEY".to_string(), "secret".to_string())));
        assert!(vars.contains(&("PORT".to_string(), "8080".to_string())));
    }
}
