//! Error types for crane.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crane operations.
pub type Result<T> = std::result::Result<T, CraneError>;

/// Main error type for crane.
#[derive(Error, Debug)]
pub enum CraneError {
    // Pre-execution validation errors. Raising any of these guarantees
    // that no subprocess has been spawned.
    #[error("Profile not found: {name}")]
    ProfileNotFound { name: String },

    #[error("No profile selected and no default profile is configured")]
    NoDefaultProfile,

    #[error("Unknown service '{name}': not declared in profile '{profile}'")]
    UnknownService { name: String, profile: String },

    #[error("No services to target: {reason}")]
    EmptyTargetSet { reason: String },

    #[error("Scale spec mismatch: {reason}")]
    ScaleSpecMismatch { reason: String },

    #[error("Conflicting selectors: {reason}")]
    ConflictingSelectors { reason: String },

    // Mid-execution fatal error: the backend CLI itself cannot run, so the
    // rest of the plan is abandoned.
    #[error("Swarm backend unavailable: {reason}")]
    EnvironmentUnavailable { reason: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CraneError {
    /// True for errors detected before any invocation runs.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound { .. }
                | Self::NoDefaultProfile
                | Self::UnknownService { .. }
                | Self::EmptyTargetSet { .. }
                | Self::ScaleSpecMismatch { .. }
                | Self::ConflictingSelectors { .. }
        )
    }
}
