//! Error types for jvmlayer
//!
//! All modules use `JvmLayerResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jvmlayer operations
pub type JvmLayerResult<T> = Result<T, JvmLayerError>;

/// All errors that can occur while resolving, fetching and assembling layers
#[derive(Error, Debug)]
pub enum JvmLayerError {
    // Resolution errors
    #[error("No valid dependencies for {id}, {version}, and {stack}")]
    NoValidDependencies {
        id: String,
        version: String,
        stack: String,
    },

    #[error("Invalid version constraint {constraint}: {reason}")]
    VersionConstraint { constraint: String, reason: String },

    // Integrity errors
    #[error("Dependency {id} declares an invalid sha256 '{sha256}'")]
    InvalidChecksum { id: String, sha256: String },

    #[error("SHA256 mismatch for {uri}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to download {uri}: {reason}")]
    Download { uri: String, reason: String },

    // Assembly errors
    #[error("Failed to expand archive into {path}: {reason}")]
    Extract { path: PathBuf, reason: String },

    #[error("Invalid certificate in {path}: {reason}")]
    CertificateParse { path: PathBuf, reason: String },

    #[error("Keystore {keystore} already holds a different certificate under alias {alias}")]
    AliasConflict { keystore: PathBuf, alias: String },

    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command {command} exited with code {code}: {output}")]
    CommandExit {
        command: String,
        code: i32,
        output: String,
    },

    #[error("{step}")]
    Step {
        step: String,
        #[source]
        source: Box<JvmLayerError>,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl JvmLayerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Wrap this error with the assembly step that produced it
    pub fn step(self, step: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// True when resolution found no candidate for the requested id/version/stack
    pub fn is_no_valid_dependencies(&self) -> bool {
        match self {
            Self::NoValidDependencies { .. } => true,
            Self::Step { source, .. } => source.is_no_valid_dependencies(),
            _ => false,
        }
    }

    /// Innermost error of a chain of step wrappers
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self.root_cause() {
            Self::NoValidDependencies { .. } => {
                Some("Check BP_JAVA_VERSION and the [[buildpack.dependencies]] stacks")
            }
            Self::InvalidChecksum { .. } => {
                Some("Set sha256 to the 64 hex character digest of the artifact")
            }
            Self::ChecksumMismatch { .. } => {
                Some("The artifact does not match its declared sha256; update the dependency entry")
            }
            Self::AliasConflict { .. } => {
                Some("Rename the certificate file so its derived alias is unique")
            }
            _ => None,
        }
    }
}

/// Attach an assembly step description to a failing result
pub trait StepContext<T> {
    fn step(self, step: impl FnOnce() -> String) -> JvmLayerResult<T>;
}

impl<T> StepContext<T> for JvmLayerResult<T> {
    fn step(self, step: impl FnOnce() -> String) -> JvmLayerResult<T> {
        self.map_err(|e| e.step(step()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = JvmLayerError::NoValidDependencies {
            id: "jre".to_string(),
            version: "11.*".to_string(),
            stack: "test-stack-id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No valid dependencies for jre, 11.*, and test-stack-id"
        );
    }

    #[test]
    fn step_wraps_and_keeps_source() {
        let err = JvmLayerError::Internal("boom".to_string()).step("unable to expand JDK");
        assert_eq!(err.to_string(), "unable to expand JDK");
        assert!(matches!(err.root_cause(), JvmLayerError::Internal(_)));

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Internal error: boom");
    }

    #[test]
    fn no_valid_dependencies_seen_through_steps() {
        let err = JvmLayerError::NoValidDependencies {
            id: "jre".to_string(),
            version: "8".to_string(),
            stack: "s".to_string(),
        }
        .step("unable to find dependency");
        assert!(err.is_no_valid_dependencies());
        assert!(!JvmLayerError::User("x".to_string()).is_no_valid_dependencies());
    }

    #[test]
    fn error_hint() {
        let err = JvmLayerError::ChecksumMismatch {
            uri: "https://localhost/stub.tar.gz".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        }
        .step("unable to get dependency jdk");
        assert!(err.hint().unwrap().contains("sha256"));
        assert_eq!(JvmLayerError::Internal("x".to_string()).hint(), None);
    }

    #[test]
    fn step_context_on_result() {
        let result: JvmLayerResult<()> = Err(JvmLayerError::User("bad".to_string()));
        let err = result.step(|| "unable to load certificates".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "unable to load certificates");
    }
}
