//! Unified error types for the xaas workspace.
//!
//! The four build-time categories (configuration, content loading,
//! packaging, resource creation) are unrecoverable at the graph-building
//! level: the first one raised aborts the whole build.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum XaasError {
    /// A required configuration parameter is missing or invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A content file or its sidecar metadata is missing or malformed.
    #[error("failed to load content from {path}: {message}")]
    ContentLoad {
        /// Path of the content source that failed.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Packaging a function's code artifact failed.
    #[error("failed to package function \"{stack}\": {message}")]
    Build {
        /// Stack whose function failed to package.
        stack: String,
        /// Description of the failure.
        message: String,
    },

    /// The provisioning layer rejected a resource declaration.
    #[error("failed to declare {kind} \"{name}\": {message}")]
    ResourceCreation {
        /// Kind of the rejected resource.
        kind: String,
        /// Logical name of the rejected resource.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// A bounded retry loop ran out of attempts.
    #[error("gave up after {attempts} attempts: {message}")]
    Exhaustion {
        /// Number of attempts made.
        attempts: u32,
        /// What was being attempted.
        message: String,
    },

    /// A backing store used by a deployed function failed.
    #[error("store error: {message}")]
    Store {
        /// Description of the failure.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl XaasError {
    /// Shorthand for a [`XaasError::Configuration`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a [`XaasError::ContentLoad`] error.
    pub fn content(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ContentLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true for the categories that abort graph construction.
    #[must_use]
    pub const fn is_fatal_to_build(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::ContentLoad { .. }
                | Self::Build { .. }
                | Self::ResourceCreation { .. }
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, XaasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_categories_are_fatal() {
        assert!(XaasError::config("missing animal").is_fatal_to_build());
        assert!(XaasError::content("/tmp/facts.txt", "not found").is_fatal_to_build());
        assert!(
            XaasError::Build {
                stack: "facts".into(),
                message: "make failed".into(),
            }
            .is_fatal_to_build()
        );
        assert!(
            XaasError::ResourceCreation {
                kind: "Function".into(),
                name: "caas-lambda-facts".into(),
                message: "rejected".into(),
            }
            .is_fatal_to_build()
        );
    }

    #[test]
    fn runtime_categories_are_not_build_fatal() {
        let err = XaasError::Exhaustion {
            attempts: 3,
            message: "token space".into(),
        };
        assert!(!err.is_fatal_to_build());
        assert!(!XaasError::Store { message: "down".into() }.is_fatal_to_build());
    }

    #[test]
    fn content_error_message_includes_path() {
        let err = XaasError::content("/assets/facts.txt", "no such file");
        let msg = err.to_string();
        assert!(msg.contains("/assets/facts.txt"), "got: {msg}");
        assert!(msg.contains("no such file"), "got: {msg}");
    }
}
