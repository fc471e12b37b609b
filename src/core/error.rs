//! Error handling for the provider test matrix
//!
//! This module provides the error taxonomy with recovery guidance
//! using the thiserror crate for ergonomic error handling.
//!
//! No variant's `Display` output ever contains a raw command sequence:
//! group failures carry their target for later redaction instead.

use crate::security::redactor::FailureTarget;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for matrix runs
#[derive(Error, Debug)]
pub enum MatrixError {
    // Credential errors
    #[error("Missing credentials: {detail}")]
    MissingCredential { detail: String },

    #[error("Invalid credential file {}: {reason}; set {override_var} to override", .path.display())]
    InvalidCredentialFile {
        path: PathBuf,
        reason: String,
        override_var: String,
    },

    // Execution errors
    #[error("Command group {group_index} failed with exit code {exit_code}")]
    GroupExecutionFailed {
        group_index: usize,
        exit_code: i32,
        target: FailureTarget,
    },

    #[error("Runner not found at {}", .0.display())]
    RunnerNotFound(PathBuf),

    #[error("Failed to launch runner {}: {reason}", .runner.display())]
    RunnerLaunchFailed { runner: PathBuf, reason: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for matrix operations.
pub type Result<T> = std::result::Result<T, MatrixError>;

impl MatrixError {
    /// Check if this error can be fixed by the user without code changes
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. }
                | Self::InvalidCredentialFile { .. }
                | Self::RunnerNotFound(_)
                | Self::ConfigError(_)
        )
    }

    /// Process exit code for this error
    ///
    /// Group failures propagate the runner's exit code verbatim; every
    /// other failure maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::GroupExecutionFailed { exit_code, .. } => *exit_code,
            _ => 1,
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingCredential { .. } => vec![
                "Set POE_API_KEY (or POE_CODE_API_KEY) in the environment",
                "Login locally via `poe-code login`",
            ],
            Self::InvalidCredentialFile { .. } => vec![
                "Fix or delete the credential file and login again",
                "Set POE_API_KEY to bypass the credential file",
            ],
            Self::GroupExecutionFailed { .. } => vec![
                "Inspect the runner output above the failure line",
                "Re-run with --verbose for runner diagnostics",
            ],
            Self::RunnerNotFound(_) => vec![
                "Check --repo-root points at the repository root",
                "Pass the runner script explicitly with --runner",
            ],
            Self::RunnerLaunchFailed { .. } => {
                vec!["Make sure the runner script is executable (chmod +x)"]
            }
            Self::ConfigError(_) => vec!["Check .matrix-config.yaml against the documented keys"],
            Self::Io(_) => vec!["Check file permissions and available disk space"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "MISSING_CREDENTIAL",
            Self::InvalidCredentialFile { .. } => "INVALID_CREDENTIAL_FILE",
            Self::GroupExecutionFailed { .. } => "GROUP_EXECUTION_FAILED",
            Self::RunnerNotFound(_) => "RUNNER_NOT_FOUND",
            Self::RunnerLaunchFailed { .. } => "RUNNER_LAUNCH_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}
