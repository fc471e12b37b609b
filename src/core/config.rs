//! Configuration structures and types for provider-test-matrix
//!
//! This module provides type-safe configuration management with serde support.
//! [`MatrixConfig`] is the fully resolved form; [`MatrixConfigFile`] is the
//! partial form read from YAML files and CLI flags and merged over defaults.

use crate::security::credential_resolver::{
    CREDENTIAL_FIELD, CREDENTIAL_FILE, FALLBACK_CREDENTIAL_VAR, PRIMARY_CREDENTIAL_VAR,
};
use crate::security::login::DEFAULT_LOGIN_PROGRAM;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current configuration schema version
pub const CONFIG_VERSION: &str = "1.0";

/// Runner script location relative to the repository root
pub const DEFAULT_RUNNER: &str = "scripts/colima-runner.sh";

/// Runner-flag variables; the first non-empty one is read, both are written
pub const RUNNER_FLAG_VARS: &[&str] = &["RUNNER_DOCKER_ARGS", "COLIMA_DOCKER_ARGS"];

/// Flags every runner invocation needs
pub const REQUIRED_RUNNER_FLAGS: &[&str] = &["-e POE_CODE_STDERR_LOGS=1", "-e POE_API_KEY"];

/// Providers exercised by the built-in matrix
pub const DEFAULT_PROVIDERS: &[&str] = &["claude-code", "codex", "opencode"];

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatrixConfig {
    /// Schema version
    pub version: String,

    /// Runner executable; relative paths are anchored at the repository root
    pub runner: PathBuf,

    /// Login program, without the `--api-key` flag
    pub login_program: String,

    /// Command run before the login command in every group (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_command: Option<String>,

    /// Where the credential is looked up
    pub credential: CredentialSettings,

    /// Runner-flag handling
    pub runner_flags: RunnerFlagSettings,

    /// Variable the resolved credential is injected as
    pub injected_var: String,

    /// Command groups, executed in order
    pub groups: Vec<CommandGroup>,
}

/// Credential lookup settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSettings {
    /// Variables checked in priority order
    pub env_vars: Vec<String>,

    /// Credential file; relative paths are anchored at the home directory
    pub file: PathBuf,

    /// JSON field holding the key
    pub field: String,
}

/// Runner-flag settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunnerFlagSettings {
    /// Variables holding the flag string
    pub env_vars: Vec<String>,

    /// Flags appended when not already present
    pub required: Vec<String>,
}

/// One atomic test scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandGroup {
    /// Display name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Shell commands, run in order by the runner
    pub commands: Vec<String>,
}

impl CommandGroup {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Partial configuration as read from a file or assembled from CLI flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatrixConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_program: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialSettingsFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner_flags: Option<RunnerFlagSettingsFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_var: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<CommandGroup>>,
}

/// Partial credential settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSettingsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Partial runner-flag settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunnerFlagSettingsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// Built-in groups: a configured run and an isolated run per provider
pub fn default_groups() -> Vec<CommandGroup> {
    DEFAULT_PROVIDERS
        .iter()
        .flat_map(|provider| {
            [
                CommandGroup::new([
                    format!("poe-code install {}", provider),
                    format!("poe-code configure {} --yes", provider),
                    format!("poe-code test {}", provider),
                ])
                .named(format!("{} (configured)", provider)),
                CommandGroup::new([
                    format!("poe-code install {}", provider),
                    format!("poe-code test {} --isolated", provider),
                ])
                .named(format!("{} (isolated)", provider)),
            ]
        })
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Default configuration values
impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            runner: PathBuf::from(DEFAULT_RUNNER),
            login_program: DEFAULT_LOGIN_PROGRAM.to_string(),
            reset_command: None,
            credential: CredentialSettings::default(),
            runner_flags: RunnerFlagSettings::default(),
            injected_var: PRIMARY_CREDENTIAL_VAR.to_string(),
            groups: default_groups(),
        }
    }
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            env_vars: strings(&[PRIMARY_CREDENTIAL_VAR, FALLBACK_CREDENTIAL_VAR]),
            file: PathBuf::from(CREDENTIAL_FILE),
            field: CREDENTIAL_FIELD.to_string(),
        }
    }
}

impl Default for RunnerFlagSettings {
    fn default() -> Self {
        Self {
            env_vars: strings(RUNNER_FLAG_VARS),
            required: strings(REQUIRED_RUNNER_FLAGS),
        }
    }
}
