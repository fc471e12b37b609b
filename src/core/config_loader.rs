//! Configuration file loader for provider-test-matrix
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::{MatrixError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name, looked up in the repository root
pub const CONFIG_FILENAME: &str = ".matrix-config.yaml";

/// Environment variable overriding the runner path
pub const RUNNER_ENV_VAR: &str = "MATRIX_RUNNER";

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Repository root; anchors the config file and a relative runner path
    pub repo_root: PathBuf,

    /// Explicit config file; must exist when given
    pub config_path: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: Option<MatrixConfigFile>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "groups[2].commands")
    pub field: String,
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Explicit config file, or ./.matrix-config.yaml in the repo root
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<MatrixConfig> {
        let mut layers: Vec<MatrixConfigFile> = Vec::new();

        match &options.config_path {
            Some(path) => {
                let layer = Self::load_config_file(path).await?.ok_or_else(|| {
                    MatrixError::ConfigError(format!(
                        "Config file not found: {}",
                        path.display()
                    ))
                })?;
                layers.push(layer);
            }
            None => {
                let project_path = options.repo_root.join(CONFIG_FILENAME);
                if let Some(layer) = Self::load_config_file(&project_path).await? {
                    layers.push(layer);
                }
            }
        }

        if let Some(env_layer) = Self::load_env_config(&options.env) {
            layers.push(env_layer);
        }

        if let Some(cli_layer) = options.cli_args {
            layers.push(cli_layer);
        }

        let mut config = Self::merge_configs(MatrixConfig::default(), layers);

        if config.runner.is_relative() {
            config.runner = options.repo_root.join(&config.runner);
        }

        let validation = Self::validate(&config);
        for warning in &validation.warnings {
            tracing::warn!(field = %warning.field, "{}", warning.message);
        }
        if !validation.valid {
            return Err(MatrixError::ConfigError(Self::format_validation_result(
                &validation,
            )));
        }

        tracing::debug!(
            runner = %config.runner.display(),
            groups = config.groups.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load a YAML config file; `Ok(None)` when it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<MatrixConfigFile>> {
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            MatrixError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: MatrixConfigFile = serde_yaml::from_str(&content).map_err(|e| {
            MatrixError::ConfigError(format!(
                "Failed to parse YAML config {}: {}",
                file_path.display(),
                e
            ))
        })?;

        Ok(Some(config))
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<MatrixConfigFile> {
        let runner = env
            .get(RUNNER_ENV_VAR)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())?;

        Some(MatrixConfigFile {
            runner: Some(PathBuf::from(runner)),
            ..Default::default()
        })
    }

    /// Merge layers over a base configuration, later layers winning
    fn merge_configs(base: MatrixConfig, layers: Vec<MatrixConfigFile>) -> MatrixConfig {
        let mut result = base;

        for layer in layers {
            Self::merge_into(&mut result, layer);
        }

        result
    }

    /// Merge source layer into target
    fn merge_into(target: &mut MatrixConfig, source: MatrixConfigFile) {
        if let Some(version) = source.version {
            target.version = version;
        }
        if let Some(runner) = source.runner {
            target.runner = runner;
        }
        if let Some(login_program) = source.login_program {
            target.login_program = login_program;
        }
        if source.reset_command.is_some() {
            target.reset_command = source.reset_command;
        }
        if let Some(injected_var) = source.injected_var {
            target.injected_var = injected_var;
        }

        // Credential
        if let Some(credential) = source.credential {
            if let Some(env_vars) = credential.env_vars {
                target.credential.env_vars = env_vars;
            }
            if let Some(file) = credential.file {
                target.credential.file = file;
            }
            if let Some(field) = credential.field {
                target.credential.field = field;
            }
        }

        // Runner flags
        if let Some(flags) = source.runner_flags {
            if let Some(env_vars) = flags.env_vars {
                target.runner_flags.env_vars = env_vars;
            }
            if let Some(required) = flags.required {
                target.runner_flags.required = required;
            }
        }

        // Groups replace the built-in list wholesale
        if let Some(groups) = source.groups {
            target.groups = groups;
        }
    }

    /// Validate configuration
    pub fn validate(config: &MatrixConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Version
        if config.version != CONFIG_VERSION {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some(format!(
                    "Currently supported version is \"{}\" only",
                    CONFIG_VERSION
                )),
            });
        }

        // 2. Login program
        if config.login_program.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "loginProgram".to_string(),
                message: "loginProgram must not be empty".to_string(),
            });
        }

        // 3. Credential and flag variables
        if config.credential.env_vars.is_empty() {
            errors.push(ConfigValidationError {
                field: "credential.envVars".to_string(),
                message: "at least one credential variable is required".to_string(),
            });
        }
        if config.runner_flags.env_vars.is_empty() {
            errors.push(ConfigValidationError {
                field: "runnerFlags.envVars".to_string(),
                message: "at least one runner-flag variable is required".to_string(),
            });
        }
        if config.injected_var.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "injectedVar".to_string(),
                message: "injectedVar must not be empty".to_string(),
            });
        }

        // 4. Groups
        Self::validate_groups(&config.groups, &mut errors, &mut warnings);

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Validate command groups
    fn validate_groups(
        groups: &[CommandGroup],
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        if groups.is_empty() {
            errors.push(ConfigValidationError {
                field: "groups".to_string(),
                message: "at least one command group is required".to_string(),
            });
            return;
        }

        for (index, group) in groups.iter().enumerate() {
            if group.commands.is_empty() {
                warnings.push(ConfigValidationWarning {
                    field: format!("groups[{}].commands", index),
                    message: "group has no commands; only the login step will run".to_string(),
                    suggestion: Some("Remove the group or add commands".to_string()),
                });
            }

            for (position, command) in group.commands.iter().enumerate() {
                if command.trim().is_empty() {
                    errors.push(ConfigValidationError {
                        field: format!("groups[{}].commands[{}]", index, position),
                        message: "command must not be blank".to_string(),
                    });
                }
            }
        }
    }

    /// Format validation result for display
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut output = String::new();

        if result.valid {
            output.push_str("✅ Configuration is valid\n");
        } else {
            output.push_str("❌ Configuration has errors\n");
        }

        if !result.errors.is_empty() {
            output.push_str("\n🔴 Errors:\n");
            for error in &result.errors {
                output.push_str(&format!("  - [{}] {}\n", error.field, error.message));
            }
        }

        if !result.warnings.is_empty() {
            output.push_str("\n🟡 Warnings:\n");
            for warning in &result.warnings {
                output.push_str(&format!("  - [{}] {}\n", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    output.push_str(&format!("    💡 {}\n", suggestion));
                }
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options_for(root: &Path) -> ConfigLoadOptions {
        ConfigLoadOptions {
            repo_root: root.to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_defaults_without_config_file() {
        let root = TempDir::new().unwrap();

        let config = ConfigLoader::load(options_for(root.path())).await.unwrap();

        assert_eq!(config.runner, root.path().join("scripts/colima-runner.sh"));
        assert_eq!(config.groups, default_groups());
    }

    #[tokio::test]
    async fn test_project_config_replaces_groups() {
        let root = TempDir::new().unwrap();
        std::fs::write(
            root.path().join(CONFIG_FILENAME),
            "groups:\n  - commands: [cmd1, cmd2]\n  - commands: [cmd3]\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options_for(root.path())).await.unwrap();

        assert_eq!(
            config.groups,
            vec![
                CommandGroup::new(["cmd1", "cmd2"]),
                CommandGroup::new(["cmd3"])
            ]
        );
        assert_eq!(config.login_program, "poe-code login");
    }

    #[tokio::test]
    async fn test_explicit_config_path_must_exist() {
        let root = TempDir::new().unwrap();
        let mut options = options_for(root.path());
        options.config_path = Some(root.path().join("missing.yaml"));

        let err = ConfigLoader::load(options).await.unwrap_err();

        assert!(matches!(err, MatrixError::ConfigError(_)));
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_config_error() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join(CONFIG_FILENAME), "groups: [[[").unwrap();

        let err = ConfigLoader::load(options_for(root.path())).await.unwrap_err();

        assert!(matches!(err, MatrixError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_priority_cli_over_env_over_file() {
        let root = TempDir::new().unwrap();
        std::fs::write(
            root.path().join(CONFIG_FILENAME),
            "runner: /from/file.sh\nloginProgram: file-login\n",
        )
        .unwrap();

        let mut options = options_for(root.path());
        options
            .env
            .insert(RUNNER_ENV_VAR.to_string(), "/from/env.sh".to_string());
        let config = ConfigLoader::load(options.clone()).await.unwrap();
        assert_eq!(config.runner, PathBuf::from("/from/env.sh"));
        assert_eq!(config.login_program, "file-login");

        options.cli_args = Some(MatrixConfigFile {
            runner: Some(PathBuf::from("/from/cli.sh")),
            ..Default::default()
        });
        let config = ConfigLoader::load(options).await.unwrap();
        assert_eq!(config.runner, PathBuf::from("/from/cli.sh"));
    }

    #[test]
    fn test_load_env_config_ignores_blank_runner() {
        let mut env = HashMap::new();
        env.insert(RUNNER_ENV_VAR.to_string(), "  ".to_string());

        assert!(ConfigLoader::load_env_config(&env).is_none());
    }

    #[test]
    fn test_merge_nested_settings_keeps_unset_fields() {
        let layer = MatrixConfigFile {
            credential: Some(CredentialSettingsFile {
                env_vars: Some(vec!["MY_KEY".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = ConfigLoader::merge_configs(MatrixConfig::default(), vec![layer]);

        assert_eq!(merged.credential.env_vars, vec!["MY_KEY".to_string()]);
        assert_eq!(merged.credential.field, "apiKey");
        assert_eq!(merged.runner_flags, RunnerFlagSettings::default());
    }

    #[test]
    fn test_validate_default_config() {
        let result = ConfigLoader::validate(&MatrixConfig::default());

        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_empty_groups() {
        let config = MatrixConfig {
            groups: Vec::new(),
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "groups");
    }

    #[test]
    fn test_validate_blank_command() {
        let config = MatrixConfig {
            groups: vec![CommandGroup::new(["ok", "  "])],
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "groups[0].commands[1]");
    }

    #[test]
    fn test_validate_unknown_version_warning() {
        let config = MatrixConfig {
            version: "2.0".to_string(),
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);

        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "version");
    }

    #[test]
    fn test_format_validation_result() {
        let result = ConfigValidationResult {
            valid: false,
            errors: vec![ConfigValidationError {
                field: "groups".to_string(),
                message: "at least one command group is required".to_string(),
            }],
            warnings: vec![ConfigValidationWarning {
                field: "version".to_string(),
                message: "Unknown version: 2.0".to_string(),
                suggestion: None,
            }],
        };

        let formatted = ConfigLoader::format_validation_result(&result);

        assert!(formatted.contains("❌ Configuration has errors"));
        assert!(formatted.contains("🔴 Errors:"));
        assert!(formatted.contains("[groups]"));
        assert!(formatted.contains("🟡 Warnings:"));
        assert!(formatted.contains("[version]"));
    }
}
