//! Credential resolution from the environment or the local credential file
//!
//! Environment variables are checked in priority order and the first one
//! holding a non-blank value wins. Only when none does is the credential
//! file read. The two sources are never merged.
//!
//! The resolved value is held in a [`secrecy::SecretString`] so it cannot
//! leak through `Debug` output.

use crate::core::config::CredentialSettings;
use crate::core::error::{MatrixError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Primary credential variable, also the one injected into the runner env
pub const PRIMARY_CREDENTIAL_VAR: &str = "POE_API_KEY";

/// Fallback credential variable
pub const FALLBACK_CREDENTIAL_VAR: &str = "POE_CODE_API_KEY";

/// Field holding the key inside the credential file
pub const CREDENTIAL_FIELD: &str = "apiKey";

/// Credential file location relative to the user's home directory
pub const CREDENTIAL_FILE: &str = ".poe-code/credentials.json";

/// Where a credential came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    EnvVar(String),
    File(PathBuf),
}

/// A resolved, trimmed, non-empty API key
#[derive(Debug)]
pub struct Credential {
    value: SecretString,
    source: CredentialSource,
}

impl Credential {
    /// Wrap an already validated value
    pub fn new(value: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            value: SecretString::new(value.into().into_boxed_str()),
            source,
        }
    }

    /// Expose the raw key; callers must never print the result
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }
}

/// Resolves the run's credential
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    env_vars: Vec<String>,
    file_path: Option<PathBuf>,
    field: String,
    login_hint: String,
}

impl CredentialResolver {
    /// Build a resolver from configuration
    ///
    /// `home` anchors a relative credential file path; without it only an
    /// absolute path can be read.
    pub fn new(settings: &CredentialSettings, home: Option<&Path>, login_hint: &str) -> Self {
        let file_path = if settings.file.is_absolute() {
            Some(settings.file.clone())
        } else {
            home.map(|home| home.join(&settings.file))
        };

        Self {
            env_vars: settings.env_vars.clone(),
            file_path,
            field: settings.field.clone(),
            login_hint: login_hint.to_string(),
        }
    }

    /// Path of the credential file, when one can be located
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Resolve the credential from `env`, falling back to the credential file
    ///
    /// # Errors
    ///
    /// - `MatrixError::MissingCredential` - no variable is set, the file is
    ///   absent, or its key field is missing, not a string, or blank
    /// - `MatrixError::InvalidCredentialFile` - the file is not a JSON object
    pub fn resolve(&self, env: &HashMap<String, String>) -> Result<Credential> {
        for name in &self.env_vars {
            if let Some(value) = env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
                tracing::debug!(source = %name, "credential resolved from environment");
                return Ok(Credential::new(value, CredentialSource::EnvVar(name.clone())));
            }
        }

        let Some(path) = &self.file_path else {
            return Err(self.missing_everywhere());
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(self.missing_everywhere());
            }
            Err(e) => {
                return Err(self.invalid_file(path, format!("cannot read file: {}", e)));
            }
        };

        let payload: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| self.invalid_file(path, format!("invalid JSON: {}", e)))?;

        let Some(record) = payload.as_object() else {
            return Err(self.invalid_file(path, "expected a JSON object".to_string()));
        };

        let value = record
            .get(&self.field)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MatrixError::MissingCredential {
                detail: format!(
                    "missing {} in {}; set {} to override",
                    self.field,
                    path.display(),
                    self.override_var()
                ),
            })?;

        tracing::debug!(path = %path.display(), "credential resolved from file");
        Ok(Credential::new(value, CredentialSource::File(path.clone())))
    }

    fn override_var(&self) -> &str {
        self.env_vars
            .first()
            .map(String::as_str)
            .unwrap_or(PRIMARY_CREDENTIAL_VAR)
    }

    fn missing_everywhere(&self) -> MatrixError {
        MatrixError::MissingCredential {
            detail: format!(
                "set {} or login locally via `{}`",
                self.env_vars.join(" or "),
                self.login_hint
            ),
        }
    }

    fn invalid_file(&self, path: &Path, reason: String) -> MatrixError {
        MatrixError::InvalidCredentialFile {
            path: path.to_path_buf(),
            reason,
            override_var: self.override_var().to_string(),
        }
    }
}
