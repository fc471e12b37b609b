//! Execution environment composition for the container runner
//!
//! The composer never touches the process environment: it copies a base
//! snapshot, injects the credential and augments the runner-flag string.
//! Flag augmentation is idempotent, so composing an already composed
//! environment adds nothing.

use crate::core::config::{CredentialSettings, RunnerFlagSettings};
use crate::security::credential_resolver::Credential;
use crate::security::redactor::MASK;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Immutable variable mapping handed to every runner invocation
#[derive(Clone, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    vars: HashMap<String, String>,
    masked_vars: BTreeSet<String>,
}

impl ExecutionEnvironment {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl fmt::Debug for ExecutionEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sorted: BTreeMap<&str, &str> = self
            .vars
            .iter()
            .map(|(name, value)| {
                if self.masked_vars.contains(name) {
                    (name.as_str(), MASK)
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("ExecutionEnvironment")
            .field("vars", &sorted)
            .finish()
    }
}

/// Builds [`ExecutionEnvironment`] values
#[derive(Debug, Clone)]
pub struct EnvironmentComposer {
    injected_var: String,
    credential_vars: Vec<String>,
    flag_vars: Vec<String>,
    required_flags: Vec<String>,
}

impl EnvironmentComposer {
    pub fn new(settings: &RunnerFlagSettings, injected_var: &str) -> Self {
        Self {
            injected_var: injected_var.to_string(),
            credential_vars: Vec::new(),
            flag_vars: settings.env_vars.clone(),
            required_flags: settings.required.clone(),
        }
    }

    /// Variables the credential may have been read from; masked in `Debug`
    pub fn with_credential_vars(mut self, names: &[String]) -> Self {
        self.credential_vars = names.to_vec();
        self
    }

    /// Compose the runner environment from a base snapshot
    ///
    /// The credential is set as the injected variable and every flag
    /// variable receives the same augmented flag string.
    pub fn compose(
        &self,
        base: &HashMap<String, String>,
        credential: &Credential,
    ) -> ExecutionEnvironment {
        let mut vars = base.clone();
        vars.insert(self.injected_var.clone(), credential.expose().to_string());

        let existing = self
            .flag_vars
            .iter()
            .filter_map(|name| vars.get(name))
            .find(|value| !value.is_empty())
            .cloned()
            .unwrap_or_default();
        let flags = self.augment_flags(&existing);

        tracing::debug!(flags = %flags, vars = ?self.flag_vars, "runner flags composed");

        for name in &self.flag_vars {
            vars.insert(name.clone(), flags.clone());
        }

        let secret = credential.expose();
        let masked_vars = vars
            .iter()
            .filter(|(name, value)| {
                **name == self.injected_var
                    || self.credential_vars.contains(*name)
                    || value.contains(secret)
            })
            .map(|(name, _)| name.clone())
            .collect();

        ExecutionEnvironment { vars, masked_vars }
    }

    /// Append each required flag not already present as a substring
    pub fn augment_flags(&self, existing: &str) -> String {
        let mut flags = existing.to_string();
        for flag in &self.required_flags {
            if !flags.contains(flag.as_str()) {
                flags = format!("{} {}", flags, flag).trim().to_string();
            }
        }
        flags
    }
}

impl Default for EnvironmentComposer {
    fn default() -> Self {
        Self::new(
            &RunnerFlagSettings::default(),
            crate::security::credential_resolver::PRIMARY_CREDENTIAL_VAR,
        )
        .with_credential_vars(&CredentialSettings::default().env_vars)
    }
}
