//! Matrix Runner - Wires credential resolution, environment composition
//! and group execution into one run, and converts the outcome into a
//! process exit code.
//!
//! This is the only place where failures become printed diagnostics.
//! Group failures are always rendered through the [`CommandRedactor`].

use crate::core::config::MatrixConfig;
use crate::core::error::{MatrixError, Result};
use crate::core::traits::RunnerLauncher;
use crate::orchestration::environment::EnvironmentComposer;
use crate::orchestration::group_executor::GroupExecutor;
use crate::security::credential_resolver::CredentialResolver;
use crate::security::login::login_command;
use crate::security::redactor::CommandRedactor;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

/// One configured run of the test matrix
pub struct MatrixRunner<L> {
    config: MatrixConfig,
    executor: GroupExecutor<L>,
    redactor: CommandRedactor,
}

impl<L: RunnerLauncher> MatrixRunner<L> {
    pub fn new(config: MatrixConfig, launcher: L) -> Self {
        let redactor = CommandRedactor::new(&config.login_program);
        let executor = GroupExecutor::new(config.runner.clone(), launcher, redactor.clone())
            .with_reset_command(config.reset_command.clone());

        Self {
            config,
            executor,
            redactor,
        }
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    pub fn executor(&self) -> &GroupExecutor<L> {
        &self.executor
    }

    /// Resolve, compose and execute, propagating the first failure
    ///
    /// `base_env` is the environment snapshot the run starts from; it is
    /// never modified.
    pub async fn run_groups<W: Write + Send>(
        &self,
        base_env: &HashMap<String, String>,
        out: &mut W,
    ) -> Result<()> {
        self.executor.launcher().check_runner(self.executor.runner())?;

        let home = base_env.get("HOME").filter(|h| !h.is_empty()).map(PathBuf::from);
        let resolver = CredentialResolver::new(
            &self.config.credential,
            home.as_deref(),
            &self.config.login_program,
        );
        let credential = resolver.resolve(base_env)?;

        let composer =
            EnvironmentComposer::new(&self.config.runner_flags, &self.config.injected_var)
                .with_credential_vars(&self.config.credential.env_vars);
        let env = composer.compose(base_env, &credential);

        let login = login_command(&self.config.login_program, credential.expose());

        self.executor
            .execute(&self.config.groups, &login, &env, out)
            .await
    }

    /// Run the matrix and return the process exit code
    ///
    /// 0 on success, the runner's exit code on a group failure, 1 otherwise.
    pub async fn run<W, E>(&self, base_env: &HashMap<String, String>, out: &mut W, err: &mut E) -> i32
    where
        W: Write + Send,
        E: Write,
    {
        match self.run_groups(base_env, out).await {
            Ok(()) => 0,
            Err(error) => report_failure(&error, &self.redactor, err),
        }
    }
}

/// Print a diagnostic for `error` and return its exit code
pub fn report_failure<E: Write>(error: &MatrixError, redactor: &CommandRedactor, err: &mut E) -> i32 {
    let mut lines = vec![match error {
        MatrixError::GroupExecutionFailed {
            exit_code, target, ..
        } => format!(
            "\nCommand failed with exit code {}: {}",
            exit_code,
            redactor.redact_failure_target(target)
        ),
        other => format!("\nUnexpected error: {}", other),
    }];

    if error.is_recoverable() {
        lines.extend(
            error
                .suggested_actions()
                .into_iter()
                .map(|action| format!("  💡 {}", action)),
        );
    }

    tracing::debug!(code = error.code(), "run failed");
    // Nothing left to report to if stderr itself is gone
    for line in &lines {
        let _ = writeln!(err, "{}", line);
    }
    let _ = err.flush();

    error.exit_code()
}
