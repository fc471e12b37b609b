//! Group Executor - Runs command groups through the runner, one at a time
//!
//! Features:
//! - Login command prepended to every group
//! - Redacted echo of every command before it runs
//! - Fail-fast: the first non-zero runner exit aborts the whole run
//!
//! Groups run strictly in order; group N+1 is never launched before the
//! runner for group N has exited with 0.

use crate::core::config::CommandGroup;
use crate::core::error::{MatrixError, Result};
use crate::core::traits::RunnerLauncher;
use crate::orchestration::environment::ExecutionEnvironment;
use crate::security::redactor::{CommandRedactor, FailureTarget};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Executes command groups with a [`RunnerLauncher`]
pub struct GroupExecutor<L> {
    runner: PathBuf,
    launcher: L,
    redactor: CommandRedactor,
    reset_command: Option<String>,
}

impl<L: RunnerLauncher> GroupExecutor<L> {
    /// Create an executor for `runner`
    pub fn new<P: Into<PathBuf>>(runner: P, launcher: L, redactor: CommandRedactor) -> Self {
        Self {
            runner: runner.into(),
            launcher,
            redactor,
            reset_command: None,
        }
    }

    /// Run `command` before the login command in every group
    pub fn with_reset_command(mut self, command: Option<String>) -> Self {
        self.reset_command = command;
        self
    }

    pub fn runner(&self) -> &Path {
        &self.runner
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Full argument list for one group: `[reset?, login, ...commands]`
    pub fn command_sequence(&self, login_command: &str, group: &CommandGroup) -> Vec<String> {
        let mut sequence = Vec::with_capacity(group.commands.len() + 2);
        if let Some(reset) = &self.reset_command {
            sequence.push(reset.clone());
        }
        sequence.push(login_command.to_string());
        sequence.extend(group.commands.iter().cloned());
        sequence
    }

    /// Execute `groups` in order, writing progress to `out`
    ///
    /// # Errors
    ///
    /// - `MatrixError::GroupExecutionFailed` - a runner exited non-zero; no
    ///   later group was started
    /// - `MatrixError::RunnerLaunchFailed` - the runner could not be spawned
    /// - `MatrixError::Io` - progress output could not be written
    pub async fn execute<W: Write + Send>(
        &self,
        groups: &[CommandGroup],
        login_command: &str,
        env: &ExecutionEnvironment,
        out: &mut W,
    ) -> Result<()> {
        for (index, group) in groups.iter().enumerate().map(|(i, g)| (i + 1, g)) {
            let sequence = self.command_sequence(login_command, group);

            writeln!(out, "\n=== Command group {} ===", index)?;
            for command in &sequence {
                writeln!(out, "\n>>> {}", self.redactor.redact(command))?;
            }
            out.flush()?;

            tracing::info!(
                group = index,
                name = group.name.as_deref().unwrap_or(""),
                steps = sequence.len(),
                "running command group"
            );

            let exit = self.launcher.launch(&self.runner, &sequence, env).await?;

            if !exit.is_success() {
                tracing::warn!(group = index, code = exit.code, "command group failed");
                let target = FailureTarget::from_commands(
                    std::iter::once(self.runner.display().to_string()).chain(sequence),
                );
                return Err(MatrixError::GroupExecutionFailed {
                    group_index: index,
                    exit_code: exit.code,
                    target,
                });
            }
        }

        tracing::info!(groups = groups.len(), "all command groups passed");
        Ok(())
    }
}
