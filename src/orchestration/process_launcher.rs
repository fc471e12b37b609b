//! TokioProcessLauncher: runs the external runner as a child process
//!
//! # Behaviour
//!
//! - **No shell interpolation**: each command string is passed to the runner
//!   as one positional argument via `tokio::process::Command`
//! - **Exact environment**: the child sees only the composed environment
//! - **Inherited stdio**: runner output streams straight to the terminal
//! - **No timeout**: the launcher waits until the runner exits

use crate::core::error::{MatrixError, Result};
use crate::core::traits::{RunnerExit, RunnerLauncher};
use crate::orchestration::environment::ExecutionEnvironment;
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Launches the runner with `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessLauncher;

impl TokioProcessLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RunnerLauncher for TokioProcessLauncher {
    fn check_runner(&self, runner: &Path) -> Result<()> {
        if !runner.exists() {
            return Err(MatrixError::RunnerNotFound(runner.to_path_buf()));
        }
        Ok(())
    }

    async fn launch(
        &self,
        runner: &Path,
        args: &[String],
        env: &ExecutionEnvironment,
    ) -> Result<RunnerExit> {
        tracing::debug!(runner = %runner.display(), steps = args.len(), "launching runner");

        let status = Command::new(runner)
            .args(args)
            .env_clear()
            .envs(env.vars())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| MatrixError::RunnerLaunchFailed {
                runner: runner.to_path_buf(),
                reason: e.to_string(),
            })?;

        let code = exit_code_of(status);
        tracing::debug!(runner = %runner.display(), code, "runner exited");
        Ok(RunnerExit { code })
    }
}

/// Map a child's exit status to a process exit code
///
/// Signal deaths follow the shell convention of `128 + signal`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
