//! Core traits and types for runner invocation
//!
//! [`RunnerLauncher`] is the seam between the group executor and the
//! external containerized runner. The production implementation spawns a
//! real process; tests substitute a recording launcher.

use crate::core::error::Result;
use crate::orchestration::environment::ExecutionEnvironment;
use async_trait::async_trait;
use std::path::Path;

/// How a runner invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerExit {
    pub code: i32,
}

impl RunnerExit {
    pub fn success() -> Self {
        Self { code: 0 }
    }

    pub fn failure(code: i32) -> Self {
        Self { code }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Launches the external runner once per command group
#[async_trait]
pub trait RunnerLauncher: Send + Sync {
    /// Check that the runner can be launched at all
    ///
    /// Called once before any credential is resolved.
    fn check_runner(&self, _runner: &Path) -> Result<()> {
        Ok(())
    }

    /// Run `runner arg1 .. argN` with exactly `env` and wait for it to exit
    async fn launch(
        &self,
        runner: &Path,
        args: &[String],
        env: &ExecutionEnvironment,
    ) -> Result<RunnerExit>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_exit_success() {
        assert!(RunnerExit::success().is_success());
        assert!(!RunnerExit::failure(3).is_success());
        assert_eq!(RunnerExit::failure(3).code, 3);
    }
}
