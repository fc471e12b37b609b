//! Orchestration layer for matrix runs
//!
//! This module composes the runner environment, executes command groups
//! and maps run outcomes to process exit codes.

pub mod environment;
pub mod group_executor;
pub mod matrix_runner;
pub mod process_launcher;

pub use environment::{EnvironmentComposer, ExecutionEnvironment};
pub use group_executor::GroupExecutor;
pub use matrix_runner::{report_failure, MatrixRunner};
pub use process_launcher::TokioProcessLauncher;
