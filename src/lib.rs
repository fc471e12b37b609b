pub mod core;
pub mod orchestration;
pub mod security;

pub use self::core::*;
pub use orchestration::{
    EnvironmentComposer, ExecutionEnvironment, GroupExecutor, MatrixRunner, TokioProcessLauncher,
};
pub use security::{
    CommandRedactor, Credential, CredentialResolver, CredentialSource, FailureTarget, Token,
};
