pub mod credential_resolver;
pub mod login;
pub mod redactor;

pub use credential_resolver::{Credential, CredentialResolver, CredentialSource};
pub use login::{login_command, shell_quote};
pub use redactor::{CommandRedactor, FailureTarget, Token, MASK};
