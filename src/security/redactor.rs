//! Command redaction for safe logging
//!
//! Every command string that reaches stdout, stderr or a log line passes
//! through [`CommandRedactor`] first. The rule keys off the login command
//! prefix, not the secret value, so any credential after the prefix is
//! masked the same way.
//!
//! # Example
//!
//! ```
//! use provider_test_matrix::security::CommandRedactor;
//!
//! let redactor = CommandRedactor::new("poe-code login");
//! assert_eq!(
//!     redactor.redact("poe-code login --api-key sk-123"),
//!     "poe-code login --api-key ***"
//! );
//! assert_eq!(redactor.redact("poe-code test codex"), "poe-code test codex");
//! ```

use crate::security::login::{API_KEY_FLAG, DEFAULT_LOGIN_PROGRAM};
use std::borrow::Cow;
use std::fmt;

/// Replacement for everything after the login prefix
pub const MASK: &str = "***";

/// One element of a failed process description
#[derive(Clone, PartialEq, Eq)]
pub enum Token {
    /// A command string; redacted before rendering
    Text(String),
    /// Any other argument, already rendered; passed through unchanged
    Opaque(String),
}

/// The command a failed runner invocation was started with
#[derive(Clone, PartialEq, Eq)]
pub enum FailureTarget {
    Single(String),
    Sequence(Vec<Token>),
}

/// Mask whatever follows `--api-key ` regardless of the login program
fn mask_api_key(text: &str) -> Cow<'_, str> {
    let flag = format!("{} ", API_KEY_FLAG);
    match text.find(&flag) {
        Some(start) => Cow::Owned(format!("{}{}", &text[..start + flag.len()], MASK)),
        None => Cow::Borrowed(text),
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(command) => f.debug_tuple("Text").field(&mask_api_key(command)).finish(),
            Self::Opaque(value) => f.debug_tuple("Opaque").field(&mask_api_key(value)).finish(),
        }
    }
}

impl fmt::Debug for FailureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(command) => f.debug_tuple("Single").field(&mask_api_key(command)).finish(),
            Self::Sequence(tokens) => f.debug_tuple("Sequence").field(tokens).finish(),
        }
    }
}

impl FailureTarget {
    /// Build a sequence target where every element is a command string
    pub fn from_commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Sequence(
            commands
                .into_iter()
                .map(|command| Token::Text(command.into()))
                .collect(),
        )
    }
}

/// Masks the login credential in command strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRedactor {
    prefix: String,
}

impl Default for CommandRedactor {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PROGRAM)
    }
}

impl CommandRedactor {
    /// Create a redactor for a login program such as `poe-code login`
    pub fn new(login_program: &str) -> Self {
        Self {
            prefix: format!("{} {} ", login_program, API_KEY_FLAG),
        }
    }

    /// The literal prefix up to and including the flag separator
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Redact a single command string
    ///
    /// Commands starting with the login prefix become `prefix + MASK`;
    /// everything else is returned unchanged.
    pub fn redact(&self, command: &str) -> String {
        if command.starts_with(&self.prefix) {
            format!("{}{}", self.prefix, MASK)
        } else {
            command.to_string()
        }
    }

    /// Render a failure target with every command string redacted
    ///
    /// Sequences render as `["a", "b", opaque]`: text tokens are quoted,
    /// opaque tokens are written as they are.
    pub fn redact_failure_target(&self, target: &FailureTarget) -> String {
        match target {
            FailureTarget::Single(command) => self.redact(command),
            FailureTarget::Sequence(tokens) => {
                let rendered: Vec<String> = tokens
                    .iter()
                    .map(|token| match token {
                        Token::Text(command) => format!("{:?}", self.redact(command)),
                        Token::Opaque(value) => value.clone(),
                    })
                    .collect();
                format!("[{}]", rendered.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::login::login_command;

    #[test]
    fn test_redacts_login_command() {
        let redactor = CommandRedactor::default();
        assert_eq!(
            redactor.redact("poe-code login --api-key test-key"),
            "poe-code login --api-key ***"
        );
    }

    #[test]
    fn test_redacted_output_never_contains_secret() {
        let redactor = CommandRedactor::new("login");
        let secrets = [
            "abc123",
            "",
            " ",
            "sk-'quoted'",
            "a b c",
            "$(rm -rf /)",
            "***",
            "ключ",
            "line\nbreak",
        ];

        for secret in secrets {
            let command = login_command("login", secret);
            let redacted = redactor.redact(&command);
            assert_eq!(redacted, "login --api-key ***", "secret {:?}", secret);
            if secret.trim().len() > 3 {
                assert!(!redacted.contains(secret));
            }
        }
    }

    #[test]
    fn test_different_secrets_mask_identically() {
        let redactor = CommandRedactor::default();
        assert_eq!(
            redactor.redact("poe-code login --api-key first"),
            redactor.redact("poe-code login --api-key second")
        );
    }

    #[test]
    fn test_non_login_commands_are_unchanged() {
        let redactor = CommandRedactor::default();
        let commands = [
            "poe-code install codex",
            "poe-code test codex --isolated",
            "poe-code login",
            "poe-code login --api-key",
            " poe-code login --api-key leading-space",
            "echo poe-code login --api-key inner",
            "",
        ];

        for command in commands {
            assert_eq!(redactor.redact(command), command);
        }
    }

    #[test]
    fn test_redact_failure_target_single() {
        let redactor = CommandRedactor::default();
        let target = FailureTarget::Single("poe-code login --api-key test-key".to_string());

        assert_eq!(
            redactor.redact_failure_target(&target),
            "poe-code login --api-key ***"
        );
    }

    #[test]
    fn test_redact_failure_target_sequence() {
        let redactor = CommandRedactor::default();
        let target = FailureTarget::from_commands([
            "scripts/colima-runner.sh",
            "poe-code login --api-key test-key",
            "poe-code test codex",
        ]);

        let rendered = redactor.redact_failure_target(&target);

        assert_eq!(
            rendered,
            r#"["scripts/colima-runner.sh", "poe-code login --api-key ***", "poe-code test codex"]"#
        );
        assert!(!rendered.contains("test-key"));
    }

    #[test]
    fn test_redact_failure_target_mixed_tokens() {
        let redactor = CommandRedactor::default();
        let target = FailureTarget::Sequence(vec![
            Token::Opaque("42".to_string()),
            Token::Text("poe-code login --api-key test-key".to_string()),
            Token::Opaque("None".to_string()),
        ]);

        assert_eq!(
            redactor.redact_failure_target(&target),
            r#"[42, "poe-code login --api-key ***", None]"#
        );
    }

    #[test]
    fn test_redact_failure_target_empty_sequence() {
        let redactor = CommandRedactor::default();
        assert_eq!(
            redactor.redact_failure_target(&FailureTarget::Sequence(Vec::new())),
            "[]"
        );
    }

    #[test]
    fn test_debug_output_masks_api_key() {
        let target = FailureTarget::Sequence(vec![
            Token::Text("/bin/runner".to_string()),
            Token::Text("custom-login --api-key sk-primary-secret".to_string()),
            Token::Opaque("--api-key sk-opaque-secret".to_string()),
        ]);

        let debug = format!("{:?}", target);

        assert!(!debug.contains("sk-primary-secret"));
        assert!(!debug.contains("sk-opaque-secret"));
        assert!(debug.contains(r#"Text("custom-login --api-key ***")"#));
        assert!(debug.contains(r#"Text("/bin/runner")"#));
    }

    #[test]
    fn test_debug_output_masks_single_target() {
        let target = FailureTarget::Single("poe-code login --api-key sk-single".to_string());

        assert_eq!(
            format!("{:?}", target),
            r#"Single("poe-code login --api-key ***")"#
        );
    }
}
