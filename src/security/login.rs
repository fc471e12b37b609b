//! Login command construction

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Login program used when no other is configured
pub const DEFAULT_LOGIN_PROGRAM: &str = "poe-code login";

/// Flag carrying the credential on the login command line
pub const API_KEY_FLAG: &str = "--api-key";

/// Characters that force quoting in a POSIX shell word
static UNSAFE_SHELL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_@%+=:,./-]").expect("static regex is valid"));

/// Build `<program> --api-key <secret>` with the secret shell-quoted
///
/// # Example
///
/// ```
/// use provider_test_matrix::security::login_command;
///
/// assert_eq!(login_command("login", "abc123"), "login --api-key abc123");
/// assert_eq!(login_command("login", "a b"), "login --api-key 'a b'");
/// ```
pub fn login_command(program: &str, secret: &str) -> String {
    format!("{} {} {}", program, API_KEY_FLAG, shell_quote(secret))
}

/// Quote a value so a POSIX shell reads it back as one word
pub fn shell_quote(value: &str) -> Cow<'_, str> {
    if value.is_empty() {
        return Cow::Borrowed("''");
    }
    if !UNSAFE_SHELL_CHARS.is_match(value) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(format!("'{}'", value.replace('\'', r#"'"'"'"#)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_secret_is_embedded_verbatim() {
        assert_eq!(
            login_command(DEFAULT_LOGIN_PROGRAM, "sk-live_123.abc"),
            "poe-code login --api-key sk-live_123.abc"
        );
    }

    #[test]
    fn test_shell_quote_empty() {
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_shell_quote_special_characters() {
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
        assert_eq!(shell_quote("x;rm -rf /"), "'x;rm -rf /'");
    }

    #[test]
    fn test_shell_quote_embedded_single_quote() {
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
    }

    #[test]
    fn test_shell_quote_non_ascii() {
        assert_eq!(shell_quote("ключ"), "'ключ'");
        assert_eq!(shell_quote("café"), "'café'");
        assert_eq!(
            login_command("login", "ключ"),
            "login --api-key 'ключ'"
        );
    }
}
