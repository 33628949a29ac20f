// src/core/acl/forced_command.rs

//! Builds the `command="..."` option that pins a key to the account's
//! registered command.
//!
//! The stored option reads `.sshcommand` at connection time through a
//! `` `cat ...` `` substitution instead of inlining the command. sshd hands the
//! option to the user's shell verbatim, so changing `.sshcommand` takes effect
//! for every existing key without touching authorized_keys. This exact text is
//! part of the on-disk format and must not be rewritten.

use std::path::Path;

/// Name of the file holding the registered command inside the home directory.
pub const COMMAND_FILE: &str = ".sshcommand";

/// The restriction options applied to every key unless configured otherwise.
pub const DEFAULT_ALLOWED_KEYS: [&str; 4] = [
    "no-agent-forwarding",
    "no-user-rc",
    "no-X11-forwarding",
    "no-port-forwarding",
];

/// Everything needed to render the option prefix of one ACL entry.
#[derive(Debug, Clone, Copy)]
pub struct ForcedCommand<'a> {
    pub fingerprint: &'a str,
    pub name: &'a str,
    pub home_dir: &'a Path,
    pub flags: &'a [String],
}

impl ForcedCommand<'_> {
    /// The shell command sshd runs for the key, before option quoting.
    pub fn shell_command(&self) -> String {
        format!(
            "FINGERPRINT={} NAME=\"{}\" `cat {}/{}` $SSH_ORIGINAL_COMMAND",
            self.fingerprint,
            shell_escape(self.name),
            shell_path(self.home_dir),
            COMMAND_FILE
        )
    }

    /// Renders `command="..."` followed by the comma-joined restriction flags.
    pub fn build(&self) -> String {
        let mut prefix = format!("command=\"{}\"", option_escape(&self.shell_command()));
        for flag in self.flags {
            prefix.push(',');
            prefix.push_str(flag);
        }
        prefix
    }
}

/// Joins an option prefix and the public key into one authorized_keys line
/// (without the trailing newline).
pub fn encode_entry(prefix: &str, key: &str) -> String {
    format!("{prefix} {key}")
}

/// Escapes the characters that are special inside a double-quoted shell word.
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Quotes `"` the way sshd expects inside a quoted option value.
pub fn option_escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Emits a path bare when it is shell-safe, double-quoted otherwise.
fn shell_path(path: &Path) -> String {
    let path = path.to_string_lossy();
    let path = path.trim_end_matches('/');
    let is_safe = path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '+' | '-'));
    if is_safe {
        path.to_string()
    } else {
        format!("\"{}\"", shell_escape(path))
    }
}
