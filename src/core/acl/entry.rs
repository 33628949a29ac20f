// src/core/acl/entry.rs

//! Encoding and decoding of ACL entries in authorized_keys lines.

use crate::core::acl::forced_command::{ForcedCommand, encode_entry};
use crate::core::keys::is_valid_fingerprint;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A key granted access to an account, as it is written to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub name: String,
    pub fingerprint: String,
    pub flags: Vec<String>,
    /// The public key as `<type> <base64> [comment]`.
    pub key: String,
}

impl AclEntry {
    /// Renders the full authorized_keys line, without the trailing newline.
    pub fn encode(&self, home_dir: &Path) -> String {
        let prefix = ForcedCommand {
            fingerprint: &self.fingerprint,
            name: &self.name,
            home_dir,
            flags: &self.flags,
        }
        .build();
        encode_entry(&prefix, &self.key)
    }
}

/// The metadata of an entry, as reported by `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRecord {
    pub fingerprint: String,
    pub name: String,
    pub flags: Vec<String>,
}

impl AclRecord {
    /// Decodes an authorized_keys line produced by `AclEntry::encode`.
    ///
    /// Any line that does not carry the full entry structure is treated as
    /// opaque and yields `None`.
    pub fn decode(line: &str) -> Option<AclRecord> {
        let line = line.trim_end_matches(['\n', '\r']).trim_start();
        let body = line.strip_prefix("command=\"")?;

        let (command, rest) = dequote_option(body)?;
        let (fingerprint, name) = parse_shell_command(&command)?;
        let (flags, key) = split_options(rest)?;
        if key.trim().is_empty() {
            return None;
        }

        Some(AclRecord {
            fingerprint,
            name,
            flags,
        })
    }

    /// The single-line text form used by `list`.
    pub fn render(&self) -> String {
        format!(
            "{} NAME=\"{}\" SSHCOMMAND_ALLOWED_KEYS=\"{}\"",
            self.fingerprint,
            self.name,
            self.flags.join(",")
        )
    }
}

/// Reads a quoted option value up to its closing quote, undoing `\"`.
///
/// Returns the value and the text following the closing quote.
fn dequote_option(body: &str) -> Option<(String, &str)> {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '"'))) => {
                chars.next();
                value.push('"');
            }
            '"' => return Some((value, &body[i + 1..])),
            _ => value.push(c),
        }
    }
    None
}

/// Extracts `(fingerprint, name)` from
/// `FINGERPRINT=<fp> NAME="<name>" `cat ...` ...`.
fn parse_shell_command(command: &str) -> Option<(String, String)> {
    let rest = command.strip_prefix("FINGERPRINT=")?;
    let (fingerprint, rest) = rest.split_once(' ')?;
    if !is_valid_fingerprint(fingerprint) {
        return None;
    }

    let rest = rest.strip_prefix("NAME=\"")?;
    let mut name = String::new();
    let mut chars = rest.char_indices();
    let mut tail = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => name.push(chars.next()?.1),
            '"' => {
                tail = Some(&rest[i + 1..]);
                break;
            }
            _ => name.push(c),
        }
    }

    if !tail?.starts_with(" `cat ") {
        return None;
    }
    Some((fingerprint.to_string(), name))
}

/// Splits `,opt1,opt2 <key...>` into the option list and the key material.
fn split_options(rest: &str) -> Option<(Vec<String>, &str)> {
    let Some(options) = rest.strip_prefix(',') else {
        // No further options: the key must follow after whitespace.
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        return Some((Vec::new(), rest.trim_start()));
    };

    let mut flags = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in options.char_indices() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => flags.push(std::mem::take(&mut current)),
            ' ' | '\t' if !in_quotes => {
                flags.push(current);
                let flags = flags.into_iter().filter(|f| !f.is_empty()).collect();
                return Some((flags, options[i..].trim_start()));
            }
            _ => current.push(c),
        }
    }
    None
}
