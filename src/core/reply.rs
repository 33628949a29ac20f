// src/core/reply.rs

//! The result of a successfully executed command, and its rendering for stdout.

use crate::core::SshCommandError;
use crate::core::acl::AclRecord;
use crate::core::commands::list::ListFormat;

/// What a command hands back to the caller on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to print.
    Empty,
    /// The fingerprint of a newly added key.
    Fingerprint(String),
    /// The entries of an account's ACL.
    Keys {
        records: Vec<AclRecord>,
        format: ListFormat,
    },
    /// Free-form text such as usage or version information.
    Text(String),
}

impl Reply {
    /// Renders the reply as it is written to standard output. `None` means
    /// nothing is printed.
    pub fn render(&self) -> Result<Option<String>, SshCommandError> {
        match self {
            Reply::Empty => Ok(None),
            Reply::Fingerprint(fingerprint) => Ok(Some(fingerprint.clone())),
            Reply::Keys {
                records,
                format: ListFormat::Json,
            } => Ok(Some(serde_json::to_string_pretty(records)?)),
            Reply::Keys {
                records,
                format: ListFormat::Text,
            } => {
                if records.is_empty() {
                    return Ok(None);
                }
                let lines: Vec<String> = records.iter().map(|r| r.render()).collect();
                Ok(Some(lines.join("\n")))
            }
            Reply::Text(text) => Ok(Some(text.trim_end().to_string())),
        }
    }
}
