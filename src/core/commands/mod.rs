// src/core/commands/mod.rs

//! This module defines all supported operations and the central `Command`
//! enum that encapsulates their parsed arguments. Dispatch from a parsed
//! `Command` to its handler is a plain `match`, fixed at compile time.

use crate::core::SshCommandError;
use crate::core::reply::Reply;
use clap::Subcommand;

pub mod acl_add;
pub mod acl_remove;
pub mod command_trait;
pub mod create;
pub mod help;
pub mod helpers;
pub mod list;

pub use acl_add::AclAdd;
pub use acl_remove::{AclRemove, AclRemoveByFingerprint};
pub use command_trait::{ExecutableCommand, ExecutionContext};
pub use create::Create;
pub use help::{Help, Version};
pub use list::{List, ListFormat};

/// Every operation the tool supports.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a restricted account bound to a command
    Create(Create),
    /// Grant a named public key access to an account
    AclAdd(AclAdd),
    /// Revoke the key registered under a name
    AclRemove(AclRemove),
    /// Revoke every key with the given fingerprint
    AclRemoveByFingerprint(AclRemoveByFingerprint),
    /// List the keys granted access to an account
    List(List),
    /// Print usage information
    Help,
    /// Print the version
    Version,
}

impl Command {
    /// The operation name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create(_) => "create",
            Command::AclAdd(_) => "acl-add",
            Command::AclRemove(_) => "acl-remove",
            Command::AclRemoveByFingerprint(_) => "acl-remove-by-fingerprint",
            Command::List(_) => "list",
            Command::Help => "help",
            Command::Version => "version",
        }
    }

    /// Whether the operation reads the configuration. `help` and `version`
    /// run even when the config file is unreadable.
    pub fn needs_config(&self) -> bool {
        !matches!(self, Command::Help | Command::Version)
    }

    pub fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError> {
        match self {
            Command::Create(cmd) => cmd.execute(ctx),
            Command::AclAdd(cmd) => cmd.execute(ctx),
            Command::AclRemove(cmd) => cmd.execute(ctx),
            Command::AclRemoveByFingerprint(cmd) => cmd.execute(ctx),
            Command::List(cmd) => cmd.execute(ctx),
            Command::Help => Help.execute(ctx),
            Command::Version => Version.execute(ctx),
        }
    }
}
