// src/core/commands/acl_add.rs

use crate::core::SshCommandError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext};
use crate::core::commands::helpers::read_key_input;
use crate::core::reply::Reply;
use clap::Args;
use std::path::PathBuf;

/// Grants a named public key access to an account.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AclAdd {
    pub account: String,
    /// A name for the key, unique within the account.
    pub name: String,
    /// File holding the public key. Read from standard input when omitted or `-`.
    pub key_file: Option<PathBuf>,
}

impl ExecutableCommand for AclAdd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError> {
        let key = read_key_input(self.key_file.as_deref(), ctx.stdin)?;
        let fingerprint = ctx.acl_store().add(&self.account, &self.name, &key)?;
        Ok(Reply::Fingerprint(fingerprint))
    }
}
