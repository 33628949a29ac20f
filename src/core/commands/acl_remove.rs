// src/core/commands/acl_remove.rs

use crate::core::SshCommandError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext};
use crate::core::reply::Reply;
use clap::Args;

/// Revokes the key registered under a name. Succeeds if no such key exists.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AclRemove {
    pub account: String,
    pub name: String,
}

impl ExecutableCommand for AclRemove {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError> {
        ctx.acl_store().remove(&self.account, &self.name)?;
        Ok(Reply::Empty)
    }
}

/// Revokes every key with the given fingerprint. Succeeds if none match.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AclRemoveByFingerprint {
    pub account: String,
    /// Colon-separated MD5 fingerprint, as printed by `acl-add` and `list`.
    pub fingerprint: String,
}

impl ExecutableCommand for AclRemoveByFingerprint {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError> {
        ctx.acl_store()
            .remove_by_fingerprint(&self.account, &self.fingerprint.to_ascii_lowercase())?;
        Ok(Reply::Empty)
    }
}
