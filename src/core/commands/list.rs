// src/core/commands/list.rs

use crate::core::SshCommandError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext};
use crate::core::reply::Reply;
use clap::{Args, ValueEnum};

/// Output format of `list`.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// One `<fingerprint> NAME="..." SSHCOMMAND_ALLOWED_KEYS="..."` line per key.
    #[default]
    Text,
    /// A JSON array of `{fingerprint, name, flags}` objects.
    Json,
}

/// Lists the keys granted access to an account.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub account: String,
    /// Only show the key registered under this name.
    pub name: Option<String>,
    #[arg(long, value_enum, default_value_t = ListFormat::Text)]
    pub format: ListFormat,
}

impl ExecutableCommand for List {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError> {
        let records = ctx
            .acl_store()
            .list(&self.account, self.name.as_deref())?;
        Ok(Reply::Keys {
            records,
            format: self.format,
        })
    }
}
