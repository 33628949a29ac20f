// src/core/commands/create.rs

use crate::core::SshCommandError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext};
use crate::core::commands::helpers::join_words;
use crate::core::reply::Reply;
use clap::Args;

/// Creates a restricted account bound to a single command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Create {
    /// The account to create (or reuse).
    pub account: String,
    /// The command every key of the account is forced to run.
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl ExecutableCommand for Create {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError> {
        ctx.provisioner()
            .create(&self.account, &join_words(&self.command))?;
        Ok(Reply::Empty)
    }
}
