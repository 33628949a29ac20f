// src/core/commands/help.rs

use crate::cli::Cli;
use crate::core::SshCommandError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext};
use crate::core::reply::Reply;
use clap::CommandFactory;

/// Prints usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Help;

impl ExecutableCommand for Help {
    fn execute(&self, _ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError> {
        Ok(Reply::Text(Cli::command().render_long_help().to_string()))
    }
}

/// Prints the version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Version;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

impl ExecutableCommand for Version {
    fn execute(&self, _ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError> {
        Ok(Reply::Text(format!("sshcommand {VERSION}")))
    }
}
