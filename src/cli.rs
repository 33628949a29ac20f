// src/cli.rs

//! Command-line surface of the `sshcommand` binary.

use crate::core::Command;
use crate::core::commands::help::VERSION;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sshcommand", version = VERSION)]
#[command(
    about = "Provision restricted SSH accounts bound to a single command and manage their authorized keys",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The operation to run; `help` when none was given.
    pub fn operation(&self) -> Command {
        self.command.clone().unwrap_or(Command::Help)
    }

    /// The log filter implied by `-v` flags, if any were given.
    pub fn verbosity_filter(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("info"),
            _ => Some("debug"),
        }
    }
}
