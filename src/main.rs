// src/main.rs

//! The main entry point for the sshcommand CLI.

use clap::Parser;
use sshcommand::cli::Cli;
use sshcommand::config::Config;
use sshcommand::core::account::{DetectingCreator, SystemAccounts};
use sshcommand::core::commands::ExecutionContext;
use sshcommand::core::keys::SshKeyValidator;
use std::io;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::filter::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load the configuration before anything else. Operations that read it
    // cannot run without a valid one, so failures end the process right away.
    let command = cli.operation();
    let loaded = if command.needs_config() {
        Config::load(cli.config.as_deref())
    } else {
        Ok(Config::default())
    };
    let config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // Logging goes to stderr so that stdout only carries command output.
    // RUST_LOG wins over -v, which wins over the configured level.
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| cli.verbosity_filter().map(str::to_string))
        .unwrap_or_else(|| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_writer(io::stderr)
        .compact()
        .with_ansi(false)
        .init();

    debug!("Running '{}' with {:?}", command.name(), config);

    let accounts = SystemAccounts::new(
        config.passwd_path.clone(),
        Box::new(DetectingCreator::new(config.os_release_path.clone())),
    );
    let validator = SshKeyValidator;
    let mut stdin = io::stdin().lock();
    let mut ctx = ExecutionContext {
        config: &config,
        accounts: &accounts,
        validator: &validator,
        stdin: &mut stdin,
    };

    let result = command
        .execute(&mut ctx)
        .and_then(|reply| reply.render());
    match result {
        Ok(Some(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{} failed: {:?}", command.name(), e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
