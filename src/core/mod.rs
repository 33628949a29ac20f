// src/core/mod.rs

//! The central module containing the core logic and data structures of sshcommand.

pub mod account;
pub mod acl;
pub mod commands;
pub mod errors;
pub mod keys;
pub mod provision;
pub mod reply;

pub use commands::Command;
pub use errors::SshCommandError;
pub use reply::Reply;
