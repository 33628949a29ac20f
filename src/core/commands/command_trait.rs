// src/core/commands/command_trait.rs

//! Defines the execution context and the trait implemented by every command.

use crate::config::Config;
use crate::core::SshCommandError;
use crate::core::account::AccountResolver;
use crate::core::acl::AclStore;
use crate::core::keys::KeyValidator;
use crate::core::provision::ProvisionService;
use crate::core::reply::Reply;
use std::io::Read;

/// Everything a command needs to run: configuration, the collaborator
/// services, and the input stream keys may be read from.
pub struct ExecutionContext<'a> {
    pub config: &'a Config,
    pub accounts: &'a dyn AccountResolver,
    pub validator: &'a dyn KeyValidator,
    pub stdin: &'a mut dyn Read,
}

impl ExecutionContext<'_> {
    pub fn acl_store(&self) -> AclStore<'_> {
        AclStore::new(self.accounts, self.validator, &self.config.acl)
    }

    pub fn provisioner(&self) -> ProvisionService<'_> {
        ProvisionService::new(self.accounts)
    }
}

/// A trait for the actual execution logic of a command.
/// Implemented by each command's struct (e.g., `Create`, `AclAdd`).
pub trait ExecutableCommand {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<Reply, SshCommandError>;
}
