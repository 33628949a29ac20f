// src/core/provision.rs

//! Creates restricted accounts and lays out their command and keys files.

use crate::core::SshCommandError;
use crate::core::account::{Account, AccountResolver, validate_account_name};
use crate::core::acl::{AuthorizedKeysFile, COMMAND_FILE};
use std::fs::{self, DirBuilder, OpenOptions, Permissions};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use tracing::info;

/// Orchestrates account creation and skeleton file initialization.
pub struct ProvisionService<'a> {
    accounts: &'a dyn AccountResolver,
}

impl<'a> ProvisionService<'a> {
    pub fn new(accounts: &'a dyn AccountResolver) -> Self {
        Self { accounts }
    }

    /// Binds `account` to `command`, creating the account if necessary.
    ///
    /// Re-running against an existing account rewrites `.sshcommand` and
    /// leaves any existing authorized keys in place.
    pub fn create(&self, account: &str, command: &str) -> Result<Account, SshCommandError> {
        if account.is_empty() || command.trim().is_empty() {
            return Err(SshCommandError::InvalidArguments(
                "an account name and a command are required".to_string(),
            ));
        }
        if command.contains(['\n', '\r']) {
            return Err(SshCommandError::InvalidArguments(
                "the command must be a single line".to_string(),
            ));
        }
        validate_account_name(account)?;

        if self.accounts.exists(account)? {
            info!("Account '{}' already exists, skipping creation", account);
        } else {
            info!("Creating account '{}'", account);
            self.accounts.create_account(account)?;
        }

        // Files are only written once the account is known to exist.
        let resolved = self.accounts.resolve(account).map_err(|_| {
            SshCommandError::AccountCreation(format!("account '{account}' could not be resolved"))
        })?;
        self.write_skeleton(&resolved, command)?;

        info!(
            "Account '{}' is restricted to command '{}'",
            resolved.name, command
        );
        Ok(resolved)
    }

    fn write_skeleton(&self, account: &Account, command: &str) -> Result<(), SshCommandError> {
        let command_path = account.home_dir.join(COMMAND_FILE);
        fs::write(&command_path, format!("{command}\n"))?;
        account.take_ownership(&command_path)?;

        let keys_file = AuthorizedKeysFile::for_home(&account.home_dir);
        let ssh_dir = keys_file.ssh_dir();
        DirBuilder::new().recursive(true).mode(0o700).create(ssh_dir)?;
        fs::set_permissions(ssh_dir, Permissions::from_mode(0o700))?;
        account.take_ownership(ssh_dir)?;

        // Opening without truncation keeps keys granted by earlier runs.
        OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o600)
            .open(keys_file.path())?;
        fs::set_permissions(keys_file.path(), Permissions::from_mode(0o600))?;
        account.take_ownership(keys_file.path())?;
        Ok(())
    }
}
