// src/core/account/system.rs

use crate::core::SshCommandError;
use crate::core::account::passwd;
use crate::core::account::platform::AccountCreator;
use crate::core::account::{Account, AccountResolver};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Resolves accounts from a passwd database and creates them through an
/// `AccountCreator` strategy.
pub struct SystemAccounts {
    passwd_path: PathBuf,
    creator: Box<dyn AccountCreator>,
}

impl SystemAccounts {
    pub fn new(passwd_path: impl Into<PathBuf>, creator: Box<dyn AccountCreator>) -> Self {
        Self {
            passwd_path: passwd_path.into(),
            creator,
        }
    }

    fn read_database(&self) -> Result<String, SshCommandError> {
        match fs::read_to_string(&self.passwd_path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl AccountResolver for SystemAccounts {
    fn lookup(&self, name: &str) -> Result<Option<Account>, SshCommandError> {
        Ok(passwd::find(&self.read_database()?, name))
    }

    fn create_account(&self, name: &str) -> Result<(), SshCommandError> {
        self.creator.create(name)?;

        let account = self.lookup(name)?.ok_or_else(|| {
            SshCommandError::AccountCreation(format!(
                "account '{name}' is still missing after creation"
            ))
        })?;
        if !account.home_dir.is_dir() {
            return Err(SshCommandError::AccountCreation(format!(
                "home directory {} was not created",
                account.home_dir.display()
            )));
        }
        Ok(())
    }
}
