// src/core/account/mod.rs

//! Resolution and creation of the OS accounts that host restricted commands.

pub mod passwd;
pub mod platform;
pub mod system;

use crate::core::SshCommandError;
use lazy_static::lazy_static;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};

pub use platform::{AccountCreator, CommandCreator, DetectingCreator, OsRelease, Platform};
pub use system::SystemAccounts;

lazy_static! {
    static ref ACCOUNT_NAME_RE: Regex =
        Regex::new(r"^[a-z_][a-z0-9_-]*[$]?$").expect("account name pattern is valid");
}

const MAX_ACCOUNT_NAME_LEN: usize = 32;

/// An existing OS account, as read from the passwd database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub home_dir: PathBuf,
    /// Numeric owner ids, used to hand provisioned files over to the account.
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl Account {
    /// Hands `path` over to this account. A no-op when the ids are unknown.
    pub fn take_ownership(&self, path: &Path) -> io::Result<()> {
        if self.uid.is_none() && self.gid.is_none() {
            return Ok(());
        }
        std::os::unix::fs::chown(path, self.uid, self.gid)
    }
}

/// Maps logical account names to OS accounts.
pub trait AccountResolver {
    /// Looks up an account, returning `None` when it is not registered.
    fn lookup(&self, name: &str) -> Result<Option<Account>, SshCommandError>;

    /// Creates the OS account. After success, `exists(name)` is true and the
    /// home directory exists.
    fn create_account(&self, name: &str) -> Result<(), SshCommandError>;

    fn exists(&self, name: &str) -> Result<bool, SshCommandError> {
        Ok(self.lookup(name)?.is_some())
    }

    /// Resolves an account or fails with `AccountNotFound`.
    fn resolve(&self, name: &str) -> Result<Account, SshCommandError> {
        self.lookup(name)?
            .ok_or_else(|| SshCommandError::AccountNotFound(name.to_string()))
    }

    fn home_dir(&self, name: &str) -> Result<PathBuf, SshCommandError> {
        Ok(self.resolve(name)?.home_dir)
    }
}

/// Checks that `name` is acceptable to the platform user-creation tools.
pub fn validate_account_name(name: &str) -> Result<(), SshCommandError> {
    if name.len() > MAX_ACCOUNT_NAME_LEN || !ACCOUNT_NAME_RE.is_match(name) {
        return Err(SshCommandError::InvalidArguments(format!(
            "invalid account name '{name}'"
        )));
    }
    Ok(())
}
