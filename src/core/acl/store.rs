// src/core/acl/store.rs

//! Add, remove and list operations over an account's authorized_keys file.

use crate::config::AclConfig;
use crate::core::SshCommandError;
use crate::core::account::{Account, AccountResolver};
use crate::core::acl::entry::{AclEntry, AclRecord};
use crate::core::acl::keys_file::{AuthorizedKeysFile, split_lines};
use crate::core::keys::{KeyValidator, is_valid_fingerprint, single_key_line};
use tracing::{debug, info};

/// The ACL engine for restricted accounts.
pub struct AclStore<'a> {
    accounts: &'a dyn AccountResolver,
    validator: &'a dyn KeyValidator,
    config: &'a AclConfig,
}

impl<'a> AclStore<'a> {
    pub fn new(
        accounts: &'a dyn AccountResolver,
        validator: &'a dyn KeyValidator,
        config: &'a AclConfig,
    ) -> Self {
        Self {
            accounts,
            validator,
            config,
        }
    }

    /// Grants `key` access to `account` under `name` and returns its
    /// fingerprint. Every check and ownership change happens before the
    /// single append, so a failure leaves the keys file untouched.
    pub fn add(&self, account: &str, name: &str, key: &[u8]) -> Result<String, SshCommandError> {
        let account = self.accounts.resolve(account)?;
        validate_entry_name(name)?;
        let keys_file = AuthorizedKeysFile::for_home(&account.home_dir);

        let ssh_dir_existed = keys_file.ssh_dir().is_dir();
        let lock = keys_file.lock()?;

        let contents = lock.read()?;
        let existing = decode_all(contents.as_deref().unwrap_or_default());
        if existing.iter().any(|record| record.name == name) {
            return Err(SshCommandError::DuplicateName(name.to_string()));
        }

        let fingerprint = self.validator.validate(key)?;
        if !self.config.ignore_duplicate_fingerprints
            && existing.iter().any(|record| record.fingerprint == fingerprint)
        {
            return Err(SshCommandError::DuplicateFingerprint(fingerprint));
        }

        let entry = AclEntry {
            name: name.to_string(),
            fingerprint,
            flags: self.config.allowed_keys.clone(),
            key: single_key_line(key)?.to_string(),
        };
        let line = entry.encode(&account.home_dir);

        if !ssh_dir_existed {
            account.take_ownership(keys_file.ssh_dir())?;
        }
        if contents.is_none() {
            lock.create_owned_by(&account)?;
        }
        lock.append_line(&line)?;

        info!(
            "Added key '{}' ({}) to account '{}'",
            entry.name, entry.fingerprint, account.name
        );
        Ok(entry.fingerprint)
    }

    /// Removes every entry named `name`. Removing an absent name is a no-op.
    /// Returns the number of removed lines.
    pub fn remove(&self, account: &str, name: &str) -> Result<usize, SshCommandError> {
        let account = self.accounts.resolve(account)?;
        self.remove_matching(&account, |record| record.name == name)
    }

    /// Removes every entry carrying `fingerprint`. Idempotent like `remove`.
    pub fn remove_by_fingerprint(
        &self,
        account: &str,
        fingerprint: &str,
    ) -> Result<usize, SshCommandError> {
        let account = self.accounts.resolve(account)?;
        if !is_valid_fingerprint(fingerprint) {
            return Err(SshCommandError::InvalidArguments(format!(
                "invalid fingerprint '{fingerprint}'"
            )));
        }
        self.remove_matching(&account, |record| record.fingerprint == fingerprint)
    }

    /// Lists the entries of `account` in file order, optionally restricted to
    /// a single name.
    pub fn list(
        &self,
        account: &str,
        name: Option<&str>,
    ) -> Result<Vec<AclRecord>, SshCommandError> {
        let account = self.accounts.resolve(account)?;
        let keys_file = AuthorizedKeysFile::for_home(&account.home_dir);

        let Some(contents) = keys_file.read()? else {
            return Err(SshCommandError::NoKeysFile(keys_file.path().to_path_buf()));
        };
        if contents.is_empty() {
            return Err(SshCommandError::EmptyKeysFile(
                keys_file.path().to_path_buf(),
            ));
        }

        let records: Vec<AclRecord> = decode_all(&contents)
            .into_iter()
            .filter(|record| name.is_none_or(|n| record.name == n))
            .collect();

        if let Some(name) = name
            && records.is_empty()
        {
            return Err(SshCommandError::NoMatchingKeys(name.to_string()));
        }
        Ok(records)
    }

    fn remove_matching<F>(&self, account: &Account, matches: F) -> Result<usize, SshCommandError>
    where
        F: Fn(&AclRecord) -> bool,
    {
        let keys_file = AuthorizedKeysFile::for_home(&account.home_dir);
        if !keys_file.path().exists() {
            debug!("No keys file for account '{}', nothing to remove", account.name);
            return Ok(0);
        }

        let lock = keys_file.lock()?;
        let Some(contents) = lock.read()? else {
            return Ok(0);
        };

        let mut kept = Vec::with_capacity(contents.len());
        let mut removed = 0;
        for line in split_lines(&contents) {
            let is_match = std::str::from_utf8(line)
                .ok()
                .and_then(AclRecord::decode)
                .is_some_and(|record| matches(&record));
            if is_match {
                removed += 1;
            } else {
                kept.extend_from_slice(line);
            }
        }

        if removed > 0 {
            lock.rewrite(&kept)?;
            info!(
                "Removed {} key(s) from account '{}'",
                removed, account.name
            );
        }
        Ok(removed)
    }
}

/// Decodes every recognized entry of the file, skipping opaque lines.
pub fn decode_all(contents: &[u8]) -> Vec<AclRecord> {
    split_lines(contents)
        .filter_map(|line| std::str::from_utf8(line).ok())
        .filter_map(AclRecord::decode)
        .collect()
}

/// Entry names are free-form but must be non-empty single-line text.
pub fn validate_entry_name(name: &str) -> Result<(), SshCommandError> {
    if name.is_empty() {
        return Err(SshCommandError::InvalidArguments(
            "key name must not be empty".to_string(),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(SshCommandError::InvalidArguments(format!(
            "key name {name:?} contains control characters"
        )));
    }
    Ok(())
}
