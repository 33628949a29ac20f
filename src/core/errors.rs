// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing every way an operation can fail.
/// All variants are terminal for the invoking operation.
#[derive(Error, Debug)]
pub enum SshCommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Account '{0}' does not exist")]
    AccountNotFound(String),

    #[error("Duplicate ssh key name '{0}'")]
    DuplicateName(String),

    #[error("Duplicate ssh key fingerprint {0}")]
    DuplicateFingerprint(String),

    #[error("Invalid ssh public key: {0}")]
    InvalidKeyFormat(String),

    #[error("No authorized_keys file found at {}", .0.display())]
    NoKeysFile(PathBuf),

    #[error("authorized_keys file at {} is empty", .0.display())]
    EmptyKeysFile(PathBuf),

    #[error("No keys matching name '{0}'")]
    NoMatchingKeys(String),

    #[error("Unsupported platform '{0}' for account creation")]
    UnsupportedPlatform(String),

    #[error("Account creation failed: {0}")]
    AccountCreation(String),

    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Locking Error: {0}")]
    LockingError(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
impl Clone for SshCommandError {
    fn clone(&self) -> Self {
        match self {
            SshCommandError::InvalidArguments(s) => SshCommandError::InvalidArguments(s.clone()),
            SshCommandError::AccountNotFound(s) => SshCommandError::AccountNotFound(s.clone()),
            SshCommandError::DuplicateName(s) => SshCommandError::DuplicateName(s.clone()),
            SshCommandError::DuplicateFingerprint(s) => {
                SshCommandError::DuplicateFingerprint(s.clone())
            }
            SshCommandError::InvalidKeyFormat(s) => SshCommandError::InvalidKeyFormat(s.clone()),
            SshCommandError::NoKeysFile(p) => SshCommandError::NoKeysFile(p.clone()),
            SshCommandError::EmptyKeysFile(p) => SshCommandError::EmptyKeysFile(p.clone()),
            SshCommandError::NoMatchingKeys(s) => SshCommandError::NoMatchingKeys(s.clone()),
            SshCommandError::UnsupportedPlatform(s) => {
                SshCommandError::UnsupportedPlatform(s.clone())
            }
            SshCommandError::AccountCreation(s) => SshCommandError::AccountCreation(s.clone()),
            SshCommandError::Io(e) => SshCommandError::Io(Arc::clone(e)),
            SshCommandError::LockingError(s) => SshCommandError::LockingError(s.clone()),
            SshCommandError::Config(s) => SshCommandError::Config(s.clone()),
            SshCommandError::Internal(s) => SshCommandError::Internal(s.clone()),
        }
    }
}

impl PartialEq for SshCommandError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SshCommandError::Io(e1), SshCommandError::Io(e2)) => e1.to_string() == e2.to_string(),
            (SshCommandError::NoKeysFile(p1), SshCommandError::NoKeysFile(p2)) => p1 == p2,
            (SshCommandError::EmptyKeysFile(p1), SshCommandError::EmptyKeysFile(p2)) => p1 == p2,
            (SshCommandError::InvalidArguments(s1), SshCommandError::InvalidArguments(s2))
            | (SshCommandError::AccountNotFound(s1), SshCommandError::AccountNotFound(s2))
            | (SshCommandError::DuplicateName(s1), SshCommandError::DuplicateName(s2))
            | (
                SshCommandError::DuplicateFingerprint(s1),
                SshCommandError::DuplicateFingerprint(s2),
            )
            | (SshCommandError::InvalidKeyFormat(s1), SshCommandError::InvalidKeyFormat(s2))
            | (SshCommandError::NoMatchingKeys(s1), SshCommandError::NoMatchingKeys(s2))
            | (
                SshCommandError::UnsupportedPlatform(s1),
                SshCommandError::UnsupportedPlatform(s2),
            )
            | (SshCommandError::AccountCreation(s1), SshCommandError::AccountCreation(s2))
            | (SshCommandError::LockingError(s1), SshCommandError::LockingError(s2))
            | (SshCommandError::Config(s1), SshCommandError::Config(s2))
            | (SshCommandError::Internal(s1), SshCommandError::Internal(s2)) => s1 == s2,
            _ => false,
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for SshCommandError {
    fn from(e: std::io::Error) -> Self {
        SshCommandError::Io(Arc::new(e))
    }
}

impl From<ssh_key::Error> for SshCommandError {
    fn from(e: ssh_key::Error) -> Self {
        SshCommandError::InvalidKeyFormat(e.to_string())
    }
}

impl From<std::str::Utf8Error> for SshCommandError {
    fn from(_: std::str::Utf8Error) -> Self {
        SshCommandError::InvalidKeyFormat("key is not valid UTF-8".to_string())
    }
}

impl From<serde_json::Error> for SshCommandError {
    fn from(e: serde_json::Error) -> Self {
        SshCommandError::Internal(format!("JSON serialization error: {e}"))
    }
}
