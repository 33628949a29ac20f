// src/core/keys.rs

//! Public key validation and legacy (MD5) fingerprinting.

use crate::core::SshCommandError;
use lazy_static::lazy_static;
use md5::{Digest, Md5};
use regex::Regex;
use ssh_key::PublicKey;

lazy_static! {
    static ref FINGERPRINT_RE: Regex =
        Regex::new(r"^([0-9a-f]{2}:){15}[0-9a-f]{2}$").expect("fingerprint pattern is valid");
}

/// Parses a raw public key and derives its fingerprint.
pub trait KeyValidator {
    /// Returns the colon-hex fingerprint of the single key contained in `raw`.
    fn validate(&self, raw: &[u8]) -> Result<String, SshCommandError>;
}

/// Validates OpenSSH-formatted public keys (`<type> <base64> [comment]`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SshKeyValidator;

impl KeyValidator for SshKeyValidator {
    fn validate(&self, raw: &[u8]) -> Result<String, SshCommandError> {
        let line = single_key_line(raw)?;
        let public_key = PublicKey::from_openssh(line)?;
        let fingerprint = md5_fingerprint(&public_key.to_bytes()?);

        if !is_valid_fingerprint(&fingerprint) {
            return Err(SshCommandError::InvalidKeyFormat(format!(
                "unexpected fingerprint format '{fingerprint}'"
            )));
        }
        Ok(fingerprint)
    }
}

/// Extracts the one non-blank line of key input, trimmed.
///
/// Rejects non-UTF-8 input, empty input and input holding more than one key.
pub fn single_key_line(raw: &[u8]) -> Result<&str, SshCommandError> {
    let text = std::str::from_utf8(raw)?;
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let Some(line) = lines.next() else {
        return Err(SshCommandError::InvalidKeyFormat(
            "no key data provided".to_string(),
        ));
    };
    if lines.next().is_some() {
        return Err(SshCommandError::InvalidKeyFormat(
            "input contains more than one key".to_string(),
        ));
    }
    Ok(line)
}

/// Renders the MD5 digest of a key's wire blob as `aa:bb:...` (16 groups).
pub fn md5_fingerprint(blob: &[u8]) -> String {
    let digest = Md5::digest(blob);
    digest
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

pub fn is_valid_fingerprint(fingerprint: &str) -> bool {
    FINGERPRINT_RE.is_match(fingerprint)
}
