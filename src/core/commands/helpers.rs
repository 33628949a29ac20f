// src/core/commands/helpers.rs

//! Helpers shared by command implementations.

use crate::core::SshCommandError;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Upper bound on key input; public keys are a few kilobytes at most.
const MAX_KEY_INPUT: u64 = 64 * 1024;

/// Reads key material from `path`, or from `stdin` when no path (or `-`) is given.
pub fn read_key_input(path: Option<&Path>, stdin: &mut dyn Read) -> Result<Vec<u8>, SshCommandError> {
    match path {
        Some(path) if path != Path::new("-") => {
            let metadata = fs::metadata(path)?;
            if metadata.len() > MAX_KEY_INPUT {
                return Err(SshCommandError::InvalidKeyFormat(format!(
                    "{} is too large to be a public key",
                    path.display()
                )));
            }
            Ok(fs::read(path)?)
        }
        _ => {
            let mut buf = Vec::new();
            stdin.take(MAX_KEY_INPUT + 1).read_to_end(&mut buf)?;
            if buf.len() as u64 > MAX_KEY_INPUT {
                return Err(SshCommandError::InvalidKeyFormat(
                    "standard input is too large to be a public key".to_string(),
                ));
            }
            Ok(buf)
        }
    }
}

/// Joins command words the way they were given on the command line.
pub fn join_words(words: &[String]) -> String {
    words.join(" ")
}
