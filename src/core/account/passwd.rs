// src/core/account/passwd.rs

//! Parsing of passwd(5) formatted account databases.

use crate::core::account::Account;
use std::path::PathBuf;
use tracing::debug;

/// Parses a single `name:passwd:uid:gid:gecos:home:shell` line.
///
/// Returns `None` for comments, blank lines and malformed records.
pub fn parse_line(line: &str) -> Option<Account> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }

    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() != 7 || fields[0].is_empty() || fields[5].is_empty() {
        debug!("Skipping malformed passwd record: {:?}", line);
        return None;
    }

    Some(Account {
        name: fields[0].to_string(),
        home_dir: PathBuf::from(fields[5]),
        uid: fields[2].parse().ok(),
        gid: fields[3].parse().ok(),
    })
}

/// Finds the first record for `name` in the passwd database contents.
pub fn find(contents: &str, name: &str) -> Option<Account> {
    contents
        .lines()
        .filter_map(parse_line)
        .find(|account| account.name == name)
}
