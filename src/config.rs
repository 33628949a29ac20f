// src/config.rs

//! Manages configuration: loading, environment overrides, and validation.

use crate::core::acl::DEFAULT_ALLOWED_KEYS;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file read when no explicit path is given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sshcommand/config.toml";

/// Settings that shape every ACL entry written by `acl-add`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AclConfig {
    /// Restriction options appended after the forced command, in order.
    pub allowed_keys: Vec<String>,
    /// If true, the same key may be registered under several names. Set it
    /// to false to reject a key that is already granted under another name.
    pub ignore_duplicate_fingerprints: bool,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            allowed_keys: default_allowed_keys(),
            ignore_duplicate_fingerprints: default_ignore_duplicate_fingerprints(),
        }
    }
}

/// Restriction flags may be written as a TOML list or as one comma-joined string.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum AllowedKeysConfig {
    List(Vec<String>),
    String(String),
}

impl AllowedKeysConfig {
    fn resolve(self) -> Vec<String> {
        match self {
            AllowedKeysConfig::List(flags) => flags.into_iter().map(|f| f.trim().to_string()).collect(),
            AllowedKeysConfig::String(s) => split_flags(&s),
        }
    }
}

/// A raw representation of the config file before validation and resolution.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    allowed_keys: Option<AllowedKeysConfig>,
    #[serde(default = "default_ignore_duplicate_fingerprints")]
    ignore_duplicate_fingerprints: bool,
    #[serde(default = "default_os_release_path")]
    os_release_path: PathBuf,
    #[serde(default = "default_passwd_path")]
    passwd_path: PathBuf,
}

fn default_log_level() -> String {
    "warn".to_string()
}
fn default_allowed_keys() -> Vec<String> {
    DEFAULT_ALLOWED_KEYS.iter().map(|s| s.to_string()).collect()
}
fn default_ignore_duplicate_fingerprints() -> bool {
    true
}
fn default_os_release_path() -> PathBuf {
    PathBuf::from("/etc/os-release")
}
fn default_passwd_path() -> PathBuf {
    PathBuf::from("/etc/passwd")
}

/// Represents the final, validated configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub log_level: String,
    #[serde(flatten)]
    pub acl: AclConfig,
    /// Used only to pick the account creation strategy.
    pub os_release_path: PathBuf,
    /// The account database consulted for existence and home directories.
    pub passwd_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            acl: AclConfig::default(),
            os_release_path: default_os_release_path(),
            passwd_path: default_passwd_path(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{}'", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Invalid configuration in '{}'", path.display()))?;
        info!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        let config = Config {
            log_level: raw_config.log_level,
            acl: AclConfig {
                allowed_keys: raw_config
                    .allowed_keys
                    .map(AllowedKeysConfig::resolve)
                    .unwrap_or_else(default_allowed_keys),
                ignore_duplicate_fingerprints: raw_config.ignore_duplicate_fingerprints,
            },
            os_release_path: raw_config.os_release_path,
            passwd_path: raw_config.passwd_path,
        };

        config.validate()?;
        Ok(config)
    }

    /// Loads the explicit config file, else the default file when present,
    /// else built-in defaults; then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Config::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `SSHCOMMAND_*` overrides obtained through `var`.
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flags) = var("SSHCOMMAND_ALLOWED_KEYS") {
            self.acl.allowed_keys = split_flags(&flags);
        }
        if let Some(value) = var("SSHCOMMAND_IGNORE_DUPLICATE_FINGERPRINTS") {
            self.acl.ignore_duplicate_fingerprints = parse_bool(&value).ok_or_else(|| {
                anyhow!("SSHCOMMAND_IGNORE_DUPLICATE_FINGERPRINTS must be a boolean, got '{value}'")
            })?;
        }
        if let Some(path) = var("SSHCOMMAND_OSRELEASE") {
            self.os_release_path = PathBuf::from(path);
        }
        if let Some(path) = var("SSHCOMMAND_PASSWD") {
            self.passwd_path = PathBuf::from(path);
        }
        self.validate()
    }

    /// Validates the resolved configuration to ensure logical consistency.
    fn validate(&self) -> Result<()> {
        if self.acl.allowed_keys.is_empty() {
            warn!("allowed_keys is empty; keys will only be restricted by their forced command");
        }
        for flag in &self.acl.allowed_keys {
            if flag.is_empty() {
                return Err(anyhow!("allowed_keys cannot contain empty entries"));
            }
            if flag.chars().any(char::is_whitespace) {
                return Err(anyhow!("allowed_keys entry '{flag}' cannot contain whitespace"));
            }
        }
        if self.os_release_path.as_os_str().is_empty() {
            return Err(anyhow!("os_release_path cannot be empty"));
        }
        if self.passwd_path.as_os_str().is_empty() {
            return Err(anyhow!("passwd_path cannot be empty"));
        }
        Ok(())
    }
}

fn split_flags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
