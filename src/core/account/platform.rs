// src/core/account/platform.rs

//! Platform detection and the per-platform account creation strategies.
//!
//! The distribution is identified from an os-release(5) file. Each supported
//! family maps to a fixed sequence of user-management invocations.

use crate::core::SshCommandError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// The fields of an os-release file relevant to platform dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub id_like: Vec<String>,
}

impl OsRelease {
    pub fn from_file(path: &Path) -> Result<Self, SshCommandError> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Parses `KEY=value` lines, stripping optional single or double quotes.
    pub fn parse(contents: &str) -> Self {
        let mut release = OsRelease::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
            match key.trim() {
                "ID" => release.id = value.to_ascii_lowercase(),
                "ID_LIKE" => {
                    release.id_like = value
                        .split_whitespace()
                        .map(|s| s.to_ascii_lowercase())
                        .collect()
                }
                _ => {}
            }
        }
        release
    }
}

/// Supported distribution families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Debian,
    Alpine,
    Arch,
    RedHat,
    Suse,
}

impl Platform {
    /// Detects the platform family. `ID` takes precedence over `ID_LIKE`.
    pub fn detect(release: &OsRelease) -> Option<Platform> {
        std::iter::once(release.id.as_str())
            .chain(release.id_like.iter().map(String::as_str))
            .find_map(Self::from_id)
    }

    fn from_id(id: &str) -> Option<Platform> {
        match id {
            "debian" | "ubuntu" | "raspbian" | "linuxmint" | "pop" => Some(Platform::Debian),
            "alpine" => Some(Platform::Alpine),
            "arch" | "archarm" | "manjaro" => Some(Platform::Arch),
            "rhel" | "centos" | "fedora" | "rocky" | "almalinux" | "amzn" | "ol" => {
                Some(Platform::RedHat)
            }
            "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" | "sles" | "suse" => {
                Some(Platform::Suse)
            }
            _ => None,
        }
    }

    /// The user-management invocations that create a key-only account.
    pub fn creation_steps(self, name: &str) -> Vec<Vec<String>> {
        let step = |args: &[&str]| args.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match self {
            Platform::Debian => vec![step(&[
                "adduser",
                "--disabled-password",
                "--gecos",
                "",
                name,
            ])],
            Platform::Alpine => vec![step(&["adduser", "-D", "-g", "", "-s", "/bin/sh", name])],
            Platform::Arch | Platform::RedHat | Platform::Suse => vec![
                step(&["useradd", "-m", "-s", "/bin/bash", name]),
                step(&["usermod", "-L", name]),
            ],
        }
    }

    /// Builds the account creation strategy for this platform.
    pub fn creator(self) -> CommandCreator {
        CommandCreator { platform: self }
    }
}

/// A strategy that creates OS accounts.
pub trait AccountCreator {
    fn create(&self, name: &str) -> Result<(), SshCommandError>;
}

/// Creates accounts by running the platform's user-management tools.
#[derive(Debug, Clone, Copy)]
pub struct CommandCreator {
    platform: Platform,
}

impl CommandCreator {
    /// Detects the platform from the os-release file at `path`.
    pub fn detect(path: &Path) -> Result<Self, SshCommandError> {
        let release = OsRelease::from_file(path)?;
        let platform = Platform::detect(&release)
            .ok_or_else(|| SshCommandError::UnsupportedPlatform(release.id.clone()))?;
        debug!("Detected platform {:?} from {}", platform, path.display());
        Ok(platform.creator())
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

impl AccountCreator for CommandCreator {
    fn create(&self, name: &str) -> Result<(), SshCommandError> {
        for step in self.platform.creation_steps(name) {
            let Some((program, args)) = step.split_first() else {
                continue;
            };
            info!("Running {} for account '{}'", program, name);

            let output = Command::new(program).args(args).output().map_err(|e| {
                SshCommandError::AccountCreation(format!("failed to run {program}: {e}"))
            })?;

            if !output.status.success() {
                return Err(SshCommandError::AccountCreation(format!(
                    "{program} exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
        }
        Ok(())
    }
}

/// Detects the platform from an os-release file each time an account is
/// created, so resolving existing accounts never depends on it.
#[derive(Debug, Clone)]
pub struct DetectingCreator {
    os_release_path: PathBuf,
}

impl DetectingCreator {
    pub fn new(os_release_path: impl Into<PathBuf>) -> Self {
        Self {
            os_release_path: os_release_path.into(),
        }
    }
}

impl AccountCreator for DetectingCreator {
    fn create(&self, name: &str) -> Result<(), SshCommandError> {
        CommandCreator::detect(&self.os_release_path)?.create(name)
    }
}
