// src/core/acl/keys_file.rs

//! The authorized_keys file of one account, and the exclusive lock that
//! guards every read-modify-write of it.

use crate::core::SshCommandError;
use crate::core::account::Account;
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::{DirBuilderExt, FileExt, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SSH_DIR: &str = ".ssh";
pub const AUTHORIZED_KEYS: &str = "authorized_keys";

/// Handle on `<home>/.ssh/authorized_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedKeysFile {
    path: PathBuf,
}

impl AuthorizedKeysFile {
    pub fn for_home(home_dir: &Path) -> Self {
        Self {
            path: home_dir.join(SSH_DIR).join(AUTHORIZED_KEYS),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ssh_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Reads the whole file. `None` means the file does not exist.
    pub fn read(&self) -> Result<Option<Vec<u8>>, SshCommandError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Takes the exclusive advisory lock on the `.ssh` directory, creating the
    /// directory (mode 0700) if needed. The lock is held until the guard drops.
    pub fn lock(&self) -> Result<KeysFileLock<'_>, SshCommandError> {
        let dir = self.ssh_dir();
        DirBuilder::new().recursive(true).mode(0o700).create(dir)?;

        let handle = File::open(dir)?;
        flock(&handle, libc::LOCK_EX).map_err(|e| {
            SshCommandError::LockingError(format!("failed to lock {}: {e}", dir.display()))
        })?;
        debug!("Acquired lock on {}", dir.display());

        Ok(KeysFileLock {
            file: self,
            handle,
        })
    }
}

/// Splits file contents into lines, each keeping its trailing newline.
pub fn split_lines(contents: &[u8]) -> impl Iterator<Item = &[u8]> {
    contents.split_inclusive(|b| *b == b'\n')
}

/// Proof that the account's keys file is exclusively locked. All mutations go
/// through it.
#[derive(Debug)]
pub struct KeysFileLock<'a> {
    file: &'a AuthorizedKeysFile,
    handle: File,
}

impl KeysFileLock<'_> {
    pub fn read(&self) -> Result<Option<Vec<u8>>, SshCommandError> {
        self.file.read()
    }

    /// Creates the file empty with mode 0600 and hands it to `account`. If the
    /// ownership change fails the file is removed again.
    pub fn create_owned_by(&self, account: &Account) -> Result<(), SshCommandError> {
        let path = self.file.path();
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(path)?;

        if let Err(e) = account.take_ownership(path) {
            if let Err(cleanup) = fs::remove_file(path) {
                warn!("Failed to remove {}: {}", path.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Appends one line, creating the file with mode 0600 when absent. A
    /// newline is inserted first if the file does not end with one.
    pub fn append_line(&self, line: &str) -> Result<(), SshCommandError> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .mode(0o600)
            .open(self.file.path())?;

        let len = file.metadata()?.len();
        let mut buf = Vec::with_capacity(line.len() + 2);
        if len > 0 {
            let mut last = [0u8; 1];
            file.read_exact_at(&mut last, len - 1)?;
            if last[0] != b'\n' {
                buf.push(b'\n');
            }
        }
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        file.write_all(&buf)?;
        file.sync_all()?;
        Ok(())
    }

    /// Atomically replaces the file contents: writes a temporary file next to
    /// it with the same mode and owner, then renames it into place.
    pub fn rewrite(&self, contents: &[u8]) -> Result<(), SshCommandError> {
        let path = self.file.path();
        let metadata = fs::metadata(path)?;
        let temp_path = path.with_file_name(format!(
            "{AUTHORIZED_KEYS}.tmp-{}",
            rand::random::<u32>()
        ));

        let result = write_replacement(&temp_path, contents, &metadata)
            .and_then(|_| fs::rename(&temp_path, path));
        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&temp_path)
                && cleanup.kind() != ErrorKind::NotFound
            {
                warn!(
                    "Failed to remove temporary file {}: {}",
                    temp_path.display(),
                    cleanup
                );
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl Drop for KeysFileLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = flock(&self.handle, libc::LOCK_UN) {
            warn!(
                "Failed to unlock {}: {}",
                self.file.ssh_dir().display(),
                e
            );
        }
    }
}

fn write_replacement(temp_path: &Path, contents: &[u8], original: &fs::Metadata) -> io::Result<()> {
    let mut temp = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(original.permissions().mode() & 0o7777)
        .open(temp_path)?;
    temp.write_all(contents)?;
    temp.sync_all()?;
    fs::set_permissions(temp_path, original.permissions())?;
    std::os::unix::fs::chown(temp_path, Some(original.uid()), Some(original.gid()))?;
    Ok(())
}

fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
    loop {
        // SAFETY: the descriptor is owned by `file` and stays open for the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), operation) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
