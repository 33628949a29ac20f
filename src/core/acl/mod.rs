// src/core/acl/mod.rs

//! The authorized_keys ACL engine: entry codec, forced command builder,
//! locked file access and the store operations built on top of them.

pub mod entry;
pub mod forced_command;
pub mod keys_file;
pub mod store;

pub use entry::{AclEntry, AclRecord};
pub use forced_command::{COMMAND_FILE, DEFAULT_ALLOWED_KEYS, ForcedCommand};
pub use keys_file::AuthorizedKeysFile;
pub use store::AclStore;
