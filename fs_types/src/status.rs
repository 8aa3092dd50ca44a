//! File status and block location records
//!
//! Both records are assembled by the bridge on demand and owned by the
//! caller; nothing here is cached.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::LogicalPath;

/// Permission bits for a file or directory
///
/// Only the low 12 bits (rwx triplets plus setuid/setgid/sticky) are
/// meaningful; file-type bits are never carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMode(pub u32);

impl FileMode {
    /// Mask selecting the permission bits of a raw mode word
    pub const PERMISSION_MASK: u32 = 0o7777;

    /// Creates a mode from a raw mode word, discarding type bits
    pub fn from_raw(mode: u32) -> Self {
        Self(mode & Self::PERMISSION_MASK)
    }

    /// Returns the bits as a plain integer
    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// Status record for one file or directory
///
/// Built fresh on every stat call. Block-related fields are populated
/// from whatever the backend reports even for non-regular files, where
/// they carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    /// Logical path this status describes
    pub path: LogicalPath,
    /// Size in bytes
    pub len: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Replication factor for the file's blocks
    pub replication: u32,
    /// Block size in bytes
    pub block_size: u64,
    /// Modification time, milliseconds since the backend epoch
    pub modification_time: i64,
    /// Access time, milliseconds since the backend epoch
    pub access_time: i64,
    /// Permission bits
    pub permission: FileMode,
    /// Owner name ("unknown" when the identity database has no answer)
    pub owner: String,
    /// Group name ("unknown" when the identity database has no answer)
    pub group: String,
}

impl FileStatus {
    /// Returns true if this status describes a regular file
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

/// Location record for one block of a file
///
/// `names[i]` and `hosts[i]` describe the same replica: the name is the
/// full authority (`host:port`) of the replica's location identifier,
/// the host is its host component alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocation {
    /// Authority string per replica
    pub names: Vec<String>,
    /// Host string per replica, index-aligned with `names`
    pub hosts: Vec<String>,
    /// Byte offset of this block from the start of the file
    pub offset: u64,
    /// Length of this block in bytes
    pub len: u64,
}
