//! Storage backend trait
//!
//! The minimal primitive set a hierarchical storage backend must
//! provide. Each primitive maps to a POSIX-equivalent call; the custom
//! additions are `translate` (the backend-specific path encoding rule),
//! `replication` and `locate_blocks` (block distribution reporting).

use bitflags::bitflags;
use fs_types::{Authority, FileMode};

use crate::error::BackendError;

/// Maximum length of a backend-native path, in bytes
///
/// Translation must fail rather than truncate when the encoded path
/// exceeds this bound.
pub const PATH_MAX: usize = 4096;

/// Maximum length of a replica host name, in bytes
pub const HOST_NAME_MAX: usize = 255;

bitflags! {
    /// Open flags for [`StorageBackend::open`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// Open for reading
        const READ = 1 << 0;
        /// Open for writing
        const WRITE = 1 << 1;
        /// Create the file if it does not exist
        const CREATE = 1 << 2;
        /// With CREATE: fail if the file already exists
        const EXCLUSIVE = 1 << 3;
        /// Truncate existing contents on open
        const TRUNCATE = 1 << 4;
        /// Every write lands at the end of the file
        const APPEND = 1 << 5;
    }
}

/// Origin for a seek operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Absolute offset from the start of the file
    Set,
    /// Relative to the current position
    Current,
    /// Relative to the end of the file
    End,
}

/// An open file descriptor
///
/// Valid from open to close. `INVALID` is the sentinel a stream handle
/// stores once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor(pub i64);

impl Descriptor {
    /// Sentinel value for a closed or never-opened descriptor
    pub const INVALID: Descriptor = Descriptor(-1);

    /// Returns true if this descriptor has not been invalidated
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

/// An open directory cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirHandle(pub u64);

/// Kind of a backend node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Stat record as reported by the backend
///
/// Times are seconds since the backend epoch; the bridge scales them to
/// milliseconds when building client-facing status records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStat {
    /// File or directory
    pub kind: NodeKind,
    /// Size in bytes
    pub size: u64,
    /// Raw mode word (permission bits, possibly with type bits)
    pub mode: u32,
    /// Numeric owner id
    pub uid: u32,
    /// Numeric group id
    pub gid: u32,
    /// Modification time, seconds since the backend epoch
    pub mtime_secs: i64,
    /// Access time, seconds since the backend epoch
    pub atime_secs: i64,
    /// Block size in bytes
    pub block_size: u64,
}

impl NodeStat {
    /// Returns true if this node is a directory
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// The Backend Capability Set
///
/// All methods take `&self` and must be safe to invoke concurrently
/// from multiple callers; any locking or atomicity (e.g. the
/// exclusive-create guarantee) is the backend's responsibility.
pub trait StorageBackend {
    /// One-time backend startup
    fn init(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// One-time backend teardown
    fn shutdown(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Encodes an authority plus logical path into a backend-native path
    ///
    /// The encoding is backend-specific: an authority may be folded into
    /// a path prefix, or discarded entirely on single-tenant backends.
    /// Every backend must implement this even if it ignores the
    /// authority. Must fail with `TooLong` rather than truncate.
    fn translate(
        &self,
        authority: Option<&Authority>,
        path: &str,
    ) -> Result<String, BackendError>;

    /// Opens a directory cursor
    ///
    /// Fails with `NotADirectory` when the path names a file. The entry
    /// stream includes the `.` and `..` pseudo-entries.
    fn open_dir(&self, path: &str) -> Result<DirHandle, BackendError>;

    /// Reads the next entry name, or `None` at the end of the stream
    fn read_dir_entry(&self, handle: DirHandle) -> Result<Option<String>, BackendError>;

    /// Closes a directory cursor
    fn close_dir(&self, handle: DirHandle) -> Result<(), BackendError>;

    /// Creates one directory (non-recursive)
    fn mkdir(&self, path: &str, mode: FileMode) -> Result<(), BackendError>;

    /// Removes one directory; fails with `DirectoryNotEmpty` if it has entries
    fn rmdir(&self, path: &str) -> Result<(), BackendError>;

    /// Opens a file, returning a descriptor
    ///
    /// `mode` applies only when the call creates the file.
    fn open(&self, path: &str, flags: OpenFlags, mode: FileMode)
        -> Result<Descriptor, BackendError>;

    /// Closes a descriptor
    fn close(&self, fd: Descriptor) -> Result<(), BackendError>;

    /// Removes a file
    fn unlink(&self, path: &str) -> Result<(), BackendError>;

    /// Reads up to `buf.len()` bytes at the descriptor's position
    ///
    /// Returns the count actually read; zero means end of file. Partial
    /// reads are legal.
    fn read(&self, fd: Descriptor, buf: &mut [u8]) -> Result<usize, BackendError>;

    /// Writes up to `buf.len()` bytes at the descriptor's position
    ///
    /// Returns the count actually accepted, which may be short.
    fn write(&self, fd: Descriptor, buf: &[u8]) -> Result<usize, BackendError>;

    /// Stats a path
    fn stat(&self, path: &str) -> Result<NodeStat, BackendError>;

    /// Repositions a descriptor, returning the resulting offset
    fn seek(&self, fd: Descriptor, offset: i64, whence: Whence) -> Result<u64, BackendError>;

    /// Reports the replication factor for a file's blocks
    fn replication(&self, path: &str) -> Result<u32, BackendError>;

    /// Reports per-block, per-replica location identifiers
    ///
    /// Outer index is the absolute block number, inner index the replica
    /// slot. Each identifier is URI-like: scheme-independent, with an
    /// authority segment and a host segment.
    fn locate_blocks(&self, path: &str) -> Result<Vec<Vec<String>>, BackendError>;

    /// Renames a file or directory
    fn rename(&self, src: &str, dst: &str) -> Result<(), BackendError>;

    /// Changes permission bits
    fn chmod(&self, path: &str, mode: FileMode) -> Result<(), BackendError>;

    /// Changes ownership; `None` leaves the respective id unchanged
    fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<(), BackendError>;
}
