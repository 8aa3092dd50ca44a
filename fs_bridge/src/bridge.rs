//! Client-facing bridge facade
//!
//! One value owning the storage backend and the identity database,
//! threaded explicitly through every call; there is no process-wide
//! cached state. Every entry point translates the logical path first,
//! invokes backend primitives, and assembles plain result records.

use backend_api::{ErrorCode, IdentityDatabase, StorageBackend};
use fs_types::{BlockLocation, FileMode, FileStatus, LogicalPath};

use crate::blocks;
use crate::dirtree;
use crate::error::{map_backend, BridgeError};
use crate::identity;
use crate::stream::{ReadStream, WriteMode, WriteStream};
use crate::translate::translate;

/// Permission bits used when creating parent directories implicitly
pub const DEFAULT_DIR_MODE: FileMode = FileMode(0o755);

/// The bridge between the host framework and a storage backend
///
/// Holds no shared mutable state of its own; all operations are
/// synchronous and safe to call from multiple threads as long as the
/// backend honors its concurrency contract.
pub struct FileSystemBridge<B: StorageBackend, I: IdentityDatabase> {
    backend: B,
    identity: I,
}

impl<B: StorageBackend, I: IdentityDatabase> FileSystemBridge<B, I> {
    /// Initializes the backend and builds the bridge
    pub fn new(backend: B, identity: I) -> Result<Self, BridgeError> {
        log::debug!("initializing bridge");
        backend.init().map_err(|e| BridgeError::io("init", &e))?;
        Ok(Self { backend, identity })
    }

    /// Tears the backend down
    pub fn shutdown(self) -> Result<(), BridgeError> {
        log::debug!("shutting down bridge");
        self.backend
            .shutdown()
            .map_err(|e| BridgeError::io("shutdown", &e))
    }

    /// Direct access to the backend, mainly for tests
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stats a path, building a fresh status record
    pub fn get_status(&self, path: &LogicalPath) -> Result<FileStatus, BridgeError> {
        log::debug!("get status for {}", path);
        let backend_path = translate(&self.backend, path)?;
        let stat = self.backend.stat(&backend_path).map_err(|e| {
            if e.code == ErrorCode::NotFound {
                BridgeError::NotFound(format!("stat: {}", e))
            } else {
                BridgeError::io("stat", &e)
            }
        })?;
        let replication = self
            .backend
            .replication(&backend_path)
            .map_err(|e| BridgeError::io("replication", &e))?;
        let owner = identity::owner_name(&self.identity, stat.uid)?;
        let group = identity::group_name(&self.identity, stat.gid)?;

        Ok(FileStatus {
            path: path.clone(),
            len: stat.size,
            is_dir: stat.is_dir(),
            replication,
            block_size: stat.block_size,
            modification_time: stat.mtime_secs * 1000,
            access_time: stat.atime_secs * 1000,
            permission: FileMode::from_raw(stat.mode),
            owner,
            group,
        })
    }

    /// Lists the entries of a directory as child logical paths
    ///
    /// Returns `None` when the path names something other than a
    /// directory. The `.` and `..` pseudo-entries are skipped.
    pub fn list_entries(
        &self,
        path: &LogicalPath,
    ) -> Result<Option<Vec<LogicalPath>>, BridgeError> {
        log::debug!("list entries of {}", path);
        let backend_path = translate(&self.backend, path)?;
        let handle = match self.backend.open_dir(&backend_path) {
            Ok(handle) => handle,
            Err(e) if e.code == ErrorCode::NotADirectory => return Ok(None),
            Err(e) => return Err(BridgeError::io("open_dir", &e)),
        };

        let mut entries = Vec::new();
        let result = loop {
            match self.backend.read_dir_entry(handle) {
                Ok(Some(name)) => {
                    if name != "." && name != ".." {
                        entries.push(path.child(&name));
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(BridgeError::io("read_dir_entry", &e)),
            }
        };
        let close_result = self.backend.close_dir(handle);
        result?;
        close_result.map_err(|e| BridgeError::io("close_dir", &e))?;
        Ok(Some(entries))
    }

    /// Stats every entry of a directory
    ///
    /// Non-directories produce an empty listing, matching the client
    /// contract for flat status listings.
    pub fn list_status(&self, path: &LogicalPath) -> Result<Vec<FileStatus>, BridgeError> {
        log::debug!("list status for {}", path);
        let status = self.get_status(path)?;
        if !status.is_dir {
            return Ok(Vec::new());
        }
        let entries = self.list_entries(path)?.unwrap_or_default();
        entries
            .iter()
            .map(|entry| self.get_status(entry))
            .collect()
    }

    /// Creates a directory and all missing ancestors
    pub fn make_directories(
        &self,
        path: &LogicalPath,
        mode: FileMode,
    ) -> Result<bool, BridgeError> {
        log::debug!("make directories to {} with mode {}", path, mode);
        let backend_path = translate(&self.backend, path)?;
        dirtree::make_directories(&self.backend, &backend_path, mode)?;
        Ok(true)
    }

    /// Renames a file or directory
    pub fn rename(&self, src: &LogicalPath, dst: &LogicalPath) -> Result<bool, BridgeError> {
        log::debug!("rename {} to {}", src, dst);
        let backend_src = translate(&self.backend, src)?;
        let backend_dst = translate(&self.backend, dst)?;
        self.backend
            .rename(&backend_src, &backend_dst)
            .map_err(|e| map_backend("rename", e))?;
        Ok(true)
    }

    /// Deletes a path, recursively if asked
    pub fn delete(&self, path: &LogicalPath, recursive: bool) -> Result<bool, BridgeError> {
        log::debug!("delete {} with recursive={}", path, recursive);
        let backend_path = translate(&self.backend, path)?;
        dirtree::delete(&self.backend, &backend_path, recursive)?;
        Ok(true)
    }

    /// Applies permission bits to a path
    pub fn set_permission(&self, path: &LogicalPath, mode: FileMode) -> Result<(), BridgeError> {
        log::debug!("set permission for {} to {}", path, mode);
        let backend_path = translate(&self.backend, path)?;
        self.backend
            .chmod(&backend_path, mode)
            .map_err(|e| BridgeError::io("chmod", &e))
    }

    /// Changes ownership; a `None` component is left unchanged
    ///
    /// With both components `None` nothing is done. Names must resolve;
    /// an unknown name is an identity error and nothing is changed.
    pub fn set_owner(
        &self,
        path: &LogicalPath,
        owner: Option<&str>,
        group: Option<&str>,
    ) -> Result<(), BridgeError> {
        if owner.is_none() && group.is_none() {
            return Ok(());
        }
        log::debug!("set owner for {} to {:?}:{:?}", path, owner, group);
        let backend_path = translate(&self.backend, path)?;
        let uid = owner
            .map(|name| identity::user_id(&self.identity, name))
            .transpose()?;
        let gid = group
            .map(|name| identity::group_id(&self.identity, name))
            .transpose()?;
        self.backend
            .chown(&backend_path, uid, gid)
            .map_err(|e| BridgeError::io("chown", &e))
    }

    /// Resolves block locations for a byte range of a file
    pub fn get_block_locations(
        &self,
        status: &FileStatus,
        start: u64,
        len: u64,
    ) -> Result<Vec<BlockLocation>, BridgeError> {
        let backend_path = translate(&self.backend, &status.path)?;
        blocks::block_locations(&self.backend, &backend_path, status, start, len)
    }

    /// Opens a readable stream; directories cannot be opened
    pub fn open_read(&self, path: &LogicalPath) -> Result<ReadStream<'_, B>, BridgeError> {
        log::debug!("open {}", path);
        let status = self.get_status(path)?;
        if status.is_dir {
            return Err(BridgeError::NotFound(format!(
                "open: cannot open directory {}",
                path
            )));
        }
        ReadStream::open(&self.backend, path.clone(), status.len)
    }

    /// Creates a file for writing, making parent directories first
    ///
    /// With `overwrite` false an existing target is an already-exists
    /// failure. Parent directories are created with default
    /// permissions.
    pub fn create(
        &self,
        path: &LogicalPath,
        mode: FileMode,
        overwrite: bool,
    ) -> Result<WriteStream<'_, B>, BridgeError> {
        log::debug!("create {} with mode {} overwrite={}", path, mode, overwrite);
        if !overwrite {
            match self.get_status(path) {
                Ok(_) => {
                    return Err(BridgeError::AlreadyExists(format!(
                        "create: {} exists",
                        path
                    )))
                }
                Err(BridgeError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        if let Some(parent) = path.parent() {
            self.make_directories(&parent, DEFAULT_DIR_MODE)?;
        }
        WriteStream::open(&self.backend, path.clone(), WriteMode::Create { mode, overwrite })
    }

    /// Opens an existing file for appending
    pub fn append(&self, path: &LogicalPath) -> Result<WriteStream<'_, B>, BridgeError> {
        log::debug!("append to {}", path);
        let status = self.get_status(path)?;
        if status.is_dir {
            return Err(BridgeError::NotFound(format!(
                "append: cannot open directory {}",
                path
            )));
        }
        WriteStream::open(&self.backend, path.clone(), WriteMode::Append)
    }
}
