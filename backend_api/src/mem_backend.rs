//! In-memory reference backend
//!
//! Implements the full capability set over a tree of nodes held in a
//! mutex, so `&self` primitives stay safe under concurrent callers.
//! Used by every bridge test and usable as a scratch backend.
//!
//! The translate rule folds the authority host into a path prefix, the
//! way a partitioned backend addresses its mount points:
//! `//part1/tmp/x` becomes `/part1/tmp/x`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

use fs_types::{Authority, FileMode};

use crate::backend::{
    Descriptor, DirHandle, NodeKind, NodeStat, OpenFlags, StorageBackend, Whence, PATH_MAX,
};
use crate::error::{BackendError, ErrorCode};

const DEFAULT_BLOCK_SIZE: u64 = 4096;
const DEFAULT_REPLICATION: u32 = 3;

#[derive(Debug, Clone)]
struct Meta {
    mode: u32,
    uid: u32,
    gid: u32,
    mtime: i64,
    atime: i64,
}

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, meta: Meta },
    Dir { meta: Meta },
}

impl Node {
    fn meta(&self) -> &Meta {
        match self {
            Node::File { meta, .. } => meta,
            Node::Dir { meta } => meta,
        }
    }

    fn meta_mut(&mut self) -> &mut Meta {
        match self {
            Node::File { meta, .. } => meta,
            Node::Dir { meta } => meta,
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, Node::Dir { .. })
    }
}

#[derive(Debug)]
struct OpenFile {
    path: String,
    pos: u64,
    readable: bool,
    writable: bool,
    append: bool,
}

#[derive(Debug)]
struct MemState {
    nodes: BTreeMap<String, Node>,
    open_files: BTreeMap<i64, OpenFile>,
    cursors: BTreeMap<u64, VecDeque<String>>,
    next_fd: i64,
    next_cursor: u64,
    clock_secs: i64,
    default_replication: u32,
    default_block_size: u64,
    replication_overrides: BTreeMap<String, u32>,
    location_overrides: BTreeMap<String, Vec<Vec<String>>>,
    write_limit: Option<usize>,
    contended_dirs: BTreeSet<String>,
    fail_close: bool,
}

impl MemState {
    fn node(&self, path: &str) -> Result<&Node, BackendError> {
        self.nodes
            .get(path)
            .ok_or_else(|| BackendError::not_found(path))
    }

    fn child_names(&self, path: &str) -> Vec<String> {
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                if rest.is_empty() || rest.contains('/') {
                    None
                } else {
                    Some(rest.to_string())
                }
            })
            .collect()
    }
}

/// In-memory storage backend
#[derive(Debug)]
pub struct MemBackend {
    state: Mutex<MemState>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemBackend {
    /// Creates a backend containing only the root directory
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Node::Dir {
                meta: Meta {
                    mode: 0o755,
                    uid: 0,
                    gid: 0,
                    mtime: 0,
                    atime: 0,
                },
            },
        );
        Self {
            state: Mutex::new(MemState {
                nodes,
                open_files: BTreeMap::new(),
                cursors: BTreeMap::new(),
                next_fd: 3,
                next_cursor: 1,
                clock_secs: 0,
                default_replication: DEFAULT_REPLICATION,
                default_block_size: DEFAULT_BLOCK_SIZE,
                replication_overrides: BTreeMap::new(),
                location_overrides: BTreeMap::new(),
                write_limit: None,
                contended_dirs: BTreeSet::new(),
                fail_close: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemState> {
        // A poisoned mutex means a panicking test, not a backend failure
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sets the fake clock used for mtime/atime stamping
    pub fn set_clock(&self, secs: i64) {
        self.lock().clock_secs = secs;
    }

    /// Caps the number of bytes accepted by a single write call
    ///
    /// Lets tests exercise the bridge's write-completion loop against
    /// short writes.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.lock().write_limit = limit;
    }

    /// Marks a directory as created by a concurrent client
    ///
    /// The directory exists in the tree, but `stat` keeps reporting it
    /// missing and `mkdir` reports it already existing, the window a
    /// racing ensure-path-exists caller observes.
    pub fn set_contended_dir(&self, path: &str) {
        let mut state = self.lock();
        let now = state.clock_secs;
        state.nodes.entry(path.to_string()).or_insert(Node::Dir {
            meta: Meta {
                mode: 0o755,
                uid: 0,
                gid: 0,
                mtime: now,
                atime: now,
            },
        });
        state.contended_dirs.insert(path.to_string());
    }

    /// Makes every close call report a failure after releasing the
    /// descriptor
    pub fn set_close_error(&self, enabled: bool) {
        self.lock().fail_close = enabled;
    }

    /// Sets the replication factor reported for all files by default
    pub fn set_default_replication(&self, replication: u32) {
        self.lock().default_replication = replication;
    }

    /// Sets the block size reported in stat records
    pub fn set_default_block_size(&self, block_size: u64) {
        self.lock().default_block_size = block_size;
    }

    /// Overrides the replication factor for one backend path
    pub fn set_replication(&self, path: &str, replication: u32) {
        self.lock()
            .replication_overrides
            .insert(path.to_string(), replication);
    }

    /// Overrides the per-block replica location identifiers for one path
    pub fn set_block_locations(&self, path: &str, locations: Vec<Vec<String>>) {
        self.lock()
            .location_overrides
            .insert(path.to_string(), locations);
    }
}

fn check_absolute(path: &str) -> Result<(), BackendError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(BackendError::new(
            ErrorCode::Other,
            format!("path is not absolute: {}", path),
        ))
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "/",
    }
}

impl StorageBackend for MemBackend {
    fn translate(
        &self,
        authority: Option<&Authority>,
        path: &str,
    ) -> Result<String, BackendError> {
        let rel = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let mut full = match authority {
            Some(authority) => format!("/{}{}", authority.host, rel),
            None => rel,
        };
        while full.len() > 1 && full.ends_with('/') {
            full.pop();
        }
        if full.len() >= PATH_MAX {
            return Err(BackendError::new(
                ErrorCode::TooLong,
                format!("translated path exceeds {} bytes", PATH_MAX),
            ));
        }
        Ok(full)
    }

    fn open_dir(&self, path: &str) -> Result<DirHandle, BackendError> {
        check_absolute(path)?;
        let mut state = self.lock();
        let node = state.node(path)?;
        if !node.is_dir() {
            return Err(BackendError::code(ErrorCode::NotADirectory));
        }
        let mut entries: VecDeque<String> = VecDeque::new();
        entries.push_back(".".to_string());
        entries.push_back("..".to_string());
        for name in state.child_names(path) {
            entries.push_back(name);
        }
        let handle = DirHandle(state.next_cursor);
        state.next_cursor += 1;
        state.cursors.insert(handle.0, entries);
        Ok(handle)
    }

    fn read_dir_entry(&self, handle: DirHandle) -> Result<Option<String>, BackendError> {
        let mut state = self.lock();
        let cursor = state
            .cursors
            .get_mut(&handle.0)
            .ok_or_else(|| BackendError::code(ErrorCode::BadDescriptor))?;
        Ok(cursor.pop_front())
    }

    fn close_dir(&self, handle: DirHandle) -> Result<(), BackendError> {
        let mut state = self.lock();
        state
            .cursors
            .remove(&handle.0)
            .map(|_| ())
            .ok_or_else(|| BackendError::code(ErrorCode::BadDescriptor))
    }

    fn mkdir(&self, path: &str, mode: FileMode) -> Result<(), BackendError> {
        check_absolute(path)?;
        let mut state = self.lock();
        if state.contended_dirs.contains(path) {
            return Err(BackendError::new(
                ErrorCode::AlreadyExists,
                format!("entry exists: {}", path),
            ));
        }
        if state.nodes.contains_key(path) {
            return Err(BackendError::new(
                ErrorCode::AlreadyExists,
                format!("entry exists: {}", path),
            ));
        }
        match state.nodes.get(parent_of(path)) {
            Some(node) if node.is_dir() => {}
            Some(_) => return Err(BackendError::code(ErrorCode::NotADirectory)),
            None => return Err(BackendError::not_found(parent_of(path))),
        }
        let now = state.clock_secs;
        state.nodes.insert(
            path.to_string(),
            Node::Dir {
                meta: Meta {
                    mode: mode.bits(),
                    uid: 0,
                    gid: 0,
                    mtime: now,
                    atime: now,
                },
            },
        );
        Ok(())
    }

    fn rmdir(&self, path: &str) -> Result<(), BackendError> {
        check_absolute(path)?;
        let mut state = self.lock();
        match state.nodes.get(path) {
            Some(node) if !node.is_dir() => {
                return Err(BackendError::code(ErrorCode::NotADirectory))
            }
            Some(_) => {}
            None => return Err(BackendError::not_found(path)),
        }
        if !state.child_names(path).is_empty() {
            return Err(BackendError::new(
                ErrorCode::DirectoryNotEmpty,
                format!("directory not empty: {}", path),
            ));
        }
        state.nodes.remove(path);
        Ok(())
    }

    fn open(
        &self,
        path: &str,
        flags: OpenFlags,
        mode: FileMode,
    ) -> Result<Descriptor, BackendError> {
        check_absolute(path)?;
        let mut state = self.lock();
        let now = state.clock_secs;
        let writable = flags.contains(OpenFlags::WRITE);
        let append = flags.contains(OpenFlags::APPEND);

        let exists_as_dir = matches!(state.nodes.get(path), Some(node) if node.is_dir());
        if exists_as_dir {
            return Err(BackendError::code(ErrorCode::IsADirectory));
        }

        if writable && flags.contains(OpenFlags::CREATE) {
            if state.nodes.contains_key(path) {
                if flags.contains(OpenFlags::EXCLUSIVE) {
                    return Err(BackendError::new(
                        ErrorCode::AlreadyExists,
                        format!("entry exists: {}", path),
                    ));
                }
                if flags.contains(OpenFlags::TRUNCATE) {
                    if let Some(Node::File { data, meta }) = state.nodes.get_mut(path) {
                        data.clear();
                        meta.mtime = now;
                    }
                }
            } else {
                match state.nodes.get(parent_of(path)) {
                    Some(node) if node.is_dir() => {}
                    Some(_) => return Err(BackendError::code(ErrorCode::NotADirectory)),
                    None => return Err(BackendError::not_found(parent_of(path))),
                }
                state.nodes.insert(
                    path.to_string(),
                    Node::File {
                        data: Vec::new(),
                        meta: Meta {
                            mode: mode.bits(),
                            uid: 0,
                            gid: 0,
                            mtime: now,
                            atime: now,
                        },
                    },
                );
            }
        } else if !state.nodes.contains_key(path) {
            return Err(BackendError::not_found(path));
        }

        let fd = Descriptor(state.next_fd);
        state.next_fd += 1;
        state.open_files.insert(
            fd.0,
            OpenFile {
                path: path.to_string(),
                pos: 0,
                readable: !writable,
                writable,
                append,
            },
        );
        Ok(fd)
    }

    fn close(&self, fd: Descriptor) -> Result<(), BackendError> {
        let mut state = self.lock();
        state
            .open_files
            .remove(&fd.0)
            .ok_or_else(|| BackendError::code(ErrorCode::BadDescriptor))?;
        if state.fail_close {
            return Err(BackendError::new(ErrorCode::Other, "close failed"));
        }
        Ok(())
    }

    fn unlink(&self, path: &str) -> Result<(), BackendError> {
        check_absolute(path)?;
        let mut state = self.lock();
        match state.nodes.get(path) {
            Some(node) if node.is_dir() => {
                return Err(BackendError::code(ErrorCode::IsADirectory))
            }
            Some(_) => {}
            None => return Err(BackendError::not_found(path)),
        }
        state.nodes.remove(path);
        state.location_overrides.remove(path);
        state.replication_overrides.remove(path);
        Ok(())
    }

    fn read(&self, fd: Descriptor, buf: &mut [u8]) -> Result<usize, BackendError> {
        let mut state = self.lock();
        let open = state
            .open_files
            .get(&fd.0)
            .ok_or_else(|| BackendError::code(ErrorCode::BadDescriptor))?;
        if !open.readable {
            return Err(BackendError::new(
                ErrorCode::BadDescriptor,
                "descriptor not open for reading",
            ));
        }
        let path = open.path.clone();
        let pos = open.pos;
        let count = match state.node(&path)? {
            Node::File { data, .. } => {
                let start = (pos as usize).min(data.len());
                let count = buf.len().min(data.len() - start);
                buf[..count].copy_from_slice(&data[start..start + count]);
                count
            }
            Node::Dir { .. } => return Err(BackendError::code(ErrorCode::IsADirectory)),
        };
        if let Some(open) = state.open_files.get_mut(&fd.0) {
            open.pos += count as u64;
        }
        Ok(count)
    }

    fn write(&self, fd: Descriptor, buf: &[u8]) -> Result<usize, BackendError> {
        let mut state = self.lock();
        let limit = state.write_limit;
        let now = state.clock_secs;
        let open = state
            .open_files
            .get(&fd.0)
            .ok_or_else(|| BackendError::code(ErrorCode::BadDescriptor))?;
        if !open.writable {
            return Err(BackendError::new(
                ErrorCode::BadDescriptor,
                "descriptor not open for writing",
            ));
        }
        let path = open.path.clone();
        let pos = open.pos;
        let append = open.append;

        let count = buf.len().min(limit.unwrap_or(usize::MAX));
        let new_pos = match state.nodes.get_mut(&path) {
            Some(Node::File { data, meta }) => {
                let start = if append { data.len() } else { pos as usize };
                if start > data.len() {
                    data.resize(start, 0);
                }
                let end = start + count;
                if end > data.len() {
                    data.resize(end, 0);
                }
                data[start..end].copy_from_slice(&buf[..count]);
                meta.mtime = now;
                end as u64
            }
            Some(Node::Dir { .. }) => return Err(BackendError::code(ErrorCode::IsADirectory)),
            None => return Err(BackendError::not_found(&path)),
        };
        if let Some(open) = state.open_files.get_mut(&fd.0) {
            open.pos = new_pos;
        }
        Ok(count)
    }

    fn stat(&self, path: &str) -> Result<NodeStat, BackendError> {
        check_absolute(path)?;
        let state = self.lock();
        if state.contended_dirs.contains(path) {
            return Err(BackendError::not_found(path));
        }
        let block_size = state.default_block_size;
        let node = state.node(path)?;
        let meta = node.meta();
        Ok(NodeStat {
            kind: if node.is_dir() {
                NodeKind::Directory
            } else {
                NodeKind::File
            },
            size: match node {
                Node::File { data, .. } => data.len() as u64,
                Node::Dir { .. } => 0,
            },
            mode: meta.mode,
            uid: meta.uid,
            gid: meta.gid,
            mtime_secs: meta.mtime,
            atime_secs: meta.atime,
            block_size,
        })
    }

    fn seek(&self, fd: Descriptor, offset: i64, whence: Whence) -> Result<u64, BackendError> {
        let mut state = self.lock();
        let open = state
            .open_files
            .get(&fd.0)
            .ok_or_else(|| BackendError::code(ErrorCode::BadDescriptor))?;
        let path = open.path.clone();
        let pos = open.pos;
        let len = match state.node(&path)? {
            Node::File { data, .. } => data.len() as u64,
            Node::Dir { .. } => 0,
        };
        let base = match whence {
            Whence::Set => 0,
            Whence::Current => pos as i64,
            Whence::End => len as i64,
        };
        let target = base + offset;
        if target < 0 {
            return Err(BackendError::new(ErrorCode::Other, "seek before start"));
        }
        let target = target as u64;
        if let Some(open) = state.open_files.get_mut(&fd.0) {
            open.pos = target;
        }
        Ok(target)
    }

    fn replication(&self, path: &str) -> Result<u32, BackendError> {
        check_absolute(path)?;
        let state = self.lock();
        state.node(path)?;
        Ok(state
            .replication_overrides
            .get(path)
            .copied()
            .unwrap_or(state.default_replication))
    }

    fn locate_blocks(&self, path: &str) -> Result<Vec<Vec<String>>, BackendError> {
        check_absolute(path)?;
        let state = self.lock();
        if let Some(locations) = state.location_overrides.get(path) {
            return Ok(locations.clone());
        }
        let len = match state.node(path)? {
            Node::File { data, .. } => data.len() as u64,
            Node::Dir { .. } => return Err(BackendError::code(ErrorCode::IsADirectory)),
        };
        let replication = state
            .replication_overrides
            .get(path)
            .copied()
            .unwrap_or(state.default_replication);
        let block_size = state.default_block_size;
        let blocks = len.div_ceil(block_size);
        Ok((0..blocks)
            .map(|_| {
                (0..replication)
                    .map(|replica| format!("store://node-{}.local:7000{}", replica, path))
                    .collect()
            })
            .collect())
    }

    fn rename(&self, src: &str, dst: &str) -> Result<(), BackendError> {
        check_absolute(src)?;
        check_absolute(dst)?;
        let mut state = self.lock();
        if !state.nodes.contains_key(src) {
            return Err(BackendError::not_found(src));
        }
        if state.nodes.contains_key(dst) {
            return Err(BackendError::new(
                ErrorCode::AlreadyExists,
                format!("entry exists: {}", dst),
            ));
        }
        match state.nodes.get(parent_of(dst)) {
            Some(node) if node.is_dir() => {}
            Some(_) => return Err(BackendError::code(ErrorCode::NotADirectory)),
            None => return Err(BackendError::not_found(parent_of(dst))),
        }
        // Move the node and, for directories, every descendant key
        let prefix = format!("{}/", src);
        let moved: Vec<String> = state
            .nodes
            .keys()
            .filter(|key| key.as_str() == src || key.starts_with(&prefix))
            .cloned()
            .collect();
        for old_key in moved {
            let new_key = format!("{}{}", dst, &old_key[src.len()..]);
            if let Some(node) = state.nodes.remove(&old_key) {
                state.nodes.insert(new_key, node);
            }
        }
        Ok(())
    }

    fn chmod(&self, path: &str, mode: FileMode) -> Result<(), BackendError> {
        check_absolute(path)?;
        let mut state = self.lock();
        match state.nodes.get_mut(path) {
            Some(node) => {
                node.meta_mut().mode = mode.bits();
                Ok(())
            }
            None => Err(BackendError::not_found(path)),
        }
    }

    fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<(), BackendError> {
        check_absolute(path)?;
        let mut state = self.lock();
        match state.nodes.get_mut(path) {
            Some(node) => {
                let meta = node.meta_mut();
                if let Some(uid) = uid {
                    meta.uid = uid;
                }
                if let Some(gid) = gid {
                    meta.gid = gid;
                }
                Ok(())
            }
            None => Err(BackendError::not_found(path)),
        }
    }
}
