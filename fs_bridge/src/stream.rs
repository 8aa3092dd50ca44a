//! Stream handles
//!
//! One backend descriptor per handle, valid from open to close. Handles
//! are not thread-safe; a single handle must not be shared between
//! concurrent callers. The descriptor is invalidated unconditionally on
//! close, even when the backend close itself fails.

use backend_api::{Descriptor, OpenFlags, StorageBackend, Whence};
use fs_types::{FileMode, LogicalPath};

use crate::error::BridgeError;
use crate::translate::translate;

/// How a write handle opens its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the file, truncating or refusing an existing one
    Create {
        /// Permission bits applied if the file is created
        mode: FileMode,
        /// Replace existing contents instead of failing
        overwrite: bool,
    },
    /// Append to an existing file
    Append,
}

/// Readable byte stream over one backend descriptor
#[derive(Debug)]
pub struct ReadStream<'a, B: StorageBackend> {
    backend: &'a B,
    path: LogicalPath,
    fd: Descriptor,
    file_len: u64,
    offset: u64,
}

impl<'a, B: StorageBackend> ReadStream<'a, B> {
    /// Opens a read stream; any open failure is a not-found condition
    ///
    /// `file_len` is the length reported by the stat that preceded the
    /// open; reads are clamped to it and seeks past it are rejected.
    pub fn open(backend: &'a B, path: LogicalPath, file_len: u64) -> Result<Self, BridgeError> {
        let backend_path = translate(backend, &path)?;
        let fd = backend
            .open(&backend_path, OpenFlags::READ, FileMode(0))
            .map_err(|e| BridgeError::NotFound(format!("open: {}", e)))?;
        Ok(Self {
            backend,
            path,
            fd,
            file_len,
            offset: 0,
        })
    }

    /// Current read position
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Reads one byte; `None` means end of stream
    pub fn read_byte(&mut self) -> Result<Option<u8>, BridgeError> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    /// Reads into `buf`, returning the count actually read
    ///
    /// Zero means end of stream. Partial reads are legal and not
    /// retried here; loop if more bytes are needed.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError> {
        log::debug!(
            "read {}B from {} of size {}B at offset={}",
            buf.len(),
            self.path,
            self.file_len,
            self.offset
        );
        let remaining = self.file_len.saturating_sub(self.offset);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(remaining as usize);
        let count = self
            .backend
            .read(self.fd, &mut buf[..want])
            .map_err(|e| BridgeError::io("read", &e))?;
        self.offset += count as u64;
        Ok(count)
    }

    /// Repositions the stream to an absolute offset
    pub fn seek(&mut self, pos: u64) -> Result<(), BridgeError> {
        log::debug!("seek on {} of size {}B to {}", self.path, self.file_len, pos);
        if pos > self.file_len {
            return Err(BridgeError::Io(format!(
                "seek: cannot seek after EOF: pos={}, file length={}",
                pos, self.file_len
            )));
        }
        let landed = self
            .backend
            .seek(self.fd, pos as i64, Whence::Set)
            .map_err(|e| BridgeError::io("seek", &e))?;
        if landed != pos {
            return Err(BridgeError::Io(format!(
                "seek: landed on {}, expected {}",
                landed, pos
            )));
        }
        self.offset = pos;
        Ok(())
    }

    /// Closes the stream
    ///
    /// The stored descriptor becomes invalid before the backend result
    /// is inspected; the handle must not be read from afterwards even
    /// when close reports an error.
    pub fn close(&mut self) -> Result<(), BridgeError> {
        log::debug!("close {}", self.path);
        close_descriptor(self.backend, &mut self.fd)
    }
}

impl<B: StorageBackend> Drop for ReadStream<'_, B> {
    fn drop(&mut self) {
        if self.fd.is_valid() {
            let _ = self.backend.close(self.fd);
        }
    }
}

/// Writable byte stream over one backend descriptor
#[derive(Debug)]
pub struct WriteStream<'a, B: StorageBackend> {
    backend: &'a B,
    path: LogicalPath,
    fd: Descriptor,
}

impl<'a, B: StorageBackend> WriteStream<'a, B> {
    /// Opens a write stream
    ///
    /// An open failure under overwrite or append is a not-found
    /// condition (the target should already exist or be freely
    /// replaceable); under exclusive create it is an already-exists
    /// condition.
    pub fn open(backend: &'a B, path: LogicalPath, mode: WriteMode) -> Result<Self, BridgeError> {
        let backend_path = translate(backend, &path)?;
        let (flags, permission, exclusive) = match mode {
            WriteMode::Create { mode, overwrite } => {
                if overwrite {
                    (
                        OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                        mode,
                        false,
                    )
                } else {
                    (
                        OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::EXCLUSIVE,
                        mode,
                        true,
                    )
                }
            }
            WriteMode::Append => (OpenFlags::WRITE | OpenFlags::APPEND, FileMode(0), false),
        };
        let fd = backend
            .open(&backend_path, flags, permission)
            .map_err(|e| {
                if exclusive {
                    BridgeError::AlreadyExists(format!("open: {}", e))
                } else {
                    BridgeError::NotFound(format!("open: {}", e))
                }
            })?;
        Ok(Self { backend, path, fd })
    }

    /// Writes one byte; anything but exactly one accepted byte fails
    pub fn write_byte(&mut self, byte: u8) -> Result<(), BridgeError> {
        log::debug!("write 1B to {}", self.path);
        let accepted = self
            .backend
            .write(self.fd, &[byte])
            .map_err(|e| BridgeError::io("write", &e))?;
        if accepted != 1 {
            return Err(BridgeError::Io("write: short write".to_string()));
        }
        Ok(())
    }

    /// Writes the whole buffer, reissuing short writes
    ///
    /// The loop advances through the buffer until everything is
    /// accepted. A zero-byte acceptance ends the loop: success if every
    /// byte was already written, an explicit short-write error
    /// otherwise.
    pub fn write_all(&mut self, buf: &[u8]) -> Result<(), BridgeError> {
        log::debug!("write {}B to {}", buf.len(), self.path);
        let mut written = 0;
        while written < buf.len() {
            let accepted = self
                .backend
                .write(self.fd, &buf[written..])
                .map_err(|e| BridgeError::io("write", &e))?;
            if accepted == 0 {
                break;
            }
            written += accepted;
        }
        if written != buf.len() {
            return Err(BridgeError::Io(format!(
                "write: backend accepted {} of {} bytes",
                written,
                buf.len()
            )));
        }
        Ok(())
    }

    /// Closes the stream; the descriptor is invalidated unconditionally
    pub fn close(&mut self) -> Result<(), BridgeError> {
        log::debug!("close {}", self.path);
        close_descriptor(self.backend, &mut self.fd)
    }
}

impl<B: StorageBackend> Drop for WriteStream<'_, B> {
    fn drop(&mut self) {
        if self.fd.is_valid() {
            let _ = self.backend.close(self.fd);
        }
    }
}

fn close_descriptor<B: StorageBackend>(
    backend: &B,
    fd: &mut Descriptor,
) -> Result<(), BridgeError> {
    if !fd.is_valid() {
        return Ok(());
    }
    let closing = *fd;
    // Invalidate first: the handle is dead even if close fails
    *fd = Descriptor::INVALID;
    backend
        .close(closing)
        .map_err(|e| BridgeError::io("close", &e))
}
