//! # Backend Capability Set
//!
//! This crate defines the traits a storage backend must implement to be
//! adapted by the bridge, plus a reference in-memory backend.
//!
//! ## Philosophy
//!
//! **The backend must be fully abstracted and swappable.**
//!
//! No backend-specific assumptions should leak into the bridge logic.
//! Each primitive maps to a POSIX-equivalent call and reports failures
//! through a shared error-code channel.
//!
//! ## Design Principles
//!
//! 1. **Trait-based**: every backend operation goes through a trait
//! 2. **Concurrent by contract**: primitives take `&self` and must be
//!    safe to invoke from multiple callers; the backend, not the
//!    bridge, owns any locking it needs
//! 3. **Testable**: `MemBackend` implements the full capability set in
//!    memory, with fault knobs for exercising the bridge's retry and
//!    error paths

pub mod backend;
pub mod error;
pub mod identity;
pub mod mem_backend;

pub use backend::{
    Descriptor, DirHandle, NodeKind, NodeStat, OpenFlags, StorageBackend, Whence, HOST_NAME_MAX,
    PATH_MAX,
};
pub use error::{BackendError, ErrorCode};
pub use identity::{IdentityDatabase, StaticIdentityTable};
pub use mem_backend::MemBackend;
