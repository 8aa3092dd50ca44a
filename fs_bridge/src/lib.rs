//! # Filesystem Bridge
//!
//! This crate adapts a hierarchical, POSIX-flavored storage backend to
//! a generic client-facing filesystem contract: stat, listing,
//! recursive directory creation and deletion, rename, permission and
//! ownership changes, block-location reporting, and byte streams.
//!
//! ## Philosophy
//!
//! - **The bridge holds no shared mutable state**: every operation works
//!   on caller-supplied paths and handles; the backend owns locking
//! - **Errors are mapped once**: each backend failure is inspected at
//!   the call site that produced it and becomes exactly one member of
//!   the client-visible taxonomy
//! - **Backend paths stay inside**: the translation from logical path to
//!   backend path is one-way; no reverse mapping exists
//!
//! ## Design
//!
//! The backend provides only flat primitives. Everything recursive or
//! multi-call lives here: the prefix walk of [`FileSystemBridge::make_directories`],
//! the worklist traversal behind recursive delete, the block-range
//! resolution of [`FileSystemBridge::get_block_locations`], and the
//! write-completion loop of [`stream::WriteStream`].

pub mod blocks;
pub mod bridge;
pub mod dirtree;
pub mod error;
pub mod identity;
pub mod stream;
pub mod translate;

pub use bridge::{FileSystemBridge, DEFAULT_DIR_MODE};
pub use error::BridgeError;
pub use stream::{ReadStream, WriteMode, WriteStream};
