//! # Bridge Data Types
//!
//! This crate defines the plain data records that cross the bridge
//! boundary between the host framework and the storage backend adapter.
//!
//! ## Philosophy
//!
//! - **Records are data, not behavior**: status and location records are
//!   built fresh on every call and owned by the caller once returned
//! - **Logical paths stay logical**: backend-native paths never appear in
//!   these types; the reverse mapping is intentionally not provided
//! - **Explicit over implicit**: the authority component is a parsed
//!   structure, not a substring convention

pub mod path;
pub mod status;

pub use path::{Authority, AuthorityParseError, LogicalPath};
pub use status::{BlockLocation, FileMode, FileStatus};
