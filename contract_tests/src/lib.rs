//! # Bridge Contract Tests
//!
//! This crate provides "golden" tests for the bridge's client-visible
//! contracts to ensure they don't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Stable contracts are written as code
//! - **Testability first**: Contract tests fail when interfaces change
//! - **Mechanism not policy**: Define what must be stable, not how to use it
//!
//! ## Structure
//!
//! Two kinds of contract live here:
//! - `wire`: serialized shapes of status records, block locations, and
//!   authorities, plus error message stability
//! - `scenarios`: end-to-end behavior a client may rely on, exercised
//!   through the bridge facade over the in-memory reference backend

pub mod scenarios;
pub mod wire;

/// Common test helpers for contract validation
pub mod test_helpers {
    use backend_api::{MemBackend, StaticIdentityTable};
    use fs_bridge::FileSystemBridge;
    use fs_types::{FileMode, LogicalPath};

    /// Builds a bridge over a fresh in-memory backend with a small
    /// fixed identity table
    pub fn test_bridge() -> FileSystemBridge<MemBackend, StaticIdentityTable> {
        let identity = StaticIdentityTable::new()
            .with_user(0, "root")
            .with_group(0, "wheel")
            .with_user(500, "operator")
            .with_group(500, "staff");
        FileSystemBridge::new(MemBackend::new(), identity)
            .expect("backend init must succeed")
    }

    /// Writes a file through the facade, creating parents as needed
    pub fn write_file(
        bridge: &FileSystemBridge<MemBackend, StaticIdentityTable>,
        path: &str,
        data: &[u8],
    ) {
        let mut out = bridge
            .create(&LogicalPath::new(path), FileMode(0o644), true)
            .expect("create must succeed");
        out.write_all(data).expect("write must succeed");
        out.close().expect("close must succeed");
    }

    /// Reads a whole file back through the facade
    pub fn read_file(
        bridge: &FileSystemBridge<MemBackend, StaticIdentityTable>,
        path: &str,
    ) -> Vec<u8> {
        let logical = LogicalPath::new(path);
        let len = bridge
            .get_status(&logical)
            .expect("stat must succeed")
            .len as usize;
        let mut input = bridge.open_read(&logical).expect("open must succeed");
        let mut data = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = input.read(&mut data[filled..]).expect("read must succeed");
            assert!(n > 0, "backend returned EOF before the known length");
            filled += n;
        }
        input.close().expect("close must succeed");
        data
    }
}
