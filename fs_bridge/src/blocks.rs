//! Block location resolution
//!
//! Converts a file's length, block size and a requested byte range into
//! per-block replica host lists. The backend reports one URI-like
//! location identifier per replica slot; the authority and host
//! components of each identifier become the record's name and host
//! entries.

use backend_api::StorageBackend;
use fs_types::{BlockLocation, FileStatus};
use url::Url;

use crate::error::BridgeError;

/// Resolves the block locations overlapping a byte range
///
/// `first = start / block_size`, `last = ceil(len / block_size)`; one
/// record per block index in `[first, last)` with `offset = index *
/// block_size` and `len = block_size`. The final partial block is not
/// clamped: every record reports a full block length.
pub fn block_locations<B: StorageBackend>(
    backend: &B,
    backend_path: &str,
    status: &FileStatus,
    start: u64,
    len: u64,
) -> Result<Vec<BlockLocation>, BridgeError> {
    log::debug!(
        "locate blocks for {} [start: {}, len: {}]",
        status.path,
        start,
        len
    );

    // Range guard carried over from the reference client wrapper
    if status.len <= start {
        return Ok(Vec::new());
    }
    if status.block_size == 0 {
        return Err(BridgeError::Io(format!(
            "locate: zero block size for {}",
            status.path
        )));
    }

    let first = start / status.block_size;
    let last = status.len.div_ceil(status.block_size);

    let table = backend
        .locate_blocks(backend_path)
        .map_err(|e| BridgeError::io("locate_blocks", &e))?;
    if (table.len() as u64) < last {
        return Err(BridgeError::Io(format!(
            "locate_blocks: backend reported {} blocks, expected at least {}",
            table.len(),
            last
        )));
    }

    let mut records = Vec::with_capacity((last - first) as usize);
    for index in first..last {
        let replicas = &table[index as usize];
        let mut names = Vec::with_capacity(status.replication as usize);
        let mut hosts = Vec::with_capacity(status.replication as usize);

        for identifier in replicas {
            let (name, host) = split_identifier(identifier)?;
            names.push(name);
            hosts.push(host);
        }

        records.push(BlockLocation {
            names,
            hosts,
            offset: index * status.block_size,
            len: status.block_size,
        });
    }
    Ok(records)
}

/// Splits a location identifier into (authority, host)
fn split_identifier(identifier: &str) -> Result<(String, String), BridgeError> {
    let url = Url::parse(identifier).map_err(|e| {
        BridgeError::Io(format!("locate: bad location identifier '{}': {}", identifier, e))
    })?;
    let host = url.host_str().ok_or_else(|| {
        BridgeError::Io(format!(
            "locate: location identifier '{}' has no host",
            identifier
        ))
    })?;
    Ok((url.authority().to_string(), host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_api::{MemBackend, OpenFlags};
    use fs_types::{FileMode, LogicalPath};

    fn write_file(backend: &MemBackend, path: &str, len: usize) {
        let fd = backend
            .open(
                path,
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                FileMode(0o644),
            )
            .unwrap();
        let data = vec![7u8; len];
        let mut written = 0;
        while written < data.len() {
            written += backend.write(fd, &data[written..]).unwrap();
        }
        backend.close(fd).unwrap();
    }

    fn status_for(path: &str, len: u64, block_size: u64, replication: u32) -> FileStatus {
        FileStatus {
            path: LogicalPath::new(path),
            len,
            is_dir: false,
            replication,
            block_size,
            modification_time: 0,
            access_time: 0,
            permission: FileMode(0o644),
            owner: "root".to_string(),
            group: "root".to_string(),
        }
    }

    #[test]
    fn test_full_range_covers_every_block_without_gaps() {
        let backend = MemBackend::new();
        backend.set_default_block_size(32);
        write_file(&backend, "/f", 100);
        let status = status_for("/f", 100, 32, 3);

        let records = block_locations(&backend, "/f", &status, 0, 100).unwrap();
        assert_eq!(records.len(), 4); // ceil(100/32)
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.offset, i as u64 * 32);
            assert_eq!(record.len, 32);
            assert_eq!(record.names.len(), 3);
            assert_eq!(record.hosts.len(), 3);
        }
    }

    #[test]
    fn test_last_partial_block_reports_full_length() {
        let backend = MemBackend::new();
        backend.set_default_block_size(64);
        write_file(&backend, "/f", 130);
        let status = status_for("/f", 130, 64, 3);

        let records = block_locations(&backend, "/f", &status, 0, 130).unwrap();
        let offsets: Vec<u64> = records.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![0, 64, 128]);
        // Only 2 bytes remain past offset 128, but the record still
        // reports a full block
        assert!(records.iter().all(|r| r.len == 64));
    }

    #[test]
    fn test_start_within_file_skips_leading_blocks() {
        let backend = MemBackend::new();
        backend.set_default_block_size(64);
        write_file(&backend, "/f", 130);
        let status = status_for("/f", 130, 64, 3);

        let records = block_locations(&backend, "/f", &status, 70, 10).unwrap();
        let offsets: Vec<u64> = records.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![64, 128]);
    }

    #[test]
    fn test_start_past_end_is_empty() {
        let backend = MemBackend::new();
        let status = status_for("/f", 100, 64, 3);
        let records = block_locations(&backend, "/f", &status, 100, 10).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_names_and_hosts_come_from_identifier() {
        let backend = MemBackend::new();
        write_file(&backend, "/f", 10);
        backend.set_block_locations(
            "/f",
            vec![vec![
                "store://node-a.cluster:7000/f".to_string(),
                "store://node-b.cluster:7001/f".to_string(),
            ]],
        );
        let status = status_for("/f", 10, 4096, 2);

        let records = block_locations(&backend, "/f", &status, 0, 10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].names, vec!["node-a.cluster:7000", "node-b.cluster:7001"]);
        assert_eq!(records[0].hosts, vec!["node-a.cluster", "node-b.cluster"]);
    }

    #[test]
    fn test_short_locate_table_is_io_error() {
        let backend = MemBackend::new();
        write_file(&backend, "/f", 10);
        backend.set_block_locations("/f", vec![]);
        let status = status_for("/f", 10, 4, 1);

        let err = block_locations(&backend, "/f", &status, 0, 10).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn test_unparseable_identifier_is_io_error() {
        let backend = MemBackend::new();
        write_file(&backend, "/f", 2);
        backend.set_block_locations("/f", vec![vec!["not a url".to_string()]]);
        let status = status_for("/f", 2, 4096, 1);

        let err = block_locations(&backend, "/f", &status, 0, 2).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn test_zero_block_size_is_io_error() {
        let backend = MemBackend::new();
        let status = status_for("/f", 10, 0, 1);
        let err = block_locations(&backend, "/f", &status, 0, 10).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
