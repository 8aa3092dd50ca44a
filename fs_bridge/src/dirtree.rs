//! Directory tree operations
//!
//! The backend only provides flat mkdir/rmdir/unlink primitives; the
//! recursive ensure-path-exists and remove-subtree algorithms live
//! here. Neither is transactional: a failure partway through leaves the
//! already-completed sub-operations in place and surfaces one error.

use backend_api::{ErrorCode, StorageBackend};
use fs_types::FileMode;

use crate::error::{map_backend, BridgeError};

/// Creates a directory and every missing ancestor
///
/// Walks the path one separator at a time. At each prefix: an existing
/// directory is kept, an existing non-directory is a path conflict
/// naming the segment, and a missing segment is created with `mode`.
/// A concurrent creation of the same prefix by another caller (seen as
/// already-exists from the backend) counts as success. The root is
/// always treated as present. Idempotent.
pub fn make_directories<B: StorageBackend>(
    backend: &B,
    path: &str,
    mode: FileMode,
) -> Result<(), BridgeError> {
    let path = path.trim_end_matches('/');
    // Root (mount point) is always present
    if path.is_empty() {
        return Ok(());
    }

    for (idx, _) in path.match_indices('/') {
        if idx == 0 {
            continue;
        }
        ensure_directory(backend, &path[..idx], mode)?;
    }
    ensure_directory(backend, path, mode)
}

fn ensure_directory<B: StorageBackend>(
    backend: &B,
    prefix: &str,
    mode: FileMode,
) -> Result<(), BridgeError> {
    match backend.stat(prefix) {
        Ok(stat) if stat.is_dir() => Ok(()),
        Ok(_) => Err(BridgeError::PathConflict(format!(
            "mkdir: '{}' is not a directory",
            prefix
        ))),
        // Any stat failure falls through to the create attempt, as the
        // entry may have appeared or vanished since
        Err(_) => match backend.mkdir(prefix, mode) {
            Ok(()) => Ok(()),
            // Lost a creation race with another ensure-path-exists caller
            Err(e) if e.code == ErrorCode::AlreadyExists => Ok(()),
            Err(e) => Err(BridgeError::io("mkdir", &e)),
        },
    }
}

/// Lists the entry names of a directory, skipping `.` and `..`
///
/// The cursor is closed on every path, including after a read failure.
pub(crate) fn list_entry_names<B: StorageBackend>(
    backend: &B,
    path: &str,
) -> Result<Vec<String>, BridgeError> {
    let handle = backend
        .open_dir(path)
        .map_err(|e| map_backend("open_dir", e))?;
    let mut names = Vec::new();
    let result = loop {
        match backend.read_dir_entry(handle) {
            Ok(Some(name)) => {
                if name != "." && name != ".." {
                    names.push(name);
                }
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(BridgeError::io("read_dir_entry", &e)),
        }
    };
    // Close errors do not mask a read failure
    let close_result = backend.close_dir(handle);
    result?;
    close_result.map_err(|e| BridgeError::io("close_dir", &e))?;
    Ok(names)
}

enum Visit {
    Enter(String),
    Remove(String),
}

/// Removes a directory and every descendant, depth first
///
/// Uses an explicit worklist rather than native recursion so a deep
/// tree cannot exhaust the call stack. Files are unlinked as they are
/// found; a directory is removed once its entries are gone. An empty
/// directory removes cleanly with zero entries. The first failure
/// aborts the walk; partial deletions remain on disk.
pub fn remove_tree<B: StorageBackend>(backend: &B, path: &str) -> Result<(), BridgeError> {
    let mut worklist = vec![Visit::Enter(path.to_string())];

    while let Some(visit) = worklist.pop() {
        match visit {
            Visit::Enter(dir) => {
                let entries = list_entry_names(backend, &dir)?;
                worklist.push(Visit::Remove(dir.clone()));
                for name in entries {
                    let child = join(&dir, &name);
                    let stat = backend.stat(&child).map_err(|e| map_backend("stat", e))?;
                    if stat.is_dir() {
                        worklist.push(Visit::Enter(child));
                    } else {
                        backend
                            .unlink(&child)
                            .map_err(|e| map_backend("unlink", e))?;
                    }
                }
            }
            Visit::Remove(dir) => {
                backend.rmdir(&dir).map_err(|e| map_backend("rmdir", e))?;
            }
        }
    }
    Ok(())
}

/// Deletes a path, recursively if asked
///
/// Files are unlinked unconditionally (the flag is irrelevant to
/// files). A directory is removed flat when `recursive` is false, which
/// fails if it has entries. A failed pre-delete stat surfaces as a
/// generic I/O failure, matching the reference behavior.
pub fn delete<B: StorageBackend>(
    backend: &B,
    path: &str,
    recursive: bool,
) -> Result<(), BridgeError> {
    let stat = backend
        .stat(path)
        .map_err(|e| BridgeError::io("stat", &e))?;

    if stat.is_dir() {
        if recursive {
            remove_tree(backend, path)
        } else {
            backend.rmdir(path).map_err(|e| map_backend("rmdir", e))
        }
    } else {
        backend.unlink(path).map_err(|e| map_backend("unlink", e))
    }
}

fn join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_api::{MemBackend, OpenFlags, StorageBackend};

    fn touch(backend: &MemBackend, path: &str) {
        let fd = backend
            .open(
                path,
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                FileMode(0o644),
            )
            .unwrap();
        backend.write(fd, b"x").unwrap();
        backend.close(fd).unwrap();
    }

    #[test]
    fn test_make_directories_creates_all_ancestors() {
        let backend = MemBackend::new();
        make_directories(&backend, "/a/b/c", FileMode(0o755)).unwrap();
        assert!(backend.stat("/a").unwrap().is_dir());
        assert!(backend.stat("/a/b").unwrap().is_dir());
        assert!(backend.stat("/a/b/c").unwrap().is_dir());
    }

    #[test]
    fn test_make_directories_is_idempotent() {
        let backend = MemBackend::new();
        make_directories(&backend, "/a/b", FileMode(0o755)).unwrap();
        make_directories(&backend, "/a/b", FileMode(0o755)).unwrap();
        assert!(backend.stat("/a/b").unwrap().is_dir());
    }

    #[test]
    fn test_make_directories_root_is_present() {
        let backend = MemBackend::new();
        make_directories(&backend, "/", FileMode(0o755)).unwrap();
    }

    #[test]
    fn test_make_directories_trailing_slash() {
        let backend = MemBackend::new();
        make_directories(&backend, "/a/b/", FileMode(0o755)).unwrap();
        assert!(backend.stat("/a/b").unwrap().is_dir());
    }

    #[test]
    fn test_make_directories_conflict_names_segment() {
        let backend = MemBackend::new();
        backend.mkdir("/a", FileMode(0o755)).unwrap();
        touch(&backend, "/a/file");
        let err = make_directories(&backend, "/a/file/sub", FileMode(0o755)).unwrap_err();
        match err {
            BridgeError::PathConflict(msg) => assert!(msg.contains("/a/file")),
            other => panic!("expected PathConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_make_directories_tolerates_creation_race() {
        // Another client creates "/a" between our stat and our mkdir:
        // stat reports it missing, mkdir reports it already existing.
        let backend = MemBackend::new();
        backend.set_contended_dir("/a");
        assert!(backend.stat("/a").is_err());

        make_directories(&backend, "/a/b", FileMode(0o755)).unwrap();
        assert!(backend.stat("/a/b").unwrap().is_dir());
    }

    #[test]
    fn test_make_directories_tolerates_existing_prefix() {
        let backend = MemBackend::new();
        backend.mkdir("/a", FileMode(0o700)).unwrap();
        make_directories(&backend, "/a/b", FileMode(0o755)).unwrap();
        // The pre-existing prefix keeps its mode
        assert_eq!(backend.stat("/a").unwrap().mode, 0o700);
    }

    #[test]
    fn test_remove_tree_removes_every_descendant() {
        let backend = MemBackend::new();
        make_directories(&backend, "/a/b/c", FileMode(0o755)).unwrap();
        touch(&backend, "/a/top");
        touch(&backend, "/a/b/mid");
        touch(&backend, "/a/b/c/leaf");
        remove_tree(&backend, "/a").unwrap();
        assert!(backend.stat("/a").is_err());
        assert!(backend.stat("/a/b/c/leaf").is_err());
    }

    #[test]
    fn test_remove_tree_of_empty_directory() {
        let backend = MemBackend::new();
        backend.mkdir("/empty", FileMode(0o755)).unwrap();
        remove_tree(&backend, "/empty").unwrap();
        assert!(backend.stat("/empty").is_err());
    }

    #[test]
    fn test_remove_tree_deep_tree() {
        let backend = MemBackend::new();
        let mut path = String::new();
        for i in 0..200 {
            path.push_str(&format!("/d{}", i));
        }
        make_directories(&backend, &path, FileMode(0o755)).unwrap();
        remove_tree(&backend, "/d0").unwrap();
        assert!(backend.stat("/d0").is_err());
    }

    #[test]
    fn test_delete_file_ignores_recursive_flag() {
        let backend = MemBackend::new();
        touch(&backend, "/file");
        delete(&backend, "/file", false).unwrap();
        touch(&backend, "/file");
        delete(&backend, "/file", true).unwrap();
        assert!(backend.stat("/file").is_err());
    }

    #[test]
    fn test_delete_non_recursive_refuses_non_empty() {
        let backend = MemBackend::new();
        make_directories(&backend, "/a", FileMode(0o755)).unwrap();
        touch(&backend, "/a/file");
        let err = delete(&backend, "/a", false).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
        // Directory and contents untouched
        assert!(backend.stat("/a").unwrap().is_dir());
        assert!(backend.stat("/a/file").is_ok());
    }

    #[test]
    fn test_delete_missing_path_is_io() {
        let backend = MemBackend::new();
        let err = delete(&backend, "/ghost", true).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn test_list_entry_names_skips_pseudo_entries() {
        let backend = MemBackend::new();
        make_directories(&backend, "/a", FileMode(0o755)).unwrap();
        touch(&backend, "/a/one");
        touch(&backend, "/a/two");
        let mut names = list_entry_names(&backend, "/a").unwrap();
        names.sort();
        assert_eq!(names, vec!["one".to_string(), "two".to_string()]);
    }
}
