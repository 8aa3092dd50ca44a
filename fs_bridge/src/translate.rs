//! Path translation
//!
//! Delegates to the backend's pluggable encoding rule and enforces the
//! platform path-length bound on the result. Backend paths produced
//! here never flow back to the caller.

use backend_api::{StorageBackend, PATH_MAX};
use fs_types::LogicalPath;

use crate::error::{map_backend, BridgeError};

/// Produces the backend-native path for a logical path
///
/// Deterministic and side-effect free for any pure backend rule: the
/// same (authority, path) pair always encodes to the same backend path.
pub fn translate<B: StorageBackend>(
    backend: &B,
    path: &LogicalPath,
) -> Result<String, BridgeError> {
    let encoded = backend
        .translate(path.authority(), path.path())
        .map_err(|e| match map_backend("translate", e) {
            // A translation failure is never an I/O condition
            BridgeError::Translation(msg) => BridgeError::Translation(msg),
            other => BridgeError::Translation(other.to_string()),
        })?;
    if encoded.len() >= PATH_MAX {
        return Err(BridgeError::Translation(format!(
            "backend path for '{}' exceeds {} bytes",
            path, PATH_MAX
        )));
    }
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_api::MemBackend;
    use fs_types::Authority;

    #[test]
    fn test_translation_is_deterministic() {
        let backend = MemBackend::new();
        let path = LogicalPath::with_authority(Authority::new("part1"), "/tmp/data");
        let first = translate(&backend, &path).unwrap();
        let second = translate(&backend, &path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "/part1/tmp/data");
    }

    #[test]
    fn test_overlong_path_is_translation_error() {
        let backend = MemBackend::new();
        let path = LogicalPath::new(format!("/{}", "a".repeat(PATH_MAX)));
        let err = translate(&backend, &path).unwrap_err();
        assert!(matches!(err, BridgeError::Translation(_)));
    }
}
