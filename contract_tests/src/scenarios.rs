//! End-to-end behavior contracts
//!
//! Client-observable sequences exercised through the bridge facade over
//! the in-memory reference backend. Each test pins one behavior a
//! client may rely on across releases.

#[cfg(test)]
mod tests {
    use crate::test_helpers::{read_file, test_bridge, write_file};
    use backend_api::StorageBackend;
    use fs_bridge::BridgeError;
    use fs_types::{FileMode, LogicalPath};

    #[test]
    fn test_write_then_read_round_trip() {
        let bridge = test_bridge();
        let payload = b"the quick brown fox jumps over the lazy dog";
        write_file(&bridge, "/docs/pangram.txt", payload);
        assert_eq!(read_file(&bridge, "/docs/pangram.txt"), payload);
    }

    #[test]
    fn test_mkdirs_is_idempotent() {
        let bridge = test_bridge();
        let path = LogicalPath::new("/warehouse/year=2026/month=08");
        assert!(bridge.make_directories(&path, FileMode(0o755)).unwrap());
        assert!(bridge.make_directories(&path, FileMode(0o755)).unwrap());

        let status = bridge.get_status(&path).unwrap();
        assert!(status.is_dir);
    }

    #[test]
    fn test_mkdirs_through_file_reports_conflict() {
        let bridge = test_bridge();
        write_file(&bridge, "/blocker", b"x");

        let err = bridge
            .make_directories(&LogicalPath::new("/blocker/child"), FileMode(0o755))
            .unwrap_err();
        assert!(matches!(err, BridgeError::PathConflict(_)));
    }

    #[test]
    fn test_recursive_delete_then_stat_is_not_found() {
        let bridge = test_bridge();
        write_file(&bridge, "/stage/a/one", b"1");
        write_file(&bridge, "/stage/a/two", b"2");
        write_file(&bridge, "/stage/b/three", b"3");

        assert!(bridge.delete(&LogicalPath::new("/stage"), true).unwrap());
        for path in ["/stage", "/stage/a", "/stage/a/one", "/stage/b/three"] {
            let err = bridge.get_status(&LogicalPath::new(path)).unwrap_err();
            assert!(matches!(err, BridgeError::NotFound(_)), "{} survived", path);
        }
    }

    #[test]
    fn test_non_recursive_delete_leaves_tree_intact() {
        let bridge = test_bridge();
        write_file(&bridge, "/stage/leaf", b"x");

        bridge
            .delete(&LogicalPath::new("/stage"), false)
            .unwrap_err();
        assert_eq!(read_file(&bridge, "/stage/leaf"), b"x");
    }

    #[test]
    fn test_block_locations_cover_partial_final_block() {
        let bridge = test_bridge();
        bridge.backend().set_default_block_size(64);
        write_file(&bridge, "/blocks", &[7u8; 130]);

        let status = bridge.get_status(&LogicalPath::new("/blocks")).unwrap();
        let records = bridge.get_block_locations(&status, 0, 130).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records.iter().map(|r| r.offset).collect::<Vec<_>>(),
            vec![0, 64, 128]
        );
        // Each record reports the nominal block length, including the
        // final block that holds only 2 bytes of file data.
        assert!(records.iter().all(|r| r.len == 64));
        for record in &records {
            assert_eq!(record.names.len(), record.hosts.len());
            assert!(!record.hosts.is_empty());
        }
    }

    #[test]
    fn test_block_locations_past_eof_are_empty() {
        let bridge = test_bridge();
        write_file(&bridge, "/small", b"abc");

        let status = bridge.get_status(&LogicalPath::new("/small")).unwrap();
        assert!(bridge.get_block_locations(&status, 3, 10).unwrap().is_empty());
    }

    #[test]
    fn test_exclusive_create_refuses_existing_target() {
        let bridge = test_bridge();
        write_file(&bridge, "/exclusive", b"keep me");

        let err = bridge
            .create(&LogicalPath::new("/exclusive"), FileMode(0o644), false)
            .unwrap_err();
        assert!(matches!(err, BridgeError::AlreadyExists(_)));
        assert_eq!(read_file(&bridge, "/exclusive"), b"keep me");
    }

    #[test]
    fn test_overwriting_create_truncates() {
        let bridge = test_bridge();
        write_file(&bridge, "/target", b"a much longer original body");
        write_file(&bridge, "/target", b"short");
        assert_eq!(read_file(&bridge, "/target"), b"short");
    }

    #[test]
    fn test_append_extends_existing_file() {
        let bridge = test_bridge();
        write_file(&bridge, "/log", b"line one\n");

        let mut out = bridge.append(&LogicalPath::new("/log")).unwrap();
        out.write_all(b"line two\n").unwrap();
        out.close().unwrap();

        assert_eq!(read_file(&bridge, "/log"), b"line one\nline two\n");
    }

    #[test]
    fn test_unknown_owner_name_is_rejected_without_side_effects() {
        let bridge = test_bridge();
        write_file(&bridge, "/owned", b"x");

        let err = bridge
            .set_owner(&LogicalPath::new("/owned"), Some("doesnotexist"), None)
            .unwrap_err();
        assert!(matches!(err, BridgeError::Identity(_)));

        let status = bridge.get_status(&LogicalPath::new("/owned")).unwrap();
        assert_eq!(status.owner, "root");
        assert_eq!(status.group, "wheel");
    }

    #[test]
    fn test_unmapped_ids_surface_as_unknown() {
        let bridge = test_bridge();
        write_file(&bridge, "/orphan", b"x");
        bridge
            .backend()
            .chown("/orphan", Some(9999), Some(9999))
            .unwrap();

        let status = bridge.get_status(&LogicalPath::new("/orphan")).unwrap();
        assert_eq!(status.owner, "unknown");
        assert_eq!(status.group, "unknown");
    }

    #[test]
    fn test_rename_moves_directory_subtree() {
        let bridge = test_bridge();
        write_file(&bridge, "/src/inner/file", b"payload");

        assert!(bridge
            .rename(&LogicalPath::new("/src"), &LogicalPath::new("/dst"))
            .unwrap());
        assert_eq!(read_file(&bridge, "/dst/inner/file"), b"payload");
        assert!(matches!(
            bridge.get_status(&LogicalPath::new("/src")).unwrap_err(),
            BridgeError::NotFound(_)
        ));
    }

    #[test]
    fn test_listing_skips_pseudo_entries() {
        let bridge = test_bridge();
        write_file(&bridge, "/dir/only", b"x");

        let entries = bridge
            .list_entries(&LogicalPath::new("/dir"))
            .unwrap()
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path(), "/dir/only");
    }

    #[test]
    fn test_short_backend_writes_are_retried_to_completion() {
        let bridge = test_bridge();
        bridge.backend().set_write_limit(Some(3));

        write_file(&bridge, "/chunked", b"twelve bytes");
        assert_eq!(read_file(&bridge, "/chunked"), b"twelve bytes");
    }
}
