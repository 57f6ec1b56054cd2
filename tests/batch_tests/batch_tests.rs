//! Tests for DirtyBatch
//!
//! These tests verify:
//! - Snapshot contents and ordering
//! - Frame corruption detection (magic, length, CRC)
//! - File round trip through write_to / read_from
//! - Replaying a batch into a fresh layer

use bytes::Bytes;
use nodedb_cache::batch::{decode_batch, HEADER_SIZE};
use nodedb_cache::{CacheConfig, CacheError, CacheLayer, DirtyBatch, Lookup, NodeKey, OrphanKey};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn populated_layer() -> CacheLayer {
    let mut layer = CacheLayer::new(10);
    layer.save_node(b"node-b", Bytes::from_static(b"B"));
    layer.save_node(b"node-a", Bytes::from_static(b"A"));
    layer.delete_node(b"node-z");
    layer.save_root(10, Bytes::from_static(b"r10")).unwrap();
    layer.save_root(11, Bytes::from_static(b"r11")).unwrap();
    layer.save_root(12, Bytes::from_static(b"r12")).unwrap();
    layer.delete_root(12);
    layer.save_orphan(b"orphan-2", Bytes::from_static(b"h2"));
    layer.save_orphan(b"orphan-1", Bytes::from_static(b"h1"));
    layer
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_dirty_batch_contents() {
    let layer = populated_layer();

    let batch = layer.dirty_batch();

    assert_eq!(batch.first_version, 10);
    assert_eq!(batch.last_version, 12);
    assert_eq!(
        batch.nodes,
        vec![
            (NodeKey::from(b"node-a"), Bytes::from_static(b"A")),
            (NodeKey::from(b"node-b"), Bytes::from_static(b"B")),
        ]
    );
    assert_eq!(batch.deleted_nodes, vec![NodeKey::from(b"node-z")]);
    assert_eq!(batch.roots.keys().copied().collect::<Vec<_>>(), vec![10, 11]);
    assert_eq!(batch.deleted_roots, vec![12]);
    assert_eq!(
        batch.orphans,
        vec![
            (OrphanKey::from(b"orphan-1"), Bytes::from_static(b"h1")),
            (OrphanKey::from(b"orphan-2"), Bytes::from_static(b"h2")),
        ]
    );
    assert_eq!(batch.len(), 8);
}

#[test]
fn test_dirty_batch_does_not_drain_layer() {
    let layer = populated_layer();

    let _batch = layer.dirty_batch();

    assert_eq!(layer.get_node(b"node-a"), Some(Bytes::from_static(b"A")));
    assert_eq!(layer.orphans().len(), 2);
}

#[test]
fn test_empty_layer_gives_empty_batch() {
    let batch = CacheLayer::new(4).dirty_batch();

    assert!(batch.is_empty());
    assert_eq!(batch, DirtyBatch::new(4, 4));
}

// =============================================================================
// Codec Tests
// =============================================================================

#[test]
fn test_encode_decode_preserves_batch() {
    let batch = populated_layer().dirty_batch();

    let frame = batch.encode().unwrap();
    let decoded = DirtyBatch::decode(&frame).unwrap();

    assert_eq!(decoded, batch);
}

#[test]
fn test_decode_detects_flipped_payload_byte() {
    let mut frame = populated_layer().dirty_batch().encode().unwrap();
    let last = frame.len() - 1;
    frame[last] ^= 0xFF;

    let result = decode_batch(&frame);

    assert!(matches!(result, Err(CacheError::Corruption(_))));
}

#[test]
fn test_decode_detects_bad_magic() {
    let mut frame = DirtyBatch::new(0, 0).encode().unwrap();
    frame[0] = b'X';

    assert!(matches!(decode_batch(&frame), Err(CacheError::Corruption(_))));
}

#[test]
fn test_decode_detects_truncation() {
    let frame = populated_layer().dirty_batch().encode().unwrap();

    assert!(matches!(
        decode_batch(&frame[..frame.len() - 3]),
        Err(CacheError::Corruption(_))
    ));
    assert!(matches!(
        decode_batch(&frame[..HEADER_SIZE - 1]),
        Err(CacheError::Corruption(_))
    ));
}

#[test]
fn test_decode_rejects_trailing_bytes() {
    let mut frame = DirtyBatch::new(0, 0).encode().unwrap();
    frame.push(0);

    assert!(matches!(decode_batch(&frame), Err(CacheError::Corruption(_))));
}

// =============================================================================
// File Tests
// =============================================================================

#[test]
fn test_write_and_read_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("batch.ndbc");
    let batch = populated_layer().dirty_batch();

    batch.write_to(&path).unwrap();
    let recovered = DirtyBatch::read_from(&path).unwrap();

    assert_eq!(recovered, batch);
}

#[test]
fn test_read_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();

    let result = DirtyBatch::read_from(&temp_dir.path().join("missing"));

    assert!(matches!(result, Err(CacheError::Io(_))));
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_into_layer_restores_state() {
    let batch = populated_layer().dirty_batch();

    let layer = batch.clone().into_layer(CacheConfig::default()).unwrap();

    assert_eq!(layer.first_version(), 10);
    assert_eq!(layer.last_version(), 12);
    assert_eq!(layer.get_node(b"node-b"), Some(Bytes::from_static(b"B")));
    assert_eq!(layer.lookup_node(b"node-z"), Lookup::Deleted);
    assert!(layer.has_root(11));
    assert_eq!(layer.lookup_root(12), Lookup::Deleted);
    assert_eq!(layer.orphans().len(), 2);
    assert_eq!(layer.dirty_batch(), batch);
}

#[test]
fn test_apply_to_raises_last_version_past_deleted_roots() {
    let mut source = CacheLayer::new(0);
    source.save_root(1, Bytes::from_static(b"a")).unwrap();
    source.save_root(9, Bytes::from_static(b"b")).unwrap();
    source.delete_roots_from(5);

    let mut target = CacheLayer::new(0);
    source.dirty_batch().apply_to(&mut target).unwrap();

    assert_eq!(target.last_version(), 9);
    assert!(!target.has_root(9));
}

#[test]
fn test_apply_to_honors_root_validation() {
    let mut source = CacheLayer::new(0);
    source.save_root(2, Bytes::from_static(b"a")).unwrap();

    let config = CacheConfig::builder().reject_roots_below_first(true).build();
    let mut target = CacheLayer::with_config(5, config);

    let result = source.dirty_batch().apply_to(&mut target);

    assert!(matches!(
        result,
        Err(CacheError::VersionBelowFirst { version: 2, first: 5 })
    ));
}

#[test]
fn test_rejected_apply_leaves_target_untouched() {
    let mut source = CacheLayer::new(0);
    source.save_node(b"n", Bytes::from_static(b"v"));
    source.delete_node(b"gone");
    source.save_root(2, Bytes::from_static(b"old")).unwrap();
    source.save_root(7, Bytes::from_static(b"new")).unwrap();
    source.delete_root(8);
    source.save_orphan(b"o", Bytes::from_static(b"h"));

    let config = CacheConfig::builder().reject_roots_below_first(true).build();
    let mut target = CacheLayer::with_config(5, config);

    let result = source.dirty_batch().apply_to(&mut target);

    assert!(result.is_err());
    assert!(target.is_empty(), "nothing may be staged: {:?}", target.stats());
    assert_eq!(target.lookup_node(b"n"), Lookup::Absent);
    assert!(!target.has_root(7));
    assert_eq!(target.last_version(), 5);
}

#[test]
fn test_rejected_apply_on_tombstoned_target() {
    let mut source = CacheLayer::new(0);
    source.save_node(b"n", Bytes::from_static(b"v"));
    source.save_root(1, Bytes::from_static(b"a")).unwrap();
    source.save_root(3, Bytes::from_static(b"b")).unwrap();

    let config = CacheConfig::builder().reject_tombstoned_roots(true).build();
    let mut target = CacheLayer::with_config(0, config);
    target.delete_root(3);

    let result = source.dirty_batch().apply_to(&mut target);

    assert!(matches!(result, Err(CacheError::RootTombstoned(3))));
    assert!(!target.has_root(1));
    assert_eq!(target.lookup_node(b"n"), Lookup::Absent);
    assert_eq!(target.lookup_root(3), Lookup::Deleted);
    assert_eq!(target.stats().total(), 1);
}
