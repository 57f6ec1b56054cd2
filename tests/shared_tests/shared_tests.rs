//! Tests for SharedCacheLayer
//!
//! These tests verify:
//! - Closure-scoped exclusive access
//! - Atomic check-then-save for roots
//! - Concurrent writers through cloned handles

use std::thread;

use bytes::Bytes;
use nodedb_cache::{CacheLayer, SharedCacheLayer};

#[test]
fn test_with_runs_against_the_layer() {
    let shared = SharedCacheLayer::new(CacheLayer::new(0));

    shared.with(|layer| layer.save_node(b"k", Bytes::from_static(b"v")));
    let value = shared.with(|layer| layer.get_node(b"k"));

    assert_eq!(value, Some(Bytes::from_static(b"v")));
}

#[test]
fn test_save_root_if_absent() {
    let shared = SharedCacheLayer::from(CacheLayer::new(0));

    assert!(shared.save_root_if_absent(1, Bytes::from_static(b"first")).unwrap());
    assert!(!shared.save_root_if_absent(1, Bytes::from_static(b"second")).unwrap());

    let root = shared.lock().get_root(1);
    assert_eq!(root, Some(Bytes::from_static(b"first")));
}

#[test]
fn test_concurrent_root_claims_have_one_winner() {
    let shared = SharedCacheLayer::new(CacheLayer::new(0));

    let mut handles = vec![];
    for t in 0..8u8 {
        let shared = shared.clone();
        handles.push(thread::spawn(move || {
            shared.save_root_if_absent(42, vec![t]).unwrap()
        }));
    }

    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|saved| *saved)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(shared.lock().last_version(), 42);
}

#[test]
fn test_concurrent_writers() {
    let shared = SharedCacheLayer::new(CacheLayer::new(0));

    let mut handles = vec![];
    for t in 0..4 {
        let shared = shared.clone();
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let key = format!("thread{}_key{}", t, i);
                shared.with(|layer| layer.save_node(key.into_bytes(), vec![t as u8]));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let layer = shared.into_inner().unwrap();
    assert_eq!(layer.stats().dirty_nodes, 100);
    assert_eq!(layer.get_node(b"thread3_key24"), Some(Bytes::from(vec![3u8])));
}

#[test]
fn test_into_inner_fails_while_shared() {
    let shared = SharedCacheLayer::new(CacheLayer::new(0));
    let _other = shared.clone();

    assert!(shared.into_inner().is_none());
}
