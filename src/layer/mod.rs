//! Cache Layer Module
//!
//! In-memory staging area for node, root and orphan mutations that have not
//! been flushed to durable storage yet.
//!
//! ## Responsibilities
//! - Read-your-writes for nodes and roots within one build session
//! - Read-your-deletes through tombstones
//! - Track the version horizon (`first_version..=last_version`)
//! - Queue orphan records for a later pruning pass
//!
//! ## Data Structure Choice
//! Each node key and root version maps to a single [`CacheEntry`], so a key
//! can never be dirty and tombstoned at the same time:
//! - Nodes: `HashMap<NodeKey, CacheEntry>` (point lookups only)
//! - Roots: `BTreeMap<Version, CacheEntry>` (ordered, range deletes)
//! - Orphans: `HashMap<OrphanKey, Bytes>` (no tombstone state)
//!
//! ## Range Deletes
//! The two range operations use different upper bounds:
//! ```text
//! delete_roots_from(f)        tombstones  f ..= last_version   (inclusive)
//! delete_roots_range(f, t)    tombstones  f ..  t              (exclusive)
//! ```

mod cache;
mod key;

pub use cache::{CacheLayer, CacheStats};
pub use key::{NodeKey, OrphanKey};

use bytes::Bytes;

/// Version number of a tree root
pub type Version = u64;

/// Entry stored for a node key or a root version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// A dirty value pending write
    Value(Bytes),

    /// A tombstone pending removal
    Tombstone,
}

/// Result of looking up a key in the layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Dirty value staged in this layer
    Present(Bytes),

    /// Deleted in this layer; durable storage must not be consulted
    Deleted,

    /// Unknown to this layer; the caller falls through to durable storage
    Absent,
}

impl Lookup {
    /// The staged value, if any
    pub fn into_value(self) -> Option<Bytes> {
        match self {
            Lookup::Present(value) => Some(value),
            Lookup::Deleted | Lookup::Absent => None,
        }
    }

    /// True for keys this layer knows about (present or deleted)
    pub fn is_known(&self) -> bool {
        !matches!(self, Lookup::Absent)
    }
}

impl From<Option<&CacheEntry>> for Lookup {
    fn from(entry: Option<&CacheEntry>) -> Self {
        match entry {
            Some(CacheEntry::Value(value)) => Lookup::Present(value.clone()),
            Some(CacheEntry::Tombstone) => Lookup::Deleted,
            None => Lookup::Absent,
        }
    }
}
