//! CacheLayer implementation
//!
//! Plain owned maps, no interior locking. Wrap the whole layer in
//! [`SharedCacheLayer`](crate::SharedCacheLayer) when it must cross threads.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::batch::DirtyBatch;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

use super::{CacheEntry, Lookup, NodeKey, OrphanKey, Version};

/// Staging area for the uncommitted versions of a tree
///
/// ## Version Bounds
/// - `first_version`: oldest version this layer is responsible for
/// - `last_version`: highest version with a saved root, never below
///   `first_version` and never lowered by deletes
#[derive(Debug)]
pub struct CacheLayer {
    first_version: Version,
    last_version: Version,

    /// Node key -> dirty bytes or tombstone
    nodes: HashMap<NodeKey, CacheEntry>,

    /// Version -> dirty root hash or tombstone
    roots: BTreeMap<Version, CacheEntry>,

    /// Orphan key -> hash of the orphaned node
    orphans: HashMap<OrphanKey, Bytes>,

    config: CacheConfig,
}

/// Entry counts per map, for logging and flush heuristics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub dirty_nodes: usize,
    pub deleted_nodes: usize,
    pub dirty_roots: usize,
    pub deleted_roots: usize,
    pub orphans: usize,
}

impl CacheStats {
    pub fn total(&self) -> usize {
        self.dirty_nodes + self.deleted_nodes + self.dirty_roots + self.deleted_roots + self.orphans
    }
}

impl CacheLayer {
    /// Create an empty layer starting at `first_version`
    pub fn new(first_version: Version) -> Self {
        Self::with_config(first_version, CacheConfig::default())
    }

    /// Create an empty layer with an explicit config
    pub fn with_config(first_version: Version, config: CacheConfig) -> Self {
        trace!(first_version, validates_roots = config.validates_roots(), "new cache layer");

        Self {
            first_version,
            last_version: first_version,
            nodes: HashMap::with_capacity(config.expected_nodes),
            roots: BTreeMap::new(),
            orphans: HashMap::with_capacity(config.expected_orphans),
            config,
        }
    }

    // =========================================================================
    // Introspection & Teardown
    // =========================================================================

    pub fn first_version(&self) -> Version {
        self.first_version
    }

    pub fn last_version(&self) -> Version {
        self.last_version
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// True when nothing is staged
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.roots.is_empty() && self.orphans.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            orphans: self.orphans.len(),
            ..CacheStats::default()
        };

        for entry in self.nodes.values() {
            match entry {
                CacheEntry::Value(_) => stats.dirty_nodes += 1,
                CacheEntry::Tombstone => stats.deleted_nodes += 1,
            }
        }
        for entry in self.roots.values() {
            match entry {
                CacheEntry::Value(_) => stats.dirty_roots += 1,
                CacheEntry::Tombstone => stats.deleted_roots += 1,
            }
        }

        stats
    }

    /// Tear the layer down once its contents are durable
    ///
    /// Clears nodes, roots (dirty and tombstoned) and orphans, and resets
    /// both bounds to zero.
    pub fn destroy(&mut self) {
        debug!(
            first_version = self.first_version,
            last_version = self.last_version,
            nodes = self.nodes.len(),
            roots = self.roots.len(),
            orphans = self.orphans.len(),
            "destroying cache layer"
        );

        self.first_version = 0;
        self.last_version = 0;
        self.nodes.clear();
        self.roots.clear();
        self.orphans.clear();
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Get a dirty node value
    ///
    /// `None` means either deleted here or unknown here; use
    /// [`lookup_node`](Self::lookup_node) to tell the two apart.
    pub fn get_node(&self, key: &[u8]) -> Option<Bytes> {
        self.lookup_node(key).into_value()
    }

    /// Get the staged state of a node
    pub fn lookup_node(&self, key: &[u8]) -> Lookup {
        let lookup = Lookup::from(self.nodes.get(key));
        trace!(key = %hex::encode(key), known = lookup.is_known(), "lookup_node");
        lookup
    }

    /// Stage a node write, replacing any earlier value or tombstone
    pub fn save_node(&mut self, key: impl Into<NodeKey>, value: impl Into<Bytes>) {
        let key = key.into();
        trace!(key = %key, "save_node");
        self.nodes.insert(key, CacheEntry::Value(value.into()));
    }

    /// Tombstone a node, discarding any pending write
    pub fn delete_node(&mut self, key: impl AsRef<[u8]> + Into<NodeKey>) {
        trace!(key = %hex::encode(key.as_ref()), "delete_node");

        if matches!(self.nodes.get(key.as_ref()), Some(CacheEntry::Tombstone)) {
            return;
        }
        self.nodes.insert(key.into(), CacheEntry::Tombstone);
    }

    // =========================================================================
    // Roots
    // =========================================================================

    /// True iff a dirty root is staged for exactly `version`
    pub fn has_root(&self, version: Version) -> bool {
        trace!(version, "has_root");
        matches!(self.roots.get(&version), Some(CacheEntry::Value(_)))
    }

    pub fn get_root(&self, version: Version) -> Option<Bytes> {
        self.lookup_root(version).into_value()
    }

    /// Get the staged state of a root
    pub fn lookup_root(&self, version: Version) -> Lookup {
        trace!(version, "lookup_root");
        Lookup::from(self.roots.get(&version))
    }

    /// Snapshot of every dirty root
    ///
    /// The returned map is owned by the caller; later mutations of the
    /// layer do not show up in it.
    pub fn get_roots(&self) -> BTreeMap<Version, Bytes> {
        trace!("get_roots");
        self.roots
            .iter()
            .filter_map(|(version, entry)| match entry {
                CacheEntry::Value(hash) => Some((*version, hash.clone())),
                CacheEntry::Tombstone => None,
            })
            .collect()
    }

    /// Stage the root hash of `version`
    ///
    /// Advances `last_version` when `version` is newer. Fails only when a
    /// check is enabled in [`CacheConfig`]; the layer is untouched then.
    pub fn save_root(&mut self, version: Version, hash: impl Into<Bytes>) -> Result<()> {
        trace!(version, "save_root");

        self.check_root(version)?;

        self.last_version = self.last_version.max(version);
        self.roots.insert(version, CacheEntry::Value(hash.into()));

        Ok(())
    }

    /// Run the enabled `save_root` checks for `version` without staging anything
    pub fn check_root(&self, version: Version) -> Result<()> {
        if self.config.reject_roots_below_first && version < self.first_version {
            warn!(version, first_version = self.first_version, "rejected root below first version");
            return Err(CacheError::VersionBelowFirst {
                version,
                first: self.first_version,
            });
        }

        if self.config.reject_tombstoned_roots
            && matches!(self.roots.get(&version), Some(CacheEntry::Tombstone))
        {
            warn!(version, "rejected root for tombstoned version");
            return Err(CacheError::RootTombstoned(version));
        }

        Ok(())
    }

    /// Tombstone the root of a single version
    pub fn delete_root(&mut self, version: Version) {
        trace!(version, "delete_root");
        self.roots.insert(version, CacheEntry::Tombstone);
    }

    /// Tombstone every root in `from_version..=last_version`
    ///
    /// Upper bound is INCLUSIVE, unlike [`delete_roots_range`](Self::delete_roots_range).
    pub fn delete_roots_from(&mut self, from_version: Version) {
        debug!(from_version, last_version = self.last_version, "delete_roots_from");

        for version in from_version..=self.last_version {
            self.roots.insert(version, CacheEntry::Tombstone);
        }
    }

    /// Tombstone every root in `from_version..to_version`
    ///
    /// Upper bound is EXCLUSIVE, unlike [`delete_roots_from`](Self::delete_roots_from).
    pub fn delete_roots_range(&mut self, from_version: Version, to_version: Version) {
        debug!(from_version, to_version, "delete_roots_range");

        for version in from_version..to_version {
            self.roots.insert(version, CacheEntry::Tombstone);
        }
    }

    // =========================================================================
    // Orphans
    // =========================================================================

    /// Record an orphan, overwriting an existing record for the same key
    pub fn save_orphan(&mut self, key: impl Into<OrphanKey>, node_hash: impl Into<Bytes>) {
        let key = key.into();
        trace!(key = %key, "save_orphan");
        self.orphans.insert(key, node_hash.into());
    }

    /// Live view of the orphan records
    ///
    /// Reflects the current state on every call. The layer cannot be
    /// mutated while the view is borrowed; use
    /// [`take_orphans`](Self::take_orphans) to drain them instead.
    pub fn orphans(&self) -> &HashMap<OrphanKey, Bytes> {
        trace!(count = self.orphans.len(), "orphans");
        &self.orphans
    }

    /// Hand every orphan over to the caller, leaving none staged
    pub fn take_orphans(&mut self) -> HashMap<OrphanKey, Bytes> {
        debug!(count = self.orphans.len(), "take_orphans");
        std::mem::take(&mut self.orphans)
    }

    /// Remove an orphan record; no-op if absent
    pub fn delete_orphan(&mut self, key: impl AsRef<[u8]>) {
        let key = key.as_ref();
        trace!(key = %hex::encode(key), "delete_orphan");
        self.orphans.remove(key);
    }

    // =========================================================================
    // Flush Hand-off
    // =========================================================================

    /// Snapshot of everything the flush component must persist
    pub fn dirty_batch(&self) -> DirtyBatch {
        let mut batch = DirtyBatch::new(self.first_version, self.last_version);

        for (key, entry) in &self.nodes {
            match entry {
                CacheEntry::Value(value) => batch.nodes.push((key.clone(), value.clone())),
                CacheEntry::Tombstone => batch.deleted_nodes.push(key.clone()),
            }
        }
        for (version, entry) in &self.roots {
            match entry {
                CacheEntry::Value(hash) => {
                    batch.roots.insert(*version, hash.clone());
                }
                CacheEntry::Tombstone => batch.deleted_roots.push(*version),
            }
        }
        batch.orphans = self
            .orphans
            .iter()
            .map(|(key, hash)| (key.clone(), hash.clone()))
            .collect();

        batch.nodes.sort_by(|a, b| a.0.cmp(&b.0));
        batch.deleted_nodes.sort();
        batch.orphans.sort_by(|a, b| a.0.cmp(&b.0));

        debug!(
            nodes = batch.nodes.len(),
            deleted_nodes = batch.deleted_nodes.len(),
            roots = batch.roots.len(),
            deleted_roots = batch.deleted_roots.len(),
            orphans = batch.orphans.len(),
            "built dirty batch"
        );

        batch
    }

    /// Raise `last_version` without staging a root (batch replay)
    pub(crate) fn raise_last_version(&mut self, version: Version) {
        self.last_version = self.last_version.max(version);
    }
}
