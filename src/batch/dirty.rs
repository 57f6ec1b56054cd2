//! DirtyBatch definition
//!
//! Owned snapshot of a layer's staged state.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::layer::{CacheLayer, NodeKey, OrphanKey, Version};

use super::codec::{decode_batch, encode_batch};

/// Everything a flush must persist, sorted by key or version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyBatch {
    /// First version of the source layer
    pub first_version: Version,

    /// Last version of the source layer
    pub last_version: Version,

    /// Node writes
    pub nodes: Vec<(NodeKey, Bytes)>,

    /// Node removals
    pub deleted_nodes: Vec<NodeKey>,

    /// Root writes
    pub roots: BTreeMap<Version, Bytes>,

    /// Root removals, ascending
    pub deleted_roots: Vec<Version>,

    /// Orphan records (key -> node hash)
    pub orphans: Vec<(OrphanKey, Bytes)>,
}

impl DirtyBatch {
    /// Create an empty batch for the given bounds
    pub fn new(first_version: Version, last_version: Version) -> Self {
        Self {
            first_version,
            last_version,
            ..Self::default()
        }
    }

    /// Total number of entries in the batch
    pub fn len(&self) -> usize {
        self.nodes.len()
            + self.deleted_nodes.len()
            + self.roots.len()
            + self.deleted_roots.len()
            + self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode to a checksummed frame
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_batch(self)
    }

    /// Decode from a checksummed frame
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_batch(bytes)
    }

    /// Write the encoded batch to `path`, replacing any existing file
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let frame = self.encode()?;
        fs::write(path, &frame)?;
        debug!(path = %path.display(), bytes = frame.len(), entries = self.len(), "wrote dirty batch");
        Ok(())
    }

    /// Read and decode a batch from `path`
    pub fn read_from(path: &Path) -> Result<Self> {
        let frame = fs::read(path)?;
        let batch = Self::decode(&frame)?;
        debug!(path = %path.display(), entries = batch.len(), "read dirty batch");
        Ok(batch)
    }

    /// Replay the batch into `layer`
    ///
    /// Every root is checked against the layer's `save_root` validation
    /// before anything is staged, so a rejected batch leaves the layer
    /// untouched. `last_version` is raised to the batch's bound even if its
    /// top roots were deleted.
    pub fn apply_to(&self, layer: &mut CacheLayer) -> Result<()> {
        for version in self.roots.keys() {
            layer.check_root(*version)?;
        }

        for (key, value) in &self.nodes {
            layer.save_node(key.clone(), value.clone());
        }
        for key in &self.deleted_nodes {
            layer.delete_node(key.clone());
        }
        for (version, hash) in &self.roots {
            layer.save_root(*version, hash.clone())?;
        }
        for version in &self.deleted_roots {
            layer.delete_root(*version);
        }
        for (key, hash) in &self.orphans {
            layer.save_orphan(key.clone(), hash.clone());
        }
        layer.raise_last_version(self.last_version);

        debug!(entries = self.len(), last_version = layer.last_version(), "applied dirty batch");
        Ok(())
    }

    /// Rebuild a layer holding exactly this batch's staged state
    pub fn into_layer(self, config: CacheConfig) -> Result<CacheLayer> {
        let mut layer = CacheLayer::with_config(self.first_version, config);
        self.apply_to(&mut layer)?;
        Ok(layer)
    }
}
