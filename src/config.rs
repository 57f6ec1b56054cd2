//! Configuration for nodedb-cache
//!
//! Everything defaults to the permissive behavior: `save_root` never fails
//! unless a check is switched on here.

/// Configuration for a [`CacheLayer`](crate::CacheLayer)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    // -------------------------------------------------------------------------
    // Root Validation
    // -------------------------------------------------------------------------
    /// Reject `save_root` for versions older than the layer's first version
    pub reject_roots_below_first: bool,

    /// Reject `save_root` for versions that carry a tombstone in this layer
    pub reject_tombstoned_roots: bool,

    // -------------------------------------------------------------------------
    // Capacity Hints
    // -------------------------------------------------------------------------
    /// Expected number of dirty nodes, used to pre-size the node map
    pub expected_nodes: usize,

    /// Expected number of orphan records, used to pre-size the orphan map
    pub expected_orphans: usize,
}

impl CacheConfig {
    /// Create a new config builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// True when any `save_root` validation is enabled
    pub fn validates_roots(&self) -> bool {
        self.reject_roots_below_first || self.reject_tombstoned_roots
    }
}

/// Builder for CacheConfig
#[derive(Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Reject roots saved below the first version
    pub fn reject_roots_below_first(mut self, enabled: bool) -> Self {
        self.config.reject_roots_below_first = enabled;
        self
    }

    /// Reject roots saved for tombstoned versions
    pub fn reject_tombstoned_roots(mut self, enabled: bool) -> Self {
        self.config.reject_tombstoned_roots = enabled;
        self
    }

    /// Enable every root check
    pub fn strict(self) -> Self {
        self.reject_roots_below_first(true).reject_tombstoned_roots(true)
    }

    /// Set the expected number of dirty nodes
    pub fn expected_nodes(mut self, count: usize) -> Self {
        self.config.expected_nodes = count;
        self
    }

    /// Set the expected number of orphan records
    pub fn expected_orphans(mut self, count: usize) -> Self {
        self.config.expected_orphans = count;
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}
