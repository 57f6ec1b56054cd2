//! # nodedb-cache
//!
//! Dirty-write staging cache for a versioned, Merkle-tree-backed key-value
//! database:
//! - Read-your-writes for nodes and roots that are not flushed yet
//! - Tombstones so deletes shadow durable storage
//! - Orphan bookkeeping for a later pruning pass
//! - Checksummed batch hand-off to the persistence layer
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Tree Mutation (upstream)                  │
//! │      save/delete nodes, roots, orphans · read back state    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        CacheLayer                           │
//! │      nodes (value | tombstone) · roots · orphans            │
//! │      first_version ..= last_version                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  get_roots / orphans / dirty_batch
//!                       ▼
//!               ┌───────────────┐
//!               │ Commit/Flush  │ ──▶ durable storage, then destroy()
//!               │ (downstream)  │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod layer;
pub mod batch;
pub mod shared;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CacheError, Result};
pub use config::CacheConfig;
pub use layer::{CacheLayer, Lookup, NodeKey, OrphanKey, Version};
pub use batch::DirtyBatch;
pub use shared::SharedCacheLayer;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of nodedb-cache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
