//! Dirty Batch Module
//!
//! Hand-off format between a [`CacheLayer`](crate::CacheLayer) and the
//! component that persists it.
//!
//! ## Responsibilities
//! - Snapshot all staged writes and tombstones in deterministic order
//! - Checksummed binary framing for batches parked on disk
//! - Replay a batch back into a layer (e.g. after a failed flush)
//!
//! ## Frame Format
//! ```text
//! ┌───────────┬───────────┬───────────┬──────────────────────┐
//! │ Magic (4) │  Len (4)  │  CRC (4)  │   bincode payload    │
//! └───────────┴───────────┴───────────┴──────────────────────┘
//! ```
//! Header fields are big-endian. The CRC32 covers the payload only.

mod codec;
mod dirty;

pub use codec::{decode_batch, encode_batch, BATCH_MAGIC, HEADER_SIZE};
pub use dirty::DirtyBatch;
