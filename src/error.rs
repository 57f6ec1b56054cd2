//! Error types for nodedb-cache
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::layer::Version;

/// Result type alias using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

/// Unified error type for nodedb-cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Root Validation Errors
    // -------------------------------------------------------------------------
    #[error("Root version {version} is below the first version {first} of this cache")]
    VersionBelowFirst { version: Version, first: Version },

    #[error("Root version {0} is tombstoned")]
    RootTombstoned(Version),

    // -------------------------------------------------------------------------
    // Batch Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Batch corruption detected: {0}")]
    Corruption(String),
}
