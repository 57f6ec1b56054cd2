//! Shared access to a CacheLayer
//!
//! The layer has no internal locking. When several threads build or drain
//! the same layer, they go through this wrapper, which holds one lock for a
//! whole logical operation. Sequences such as "check `has_root`, then
//! `save_root`" belong inside a single [`SharedCacheLayer::with`] call.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};

use crate::error::Result;
use crate::layer::{CacheLayer, Version};

/// Cloneable handle to a mutex-guarded [`CacheLayer`]
#[derive(Debug, Clone)]
pub struct SharedCacheLayer {
    inner: Arc<Mutex<CacheLayer>>,
}

impl SharedCacheLayer {
    pub fn new(layer: CacheLayer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(layer)),
        }
    }

    /// Run `f` with exclusive access to the layer
    pub fn with<R>(&self, f: impl FnOnce(&mut CacheLayer) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Hold the lock across several calls
    pub fn lock(&self) -> MutexGuard<'_, CacheLayer> {
        self.inner.lock()
    }

    /// Save a root only if none is staged for `version`
    ///
    /// Returns `Ok(true)` when the root was saved.
    pub fn save_root_if_absent(&self, version: Version, hash: impl Into<Bytes>) -> Result<bool> {
        self.with(|layer| {
            if layer.has_root(version) {
                return Ok(false);
            }
            layer.save_root(version, hash)?;
            Ok(true)
        })
    }

    /// Take the layer back once no other handle exists
    pub fn into_inner(self) -> Option<CacheLayer> {
        Arc::try_unwrap(self.inner).ok().map(Mutex::into_inner)
    }
}

impl From<CacheLayer> for SharedCacheLayer {
    fn from(layer: CacheLayer) -> Self {
        Self::new(layer)
    }
}
