//! JSON cache adapter over the key-value service
//!
//! This is the only place cache values are encoded, decoded and written,
//! and the only place key-value faults on entries are swallowed. Reads
//! degrade to a miss and writes to a no-op; neither ever fails the caller.

use crate::cache::config::WriteMode;
use crate::error::Result;
use crate::kv::KvStore;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fail-open JSON view of a [`KvStore`]
#[derive(Clone)]
pub struct CacheStore {
    kv: Arc<dyn KvStore>,
    write_mode: WriteMode,
}

impl CacheStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_write_mode(kv, WriteMode::Inline)
    }

    pub fn with_write_mode(kv: Arc<dyn KvStore>, write_mode: WriteMode) -> Self {
        Self { kv, write_mode }
    }

    /// Decode the value under `key`. Absent, faulted and undecodable all
    /// come back as `None`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get_json(key).await {
            Ok(Some(value)) => {
                debug!("Cache hit: {}", key);
                Some(value)
            }
            Ok(None) => {
                debug!("Cache miss: {}", key);
                None
            }
            Err(e) if e.is_cache_unavailable() => {
                warn!("Cache read of {} on {} failed, treating as miss: {}", key, self.kv.name(), e);
                None
            }
            Err(e) => {
                debug!("Unusable cache value under {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    async fn try_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode `value` and store it under `key` for `ttl`.
    ///
    /// Every cache entry has a TTL; there are no unbounded entries. In
    /// background mode the write is spawned and this returns immediately.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot encode cache value for {}, skipping write: {}", key, e);
                return;
            }
        };

        match self.write_mode {
            WriteMode::Inline => Self::write(self.kv.as_ref(), key, bytes, ttl).await,
            WriteMode::Background => {
                let kv = Arc::clone(&self.kv);
                let key = key.to_string();
                tokio::spawn(async move {
                    Self::write(kv.as_ref(), &key, bytes, ttl).await;
                });
            }
        }
    }

    async fn write(kv: &dyn KvStore, key: &str, bytes: Vec<u8>, ttl: Duration) {
        match kv.put(key, bytes, Some(ttl)).await {
            Ok(()) => debug!("Cached {} for {}s", key, ttl.as_secs()),
            Err(e) => warn!("Cache write of {} on {} failed, ignoring: {}", key, kv.name(), e),
        }
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.kv.name())
            .field("write_mode", &self.write_mode)
            .finish()
    }
}
