//! Cache generation tag
//!
//! One value in the key-value store names the current cache generation.
//! Readers embed it in every key; writers replace it with a fresh random
//! token, which orphans every entry of the previous generation at once.
//! Nothing is deleted: orphaned entries expire through their TTL.

use crate::error::Result;
use crate::kv::KvStore;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Generate a new opaque generation token
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Handle to the version tag stored under a single well-known key
#[derive(Clone)]
pub struct VersionTag {
    kv: Arc<dyn KvStore>,
    key: String,
}

impl VersionTag {
    pub fn new(kv: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Key the tag is stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current tag, creating one if none exists.
    ///
    /// Concurrent first readers may each store a token; the store keeps the
    /// last write and every later reader converges on it. If the new token
    /// cannot be stored the error is returned and the caller skips the cache.
    pub async fn current(&self) -> Result<String> {
        if let Some(raw) = self.kv.get(&self.key).await? {
            match String::from_utf8(raw) {
                Ok(token) if !token.is_empty() => return Ok(token),
                _ => debug!("Ignoring unreadable version tag under {}", self.key),
            }
        }

        let token = generate_token();
        self.kv
            .put(&self.key, token.clone().into_bytes(), None)
            .await?;
        info!("Created cache version {} under {}", token, self.key);
        Ok(token)
    }

    /// Replace the tag with a new token, returning it.
    ///
    /// Blind overwrite; whichever concurrent write lands is a new generation.
    pub async fn invalidate(&self) -> Result<String> {
        let token = generate_token();
        self.kv
            .put(&self.key, token.clone().into_bytes(), None)
            .await?;
        debug!("Cache version under {} replaced with {}", self.key, token);
        Ok(token)
    }
}

impl std::fmt::Debug for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionTag")
            .field("backend", &self.kv.name())
            .field("key", &self.key)
            .finish()
    }
}
