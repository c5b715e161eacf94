//! Key-value service abstraction
//!
//! The cache core never talks to a concrete key-value client; it is handed
//! an `Arc<dyn KvStore>` at construction time.

pub mod entry;
pub mod memory;

pub use entry::{KvEntry, KvMetadata};
pub use memory::{spawn_purge_task, MemoryKv};

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// External key-value service with per-key expiry.
///
/// Any call may fail with a connectivity, timeout or quota error.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Short backend name for log context (e.g. "memory").
    fn name(&self) -> &'static str;

    /// Fetch the raw bytes stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, overwriting any previous value.
    ///
    /// `ttl = None` means the value never expires.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
