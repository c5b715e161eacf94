//! # Versioned Read-Through Cache
//!
//! Caches list and read results of a record store in an external TTL
//! key-value service.
//!
//! ## Features
//!
//! - **Canonical keys**: query parameters are sorted so equivalent list
//!   requests share one entry
//! - **Generation invalidation**: mutations replace a single version tag
//!   instead of enumerating or deleting entries
//! - **TTL-bounded freshness**: every entry expires, so orphaned
//!   generations are collected by the store itself
//! - **Fail-open**: key-value faults degrade to uncached operation, never
//!   to an error response
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tasks_cache::cache::{CacheConfig, CacheStore, CacheKeyBuilder, VersionTag};
//! use tasks_cache::kv::MemoryKv;
//!
//! # async fn example() -> tasks_cache::Result<()> {
//! let kv = Arc::new(MemoryKv::new());
//! let config = CacheConfig::builder().ttl_seconds(120).build();
//!
//! let keys = CacheKeyBuilder::new(config.namespace.clone());
//! let version = VersionTag::new(kv.clone(), keys.version_key());
//! let store = CacheStore::new(kv);
//!
//! let key = keys.list(&version.current().await?, "/tasks?page=2&search=x")?;
//! store.put_json(&key, &vec!["cached"], config.ttl_for_write()).await;
//!
//! let hit: Option<Vec<String>> = store.get_json(&key).await;
//! assert!(hit.is_some());
//!
//! // A write elsewhere bumps the generation; the old key is never computed again.
//! version.invalidate().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod invalidation;
pub mod key;
pub mod read_through;
pub mod store;
pub mod version;

pub use config::{CacheConfig, CacheConfigBuilder, WriteMode, MIN_TTL_SECONDS};
pub use invalidation::{Invalidation, MutationKind};
pub use key::{canonicalize_url, CacheKey, CacheKeyBuilder, CacheOperation};
pub use read_through::{CacheSource, Cached, CachedRecords};
pub use store::CacheStore;
pub use version::{generate_token, VersionTag};
