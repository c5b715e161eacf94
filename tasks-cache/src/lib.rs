//! # tasks-cache
//!
//! Read-through caching for a record-management API, backed by an external
//! key-value store with TTL support.
//!
//! ## Features
//!
//! - Canonical cache keys for list requests (parameter order never matters)
//! - Generation-counter invalidation via a single random version tag
//! - TTL-bounded freshness with a configurable floor
//! - Fail-open handling of every key-value fault
//! - Injected key-value and record-store capabilities for testing
//!
//! ## Usage
//!
//! Wrap any [`RecordStore`] in a [`CachedRecords`] and route the five
//! operations through it:
//!
//! ```ignore
//! use std::sync::Arc;
//! use tasks_cache::{CacheConfig, CachedRecords, MemoryKv};
//!
//! let kv = Arc::new(MemoryKv::new());
//! let tasks = CachedRecords::new(Arc::new(my_store), kv, CacheConfig::from_env());
//!
//! let page = tasks.list("http://local.test/tasks?page=1", &query).await;
//! println!("served from {}", page.source);
//!
//! // Replaces the version tag; the next list misses and repopulates.
//! tasks.create(fields).await;
//! ```

pub mod cache;
pub mod error;
pub mod kv;
pub mod outcome;
pub mod record;

// Re-export main types for convenience
pub use cache::{
    canonicalize_url, CacheConfig, CacheConfigBuilder, CacheKey, CacheKeyBuilder, CacheOperation,
    CacheSource, CacheStore, Cached, CachedRecords, Invalidation, MutationKind, VersionTag,
    WriteMode,
};
pub use error::{CacheError, Result};
pub use kv::{KvStore, MemoryKv};
pub use outcome::{FailureKind, OperationFailure, Outcome};
pub use record::RecordStore;
