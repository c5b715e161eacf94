//! Read-through caching around a [`RecordStore`]
//!
//! Reads resolve the version tag, build a key and try the cache; a miss
//! falls through to the record store and only successful results are
//! written back. Mutations pass straight through and then bump the
//! version tag. Cache faults of any kind degrade to uncached operation.

use crate::cache::config::CacheConfig;
use crate::cache::invalidation::{Invalidation, MutationKind};
use crate::cache::key::{CacheKey, CacheKeyBuilder};
use crate::cache::store::CacheStore;
use crate::cache::version::VersionTag;
use crate::error::Result;
use crate::kv::KvStore;
use crate::outcome::Outcome;
use crate::record::RecordStore;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// Where a read result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheSource {
    /// Served from the cache; the record store was not consulted
    Hit,
    /// Looked up, not found, fetched from the record store
    Miss,
    /// No lookup was possible (disabled, version fault or malformed key)
    Bypass,
}

impl CacheSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheSource::Hit => "HIT",
            CacheSource::Miss => "MISS",
            CacheSource::Bypass => "BYPASS",
        }
    }
}

impl fmt::Display for CacheSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read outcome annotated with its cache source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached<T> {
    pub outcome: Outcome<T>,
    pub source: CacheSource,
}

impl<T> Cached<T> {
    pub fn is_hit(&self) -> bool {
        self.source == CacheSource::Hit
    }
}

enum KeyResolution {
    Ready(CacheKey),
    VersionFault,
    Malformed,
}

/// Cached facade over one record collection
pub struct CachedRecords<R: RecordStore> {
    records: Arc<R>,
    config: CacheConfig,
    keys: CacheKeyBuilder,
    version: VersionTag,
    store: CacheStore,
    invalidation: Invalidation,
}

impl<R: RecordStore> CachedRecords<R> {
    pub fn new(records: Arc<R>, kv: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        let keys = CacheKeyBuilder::new(config.namespace.clone());
        let version = VersionTag::new(Arc::clone(&kv), keys.version_key());
        let store = CacheStore::with_write_mode(kv, config.write_mode);
        let invalidation = Invalidation::new(version.clone());

        Self {
            records,
            config,
            keys,
            version,
            store,
            invalidation,
        }
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn keys(&self) -> &CacheKeyBuilder {
        &self.keys
    }

    pub fn version_tag(&self) -> &VersionTag {
        &self.version
    }

    /// List records for the request at `url`.
    ///
    /// `url` is only used for the cache key; `query` is what the record
    /// store sees.
    pub async fn list(&self, url: &str, query: &R::Query) -> Cached<R::Page> {
        if !self.config.enabled {
            return bypass(self.records.list(query).await);
        }

        self.read_through(
            |version: &str| self.keys.list(version, url),
            || self.records.list(query),
        )
        .await
    }

    /// Read one record by id
    pub async fn read(&self, id: &R::Id) -> Cached<R::Record> {
        if !self.config.enabled {
            return bypass(self.records.read(id).await);
        }

        self.read_through(
            |version: &str| self.keys.read(version, id),
            || self.records.read(id),
        )
        .await
    }

    pub async fn create(&self, fields: R::Fields) -> Outcome<R::Record> {
        let outcome = self.records.create(fields).await;
        self.invalidation
            .after_mutation(MutationKind::Create, &outcome)
            .await;
        outcome
    }

    pub async fn update(&self, id: &R::Id, fields: R::Fields) -> Outcome<R::Record> {
        let outcome = self.records.update(id, fields).await;
        self.invalidation
            .after_mutation(MutationKind::Update, &outcome)
            .await;
        outcome
    }

    pub async fn delete(&self, id: &R::Id) -> Outcome<R::Record> {
        let outcome = self.records.delete(id).await;
        self.invalidation
            .after_mutation(MutationKind::Delete, &outcome)
            .await;
        outcome
    }

    async fn resolve_key<B>(&self, build: &B) -> KeyResolution
    where
        B: Fn(&str) -> Result<CacheKey>,
    {
        let version = match self.version.current().await {
            Ok(version) => version,
            Err(e) => {
                warn!("Cannot resolve cache version, bypassing cache: {}", e);
                return KeyResolution::VersionFault;
            }
        };

        match build(&version) {
            Ok(key) => KeyResolution::Ready(key),
            Err(e) => {
                warn!("Cannot build cache key, bypassing cache: {}", e);
                KeyResolution::Malformed
            }
        }
    }

    async fn read_through<T, B, F, Fut>(&self, build: B, fetch: F) -> Cached<T>
    where
        T: Serialize + DeserializeOwned,
        B: Fn(&str) -> Result<CacheKey>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let resolution = self.resolve_key(&build).await;

        if let KeyResolution::Ready(key) = &resolution {
            if let Some(value) = self.store.get_json::<T>(key).await {
                return Cached {
                    outcome: Outcome::Success(value),
                    source: CacheSource::Hit,
                };
            }
        }

        let fresh = fetch().await;
        let source = match resolution {
            KeyResolution::Ready(_) => CacheSource::Miss,
            _ => CacheSource::Bypass,
        };

        // Failures are never cached.
        if let Outcome::Success(value) = &fresh {
            let key = match resolution {
                KeyResolution::Ready(key) => Some(key),
                // The version read may have been a transient fault; one
                // more attempt to publish this result.
                KeyResolution::VersionFault => match self.resolve_key(&build).await {
                    KeyResolution::Ready(key) => Some(key),
                    _ => None,
                },
                KeyResolution::Malformed => None,
            };

            if let Some(key) = key {
                self.store
                    .put_json(&key, value, self.config.ttl_for_write())
                    .await;
            }
        }

        Cached {
            outcome: fresh,
            source,
        }
    }
}

fn bypass<T>(outcome: Outcome<T>) -> Cached<T> {
    Cached {
        outcome,
        source: CacheSource::Bypass,
    }
}
