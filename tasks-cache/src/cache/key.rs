//! Cache key construction
//!
//! Keys have the shape `{namespace}:{version}:{operation}:{target}` where
//! `target` is a canonical path-and-query for list requests and the record
//! identifier for reads. Once the version tag changes, old keys are never
//! computed again and their entries age out.

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::{form_urlencoded, Url};

/// Cache key type
pub type CacheKey = String;

/// Origin prefixed to path-only request targets such as `/tasks?page=2`
const RELATIVE_ORIGIN: &str = "http://localhost";

/// Which read operation a cache entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheOperation {
    List,
    Read,
}

impl fmt::Display for CacheOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheOperation::List => write!(f, "list"),
            CacheOperation::Read => write!(f, "read"),
        }
    }
}

/// Parse a request URL, accepting absolute URLs and absolute paths.
///
/// A path target is appended to a fixed origin rather than resolved as a
/// reference, so `//host/path` stays a path and never names another host.
fn parse_request_url(raw: &str) -> Result<Url> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) if raw.starts_with('/') => {
            Url::parse(&format!("{}{}", RELATIVE_ORIGIN, raw))?
        }
        Err(e) => {
            return Err(CacheError::MalformedInput(format!(
                "cannot parse request URL {:?}: {}",
                raw, e
            )))
        }
    };

    if url.cannot_be_a_base() {
        return Err(CacheError::MalformedInput(format!(
            "request URL {:?} has no path",
            raw
        )));
    }

    Ok(url)
}

/// Normalize a request URL to `path[?query]` with its query pairs sorted.
///
/// Pairs are ordered by name, then by value, using byte-wise comparison,
/// so reordered parameters (including repeated ones) produce the same
/// string. The fragment and origin are dropped.
pub fn canonicalize_url(raw: &str) -> Result<String> {
    let url = parse_request_url(raw)?;

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.sort();

    if pairs.is_empty() {
        return Ok(url.path().to_string());
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish();
    Ok(format!("{}?{}", url.path(), query))
}

/// Builds version-scoped cache keys under one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    namespace: String,
}

impl CacheKeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key holding the current version tag
    pub fn version_key(&self) -> CacheKey {
        format!("{}:version", self.namespace)
    }

    /// Key for a list request identified by its URL
    pub fn list(&self, version: &str, url: &str) -> Result<CacheKey> {
        let canonical = canonicalize_url(url)?;
        self.entry_key(version, CacheOperation::List, &canonical)
    }

    /// Key for a single-record read
    pub fn read(&self, version: &str, id: impl fmt::Display) -> Result<CacheKey> {
        let id = id.to_string();
        if id.is_empty() {
            return Err(CacheError::MalformedInput(
                "record identifier must not be empty".to_string(),
            ));
        }
        self.entry_key(version, CacheOperation::Read, &id)
    }

    fn entry_key(&self, version: &str, operation: CacheOperation, target: &str) -> Result<CacheKey> {
        if version.is_empty() {
            return Err(CacheError::MalformedInput(
                "version tag must not be empty".to_string(),
            ));
        }
        Ok(format!("{}:{}:{}:{}", self.namespace, version, operation, target))
    }
}
