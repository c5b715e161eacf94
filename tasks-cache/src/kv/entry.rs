//! Stored values with expiry metadata

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A value held by [`MemoryKv`](super::MemoryKv)
#[derive(Debug, Clone)]
pub struct KvEntry {
    /// Raw stored bytes
    pub value: Vec<u8>,

    /// Entry metadata
    pub metadata: KvMetadata,
}

/// Metadata associated with a stored value
#[derive(Debug, Clone)]
pub struct KvMetadata {
    /// When the value was written
    pub created_at: DateTime<Utc>,

    /// When the value expires; `None` for values written without a TTL
    pub expires_at: Option<DateTime<Utc>>,
}

impl KvEntry {
    /// Create an entry that expires `ttl` from now
    pub fn with_ttl(value: Vec<u8>, ttl: Duration) -> Self {
        let now = Utc::now();
        // Durations too large for chrono are effectively "never".
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl));

        Self {
            value,
            metadata: KvMetadata {
                created_at: now,
                expires_at,
            },
        }
    }

    /// Create an entry with no expiry
    pub fn persistent(value: Vec<u8>) -> Self {
        Self {
            value,
            metadata: KvMetadata {
                created_at: Utc::now(),
                expires_at: None,
            },
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.metadata.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}
