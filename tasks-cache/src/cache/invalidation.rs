//! Generation-based invalidation after mutations
//!
//! Writes never touch individual cache keys. A successful create, update
//! or delete replaces the version tag, and every previously cached list
//! and read result becomes unaddressable in one step.

use crate::cache::version::VersionTag;
use crate::outcome::Outcome;
use std::fmt;
use tracing::{debug, info, warn};

/// Mutation that may trigger an invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Post-mutation hook that bumps the cache generation
#[derive(Debug, Clone)]
pub struct Invalidation {
    version: VersionTag,
}

impl Invalidation {
    pub fn new(version: VersionTag) -> Self {
        Self { version }
    }

    /// Replace the version tag iff `outcome` succeeded.
    ///
    /// Never fails: a fault here only risks staleness bounded by the TTL,
    /// so the mutation's own result is what the caller sees. No retries.
    pub async fn after_mutation<T>(
        &self,
        mutation: MutationKind,
        outcome: &Outcome<T>,
    ) {
        if !outcome.is_success() {
            debug!("Skipping cache invalidation after failed {}", mutation);
            return;
        }

        match self.version.invalidate().await {
            Ok(version) => {
                info!("Cache invalidated after {} (version {})", mutation, version);
            }
            Err(e) => {
                warn!(
                    "Cache invalidation after {} failed, entries may be stale until TTL: {}",
                    mutation, e
                );
            }
        }
    }
}
