//! Capability interface of the system of record
//!
//! The cache layer treats the record store as an opaque transactional data
//! service. It only needs to know whether an operation succeeded and how
//! to serialize the successful payload.

use crate::outcome::Outcome;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;

/// Create/read/update/delete/list over one resource collection.
///
/// Implementations report failures through [`Outcome::Failure`]; they must
/// not panic for not-found or validation problems.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Record identifier. Its `Display` form is used in read cache keys.
    type Id: Display + Send + Sync;

    /// A single record, as returned by create/read/update/delete.
    type Record: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Writable fields for create and update.
    type Fields: Send + Sync;

    /// Parsed list query. Opaque to the cache layer.
    type Query: Send + Sync;

    /// Result of a list call.
    type Page: Serialize + DeserializeOwned + Send + Sync + 'static;

    async fn create(&self, fields: Self::Fields) -> Outcome<Self::Record>;

    async fn read(&self, id: &Self::Id) -> Outcome<Self::Record>;

    async fn update(&self, id: &Self::Id, fields: Self::Fields) -> Outcome<Self::Record>;

    async fn delete(&self, id: &Self::Id) -> Outcome<Self::Record>;

    async fn list(&self, query: &Self::Query) -> Outcome<Self::Page>;
}
