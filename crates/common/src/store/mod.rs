//! Store contracts for the external managed services
//!
//! The portal delegates persistence wholesale to two collaborators:
//! a document store (schemaless keyed records grouped into named
//! collections) and an object store (binary hosting returning durable
//! URLs). Both are expressed as traits so the panel workflow can be
//! driven against HTTP implementations in production and in-memory
//! doubles in tests.

mod http;
mod memory;
pub mod object;

pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;
pub use object::{
    DeleteOutcome, HttpObjectStore, MemoryObjectStore, ObjectStore, ResourceKind, StoredObject,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure modes surfaced by both store collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Ordering was requested on a field the store cannot order by
    /// (e.g. missing index). Callers must fall back to an unordered
    /// fetch followed by a client-side sort.
    #[error("precondition failed: {message}")]
    PreconditionFailed { message: String },

    #[error("malformed store response: {message}")]
    Malformed { message: String },
}

/// A raw, undecoded document as the store returns it
///
/// `id` is an opaque string assigned by the store on create; it is
/// unique within a collection and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub fields: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

/// Sort direction for server-side ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

/// Server-side ordering request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    /// Newest-first ordering on the creation timestamp, the default
    /// every panel requests.
    pub fn newest_first() -> Self {
        Self {
            field: "created_at".to_string(),
            direction: Direction::Descending,
        }
    }
}

/// Contract for the external document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List all documents in a collection, optionally server-ordered.
    ///
    /// Fails with `PreconditionFailed` when ordering is requested on a
    /// field the store cannot order by.
    async fn list(
        &self,
        collection: &str,
        order: Option<OrderBy>,
    ) -> Result<Vec<RawDocument>, StoreError>;

    /// Create a document; the store assigns and returns the id.
    async fn create(
        &self,
        collection: &str,
        fields: serde_json::Value,
    ) -> Result<String, StoreError>;

    /// Partially update an existing document.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Delete a document by id.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Cheap reachability probe for readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
