//! Persistence gateway over a document database.
//!
//! Everything above this module talks to storage through [`DocumentStore`],
//! which works on raw BSON documents addressed by collection name. Two
//! implementations exist: [`MongoStore`] for a real deployment and
//! [`MemoryStore`] for development and tests.

pub mod memory;
pub mod mongo;

use std::fmt;

use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use serde::{de::DeserializeOwned, Serialize};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// A window over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: i64,
}

/// Outcome of a single-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[derive(Debug)]
pub enum StoreError {
    /// The database could not be reached or the client could not be built.
    Connection(String),
    /// The server did not acknowledge a write.
    Unacknowledged,
    /// A unique index rejected the write.
    DuplicateKey(String),
    /// The filter uses an operator this store cannot evaluate.
    UnsupportedQuery(String),
    /// A document could not be converted to or from its typed form.
    Codec(String),
    /// Any other driver failure.
    Database(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "Connection failed: {}", msg),
            StoreError::Unacknowledged => write!(f, "Write operation was not acknowledged"),
            StoreError::DuplicateKey(msg) => write!(f, "Duplicate key: {}", msg),
            StoreError::UnsupportedQuery(op) => write!(f, "Unsupported query operator: {}", op),
            StoreError::Codec(msg) => write!(f, "Document codec error: {}", msg),
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<bson::ser::Error> for StoreError {
    fn from(error: bson::ser::Error) -> Self {
        StoreError::Codec(error.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(error: bson::de::Error) -> Self {
        StoreError::Codec(error.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Single-document operations against named collections.
///
/// Filters are plain documents: field equality plus
/// `{"$text": {"$search": "..."}}` for full-text matching.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts `doc` and returns the identifier assigned to it.
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<ObjectId>;

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        page: Option<Page>,
    ) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>>;

    /// Replaces the first match, keeping its `_id`, and returns the new document.
    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> StoreResult<Option<Document>>;

    /// Sets `fields` on the first match and returns the updated document.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> StoreResult<Option<Document>>;

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<DeleteOutcome>;

    async fn count_documents(&self, collection: &str, filter: Document) -> StoreResult<u64>;
}

pub fn encode<T: Serialize>(value: &T) -> StoreResult<Document> {
    Ok(bson::to_document(value)?)
}

pub fn decode<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    Ok(bson::from_document(doc)?)
}

pub fn by_id(id: ObjectId) -> Document {
    bson::doc! { "_id": id }
}
