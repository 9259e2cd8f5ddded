//! Document store layer
//!
//! `ToyStore` is the single seam between HTTP handlers and the database.
//! Each handler makes exactly one call through it.
//!
//! Backends:
//! - `mongo`: the MongoDB collection the service runs against
//! - `memory`: an in-process collection with the same query semantics

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use serde::Serialize;

use crate::models::serialize_bson;

pub use memory::MemoryToyStore;
pub use mongo::MongoToyStore;

/// Name of the secondary index on `name`.
pub const NAME_INDEX: &str = "name";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("invalid name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("skip value must be non-negative, but received: {0}")]
    NegativeSkip(i64),

    #[error("performing an update on the path '_id' would modify the immutable field '_id'")]
    ImmutableId,

    #[error("cannot set field path '{0}'")]
    InvalidPath(String),

    #[error("duplicate key error: _id {0}")]
    DuplicateId(Bson),
}

/// Which toys a query selects.
#[derive(Debug, Clone, PartialEq)]
pub enum ToyFilter {
    /// Every toy in the collection
    All,
    /// Exact `subcategory` equality
    Subcategory(String),
    /// Exact `sellerEmail` equality. `None` selects toys whose
    /// `sellerEmail` is null or absent.
    SellerEmail(Option<String>),
    /// `name` matches the pattern case-insensitively. The pattern is used
    /// as given: regex metacharacters are live.
    NameMatches(String),
}

impl ToyFilter {
    /// Filter document sent to MongoDB.
    pub fn to_document(&self) -> Document {
        match self {
            Self::All => Document::new(),
            Self::Subcategory(text) => doc! { "subcategory": text },
            Self::SellerEmail(Some(email)) => doc! { "sellerEmail": email },
            Self::SellerEmail(None) => doc! { "sellerEmail": Bson::Null },
            Self::NameMatches(pattern) => doc! {
                "name": { "$regex": pattern, "$options": "i" }
            },
        }
    }
}

/// A find over the toy collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ToyQuery {
    pub filter: ToyFilter,
    /// Sort by `createdAt` descending
    pub newest_first: bool,
    /// Documents to skip. Negative values are passed through to the store.
    pub skip: i64,
    pub limit: Option<i64>,
}

impl ToyQuery {
    pub fn new(filter: ToyFilter) -> Self {
        Self {
            filter,
            newest_first: false,
            skip: 0,
            limit: None,
        }
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Acknowledgment of `insertOne`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    #[serde(serialize_with = "serialize_bson")]
    pub inserted_id: Bson,
}

/// Acknowledgment of `updateOne`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    #[serde(serialize_with = "serialize_bson")]
    pub upserted_id: Bson,
}

/// Acknowledgment of `deleteOne`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Operations the toy API performs against its collection.
#[async_trait]
pub trait ToyStore: Send + Sync {
    /// Create the `name` index if missing. Returns the index name.
    async fn ensure_name_index(&self) -> StoreResult<String>;

    /// Liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    async fn find(&self, query: ToyQuery) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>>;

    async fn insert_one(&self, toy: Document) -> StoreResult<InsertAck>;

    /// `$set` the given fields on the toy with this id.
    async fn update_one(&self, id: ObjectId, fields: Document) -> StoreResult<UpdateAck>;

    async fn delete_one(&self, id: ObjectId) -> StoreResult<DeleteAck>;

    /// Collection size from metadata. Not transactionally exact.
    async fn estimated_count(&self) -> StoreResult<u64>;
}
