use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::filter::{FilterSet, QueryPlan, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD, VERSION_FIELD};
use crate::types::Collection;

/// A stored document: a JSON object carrying `_id`, `__v`, `createdAt` and `updatedAt`
pub type Document = Map<String, Value>;

/// Errors from the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Duplicate value for unique field '{field}' in {collection}")]
    Duplicate { collection: Collection, field: String },

    #[error("Stored document is malformed: {0}")]
    Malformed(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Schema-on-write document collections.
///
/// Implementations assign `_id`, `__v` and timestamps on insert and refresh
/// `updatedAt` on update; everything else is the caller's document verbatim.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Filtered, sorted, projected and paged listing
    async fn find(&self, collection: Collection, plan: &QueryPlan) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: Collection, filter: &FilterSet) -> StoreResult<Option<Document>>;

    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Documents for the given ids, in no particular order; unknown ids are skipped
    async fn find_by_ids(&self, collection: Collection, ids: &[String]) -> StoreResult<Vec<Document>>;

    async fn exists(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        Ok(self.find_by_id(collection, id).await?.is_some())
    }

    async fn count(&self, collection: Collection, filter: &FilterSet) -> StoreResult<u64>;

    async fn insert(&self, collection: Collection, document: Document) -> StoreResult<Document>;

    /// Merge `changes` into the stored document; `None` when the id is unknown
    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> StoreResult<Option<Document>>;

    /// Remove and return the document; `None` when the id is unknown
    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    async fn health_check(&self) -> StoreResult<()>;
}

/// Timestamp format used for `createdAt`/`updatedAt`. Fixed width, so lexical
/// order is chronological.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stamp a fresh document with its identity, version and timestamps
pub fn prepare_insert(mut document: Document) -> (String, Document) {
    let id = Uuid::new_v4().to_string();
    let now = timestamp_now();
    document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    document.insert(VERSION_FIELD.to_string(), Value::from(0));
    document
        .entry(CREATED_AT_FIELD.to_string())
        .or_insert_with(|| Value::String(now.clone()));
    document.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));
    (id, document)
}

/// Merge changes into an existing document. Identity, version and creation
/// time cannot be overwritten.
pub fn apply_update(existing: &mut Document, changes: Document) {
    for (key, value) in changes {
        if key == ID_FIELD || key == VERSION_FIELD || key == CREATED_AT_FIELD {
            continue;
        }
        existing.insert(key, value);
    }
    existing.insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp_now()));
}
