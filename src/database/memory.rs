//! In-memory document store for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::store::{apply_update, prepare_insert, Document, DocumentStore, StoreError, StoreResult};
use crate::filter::{FilterOrder, FilterSet, FilterWhere, QueryPlan};
use crate::types::Collection;

/// Collections kept in insertion order; reads scan linearly.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        collection: Collection,
        documents: &[Document],
        candidate: &Document,
        skip_id: Option<&str>,
    ) -> StoreResult<()> {
        for field in collection.unique_fields() {
            let Some(value) = candidate.get(*field).and_then(Value::as_str) else {
                continue;
            };
            let taken = documents.iter().any(|doc| {
                skip_id.map_or(true, |id| doc_id(doc) != Some(id))
                    && doc
                        .get(*field)
                        .and_then(Value::as_str)
                        .map_or(false, |existing| existing.eq_ignore_ascii_case(value))
            });
            if taken {
                return Err(StoreError::Duplicate {
                    collection,
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn doc_id(doc: &Document) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: Collection, plan: &QueryPlan) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut matched: Vec<&Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| FilterWhere::matches(&plan.filter, d)).collect())
            .unwrap_or_default();

        // stable sort keeps insertion order among ties
        matched.sort_by(|a, b| FilterOrder::compare(&plan.sort, a, b));

        let skip = usize::try_from(plan.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(plan.limit).unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| {
                let mut doc = doc.clone();
                plan.projection.apply(&mut doc);
                doc
            })
            .collect())
    }

    async fn find_one(&self, collection: Collection, filter: &FilterSet) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| FilterWhere::matches(filter, d)))
            .cloned())
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id)))
            .cloned())
    }

    async fn find_by_ids(&self, collection: Collection, ids: &[String]) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| doc_id(d).map_or(false, |id| ids.iter().any(|want| want == id)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: Collection, filter: &FilterSet) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| FilterWhere::matches(filter, d)).count() as u64)
            .unwrap_or(0))
    }

    async fn insert(&self, collection: Collection, document: Document) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        Self::check_unique(collection, docs, &document, None)?;
        let (_, document) = prepare_insert(document);
        docs.push(document.clone());
        Ok(document)
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        Self::check_unique(collection, docs, &changes, Some(id))?;
        Ok(docs.iter_mut().find(|d| doc_id(d) == Some(id)).map(|doc| {
            apply_update(doc, changes);
            doc.clone()
        }))
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| doc_id(d) == Some(id))
            .map(|index| docs.remove(index)))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
