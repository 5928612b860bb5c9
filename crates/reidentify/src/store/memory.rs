use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use super::{Collection, RequestStore, StoreError};
use crate::documents::{RequestId, ID_FIELD};

/// Process-local store used by tests, the demo command and `serve --in-memory`.
///
/// Documents keep insertion order within a collection.
#[derive(Default, Clone)]
pub struct InMemoryRequestStore {
    collections: Arc<Mutex<HashMap<Collection, Vec<Document>>>>,
}

impl InMemoryRequestStore {
    /// Append documents to a collection, assigning an `_id` where one is missing.
    pub fn seed(&self, collection: Collection, documents: Vec<Document>) -> Vec<RequestId> {
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let entries = guard.entry(collection).or_default();
        documents
            .into_iter()
            .map(|document| {
                let (id, document) = with_id(document);
                entries.push(document);
                id
            })
            .collect()
    }

    pub fn len(&self, collection: Collection) -> usize {
        let guard = self.collections.lock().expect("store mutex poisoned");
        guard.get(&collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    pub fn contains(&self, collection: Collection, id: &RequestId) -> bool {
        let guard = self.collections.lock().expect("store mutex poisoned");
        guard
            .get(&collection)
            .is_some_and(|documents| documents.iter().any(|doc| matches_id(doc, id)))
    }
}

fn with_id(mut document: Document) -> (RequestId, Document) {
    match RequestId::of(&document) {
        Some(id) => (id, document),
        None => {
            let id = RequestId::new();
            document.insert(ID_FIELD, id.0);
            (id, document)
        }
    }
}

fn matches_id(document: &Document, id: &RequestId) -> bool {
    RequestId::of(document).as_ref() == Some(id)
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &RequestId,
    ) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        Ok(guard
            .get(&collection)
            .and_then(|documents| documents.iter().find(|doc| matches_id(doc, id)))
            .cloned())
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        Ok(guard.get(&collection).cloned().unwrap_or_default())
    }

    async fn exists_with(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        Ok(guard.get(&collection).is_some_and(|documents| {
            documents
                .iter()
                .any(|doc| matches!(doc.get(field), Some(Bson::String(stored)) if stored == value))
        }))
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        let (id, document) = with_id(document);
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let entries = guard.entry(collection).or_default();
        if entries.iter().any(|doc| matches_id(doc, &id)) {
            return Err(StoreError::Conflict(format!(
                "duplicate key {id} in {} collection",
                collection.label()
            )));
        }
        entries.push(document);
        Ok(())
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &RequestId,
    ) -> Result<bool, StoreError> {
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let Some(entries) = guard.get_mut(&collection) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|doc| !matches_id(doc, id));
        Ok(entries.len() != before)
    }
}
