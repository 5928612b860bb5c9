use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use mongodb::bson::Document;
use serde_json::Value;

use crate::documents::{doc, RequestId};
use crate::requests::{request_router, RequestWorkflowService, UnknownStatusPolicy};
use crate::store::{Collection, InMemoryRequestStore, RequestStore, StoreError};

pub(super) fn pending_request(name: &str) -> Document {
    doc! {
        "name": name,
        "registerNumber": "312220104001",
        "department": "CSE",
        "reason": "Lost card",
        "year": 3_i32,
    }
}

pub(super) fn faculty_numbers() -> Vec<Document> {
    vec![
        doc! { "facNumber": "FAC1001" },
        doc! { "facNumber": "FAC2042" },
    ]
}

/// In-memory store seeded with two pending requests and the faculty allow-list.
pub(super) fn seeded_store() -> (InMemoryRequestStore, Vec<RequestId>) {
    let store = InMemoryRequestStore::default();
    let ids = store.seed(
        Collection::Pending,
        vec![pending_request("Divya"), pending_request("Rahul")],
    );
    store.seed(Collection::Faculty, faculty_numbers());
    store.seed(
        Collection::ApprovedHistory,
        vec![doc! { "name": "Older", "decision": "approved" }],
    );
    (store, ids)
}

pub(super) fn build_service(
    policy: UnknownStatusPolicy,
) -> (
    RequestWorkflowService<InMemoryRequestStore>,
    InMemoryRequestStore,
    Vec<RequestId>,
) {
    let (store, ids) = seeded_store();
    let service = RequestWorkflowService::new(Arc::new(store.clone()), policy);
    (service, store, ids)
}

pub(super) fn router_with_service<S>(service: RequestWorkflowService<S>) -> axum::Router
where
    S: RequestStore + 'static,
{
    request_router(Arc::new(service))
}

/// Every operation fails as if the database were unreachable.
pub(super) struct UnavailableStore;

fn offline() -> StoreError {
    StoreError::Unavailable("database offline".to_string())
}

#[async_trait]
impl RequestStore for UnavailableStore {
    async fn find_by_id(
        &self,
        _collection: Collection,
        _id: &RequestId,
    ) -> Result<Option<Document>, StoreError> {
        Err(offline())
    }

    async fn find_all(&self, _collection: Collection) -> Result<Vec<Document>, StoreError> {
        Err(offline())
    }

    async fn exists_with(
        &self,
        _collection: Collection,
        _field: &str,
        _value: &str,
    ) -> Result<bool, StoreError> {
        Err(offline())
    }

    async fn insert(&self, _collection: Collection, _document: Document) -> Result<(), StoreError> {
        Err(offline())
    }

    async fn delete_by_id(
        &self,
        _collection: Collection,
        _id: &RequestId,
    ) -> Result<bool, StoreError> {
        Err(offline())
    }
}

/// Reads succeed against the wrapped store; every write fails.
pub(super) struct ReadOnlyStore(pub(super) InMemoryRequestStore);

#[async_trait]
impl RequestStore for ReadOnlyStore {
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &RequestId,
    ) -> Result<Option<Document>, StoreError> {
        self.0.find_by_id(collection, id).await
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        self.0.find_all(collection).await
    }

    async fn exists_with(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.0.exists_with(collection, field, value).await
    }

    async fn insert(&self, _collection: Collection, _document: Document) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    async fn delete_by_id(
        &self,
        _collection: Collection,
        _id: &RequestId,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }
}

/// Answers lookups from `snapshot` and everything else from `live`, like a reader that
/// fetched a record just before another writer moved it.
pub(super) struct StaleLookupStore {
    pub(super) snapshot: InMemoryRequestStore,
    pub(super) live: InMemoryRequestStore,
}

#[async_trait]
impl RequestStore for StaleLookupStore {
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &RequestId,
    ) -> Result<Option<Document>, StoreError> {
        self.snapshot.find_by_id(collection, id).await
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        self.live.find_all(collection).await
    }

    async fn exists_with(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.live.exists_with(collection, field, value).await
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        self.live.insert(collection, document).await
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &RequestId,
    ) -> Result<bool, StoreError> {
        self.live.delete_by_id(collection, id).await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
