//! Storage abstraction over the request collections.
//!
//! The workflow service only talks to [`RequestStore`], so the HTTP layer can be exercised
//! against [`InMemoryRequestStore`] while production wires in [`MongoRequestStore`].

mod memory;
mod mongo;

use async_trait::async_trait;
use mongodb::bson::Document;
use tracing::{error, warn};

use crate::documents::RequestId;

pub use memory::InMemoryRequestStore;
pub use mongo::MongoRequestStore;

/// Collections the service reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Pending,
    Approved,
    Rejected,
    ApprovedHistory,
    RejectedHistory,
    Faculty,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Pending,
        Collection::Approved,
        Collection::Rejected,
        Collection::ApprovedHistory,
        Collection::RejectedHistory,
        Collection::Faculty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Collection::Pending => "pending",
            Collection::Approved => "approved",
            Collection::Rejected => "rejected",
            Collection::ApprovedHistory => "approved history",
            Collection::RejectedHistory => "rejected history",
            Collection::Faculty => "faculty",
        }
    }
}

/// Physical collection names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub pending: String,
    pub approved: String,
    pub rejected: String,
    pub approved_history: String,
    pub rejected_history: String,
    pub faculty: String,
}

impl CollectionNames {
    pub fn name(&self, collection: Collection) -> &str {
        match collection {
            Collection::Pending => &self.pending,
            Collection::Approved => &self.approved,
            Collection::Rejected => &self.rejected,
            Collection::ApprovedHistory => &self.approved_history,
            Collection::RejectedHistory => &self.rejected_history,
            Collection::Faculty => &self.faculty,
        }
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            pending: "idcards".to_string(),
            approved: "printids".to_string(),
            rejected: "rejectedidcards".to_string(),
            approved_history: "acchistoryid".to_string(),
            rejected_history: "rejhistoryids".to_string(),
            faculty: "facultynumbers".to_string(),
        }
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[from] mongodb::error::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The write lost a race: the key already exists or the source record is gone.
    #[error("store conflict: {0}")]
    Conflict(String),
}

/// Document store holding the request collections.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &RequestId,
    ) -> Result<Option<Document>, StoreError>;

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// Exact match of a string field against `value`.
    async fn exists_with(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError>;

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    async fn delete_by_id(&self, collection: Collection, id: &RequestId)
        -> Result<bool, StoreError>;

    /// Copy `document` into `destination` (when given) and remove it from `source`.
    async fn relocate(
        &self,
        source: Collection,
        destination: Option<Collection>,
        id: &RequestId,
        document: Document,
    ) -> Result<(), StoreError> {
        relocate_with_compensation(self, source, destination, id, document).await
    }
}

/// Copy-then-delete without a transaction. If the delete fails, or finds nothing to remove
/// because another writer got there first, the copy is removed again so the record never
/// sits in two collections.
pub async fn relocate_with_compensation<S>(
    store: &S,
    source: Collection,
    destination: Option<Collection>,
    id: &RequestId,
    document: Document,
) -> Result<(), StoreError>
where
    S: RequestStore + ?Sized,
{
    if let Some(destination) = destination {
        store.insert(destination, document).await?;
    }

    let err = match store.delete_by_id(source, id).await {
        Ok(true) => return Ok(()),
        Ok(false) => StoreError::Conflict(format!(
            "request {id} already left the {} collection",
            source.label()
        )),
        Err(err) => err,
    };

    if let Some(destination) = destination {
        match store.delete_by_id(destination, id).await {
            Ok(_) => warn!(
                %id,
                destination = destination.label(),
                "rolled back copy after failed delete"
            ),
            Err(rollback) => error!(
                %id,
                destination = destination.label(),
                error = %rollback,
                "rollback failed; record now present in two collections"
            ),
        }
    }

    Err(err)
}
