use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, ClientSession};
use tracing::{info, warn};

use super::{relocate_with_compensation, Collection, CollectionNames, RequestStore, StoreError};
use crate::config::StoreConfig;
use crate::documents::{RequestId, ID_FIELD};

/// MongoDB-backed store. The client pools connections internally, so one instance is
/// shared by every request.
#[derive(Clone)]
pub struct MongoRequestStore {
    client: Client,
    database: String,
    print_database: String,
    names: CollectionNames,
    transactional: bool,
}

impl MongoRequestStore {
    /// Parse the connection string and build the client. No round trip happens here; the
    /// driver connects lazily on first use.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.uri).await?;
        info!(
            database = %config.database,
            print_database = %config.print_database,
            transactional = config.transactional,
            "mongodb client initialized"
        );

        Ok(Self {
            client,
            database: config.database.clone(),
            print_database: config.print_database.clone(),
            names: config.collections.clone(),
            transactional: config.transactional,
        })
    }

    /// Round trip to the deployment.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        let database = match collection {
            Collection::Approved => &self.print_database,
            _ => &self.database,
        };
        self.client
            .database(database)
            .collection(self.names.name(collection))
    }

    async fn relocate_in_transaction(
        &self,
        session: &mut ClientSession,
        source: Collection,
        destination: Option<Collection>,
        id: &RequestId,
        document: Document,
    ) -> Result<(), StoreError> {
        if let Some(destination) = destination {
            self.collection(destination)
                .insert_one(document)
                .session(&mut *session)
                .await?;
        }
        let removed = self
            .collection(source)
            .delete_one(doc! { ID_FIELD: id.0 })
            .session(&mut *session)
            .await?;
        if removed.deleted_count == 0 {
            return Err(StoreError::Conflict(format!(
                "request {id} already left the {} collection",
                source.label()
            )));
        }
        session.commit_transaction().await?;
        Ok(())
    }
}

#[async_trait]
impl RequestStore for MongoRequestStore {
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &RequestId,
    ) -> Result<Option<Document>, StoreError> {
        let found = self
            .collection(collection)
            .find_one(doc! { ID_FIELD: id.0 })
            .await?;
        Ok(found)
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        let documents = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn exists_with(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let found = self
            .collection(collection)
            .find_one(doc! { field: value })
            .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), StoreError> {
        self.collection(collection).insert_one(document).await?;
        Ok(())
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &RequestId,
    ) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { ID_FIELD: id.0 })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn relocate(
        &self,
        source: Collection,
        destination: Option<Collection>,
        id: &RequestId,
        document: Document,
    ) -> Result<(), StoreError> {
        if !self.transactional {
            return relocate_with_compensation(self, source, destination, id, document).await;
        }

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let outcome = self
            .relocate_in_transaction(&mut session, source, destination, id, document)
            .await;
        if outcome.is_err() {
            if let Err(abort) = session.abort_transaction().await {
                warn!(%id, error = %abort, "failed to abort relocation transaction");
            }
        }
        outcome
    }
}
