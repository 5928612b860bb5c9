use std::sync::Arc;

use mongodb::bson::Document;
use tracing::{info, warn};

use super::domain::{Listing, RequestStatus, TransitionOutcome, UnknownStatusPolicy};
use crate::documents::RequestId;
use crate::store::{Collection, RequestStore, StoreError};

/// Field of the faculty allow-list holding the faculty number.
pub const FACULTY_NUMBER_FIELD: &str = "facNumber";

/// Service moving requests between the pending, approved and rejected collections.
pub struct RequestWorkflowService<S> {
    store: Arc<S>,
    unknown_status: UnknownStatusPolicy,
}

impl<S> RequestWorkflowService<S>
where
    S: RequestStore + 'static,
{
    pub fn new(store: Arc<S>, unknown_status: UnknownStatusPolicy) -> Self {
        Self {
            store,
            unknown_status,
        }
    }

    /// Apply a review decision to a pending request.
    ///
    /// The record is copied with all of its fields into the collection matching `status`
    /// and then removed from pending. Statuses other than `approved`/`rejected` follow the
    /// configured [`UnknownStatusPolicy`]. A request decided concurrently by someone else
    /// reports [`WorkflowError::NotFound`].
    pub async fn update_status(
        &self,
        raw_id: &str,
        status: &str,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let not_found = || WorkflowError::NotFound(raw_id.to_string());
        let id = RequestId::parse(raw_id).ok_or_else(not_found)?;
        let document = self
            .store
            .find_by_id(Collection::Pending, &id)
            .await?
            .ok_or_else(not_found)?;

        let status = RequestStatus::parse(status);
        let destination = status.destination();
        if destination.is_none() && self.unknown_status == UnknownStatusPolicy::Reject {
            return Err(WorkflowError::UnsupportedStatus(status.as_str().to_string()));
        }

        self.store
            .relocate(Collection::Pending, destination, &id, document)
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => not_found(),
                other => WorkflowError::Store(other),
            })?;

        match destination {
            Some(destination) => {
                info!(
                    %id,
                    status = status.as_str(),
                    "request moved to {} collection",
                    destination.label()
                );
                Ok(TransitionOutcome::Moved { destination })
            }
            None => {
                warn!(
                    %id,
                    status = status.as_str(),
                    "unrecognized status; pending request discarded"
                );
                Ok(TransitionOutcome::Discarded)
            }
        }
    }

    /// Every document of one of the listable collections.
    pub async fn list(&self, listing: Listing) -> Result<Vec<Document>, WorkflowError> {
        let documents = self.store.find_all(listing.collection()).await?;
        Ok(documents)
    }

    /// Whether `faculty_number` is on the allow-list. Exact match only.
    pub async fn check_faculty(&self, faculty_number: &str) -> Result<bool, WorkflowError> {
        let exists = self
            .store
            .exists_with(Collection::Faculty, FACULTY_NUMBER_FIELD, faculty_number)
            .await?;
        Ok(exists)
    }
}

/// Error raised by the workflow service.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("request {0} not found")]
    NotFound(String),
    #[error("unsupported status '{0}'")]
    UnsupportedStatus(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
