use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::domain::Listing;
use super::service::{RequestWorkflowService, WorkflowError};
use crate::documents;
use crate::store::RequestStore;

/// Body of `PATCH /api/requests/:id/status`. A missing status counts as unrecognized.
#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

impl StatusUpdate {
    /// Lenient decoding: an empty, non-JSON or mistyped body reads as a missing status,
    /// regardless of the declared content type.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Router builder exposing the review, listing and faculty endpoints.
pub fn request_router<S>(service: Arc<RequestWorkflowService<S>>) -> Router
where
    S: RequestStore + 'static,
{
    Router::new()
        .route("/api/requests/:id/status", patch(update_status_handler::<S>))
        .route("/api/pending", get(pending_handler::<S>))
        .route("/api/approved", get(approved_handler::<S>))
        .route("/api/rejected", get(rejected_handler::<S>))
        .route("/api/acchistoryid", get(approved_history_handler::<S>))
        .route("/api/rejhistoryids", get(rejected_history_handler::<S>))
        .route("/api/check-faculty/:id", get(check_faculty_handler::<S>))
        .with_state(service)
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

fn internal_error(context: &str, err: &WorkflowError) -> Response {
    error!(error = %err, "{context}");
    message(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

pub(crate) async fn update_status_handler<S>(
    State(service): State<Arc<RequestWorkflowService<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response
where
    S: RequestStore + 'static,
{
    let update = StatusUpdate::from_body(&body);
    match service.update_status(&id, &update.status).await {
        Ok(_) => message(
            StatusCode::OK,
            format!("Request {} successfully", update.status),
        ),
        Err(WorkflowError::NotFound(_)) => message(StatusCode::NOT_FOUND, "Request not found"),
        Err(WorkflowError::UnsupportedStatus(status)) => message(
            StatusCode::BAD_REQUEST,
            format!("Unsupported status '{status}'"),
        ),
        Err(err) => internal_error("error updating request", &err),
    }
}

async fn list_collection<S>(service: &RequestWorkflowService<S>, listing: Listing) -> Response
where
    S: RequestStore + 'static,
{
    match service.list(listing).await {
        Ok(found) => {
            let payload: Vec<Value> = found.into_iter().map(documents::to_json).collect();
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => internal_error(
            &format!("error fetching {} records", listing.collection().label()),
            &err,
        ),
    }
}

pub(crate) async fn pending_handler<S>(
    State(service): State<Arc<RequestWorkflowService<S>>>,
) -> Response
where
    S: RequestStore + 'static,
{
    list_collection(&service, Listing::Pending).await
}

pub(crate) async fn approved_handler<S>(
    State(service): State<Arc<RequestWorkflowService<S>>>,
) -> Response
where
    S: RequestStore + 'static,
{
    list_collection(&service, Listing::Approved).await
}

pub(crate) async fn rejected_handler<S>(
    State(service): State<Arc<RequestWorkflowService<S>>>,
) -> Response
where
    S: RequestStore + 'static,
{
    list_collection(&service, Listing::Rejected).await
}

pub(crate) async fn approved_history_handler<S>(
    State(service): State<Arc<RequestWorkflowService<S>>>,
) -> Response
where
    S: RequestStore + 'static,
{
    list_collection(&service, Listing::ApprovedHistory).await
}

pub(crate) async fn rejected_history_handler<S>(
    State(service): State<Arc<RequestWorkflowService<S>>>,
) -> Response
where
    S: RequestStore + 'static,
{
    list_collection(&service, Listing::RejectedHistory).await
}

pub(crate) async fn check_faculty_handler<S>(
    State(service): State<Arc<RequestWorkflowService<S>>>,
    Path(faculty_number): Path<String>,
) -> Response
where
    S: RequestStore + 'static,
{
    match service.check_faculty(&faculty_number).await {
        Ok(valid) => (StatusCode::OK, Json(json!({ "valid": valid }))).into_response(),
        Err(err) => internal_error("error checking faculty id", &err),
    }
}
