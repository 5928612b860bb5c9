//! Review workflow for ID card requests: status transitions, listings and the faculty
//! allow-list lookup, plus the axum router exposing them.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{Listing, RequestStatus, TransitionOutcome, UnknownStatusPolicy};
pub use router::request_router;
pub use service::{RequestWorkflowService, WorkflowError, FACULTY_NUMBER_FIELD};
