//! Review workflow for student ID card requests.
//!
//! Pending requests are approved into the print queue or rejected into the rejected
//! collection. The crate exposes the store abstraction, the workflow service and an axum
//! router; the `reidentify-api` binary wires them to MongoDB and serves them over HTTP.

pub mod config;
pub mod documents;
pub mod error;
pub mod requests;
pub mod store;
pub mod telemetry;
