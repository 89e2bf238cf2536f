//! deckhand-api: REST API server for deckhand
//!
//! This crate provides the REST API for interacting with deckhand:
//! - Model endpoint deployment, update and undeployment
//! - Prediction job creation, inspection and stopping
//! - Submission outcome counters

pub mod rest;

pub use rest::{create_router, AppState};
