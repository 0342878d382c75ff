//! Record Store Client — lead create/update/fetch against the hosted REST database.
//!
//! The store owns every lead; nothing is cached here. Non-success responses surface as
//! `StoreError::Api` with the status and body, and nothing is retried.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::lead::{Lead, LeadId, LeadPatch, NewLead};

pub mod rest;

pub use rest::RestLeadStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Record store error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected record store response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Inserts a lead and returns the identifier the store assigned.
    async fn create(&self, lead: &NewLead) -> Result<LeadId, StoreError>;

    /// Applies a partial overwrite; fields absent from `patch` are left untouched.
    async fn update(&self, id: &LeadId, patch: &LeadPatch) -> Result<(), StoreError>;

    /// Returns `None` when no lead has this identifier.
    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, StoreError>;
}
