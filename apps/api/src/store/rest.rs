use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{LeadStore, StoreError};
use crate::models::lead::{Lead, LeadId, LeadPatch, NewLead};

const LEADS_RESOURCE: &str = "leads";

/// PostgREST-style client for the `leads` resource. Authenticates with the project API
/// key in both the `apikey` and bearer headers.
#[derive(Clone)]
pub struct RestLeadStore {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct InsertedRow {
    id: LeadId,
}

impl RestLeadStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn leads_url(&self) -> String {
        format!("{}/{LEADS_RESOURCE}", self.base_url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!("Record store returned {status}: {message}");
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Stores answer row queries with either a JSON array or a single object. Returns the
/// first row, or `None` for an empty array.
fn first_row<T: DeserializeOwned>(body: Value) -> Result<Option<T>, StoreError> {
    let row = match body {
        Value::Array(rows) => rows.into_iter().next(),
        Value::Null => None,
        object @ Value::Object(_) => Some(object),
        other => {
            return Err(StoreError::Decode(format!(
                "expected a row or an array of rows, got {other}"
            )))
        }
    };
    row.map(serde_json::from_value)
        .transpose()
        .map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl LeadStore for RestLeadStore {
    async fn create(&self, lead: &NewLead) -> Result<LeadId, StoreError> {
        debug!("Creating lead for {}", lead.phone);
        let response = self
            .authed(self.client.post(self.leads_url()))
            .header("Prefer", "return=representation")
            .json(lead)
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        let row: InsertedRow = first_row(body)?
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))?;
        debug!("Lead {} created", row.id);
        Ok(row.id)
    }

    async fn update(&self, id: &LeadId, patch: &LeadPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            debug!("Skipping empty update for lead {id}");
            return Ok(());
        }
        debug!("Updating lead {id}");
        let response = self
            .authed(self.client.patch(self.leads_url()))
            .query(&[("id", format!("eq.{id}"))])
            .json(patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
        debug!("Fetching lead {id}");
        let response = self
            .authed(self.client.get(self.leads_url()))
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;
        first_row(body)
    }
}
