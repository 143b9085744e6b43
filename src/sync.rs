use crate::errors::AppError;
use crate::mapper;
use crate::store::{PersonField, PersonStore};
use chrono::Utc;
use reqwest;
use std::sync::Arc;
use std::time::Duration;
use tracing;
use uuid::Uuid;

/// How a callout concluded when it did not fail outright.
///
/// `RemoteRejected` is the recoverable no-op from the error taxonomy: the
/// external system answered with an unexpected status, nothing was mutated
/// on either side, and the condition is logged rather than escalated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The flow completed and the store reflects it.
    Applied,
    /// The external system answered outside the accepted status range.
    RemoteRejected {
        /// HTTP status code received.
        status: u16,
    },
}

/// Connector orchestrating the two directional sync flows against the
/// external user-profile API.
#[derive(Clone)]
pub struct SyncConnector {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    store: Arc<dyn PersonStore>,
}

impl SyncConnector {
    /// Creates a new `SyncConnector`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the external user-profile API.
    /// * `token` - Optional bearer token for authentication.
    /// * `store` - The record store both flows read and write.
    pub fn new(
        base_url: String,
        token: Option<String>,
        store: Arc<dyn PersonStore>,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create profile client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            token,
            store,
        })
    }

    /// Pulls the external profile for `external_id` and upserts it locally.
    ///
    /// Issues a single GET to `{base}/users/{external_id}`. On 200 the body
    /// is mapped and upserted, matched by external id, so repeating the
    /// pull with an unchanged payload leaves the store state identical. On
    /// any other status the store is untouched and the status is logged.
    pub async fn pull_and_upsert(&self, external_id: &str) -> Result<SyncOutcome, AppError> {
        let url = format!("{}/users/{}", self.base_url, external_id);
        tracing::info!("Pulling profile {} from {}", external_id, url);

        let mut request = self.client.get(&url);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            AppError::TransportFailure(format!("Profile request failed: {}", e))
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                "Profile API returned {} for user {}: {}",
                status,
                external_id,
                body
            );
            return Ok(SyncOutcome::RemoteRejected {
                status: status.as_u16(),
            });
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            AppError::MalformedPayload(format!("Profile response is not valid JSON: {}", e))
        })?;

        let person = mapper::person_from_profile(&payload)?;
        let id = self.store.upsert_by_external_id(&person).await?;
        tracing::info!("Upserted person {} for external id {}", id, external_id);

        Ok(SyncOutcome::Applied)
    }

    /// Pushes the record identified by `id` to the external system and, on
    /// a 2xx response, stamps `last_synced_at`.
    ///
    /// Issues a single POST to `{base}/users/add`. The response body is
    /// ignored; success touches nothing beyond the timestamp. Any non-2xx
    /// status leaves the record unchanged.
    pub async fn push_and_stamp(&self, id: Uuid) -> Result<SyncOutcome, AppError> {
        let person = self.store.get_by_id(id).await?;
        let payload = mapper::outbound_user(&person);

        let url = format!("{}/users/add", self.base_url);
        tracing::info!("Pushing person {} to {}", id, url);

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            AppError::TransportFailure(format!("User creation request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                "Profile API rejected push of person {} with {}: {}",
                id,
                status,
                body
            );
            return Ok(SyncOutcome::RemoteRejected {
                status: status.as_u16(),
            });
        }

        self.store
            .update_field(id, PersonField::LastSyncedAt(Utc::now()))
            .await?;
        tracing::info!("Stamped last_synced_at for person {}", id);

        Ok(SyncOutcome::Applied)
    }
}
