//! Store API Client
//!
//! HTTP client for the remote document store that mirrors the decision log.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants;
use crate::logic::decision::DecisionRecord;

// ============================================================================
// CONFIG
// ============================================================================

/// Remote store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub server_url: String,
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            server_url: constants::get_store_url(),
            timeout_seconds: 30,
        }
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreError: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RegisterDeviceRequest {
    pub device_id: Uuid,
    pub hostname: String,
    pub app_version: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceResponse {
    pub device_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SyncRecordsRequest<'a> {
    pub device_id: Uuid,
    pub records: &'a [DecisionRecord],
}

#[derive(Debug, Deserialize)]
pub struct SyncRecordsResponse {
    pub synced_count: usize,
    pub server_time: i64,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// CLIENT
// ============================================================================

/// Store API client
pub struct StoreClient {
    config: StoreConfig,
    device_id: Uuid,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();

        Self {
            config,
            device_id: Uuid::new_v4(),
            token: None,
            http_client,
        }
    }

    pub fn device_id(&self) -> Uuid {
        self.device_id
    }

    pub fn is_registered(&self) -> bool {
        self.token.is_some()
    }

    /// Check store availability
    pub async fn health_check(&self) -> Result<HealthResponse, StoreError> {
        let url = format!("{}/health", self.config.server_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError(format!("Health check failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StoreError(format!(
                "Health check returned {}",
                response.status()
            )));
        }

        response
            .json::<HealthResponse>()
            .await
            .map_err(|e| StoreError(format!("Invalid health response: {}", e)))
    }

    /// Register this device with the store
    pub async fn register(&mut self) -> Result<(), StoreError> {
        let url = format!("{}/v1/devices/register", self.config.server_url);
        let request = RegisterDeviceRequest {
            device_id: self.device_id,
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            app_version: constants::APP_VERSION.to_string(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError(format!("Registration failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StoreError(format!(
                "Registration returned {}",
                response.status()
            )));
        }

        let body = response
            .json::<RegisterDeviceResponse>()
            .await
            .map_err(|e| StoreError(format!("Invalid registration response: {}", e)))?;

        self.device_id = body.device_id;
        self.token = Some(body.token);
        log::info!("Registered with store as device {}", self.device_id);
        Ok(())
    }

    /// Push a batch of decision records
    pub async fn sync_records(
        &self,
        records: &[DecisionRecord],
    ) -> Result<SyncRecordsResponse, StoreError> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| StoreError("Not registered".to_string()))?;

        let url = format!("{}/v1/records", self.config.server_url);
        let request = SyncRecordsRequest {
            device_id: self.device_id,
            records,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError(format!("Record sync failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StoreError(format!(
                "Record sync returned {}",
                response.status()
            )));
        }

        response
            .json::<SyncRecordsResponse>()
            .await
            .map_err(|e| StoreError(format!("Invalid sync response: {}", e)))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_starts_unregistered() {
        let client = StoreClient::new(StoreConfig {
            server_url: "http://localhost:9".to_string(),
            timeout_seconds: 1,
        });
        assert!(!client.is_registered());
    }

    #[tokio::test]
    async fn test_sync_without_registration_is_an_error() {
        let client = StoreClient::new(StoreConfig {
            server_url: "http://localhost:9".to_string(),
            timeout_seconds: 1,
        });
        let err = client.sync_records(&[]).await.unwrap_err();
        assert!(err.to_string().contains("Not registered"));
    }
}
