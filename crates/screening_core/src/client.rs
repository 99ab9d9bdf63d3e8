//! Reputation API client
//!
//! One GET per address, no retries. The API key travels in the URL path, so
//! transport errors are stripped of their URL before they leave this module.

use crate::{record::ValidationRecord, ClientConfig, ValidationError};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

/// Something that can turn an email address into a validation record
#[async_trait]
pub trait EmailValidator: Send + Sync {
    async fn validate(&self, email: &str) -> Result<ValidationRecord, ValidationError>;
}

/// HTTP client for the reputation API
pub struct ValidationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ValidationClient {
    /// Build a client for the configured endpoint
    ///
    /// # Returns
    /// * `Ok(ValidationClient)` on success
    /// * `Err(ValidationError::Transport)` if the HTTP client cannot be initialised
    pub fn new(config: ClientConfig) -> Result<Self, ValidationError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ValidationError::Transport(e.to_string()))?;

        let endpoint = format!(
            "{}/{}/",
            config.api_base_url.trim_end_matches('/'),
            config.api_key
        );

        Ok(Self { http, endpoint })
    }

    /// Look up one address
    #[instrument(skip(self))]
    pub async fn fetch(&self, email: &str) -> Result<ValidationRecord, ValidationError> {
        debug!("Requesting validation");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Request error occurred: {}", e);
                ValidationError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("HTTP error occurred: {}", status);
            return Err(ValidationError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to read response body: {}", e);
            ValidationError::Transport(e.to_string())
        })?;

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            error!("Invalid JSON response: {}", e);
            ValidationError::Parse(e.to_string())
        })?;

        let record = ValidationRecord::from_value(value).ok_or_else(|| {
            error!("Invalid JSON response: expected an object, got {}", body);
            ValidationError::Parse("expected a JSON object".to_string())
        })?;

        info!("API response: {}", body);

        if let Some(message) = record.api_rejection() {
            warn!("Validation service reported failure: {}", message);
        }

        Ok(record)
    }
}

#[async_trait]
impl EmailValidator for ValidationClient {
    async fn validate(&self, email: &str) -> Result<ValidationRecord, ValidationError> {
        self.fetch(email).await
    }
}
