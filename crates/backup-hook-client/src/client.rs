//! Backup hook HTTP client implementation.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use backup_hook_core::{sign, BackupRequest, BackupResponse, ErrorResponse, Secret, SIGNATURE_HEADER};

use crate::error::ClientError;

/// Backup hook API client.
///
/// Every request body is serialized once and signed over those exact bytes.
#[derive(Debug, Clone)]
pub struct BackupHookClient {
    client: Client,
    base_url: String,
    secret: Secret,
}

impl BackupHookClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://backup-host:47731"`)
    /// * `secret` - Shared callback secret
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, secret: Secret) -> Result<Self, ClientError> {
        Self::with_options(base_url, secret, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        secret: Secret,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret,
        })
    }

    /// Trigger a backup with the given script arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn trigger<I, S>(&self, args: I) -> Result<BackupResponse, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let body = serde_json::to_vec(&BackupRequest::new(args))?;
        self.send_signed(body).await
    }

    /// Sign and post a pre-serialized body.
    async fn send_signed(&self, body: Vec<u8>) -> Result<BackupResponse, ClientError> {
        let url = self.backup_url();
        let signature = sign(&body, &self.secret);

        tracing::debug!(url = %url, body_bytes = body.len(), "Sending signed backup request");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Hook endpoint under the base URL.
    fn backup_url(&self) -> String {
        format!("{}/backup", self.base_url)
    }

    /// Handle API response and convert errors.
    async fn handle_response(response: reqwest::Response) -> Result<BackupResponse, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // The service answers with {"error": "..."}; anything else is passed through as text
        let text = response.text().await?;
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                if text.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    text.trim().to_string()
                }
            });

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 3600, backups can be slow).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 60 * 60,
        }
    }
}
