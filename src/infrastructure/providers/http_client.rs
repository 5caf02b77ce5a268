//! # HTTP Client Utilities
//!
//! Shared HTTP client wrapper for provider implementations.
//!
//! Provides GET requests with JSON deserialization and maps transport and
//! status failures onto the provider error taxonomy, so individual clients
//! only deal with their own payload shapes.

use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client wrapper bound to one provider.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client.
    client: Client,
    /// Provider name used in error context.
    provider: &'static str,
    /// Request timeout in milliseconds.
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the underlying client
    /// cannot be built.
    pub fn new(provider: &'static str, timeout_ms: u64) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| {
                ProviderError::configuration(
                    provider,
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            provider,
            timeout_ms,
        })
    }

    /// Returns the configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Makes a GET request and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// `ProviderError::Timeout`/`Connection` on transport failure,
    /// `ProviderError::InvalidResponse` on a non-success status or an
    /// unparseable body.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> ProviderResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        self.handle_response(response).await
    }

    /// Makes a GET request with query parameters and deserializes the
    /// JSON response.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::get`].
    pub async fn get_with_params<T: DeserializeOwned, P: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        params: &P,
    ) -> ProviderResult<T> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        self.handle_response(response).await
    }

    /// Checks the HTTP status and deserializes the JSON body.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ProviderResult<T> {
        let status = response.status();

        if status.is_success() {
            response.json::<T>().await.map_err(|e| {
                ProviderError::invalid_response(
                    self.provider,
                    format!("failed to parse response: {}", e),
                )
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(self.map_status_error(status, &body))
        }
    }

    /// Maps a reqwest transport error onto the provider taxonomy.
    fn map_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::timeout(
                self.provider,
                format!("request timed out after {}ms", self.timeout_ms),
            )
        } else if error.is_connect() {
            ProviderError::connection(self.provider, format!("connection failed: {}", error))
        } else {
            ProviderError::connection(self.provider, format!("HTTP request failed: {}", error))
        }
    }

    /// Maps a non-success HTTP status onto the provider taxonomy.
    fn map_status_error(&self, status: StatusCode, body: &str) -> ProviderError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::configuration(
                self.provider,
                format!("authentication rejected: {}", body),
            ),
            StatusCode::TOO_MANY_REQUESTS => {
                ProviderError::rate_limited(self.provider, "rate limit exceeded")
            }
            StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => ProviderError::connection(
                self.provider,
                format!("server error ({}): {}", status, body),
            ),
            _ => ProviderError::invalid_response_with_code(
                self.provider,
                format!("HTTP error: {}", body),
                status.as_str(),
            ),
        }
    }
}
