//! HTTP transport for signed requests.
//!
//! The dispatcher only needs "GET this URL with this header and give me
//! JSON". Keeping that behind a trait lets tests run without a network.

use crate::dispatcher::SignedRequest;
use crate::error::ConnectorError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends a prepared request and decodes the JSON response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET for the request.
    ///
    /// # Errors
    ///
    /// Returns a transport-kind [`ConnectorError`] on connection failure,
    /// timeout, non-success status or an undecodable body.
    async fn get_json(&self, request: &SignedRequest) -> Result<JsonValue, ConnectorError>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::ConnectionFailed {
                reason: format!("HTTP client error: {e}"),
            })?;

        Ok(Self { client })
    }
}

fn request_error(error: &reqwest::Error) -> ConnectorError {
    if error.is_timeout() {
        ConnectorError::Timeout
    } else {
        ConnectorError::ConnectionFailed {
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, request: &SignedRequest) -> Result<JsonValue, ConnectorError> {
        let response = self
            .client
            .get(&request.url)
            .header(AUTHORIZATION, request.authorization.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "request to provider failed");
                request_error(&e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| request_error(&e))?;

        if !status.is_success() {
            warn!(status = %status, body = %body, "provider returned error status");
            return Err(ConnectorError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = %status, bytes = body.len(), "provider response received");

        serde_json::from_str(&body).map_err(|e| ConnectorError::ResponseParseFailed {
            reason: e.to_string(),
        })
    }
}
