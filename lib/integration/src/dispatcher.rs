//! Turns operations into signed provider calls.

use crate::credential::{ApiEnvironment, Credentials};
use crate::error::ConnectorError;
use crate::operation::ApiOperation;
use crate::transport::{HttpTransport, Transport};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::{debug, instrument};
use zadarma_core::RequestId;
use zadarma_signer::{ParameterMap, canonicalize, sign};

/// Production API host.
pub const PRODUCTION_HOST: &str = "https://api.zadarma.com";

/// Sandbox API host.
pub const SANDBOX_HOST: &str = "https://api-sandbox.zadarma.com";

/// Base URLs for the two provider environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHosts {
    /// Base URL used when the sandbox flag is off.
    #[serde(default = "default_production_host")]
    pub production: String,
    /// Base URL used when the sandbox flag is on.
    #[serde(default = "default_sandbox_host")]
    pub sandbox: String,
}

fn default_production_host() -> String {
    PRODUCTION_HOST.to_string()
}

fn default_sandbox_host() -> String {
    SANDBOX_HOST.to_string()
}

impl Default for ApiHosts {
    fn default() -> Self {
        Self {
            production: default_production_host(),
            sandbox: default_sandbox_host(),
        }
    }
}

impl ApiHosts {
    /// Returns the base URL for an environment, without a trailing slash.
    #[must_use]
    pub fn host_for(&self, environment: ApiEnvironment) -> &str {
        let host = match environment {
            ApiEnvironment::Production => &self.production,
            ApiEnvironment::Sandbox => &self.sandbox,
        };
        host.trim_end_matches('/')
    }
}

/// A request ready to be sent.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Full URL including the canonical query string.
    pub url: String,
    /// Value of the `Authorization` header: `<api key>:<signature>`.
    pub authorization: String,
}

impl SignedRequest {
    /// Returns the query string portion of the URL.
    #[must_use]
    pub fn query(&self) -> &str {
        self.url.split_once('?').map_or("", |(_, query)| query)
    }
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedRequest")
            .field("url", &self.url)
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// Signs operations and sends them through a [`Transport`].
///
/// Holds no per-call state; one dispatcher can serve any number of
/// concurrent calls with different credentials.
#[derive(Debug, Clone)]
pub struct Dispatcher<T = HttpTransport> {
    transport: T,
    hosts: ApiHosts,
}

impl<T: Transport> Dispatcher<T> {
    /// Creates a dispatcher that talks to the provider's public hosts.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            hosts: ApiHosts::default(),
        }
    }

    /// Overrides the API hosts.
    #[must_use]
    pub fn with_hosts(mut self, hosts: ApiHosts) -> Self {
        self.hosts = hosts;
        self
    }

    /// Returns the configured hosts.
    #[must_use]
    pub const fn hosts(&self) -> &ApiHosts {
        &self.hosts
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Signs a request for an arbitrary endpoint and parameter set.
    ///
    /// The query string in the URL is the exact string that was signed.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SigningFailed`] if the signature cannot be
    /// computed.
    pub fn sign_request(
        &self,
        endpoint_path: &str,
        params: &ParameterMap,
        credentials: &Credentials,
    ) -> Result<SignedRequest, ConnectorError> {
        let signature = sign(endpoint_path, params, &credentials.api_secret)?;
        let query = canonicalize(params);
        let host = self.hosts.host_for(credentials.environment());

        Ok(SignedRequest {
            url: format!("{host}{endpoint_path}?{query}"),
            authorization: format!("{}:{signature}", credentials.api_key),
        })
    }

    /// Signs the request for an operation.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SigningFailed`] if the signature cannot be
    /// computed.
    pub fn prepare(
        &self,
        operation: &ApiOperation,
        credentials: &Credentials,
    ) -> Result<SignedRequest, ConnectorError> {
        self.sign_request(
            operation.endpoint_path(),
            &operation.parameters(),
            credentials,
        )
    }

    /// Signs and sends an operation, returning the provider's JSON as-is.
    ///
    /// # Errors
    ///
    /// Returns a signing error, or a transport error from the call.
    #[instrument(
        skip_all,
        fields(
            request_id = %RequestId::new(),
            operation = operation.name(),
            sandbox = credentials.sandbox,
        )
    )]
    pub async fn execute(
        &self,
        operation: &ApiOperation,
        credentials: &Credentials,
    ) -> Result<JsonValue, ConnectorError> {
        let request = self.prepare(operation, credentials)?;
        debug!(url = %request.url, "dispatching signed request");
        self.transport.get_json(&request).await
    }
}
