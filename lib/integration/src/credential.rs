//! API credentials.
//!
//! Credentials are supplied by the caller for each call or batch and are
//! never stored or logged by this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which provider environment requests go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiEnvironment {
    /// Live API.
    #[default]
    Production,
    /// Provider test environment.
    Sandbox,
}

/// An API key pair plus the environment flag.
///
/// Deserialize only: the secret is never serialized.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Public key, sent in the `Authorization` header.
    pub api_key: String,
    /// Shared secret used to key the signature. Never transmitted.
    pub api_secret: String,
    /// Send requests to the sandbox environment.
    #[serde(default)]
    pub sandbox: bool,
}

impl Credentials {
    /// Creates production credentials.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            sandbox: false,
        }
    }

    /// Sets the sandbox flag.
    #[must_use]
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Returns the environment these credentials target.
    #[must_use]
    pub const fn environment(&self) -> ApiEnvironment {
        if self.sandbox {
            ApiEnvironment::Sandbox
        } else {
            ApiEnvironment::Production
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("sandbox", &self.sandbox)
            .finish()
    }
}
