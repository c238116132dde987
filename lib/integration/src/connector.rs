//! Connector trait and related types.
//!
//! The workflow host talks to integrations through the Connector trait:
//! it hands over a named operation with loosely-typed JSON parameters and
//! gets the provider's JSON back.

use crate::error::ConnectorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Information about a connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorInfo {
    /// Unique identifier for this connector type.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the connector.
    pub description: String,
    /// Protocol used (e.g., "rest").
    pub protocol: String,
    /// Available operations.
    pub operations: Vec<OperationInfo>,
    /// Capabilities of this connector.
    pub capabilities: Vec<ConnectorCapability>,
}

/// Information about an available operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationInfo {
    /// Operation name.
    pub name: String,
    /// Description of what the operation does.
    pub description: String,
    /// JSON schema for input parameters.
    pub input_schema: JsonValue,
}

/// Capabilities that a connector may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorCapability {
    /// Can read data from the service.
    Read,
    /// Supports API key authentication.
    ApiKey,
}

/// An operation request, as received from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// The operation name.
    #[serde(rename = "operation")]
    pub name: String,
    /// Operation parameters.
    #[serde(default = "empty_parameters")]
    pub parameters: JsonValue,
}

fn empty_parameters() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

impl OperationRequest {
    /// Creates a new operation request with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: empty_parameters(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        if let JsonValue::Object(ref mut map) = self.parameters {
            map.insert(key.into(), value);
        }
        self
    }

    /// Sets all parameters at once.
    #[must_use]
    pub fn with_parameters(mut self, parameters: JsonValue) -> Self {
        self.parameters = parameters;
        self
    }
}

/// The result of a successful operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Response body, exactly as the service returned it.
    pub data: JsonValue,
    /// Metadata about the operation.
    pub metadata: OperationMetadata,
}

/// Metadata about an operation execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMetadata {
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Number of API calls made.
    pub api_calls: u32,
}

/// Trait for integration connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns information about this connector.
    fn info(&self) -> ConnectorInfo;

    /// Executes an operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the call fails.
    async fn execute(&self, request: &OperationRequest)
    -> Result<OperationResult, ConnectorError>;

    /// Returns the list of supported capabilities.
    fn capabilities(&self) -> Vec<ConnectorCapability> {
        self.info().capabilities
    }

    /// Checks if this connector supports a specific capability.
    fn supports(&self, capability: ConnectorCapability) -> bool {
        self.capabilities().contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_request_builder() {
        let request = OperationRequest::new("get-recording-link")
            .with_param("call_id", serde_json::json!("12345"));

        assert_eq!(request.name, "get-recording-link");
        assert_eq!(
            request.parameters.get("call_id"),
            Some(&serde_json::json!("12345"))
        );
    }

    #[test]
    fn operation_request_wire_format() {
        let request: OperationRequest = serde_json::from_value(serde_json::json!({
            "operation": "get-call-statistics",
            "parameters": {"start": "2024-01-01", "end": "2024-01-02"}
        }))
        .expect("deserialize");

        assert_eq!(request.name, "get-call-statistics");
        assert_eq!(request.parameters["start"], "2024-01-01");
    }

    #[test]
    fn missing_parameters_default_to_empty_object() {
        let request: OperationRequest =
            serde_json::from_str(r#"{"operation":"get-recording-link"}"#).expect("deserialize");
        assert_eq!(request.parameters, serde_json::json!({}));
    }

    #[test]
    fn connector_info_serde() {
        let info = ConnectorInfo {
            id: "zadarma".to_string(),
            name: "Zadarma".to_string(),
            description: "Zadarma telephony API".to_string(),
            protocol: "rest".to_string(),
            operations: vec![],
            capabilities: vec![ConnectorCapability::Read, ConnectorCapability::ApiKey],
        };

        let json = serde_json::to_string(&info).expect("serialize");
        let parsed: ConnectorInfo = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(info.id, parsed.id);
        assert_eq!(parsed.capabilities.len(), 2);
    }
}
