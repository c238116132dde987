//! The Zadarma connector.
//!
//! Binds a [`Dispatcher`] to one set of credentials so the host can run
//! named operations without knowing about signing.

use crate::connector::{
    Connector, ConnectorCapability, ConnectorInfo, OperationInfo, OperationMetadata,
    OperationRequest, OperationResult,
};
use crate::credential::Credentials;
use crate::dispatcher::Dispatcher;
use crate::error::ConnectorError;
use crate::operation::{ApiOperation, NaiveDateTimeConvention};
use crate::transport::{HttpTransport, Transport};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Connector identifier reported in [`ConnectorInfo`].
pub const CONNECTOR_ID: &str = "zadarma";

/// Connector for the Zadarma telephony API.
#[derive(Debug, Clone)]
pub struct ZadarmaConnector<T = HttpTransport> {
    dispatcher: Arc<Dispatcher<T>>,
    credentials: Credentials,
    convention: NaiveDateTimeConvention,
}

impl<T: Transport> ZadarmaConnector<T> {
    /// Creates a connector using the given dispatcher and credentials.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher<T>>, credentials: Credentials) -> Self {
        Self {
            dispatcher,
            credentials,
            convention: NaiveDateTimeConvention::default(),
        }
    }

    /// Sets how date-times without an offset are interpreted.
    #[must_use]
    pub const fn with_convention(mut self, convention: NaiveDateTimeConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Returns the underlying dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }
}

fn operation_catalog() -> Vec<OperationInfo> {
    vec![
        OperationInfo {
            name: ApiOperation::CALL_STATISTICS.to_string(),
            description: "Get PBX call statistics for a date range".to_string(),
            input_schema: json!({
                "type": "object",
                "required": ["start", "end"],
                "properties": {
                    "start": {"type": "string", "format": "date-time"},
                    "end": {"type": "string", "format": "date-time"}
                }
            }),
        },
        OperationInfo {
            name: ApiOperation::RECORDING_LINK.to_string(),
            description: "Get the download link for a call recording".to_string(),
            input_schema: json!({
                "type": "object",
                "required": ["call_id"],
                "properties": {
                    "call_id": {"type": ["string", "integer"]}
                }
            }),
        },
    ]
}

#[async_trait]
impl<T: Transport> Connector for ZadarmaConnector<T> {
    fn info(&self) -> ConnectorInfo {
        ConnectorInfo {
            id: CONNECTOR_ID.to_string(),
            name: "Zadarma".to_string(),
            description: "Call statistics and recordings from the Zadarma API".to_string(),
            protocol: "rest".to_string(),
            operations: operation_catalog(),
            capabilities: vec![ConnectorCapability::Read, ConnectorCapability::ApiKey],
        }
    }

    #[instrument(skip_all, fields(operation = %request.name))]
    async fn execute(
        &self,
        request: &OperationRequest,
    ) -> Result<OperationResult, ConnectorError> {
        let operation = ApiOperation::from_request(request, self.convention)?;

        let started = Instant::now();
        let data = self.dispatcher.execute(&operation, &self.credentials).await?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        debug!(latency_ms, "operation completed");

        Ok(OperationResult {
            data,
            metadata: OperationMetadata {
                latency_ms,
                api_calls: 1,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::tests::RecordingTransport;
    use crate::error::ErrorKind;

    fn connector(transport: RecordingTransport) -> ZadarmaConnector<RecordingTransport> {
        ZadarmaConnector::new(
            Arc::new(Dispatcher::new(transport)),
            Credentials::new("mykey", "testsecret").with_sandbox(true),
        )
    }

    #[test]
    fn info_lists_operations() {
        let connector = connector(RecordingTransport::default());
        let info = connector.info();

        assert_eq!(info.id, "zadarma");
        let names: Vec<_> = info.operations.iter().map(|op| op.name.as_str()).collect();
        assert_eq!(names, ["get-call-statistics", "get-recording-link"]);
        assert!(connector.supports(ConnectorCapability::ApiKey));
    }

    #[tokio::test]
    async fn execute_recording_link() {
        let body = json!({"status": "success", "link": "https://example.test/a.mp3"});
        let connector = connector(RecordingTransport::respond_with([Ok(body.clone())]));

        let result = connector
            .execute(&OperationRequest::new("get-recording-link").with_param("call_id", json!("12345")))
            .await
            .expect("execute");

        assert_eq!(result.data, body);
        assert_eq!(result.metadata.api_calls, 1);

        let sent = connector.dispatcher().transport().requests();
        assert_eq!(
            sent[0].url,
            "https://api-sandbox.zadarma.com/v1/pbx/record/request/?call_id=12345&format=json"
        );
    }

    #[tokio::test]
    async fn convention_applies_to_naive_dates() {
        let connector = connector(RecordingTransport::default()).with_convention(
            NaiveDateTimeConvention::FixedOffset {
                seconds_east: 3600,
            },
        );

        connector
            .execute(
                &OperationRequest::new("get-call-statistics")
                    .with_param("start", json!("2024-01-01 01:00:00"))
                    .with_param("end", json!("2024-01-02T00:00:00Z")),
            )
            .await
            .expect("execute");

        let sent = connector.dispatcher().transport().requests();
        assert!(sent[0].url.contains("start=2024-01-01+00%3A00%3A00"));
        assert!(sent[0].url.contains("end=2024-01-02+00%3A00%3A00"));
    }

    #[tokio::test]
    async fn validation_errors_skip_the_network() {
        let connector = connector(RecordingTransport::default());

        let err = connector
            .execute(&OperationRequest::new("get-call-statistics"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(connector.dispatcher().transport().requests().is_empty());
    }
}
