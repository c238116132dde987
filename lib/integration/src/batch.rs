//! Running many input items against a connector.
//!
//! Items are independent: each one resolves to its own operation and its
//! own request. Results always come back in input order, whatever the
//! concurrency.

use crate::connector::{Connector, OperationRequest};
use crate::error::{BatchError, ConnectorError};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, instrument, warn};
use zadarma_core::BatchId;

/// What to do when an item fails.
///
/// Signing failures abort the batch under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing item.
    #[default]
    Abort,
    /// Record the failure in the item's slot and keep going.
    Continue,
}

/// Options for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Failure handling.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Maximum number of requests in flight. Zero is treated as one.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

const fn default_concurrency() -> usize {
    1
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            concurrency: default_concurrency(),
        }
    }
}

impl BatchOptions {
    /// Sets the failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Outcome of one input item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResult {
    /// The provider's response, unmodified.
    Success { index: usize, data: JsonValue },
    /// The item failed and the batch continued.
    Failure { index: usize, error: String },
}

impl ApiResult {
    /// Index of the input item this result belongs to.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    /// Returns true for a successful item.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the response body of a successful item.
    #[must_use]
    pub const fn data(&self) -> Option<&JsonValue> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }
}

/// Executes every item and returns one result per item, in input order.
///
/// With [`FailurePolicy::Abort`] and a concurrency above one, items after
/// the failing one may already have been sent; their results are dropped.
///
/// # Errors
///
/// Returns [`BatchError::ItemFailed`] for the first failing item when the
/// policy is [`FailurePolicy::Abort`], or for any signing failure.
#[instrument(skip_all, fields(batch_id = %BatchId::new(), items = items.len()))]
pub async fn execute_batch<C>(
    connector: &C,
    items: &[OperationRequest],
    options: BatchOptions,
) -> Result<Vec<ApiResult>, BatchError>
where
    C: Connector + ?Sized,
{
    let mut outcomes = stream::iter(items.iter().enumerate())
        .map(|(index, item)| async move { (index, connector.execute(item).await) })
        .buffered(options.concurrency.max(1));

    let mut results = Vec::with_capacity(items.len());
    let mut failures = 0_usize;

    while let Some((index, outcome)) = outcomes.next().await {
        match outcome {
            Ok(result) => results.push(ApiResult::Success {
                index,
                data: result.data,
            }),
            Err(error) if aborts(&error, options.failure_policy) => {
                warn!(index, error = %error, "item failed, aborting batch");
                return Err(BatchError::ItemFailed {
                    index,
                    operation: items[index].name.clone(),
                    error,
                });
            }
            Err(error) => {
                warn!(index, error = %error, "item failed, continuing");
                failures += 1;
                results.push(ApiResult::Failure {
                    index,
                    error: error.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = results.len() - failures,
        failed = failures,
        "batch finished"
    );
    Ok(results)
}

const fn aborts(error: &ConnectorError, policy: FailurePolicy) -> bool {
    error.is_fatal() || matches!(policy, FailurePolicy::Abort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectorCapability, ConnectorInfo, OperationMetadata, OperationResult};
    use crate::credential::Credentials;
    use crate::dispatcher::Dispatcher;
    use crate::dispatcher::tests::RecordingTransport;
    use crate::zadarma::ZadarmaConnector;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    /// Echoes the item's `value` parameter; `fail`/`fatal` parameters force errors.
    /// Earlier items yield more often so they finish after later ones.
    struct EchoConnector {
        items: usize,
    }

    #[async_trait]
    impl Connector for EchoConnector {
        fn info(&self) -> ConnectorInfo {
            ConnectorInfo {
                id: "echo".to_string(),
                name: "Echo".to_string(),
                description: "test connector".to_string(),
                protocol: "memory".to_string(),
                operations: vec![],
                capabilities: vec![ConnectorCapability::Read],
            }
        }

        async fn execute(
            &self,
            request: &OperationRequest,
        ) -> Result<OperationResult, ConnectorError> {
            let position = request.parameters["value"].as_u64().unwrap_or(0) as usize;
            for _ in 0..self.items.saturating_sub(position) {
                tokio::task::yield_now().await;
            }

            if request.parameters.get("fatal").is_some() {
                return Err(ConnectorError::SigningFailed {
                    reason: "broken".to_string(),
                });
            }
            if request.parameters.get("fail").is_some() {
                return Err(ConnectorError::Timeout);
            }

            Ok(OperationResult {
                data: json!({"value": position}),
                metadata: OperationMetadata::default(),
            })
        }
    }

    fn items(count: usize) -> Vec<OperationRequest> {
        (0..count)
            .map(|i| OperationRequest::new("echo").with_param("value", json!(i)))
            .collect()
    }

    #[tokio::test]
    async fn results_follow_input_order_under_concurrency() {
        let connector = EchoConnector { items: 8 };
        let results = execute_batch(
            &connector,
            &items(8),
            BatchOptions::default().with_concurrency(4),
        )
        .await
        .expect("batch");

        assert_eq!(results.len(), 8);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.index(), i);
            assert_eq!(result.data(), Some(&json!({"value": i})));
        }
    }

    #[tokio::test]
    async fn continue_policy_isolates_failures() {
        let mut batch = items(5);
        batch[2] = batch[2].clone().with_param("fail", json!(true));

        let connector = EchoConnector { items: 5 };
        let results = execute_batch(
            &connector,
            &batch,
            BatchOptions::default()
                .with_failure_policy(FailurePolicy::Continue)
                .with_concurrency(2),
        )
        .await
        .expect("batch");

        assert_eq!(results.len(), 5);
        assert_eq!(
            results[2],
            ApiResult::Failure {
                index: 2,
                error: "operation timed out".to_string()
            }
        );
        for i in [0, 1, 3, 4] {
            assert!(results[i].is_success());
            assert_eq!(results[i].index(), i);
            assert_eq!(results[i].data(), Some(&json!({"value": i})));
        }
    }

    #[tokio::test]
    async fn abort_policy_stops_at_first_failure() {
        let mut batch = items(4);
        batch[1] = batch[1].clone().with_param("fail", json!(true));
        batch[3] = batch[3].clone().with_param("fail", json!(true));

        let connector = EchoConnector { items: 4 };
        let err = execute_batch(&connector, &batch, BatchOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.index(), 1);
        assert!(matches!(
            err,
            BatchError::ItemFailed {
                error: ConnectorError::Timeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn signing_failures_abort_even_when_continuing() {
        let mut batch = items(3);
        batch[1] = batch[1].clone().with_param("fatal", json!(true));

        let connector = EchoConnector { items: 3 };
        let err = execute_batch(
            &connector,
            &batch,
            BatchOptions::default().with_failure_policy(FailurePolicy::Continue),
        )
        .await
        .unwrap_err();

        assert_eq!(err.index(), 1);
    }

    #[tokio::test]
    async fn zero_concurrency_runs_sequentially() {
        let connector = EchoConnector { items: 3 };
        let results = execute_batch(
            &connector,
            &items(3),
            BatchOptions::default().with_concurrency(0),
        )
        .await
        .expect("batch");

        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn empty_batch() {
        let connector = EchoConnector { items: 0 };
        let results = execute_batch(&connector, &[], BatchOptions::default())
            .await
            .expect("batch");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn zadarma_batch_captures_validation_errors() {
        let connector = ZadarmaConnector::new(
            Arc::new(Dispatcher::new(RecordingTransport::default())),
            Credentials::new("mykey", "testsecret"),
        );
        let batch = vec![
            OperationRequest::new("get-recording-link").with_param("call_id", json!("1")),
            OperationRequest::new("get-recording-link"),
            OperationRequest::new("get-recording-link").with_param("call_id", json!("3")),
        ];

        let results = execute_batch(
            &connector,
            &batch,
            BatchOptions::default().with_failure_policy(FailurePolicy::Continue),
        )
        .await
        .expect("batch");

        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert_eq!(results[1].index(), 1);
        assert!(results[2].is_success());
        assert_eq!(connector.dispatcher().transport().requests().len(), 2);
    }

    #[test]
    fn api_result_wire_format() {
        let failure = ApiResult::Failure {
            index: 1,
            error: "connection failed: refused".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failure).expect("serialize"),
            json!({"status": "failure", "index": 1, "error": "connection failed: refused"})
        );
    }
}
