//! Single-attempt delivery execution and outcome classification

use crate::{DeliveryConfig, TaskTarget, Transport};
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a delivery attempt failed
#[derive(Debug, Clone)]
pub enum FailureReason {
    /// Network-level failure: connection refused, timeout, DNS
    Transport(String),

    /// The endpoint answered with a non-2xx status
    HttpStatus {
        /// Response status code
        status: u16,
        /// Response body, if any (truncated downstream)
        body: Option<String>,
    },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::HttpStatus { status, .. } => write!(f, "HTTP {}", status),
        }
    }
}

/// Classified result of one delivery attempt
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// The endpoint answered with a 2xx status
    Success {
        /// Response status code
        status: u16,
        /// Response body, if any
        body: Option<String>,
    },

    /// The attempt failed in a way a later attempt might not
    RetryableFailure(FailureReason),
}

impl AttemptOutcome {
    /// Check if the outcome is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Executes exactly one delivery attempt per call and classifies the result.
///
/// Every non-2xx status is classified retryable, the same as a transport
/// failure. Nothing propagates past this boundary; the scheduler decides
/// what happens next.
pub struct AttemptExecutor {
    transport: Arc<dyn Transport>,
    config: DeliveryConfig,
}

impl AttemptExecutor {
    /// Create an executor over the given transport
    pub fn new(transport: Arc<dyn Transport>, config: DeliveryConfig) -> Self {
        Self { transport, config }
    }

    /// Perform one delivery attempt against the target
    pub async fn execute(&self, target: &TaskTarget, payload: &[u8]) -> AttemptOutcome {
        let result = self
            .transport
            .send(
                &target.url,
                &target.headers,
                payload,
                self.config.attempt_timeout,
            )
            .await;

        match result {
            Ok(response) if (200..300).contains(&response.status) => {
                debug!(
                    "Delivery attempt to {} succeeded with status {}",
                    target.url, response.status
                );
                AttemptOutcome::Success {
                    status: response.status,
                    body: response.body,
                }
            }
            Ok(response) => {
                warn!(
                    "Delivery attempt to {} failed with status {}",
                    target.url, response.status
                );
                AttemptOutcome::RetryableFailure(FailureReason::HttpStatus {
                    status: response.status,
                    body: response.body,
                })
            }
            Err(e) => {
                warn!("Delivery attempt to {} failed: {}", target.url, e);
                AttemptOutcome::RetryableFailure(FailureReason::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ScriptedTransport;
    use crate::transport::{TransportError, TransportResponse};

    fn executor_with(
        script: Vec<std::result::Result<TransportResponse, TransportError>>,
    ) -> AttemptExecutor {
        AttemptExecutor::new(
            Arc::new(ScriptedTransport::new(script)),
            DeliveryConfig::default(),
        )
    }

    fn target() -> TaskTarget {
        TaskTarget::new("https://example.com/hook")
    }

    #[tokio::test]
    async fn test_2xx_is_success() {
        let executor = executor_with(vec![Ok(TransportResponse {
            status: 201,
            body: Some("created".to_string()),
        })]);

        let outcome = executor.execute(&target(), b"{}").await;
        match outcome {
            AttemptOutcome::Success { status, body } => {
                assert_eq!(status, 201);
                assert_eq!(body.as_deref(), Some("created"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_5xx_is_retryable() {
        let executor = executor_with(vec![Ok(TransportResponse {
            status: 503,
            body: None,
        })]);

        let outcome = executor.execute(&target(), b"{}").await;
        match outcome {
            AttemptOutcome::RetryableFailure(FailureReason::HttpStatus { status, .. }) => {
                assert_eq!(status, 503)
            }
            other => panic!("expected retryable failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_4xx_is_also_retryable() {
        // Any non-2xx status is retryable, 404 included
        let executor = executor_with(vec![Ok(TransportResponse {
            status: 404,
            body: None,
        })]);

        let outcome = executor.execute(&target(), b"{}").await;
        assert!(matches!(
            outcome,
            AttemptOutcome::RetryableFailure(FailureReason::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_is_retryable() {
        let executor = executor_with(vec![Err(TransportError(
            "connection refused".to_string(),
        ))]);

        let outcome = executor.execute(&target(), b"{}").await;
        match outcome {
            AttemptOutcome::RetryableFailure(FailureReason::Transport(msg)) => {
                assert!(msg.contains("refused"))
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
    }
}
