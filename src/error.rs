//! Error types for delivery operations

use thiserror::Error;

/// Errors that can occur during webhook delivery operations
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Target URL failed to parse
    #[error("Invalid target URL: {0}")]
    InvalidTarget(#[from] url::ParseError),

    /// Payload missing at admission
    #[error("Payload is empty")]
    EmptyPayload,

    /// Payload exceeds the configured size limit
    #[error("Payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Task not found in the scheduler
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Webhook record not found in the registry
    #[error("Webhook not found: {0}")]
    NotFound(String),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Payload serialization failed
    #[error("Payload error: {0}")]
    PayloadError(String),

    /// Worker pool already running
    #[error("Worker pool already running")]
    WorkerAlreadyRunning,

    /// Worker pool not running
    #[error("Worker pool not running")]
    WorkerNotRunning,
}

impl From<serde_json::Error> for DeliveryError {
    fn from(err: serde_json::Error) -> Self {
        DeliveryError::PayloadError(err.to_string())
    }
}
