//! Configuration for the delivery engine

use crate::BackoffPolicy;
use std::time::Duration;

/// Configuration for the delivery engine
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Timeout for a single delivery attempt
    pub attempt_timeout: Duration,

    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// Maximum payload size in bytes
    pub max_payload_size: usize,

    /// Backoff policy applied between attempts of the same task
    pub backoff: BackoffPolicy,

    /// Attempt ceiling per task (initial attempt plus retries)
    pub max_attempts: u32,

    /// Number of concurrent delivery workers
    pub concurrency: usize,

    /// Upper bound on how long an idle worker sleeps between due checks
    pub poll_interval: Duration,

    /// How long terminal tasks are kept before the sweeper drops them
    pub retention: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(30),
            user_agent: format!("Hookrelay/{}", env!("CARGO_PKG_VERSION")),
            max_payload_size: 1024 * 1024, // 1MB
            backoff: BackoffPolicy::default(),
            max_attempts: 6,
            concurrency: 10,
            poll_interval: Duration::from_secs(1),
            retention: Duration::from_secs(86400), // 24 hours
        }
    }
}

impl DeliveryConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> DeliveryConfigBuilder {
        DeliveryConfigBuilder::new()
    }
}

/// Builder for DeliveryConfig
#[derive(Debug, Clone, Default)]
pub struct DeliveryConfigBuilder {
    config: DeliveryConfig,
}

impl DeliveryConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: DeliveryConfig::default(),
        }
    }

    /// Set the per-attempt timeout
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.attempt_timeout = timeout;
        self
    }

    /// Set the per-attempt timeout in seconds
    pub fn attempt_timeout_secs(mut self, secs: u64) -> Self {
        self.config.attempt_timeout = Duration::from_secs(secs);
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set maximum payload size
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Set the backoff base delay
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.config.backoff = BackoffPolicy::new(base);
        self
    }

    /// Set the attempt ceiling
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Set worker concurrency
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the idle poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the terminal-task retention window
    pub fn retention(mut self, retention: Duration) -> Self {
        self.config.retention = retention;
        self
    }

    /// Build the configuration
    pub fn build(self) -> DeliveryConfig {
        self.config
    }
}
