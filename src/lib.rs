//! Asynchronous webhook delivery engine
//!
//! This crate reliably delivers HTTP callbacks ("webhooks") to registered
//! endpoints over unreliable networks: attempts are classified, failures
//! are retried with bounded exponential backoff, and a fixed-size worker
//! pool keeps one slow endpoint from blocking everything else. Delivery is
//! at-least-once; tasks run to a terminal `Succeeded` or `Failed` state.
//!
//! # Features
//!
//! - **Task admission**: validate a target and payload, get a task id back
//!   immediately; delivery happens in the background
//! - **Retry scheduling**: a time-ordered due-queue with exponential
//!   backoff and a per-task attempt ceiling
//! - **Bounded dispatch**: a fixed worker pool caps concurrent in-flight
//!   HTTP calls
//! - **Subscription registry**: register endpoints per event and fan
//!   events out to every active subscriber
//!
//! # Example: delivering to one endpoint
//!
//! ```rust,no_run
//! use hookrelay::{
//!     AttemptExecutor, DeliveryConfig, Dispatcher, HttpTransport,
//!     RetryScheduler, WebhookRegistry, WorkerPool,
//! };
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DeliveryConfig::default();
//!     let scheduler = Arc::new(RetryScheduler::new(config.backoff.clone()));
//!     let transport = Arc::new(HttpTransport::new(&config)?);
//!     let executor = Arc::new(AttemptExecutor::new(transport, config.clone()));
//!
//!     let mut pool = WorkerPool::new(scheduler.clone(), executor, config.clone());
//!     pool.start().await?;
//!
//!     let dispatcher = Dispatcher::new(scheduler, WebhookRegistry::new(), config);
//!     let task_id = dispatcher.submit(
//!         "https://example.com/webhook",
//!         HashMap::new(),
//!         br#"{"hello":"world"}"#.to_vec(),
//!     )?;
//!
//!     // Delivery is asynchronous; poll the task for its terminal state
//!     let task = dispatcher.task(task_id)?;
//!     println!("task {} is {:?}", task.id, task.state);
//!     Ok(())
//! }
//! ```
//!
//! # Example: event fan-out
//!
//! ```rust,no_run
//! use hookrelay::{WebhookRecord, WebhookRegistry};
//!
//! let registry = WebhookRegistry::new();
//! registry.create(
//!     WebhookRecord::new("acme-corp", "https://api.example.com/hooks")
//!         .with_events(vec!["order.created", "order.updated"]),
//! );
//!
//! // Active subscribers for an event
//! let targets = registry.for_event("order.created");
//! ```

mod backoff;
mod config;
mod dispatcher;
mod error;
mod executor;
mod registry;
mod scheduler;
mod task;
mod transport;
mod worker;

#[cfg(test)]
mod test_util;

pub use backoff::BackoffPolicy;
pub use config::{DeliveryConfig, DeliveryConfigBuilder};
pub use dispatcher::{Dispatcher, EventPayload};
pub use error::DeliveryError;
pub use executor::{AttemptExecutor, AttemptOutcome, FailureReason};
pub use registry::{WebhookId, WebhookRecord, WebhookRegistry, WebhookUpdate};
pub use scheduler::RetryScheduler;
pub use task::{DeliveryTask, TaskId, TaskState, TaskTarget};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
pub use worker::WorkerPool;

/// Result type for delivery operations
pub type Result<T> = std::result::Result<T, DeliveryError>;
