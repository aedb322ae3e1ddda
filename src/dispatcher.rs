//! Task admission and event fan-out

use crate::error::DeliveryError;
use crate::scheduler::RetryScheduler;
use crate::task::{DeliveryTask, TaskId, TaskTarget};
use crate::{DeliveryConfig, Result, WebhookRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// JSON envelope delivered for a dispatched event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    /// Unique identifier for this event
    pub id: String,

    /// Event type (e.g., "order.created")
    pub event: String,

    /// When the event occurred
    pub timestamp: DateTime<Utc>,

    /// The actual event data
    pub data: serde_json::Value,
}

impl EventPayload {
    /// Create a new envelope for the given event type
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event: event.into(),
            timestamp: Utc::now(),
            data: serde_json::Value::Null,
        }
    }

    /// Set the event data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Convert to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Admission front-end of the delivery engine.
///
/// Validates and hands delivery requests to the scheduler. Returns the task
/// id immediately; delivery happens asynchronously and callers observe the
/// final state via [`Dispatcher::task`].
pub struct Dispatcher {
    scheduler: Arc<RetryScheduler>,
    registry: WebhookRegistry,
    config: DeliveryConfig,
}

impl Dispatcher {
    /// Create a dispatcher over the given scheduler and registry
    pub fn new(
        scheduler: Arc<RetryScheduler>,
        registry: WebhookRegistry,
        config: DeliveryConfig,
    ) -> Self {
        Self {
            scheduler,
            registry,
            config,
        }
    }

    /// Admit one delivery to a target URL.
    ///
    /// Rejects malformed URLs and empty or oversized payloads
    /// synchronously; nothing else is ever surfaced as an error to the
    /// caller. Repeated identical submissions create independent tasks.
    pub fn submit(
        &self,
        target_url: &str,
        headers: HashMap<String, String>,
        payload: Vec<u8>,
    ) -> Result<TaskId> {
        Url::parse(target_url)?;

        if payload.is_empty() {
            return Err(DeliveryError::EmptyPayload);
        }
        if payload.len() > self.config.max_payload_size {
            return Err(DeliveryError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        let task = DeliveryTask::new(
            TaskTarget::with_headers(target_url, headers),
            payload,
            self.config.max_attempts,
        );
        let id = self.scheduler.admit(task);
        debug!("Submitted delivery task {} for {}", id, target_url);
        Ok(id)
    }

    /// Fan an event out to every active webhook subscribed to it.
    ///
    /// Records with a malformed stored URL are skipped with a warning
    /// rather than failing the whole fan-out.
    pub fn dispatch_event(
        &self,
        event: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<Vec<TaskId>> {
        let envelope = EventPayload::new(event).with_data(data);
        let body = envelope.to_bytes()?;

        let records = self.registry.for_event(&envelope.event);
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            match self.submit(&record.url, record.headers.clone(), body.clone()) {
                Ok(id) => ids.push(id),
                Err(e) => warn!(
                    "Skipping webhook {} for event {}: {}",
                    record.id, envelope.event, e
                ),
            }
        }

        debug!(
            "Dispatched event {} to {} webhook(s)",
            envelope.event,
            ids.len()
        );
        Ok(ids)
    }

    /// Snapshot of a task's current state
    pub fn task(&self, id: TaskId) -> Result<DeliveryTask> {
        self.scheduler
            .get(id)
            .ok_or_else(|| DeliveryError::TaskNotFound(id.to_string()))
    }

    /// The subscription registry backing event fan-out
    pub fn registry(&self) -> &WebhookRegistry {
        &self.registry
    }
}
