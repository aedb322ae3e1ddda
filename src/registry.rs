//! Webhook subscription registry

use crate::error::DeliveryError;
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Webhook record unique identifier
pub type WebhookId = Uuid;

/// A registered webhook subscription.
///
/// Timestamps are integer epoch seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRecord {
    /// Unique record ID
    pub id: WebhookId,

    /// Owning company/tenant identifier
    pub company_id: String,

    /// Callback URL
    pub url: String,

    /// Headers to send with deliveries to this webhook
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Events this webhook subscribes to
    #[serde(default)]
    pub events: Vec<String>,

    /// Whether this webhook receives deliveries
    pub is_active: bool,

    /// Created timestamp (epoch seconds)
    pub created_at: i64,

    /// Updated timestamp (epoch seconds)
    pub updated_at: i64,
}

impl WebhookRecord {
    /// Create a new active record with no subscriptions
    pub fn new(company_id: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4(),
            company_id: company_id.into(),
            url: url.into(),
            headers: HashMap::new(),
            events: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the delivery headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Subscribe to events
    pub fn with_events(mut self, events: Vec<&str>) -> Self {
        self.events = events.into_iter().map(String::from).collect();
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Check if this record subscribes to an event ("*" matches all)
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event || e == "*")
    }
}

/// Partial update for a webhook record; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookUpdate {
    /// New callback URL
    pub url: Option<String>,

    /// New delivery headers
    pub headers: Option<HashMap<String, String>>,

    /// New event subscriptions
    pub events: Option<Vec<String>>,

    /// New active flag
    pub is_active: Option<bool>,
}

/// In-memory store of webhook subscription records
#[derive(Debug, Clone, Default)]
pub struct WebhookRegistry {
    records: Arc<RwLock<HashMap<WebhookId, WebhookRecord>>>,
}

impl WebhookRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a record and return its id
    pub fn create(&self, record: WebhookRecord) -> WebhookId {
        let id = record.id;
        let mut records = self.records.write().unwrap();
        records.insert(id, record);
        id
    }

    /// Get a record by id
    pub fn get(&self, id: WebhookId) -> Result<WebhookRecord> {
        let records = self.records.read().unwrap();
        records
            .get(&id)
            .cloned()
            .ok_or_else(|| DeliveryError::NotFound(id.to_string()))
    }

    /// Apply a partial update to a record, bumping `updated_at`
    pub fn update(&self, id: WebhookId, patch: WebhookUpdate) -> Result<()> {
        let mut records = self.records.write().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| DeliveryError::NotFound(id.to_string()))?;

        if let Some(url) = patch.url {
            record.url = url;
        }
        if let Some(headers) = patch.headers {
            record.headers = headers;
        }
        if let Some(events) = patch.events {
            record.events = events;
        }
        if let Some(is_active) = patch.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Utc::now().timestamp();

        Ok(())
    }

    /// Remove a record
    pub fn delete(&self, id: WebhookId) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DeliveryError::NotFound(id.to_string()))
    }

    /// All stored records
    pub fn list(&self) -> Vec<WebhookRecord> {
        let records = self.records.read().unwrap();
        records.values().cloned().collect()
    }

    /// Active records subscribed to an event
    pub fn for_event(&self, event: &str) -> Vec<WebhookRecord> {
        let records = self.records.read().unwrap();
        records
            .values()
            .filter(|r| r.is_active && r.subscribes_to(event))
            .cloned()
            .collect()
    }

    /// Number of stored records
    pub fn count(&self) -> usize {
        let records = self.records.read().unwrap();
        records.len()
    }
}
