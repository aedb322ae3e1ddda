//! Delivery task definition and state management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Task unique identifier
pub type TaskId = Uuid;

/// Lifecycle state of a delivery task.
///
/// Transitions are monotonic: `Pending -> InFlight -> {Succeeded, Pending
/// (retry), Failed}`. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting for its due time
    Pending,

    /// An attempt is currently executing
    InFlight,

    /// Delivered successfully
    Succeeded,

    /// Attempt ceiling reached without success
    Failed,
}

impl TaskState {
    /// Check if the state is terminal (success or exhausted retries)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Check if the task succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Destination of a delivery task: URL plus request headers.
///
/// Immutable for the task's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTarget {
    /// Destination URL
    pub url: String,

    /// Headers to send with each attempt
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl TaskTarget {
    /// Create a target with no custom headers
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Create a target with custom headers
    pub fn with_headers(url: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            url: url.into(),
            headers,
        }
    }
}

/// One delivery obligation, tracked through retries to a terminal outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTask {
    /// Unique task identifier, assigned at admission
    pub id: TaskId,

    /// Destination URL and headers
    pub target: TaskTarget,

    /// Opaque request body
    pub payload: Vec<u8>,

    /// Current state
    pub state: TaskState,

    /// Number of completed attempts
    pub attempt_count: u32,

    /// Attempt ceiling, fixed at creation
    pub max_attempts: u32,

    /// When the next attempt becomes due (meaningful only while Pending)
    pub next_attempt_at: DateTime<Utc>,

    /// HTTP status code from the last attempt
    pub last_status_code: Option<u16>,

    /// Error description from the last failed attempt
    pub last_error: Option<String>,

    /// Response body from the last attempt (truncated)
    pub last_response_body: Option<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl DeliveryTask {
    /// Create a new task, pending and due immediately
    pub fn new(target: TaskTarget, payload: Vec<u8>, max_attempts: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            target,
            payload,
            state: TaskState::Pending,
            attempt_count: 0,
            max_attempts,
            next_attempt_at: now,
            last_status_code: None,
            last_error: None,
            last_response_body: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the task is due for dispatch
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == TaskState::Pending && self.next_attempt_at <= now
    }

    /// Transition to InFlight on dequeue
    pub fn begin_attempt(&mut self) {
        self.state = TaskState::InFlight;
        self.updated_at = Utc::now();
    }

    /// Record a successful attempt
    pub fn complete(&mut self, status_code: u16, response_body: Option<String>) {
        self.attempt_count += 1;
        self.state = TaskState::Succeeded;
        self.last_status_code = Some(status_code);
        self.last_response_body = response_body.map(|s| truncate_string(&s, 1024));
        self.last_error = None;
        self.updated_at = Utc::now();
    }

    /// Record a failed attempt.
    ///
    /// With `next_retry` the task goes back to `Pending` for that time;
    /// without it the task is terminally `Failed`.
    pub fn fail_attempt(
        &mut self,
        error: String,
        status_code: Option<u16>,
        response_body: Option<String>,
        next_retry: Option<DateTime<Utc>>,
    ) {
        self.attempt_count += 1;
        self.last_error = Some(error);
        self.last_status_code = status_code;
        self.last_response_body = response_body.map(|s| truncate_string(&s, 1024));
        match next_retry {
            Some(at) => {
                self.state = TaskState::Pending;
                self.next_attempt_at = at;
            }
            None => self.state = TaskState::Failed,
        }
        self.updated_at = Utc::now();
    }
}

/// Truncate a string to a maximum byte length, never splitting a character
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len - 3;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}
