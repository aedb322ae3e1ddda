//! Retry scheduler: the state machine driving tasks to a terminal state

use crate::executor::{AttemptOutcome, FailureReason};
use crate::task::{DeliveryTask, TaskId};
use crate::BackoffPolicy;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Entry in the time-ordered due index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct DueEntry {
    at: DateTime<Utc>,
    id: TaskId,
}

struct SchedulerInner {
    tasks: HashMap<TaskId, DeliveryTask>,
    // Min-heap over next_attempt_at; stale entries are discarded on pop
    due: BinaryHeap<Reverse<DueEntry>>,
}

/// Owns the task table and drives every task from `Pending` to a terminal
/// state, respecting backoff timing and the attempt ceiling.
///
/// All task mutation happens here, under one lock, so dequeue and report
/// are mutually atomic per task: no two pollers can take the same task and
/// a late report cannot corrupt a terminal state.
pub struct RetryScheduler {
    inner: Mutex<SchedulerInner>,
    backoff: BackoffPolicy,
    wake: Notify,
}

impl RetryScheduler {
    /// Create a scheduler with the given backoff policy
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            inner: Mutex::new(SchedulerInner {
                tasks: HashMap::new(),
                due: BinaryHeap::new(),
            }),
            backoff,
            wake: Notify::new(),
        }
    }

    /// Insert a new task, pending and due at its `next_attempt_at`.
    ///
    /// Every call creates a distinct task; identical submissions are not
    /// deduplicated.
    pub fn admit(&self, task: DeliveryTask) -> TaskId {
        let id = task.id;
        {
            let mut inner = self.inner.lock().expect("scheduler lock poisoned");
            inner.due.push(Reverse(DueEntry {
                at: task.next_attempt_at,
                id,
            }));
            inner.tasks.insert(id, task);
        }
        debug!("Admitted task {}", id);
        self.wake.notify_waiters();
        id
    }

    /// Take the single next due task, transitioning it to `InFlight`.
    ///
    /// Returns `None` when nothing is due yet.
    pub fn next_due(&self) -> Option<DeliveryTask> {
        let now = Utc::now();
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");

        while let Some(Reverse(entry)) = inner.due.peek().copied() {
            if entry.at > now {
                return None;
            }
            inner.due.pop();

            if let Some(task) = inner.tasks.get_mut(&entry.id) {
                if task.is_due(now) {
                    task.begin_attempt();
                    return Some(task.clone());
                }
            }
            // Stale entry: task gone, terminal, or rescheduled later
        }

        None
    }

    /// Take every currently due task, each transitioned to `InFlight`
    pub fn poll_due(&self) -> Vec<DeliveryTask> {
        let mut due = Vec::new();
        while let Some(task) = self.next_due() {
            due.push(task);
        }
        due
    }

    /// Report the outcome of an attempt.
    ///
    /// A report for an unknown or already-terminal task is a warning and a
    /// no-op, never fatal.
    pub fn report(&self, task_id: TaskId, outcome: AttemptOutcome) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");

        let Some(task) = inner.tasks.get_mut(&task_id) else {
            warn!("Report for unknown task {}, ignoring", task_id);
            return;
        };
        if task.state.is_terminal() {
            warn!(
                "Report for task {} already in terminal state {:?}, ignoring",
                task_id, task.state
            );
            return;
        }

        match outcome {
            AttemptOutcome::Success { status, body } => {
                task.complete(status, body);
                info!(
                    "Task {} delivered with status {} (attempt {})",
                    task_id, status, task.attempt_count
                );
            }
            AttemptOutcome::RetryableFailure(reason) => {
                let (error, status, body) = match reason {
                    FailureReason::Transport(msg) => (msg, None, None),
                    FailureReason::HttpStatus { status, body } => {
                        (format!("HTTP {}", status), Some(status), body)
                    }
                };

                let completed = task.attempt_count + 1;
                if !self.backoff.should_retry(completed, task.max_attempts) {
                    task.fail_attempt(error.clone(), status, body, None);
                    warn!(
                        "Task {} failed permanently after {} attempts: {}",
                        task_id, completed, error
                    );
                } else {
                    let retry_at = Utc::now() + self.backoff.delay(completed - 1);
                    task.fail_attempt(error.clone(), status, body, Some(retry_at));
                    debug!(
                        "Task {} attempt {} failed ({}), retry at {}",
                        task_id, completed, error, retry_at
                    );
                    inner.due.push(Reverse(DueEntry {
                        at: retry_at,
                        id: task_id,
                    }));
                    self.wake.notify_waiters();
                }
            }
        }
    }

    /// Get a snapshot of a task by id
    pub fn get(&self, task_id: TaskId) -> Option<DeliveryTask> {
        let inner = self.inner.lock().expect("scheduler lock poisoned");
        inner.tasks.get(&task_id).cloned()
    }

    /// Number of tasks currently tracked, terminal included
    pub fn task_count(&self) -> usize {
        let inner = self.inner.lock().expect("scheduler lock poisoned");
        inner.tasks.len()
    }

    /// Drop terminal tasks not updated within the retention window.
    ///
    /// Returns how many tasks were removed.
    pub fn purge_terminal(&self, retention: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|d| Utc::now().checked_sub_signed(d))
        else {
            return 0;
        };
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        let before = inner.tasks.len();
        inner
            .tasks
            .retain(|_, task| !(task.state.is_terminal() && task.updated_at <= cutoff));
        let removed = before - inner.tasks.len();
        if removed > 0 {
            debug!("Purged {} terminal tasks", removed);
        }
        removed
    }

    /// When the earliest pending entry becomes due, if any
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        let inner = self.inner.lock().expect("scheduler lock poisoned");
        inner.due.peek().map(|Reverse(entry)| entry.at)
    }

    /// Sleep until the next deadline, a wake signal, or `cap`, whichever
    /// comes first. Used by idle workers instead of busy-spinning.
    pub async fn idle_wait(&self, cap: Duration) {
        let sleep_for = match self.next_deadline() {
            Some(at) => {
                let until = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                until.min(cap)
            }
            None => cap,
        };

        tokio::select! {
            _ = self.wake.notified() => {}
            _ = tokio::time::sleep(sleep_for) => {}
        }
    }
}
