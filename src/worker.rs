//! Worker pool pulling due tasks and executing delivery attempts

use crate::error::DeliveryError;
use crate::executor::{AttemptExecutor, AttemptOutcome, FailureReason};
use crate::scheduler::RetryScheduler;
use crate::{DeliveryConfig, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Fixed-size pool of delivery workers.
///
/// Each worker loops: take one due task from the scheduler, run the
/// executor, report the outcome. The pool size caps simultaneous in-flight
/// HTTP calls. Idle workers sleep until the scheduler's next deadline or a
/// wake signal rather than busy-spinning. A sweeper task drops terminal
/// tasks past the retention window.
pub struct WorkerPool {
    scheduler: Arc<RetryScheduler>,
    executor: Arc<AttemptExecutor>,
    config: DeliveryConfig,
    running: Arc<RwLock<bool>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Create a pool over the given scheduler and executor
    pub fn new(
        scheduler: Arc<RetryScheduler>,
        executor: Arc<AttemptExecutor>,
        config: DeliveryConfig,
    ) -> Self {
        Self {
            scheduler,
            executor,
            config,
            running: Arc::new(RwLock::new(false)),
            handles: Vec::new(),
        }
    }

    /// Start the workers and the sweeper
    pub async fn start(&mut self) -> Result<()> {
        let mut running = self.running.write().await;
        if *running {
            return Err(DeliveryError::WorkerAlreadyRunning);
        }
        *running = true;
        drop(running);

        info!("Starting worker pool with concurrency {}", self.config.concurrency);

        for i in 0..self.config.concurrency {
            let scheduler = self.scheduler.clone();
            let executor = self.executor.clone();
            let running = self.running.clone();
            let poll_interval = self.config.poll_interval;
            // Backstop above the transport timeout so a misbehaving
            // transport cannot pin a worker
            let attempt_deadline = self.config.attempt_timeout + Duration::from_secs(5);

            let handle = tokio::spawn(async move {
                while *running.read().await {
                    match scheduler.next_due() {
                        Some(task) => {
                            debug!(
                                "Worker {} dispatching task {} (attempt {})",
                                i,
                                task.id,
                                task.attempt_count + 1
                            );

                            let attempt =
                                executor.execute(&task.target, &task.payload);
                            let outcome =
                                match tokio::time::timeout(attempt_deadline, attempt).await {
                                    Ok(outcome) => outcome,
                                    Err(_) => {
                                        warn!("Worker {} attempt on task {} timed out", i, task.id);
                                        AttemptOutcome::RetryableFailure(
                                            FailureReason::Transport(
                                                "attempt deadline exceeded".to_string(),
                                            ),
                                        )
                                    }
                                };

                            scheduler.report(task.id, outcome);
                        }
                        None => scheduler.idle_wait(poll_interval).await,
                    }
                }

                debug!("Worker {} stopped", i);
            });

            self.handles.push(handle);
        }

        // Retention sweeper
        {
            let scheduler = self.scheduler.clone();
            let running = self.running.clone();
            let poll_interval = self.config.poll_interval;
            let retention = self.config.retention;

            let handle = tokio::spawn(async move {
                while *running.read().await {
                    tokio::time::sleep(poll_interval).await;
                    scheduler.purge_terminal(retention);
                }
            });
            self.handles.push(handle);
        }

        Ok(())
    }

    /// Stop the pool, aborting all workers
    pub async fn stop(&mut self) -> Result<()> {
        let mut running = self.running.write().await;
        if !*running {
            return Err(DeliveryError::WorkerNotRunning);
        }
        *running = false;
        drop(running);

        for handle in self.handles.drain(..) {
            handle.abort();
        }

        info!("Worker pool stopped");
        Ok(())
    }

    /// Check if the pool is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
