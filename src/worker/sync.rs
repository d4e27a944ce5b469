//! Synchronization worker: leases queue messages and reconciles them into
//! the item store.

use crate::error::{Error, Result};
use crate::model::QueueMessage;
use crate::queue::QueueClient;
use crate::store::ItemStore;
use crate::telemetry::metrics;
use crate::telemetry::sync::{record_decision, record_received, start_iteration_span};
use opentelemetry::KeyValue;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{Instrument, debug, error, info, warn};

use super::decision::{Decision, decide};

/// Configuration for the synchronization worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between iterations.
    pub poll_interval: Duration,
    /// Visibility lease requested per receive.
    pub lease: Duration,
    /// Maximum messages leased per iteration.
    pub max_messages: usize,
    /// Highest dequeue count still applied. Anything above is poison.
    pub poison_threshold: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            lease: Duration::from_secs(5),
            max_messages: 1,
            poison_threshold: 2,
        }
    }
}

/// Counters describing one iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    /// Messages leased by the receive call.
    pub received: usize,
    /// Messages whose item was appended to the store.
    pub accepted: usize,
    /// Messages naming an item the store or batch already holds.
    pub duplicates: usize,
    /// Messages dropped for exceeding the poison threshold.
    pub poison: usize,
    /// Messages whose body is not a valid description.
    pub invalid: usize,
    /// Items the commit actually stored.
    pub inserted: usize,
    /// Accepted items the store itself reported as already present.
    pub already_present: usize,
    /// Messages deleted from the queue.
    pub deleted: usize,
    /// Messages intentionally not deleted so they are delivered again.
    pub left_for_redelivery: usize,
    /// Deletes the queue refused, usually because the lease lapsed.
    pub delete_failures: usize,
    /// The store snapshot could not be read; nothing was received.
    pub snapshot_failed: bool,
    /// Shutdown was signaled before receiving; nothing was received.
    pub cancelled: bool,
    /// The receive call failed.
    pub receive_failed: bool,
    /// The commit failed; accepted messages stay queued.
    pub commit_failed: bool,
}

/// The worker loop: snapshot, receive, decide, commit, acknowledge, sleep.
pub struct SyncWorker {
    queue: Arc<dyn QueueClient>,
    store: Arc<dyn ItemStore>,
    config: WorkerConfig,
    shutdown: Arc<Notify>,
    stopping: Arc<AtomicBool>,
    iterations: Arc<AtomicU64>,
}

impl Clone for SyncWorker {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            shutdown: Arc::clone(&self.shutdown),
            stopping: Arc::clone(&self.stopping),
            iterations: Arc::clone(&self.iterations),
        }
    }
}

impl SyncWorker {
    pub fn new(
        queue: Arc<dyn QueueClient>,
        store: Arc<dyn ItemStore>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            store,
            config,
            shutdown: Arc::new(Notify::new()),
            stopping: Arc::new(AtomicBool::new(false)),
            iterations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Ensure the queue exists. Must succeed before [`run`](Self::run);
    /// a failure here is fatal for the host.
    pub async fn start(&self) -> Result<()> {
        let queue = self.queue.name().to_string();
        self.queue
            .ensure_queue_exists()
            .await
            .map_err(|e| match e {
                Error::Provisioning { .. } => e,
                other => Error::Provisioning {
                    queue: queue.clone(),
                    reason: other.to_string(),
                },
            })?;
        info!(queue = %queue, "queue ready");
        Ok(())
    }

    /// Signal the worker to stop. No receive is issued after this returns;
    /// a sleeping worker wakes immediately.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Run iterations until shutdown. Errors inside an iteration are
    /// logged and never end the loop.
    pub async fn run(&self) -> Result<()> {
        info!(queue = self.queue.name(), "sync worker started");

        loop {
            if self.is_stopping() {
                info!("sync worker shutting down");
                return Ok(());
            }

            let report = self.run_iteration().await;
            debug!(at = %chrono::Local::now(), ?report, "worker running");

            tokio::select! {
                _ = self.shutdown.notified() => {}
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// One pass of the loop without the trailing sleep.
    ///
    /// The store is committed before any message is deleted. Messages that
    /// produced no store mutation are deleted regardless of the commit;
    /// accepted messages are deleted only once the commit succeeded, so a
    /// failed commit leaves them for redelivery instead of losing them.
    pub async fn run_iteration(&self) -> IterationReport {
        let started = std::time::Instant::now();
        let iteration = self.iterations.fetch_add(1, Ordering::Relaxed) + 1;
        let span = start_iteration_span(self.queue.name(), iteration);

        let report = self.iterate(&span).instrument(span.clone()).await;

        metrics::iteration_duration_ms().record(started.elapsed().as_secs_f64() * 1000.0, &[]);
        report
    }

    async fn iterate(&self, span: &tracing::Span) -> IterationReport {
        let mut report = IterationReport::default();

        // Store might not be provisioned yet.
        let snapshot = match self.store.list_all().await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "cannot read store snapshot, skipping iteration");
                report.snapshot_failed = true;
                return report;
            }
        };

        if self.is_stopping() {
            debug!("shutdown signaled, not receiving");
            report.cancelled = true;
            return report;
        }

        let messages = match self
            .queue
            .receive(self.config.max_messages, self.config.lease)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                error!(error = %e, "cannot receive from queue");
                report.receive_failed = true;
                return report;
            }
        };
        report.received = messages.len();
        record_received(span, messages.len());

        let mut known: HashSet<String> = snapshot
            .iter()
            .map(|item| item.description.dedup_key())
            .collect();
        let mut accepted: Vec<QueueMessage> = Vec::new();
        let mut acknowledge: Vec<QueueMessage> = Vec::new();

        for msg in messages {
            let decision = decide(&msg, &known, self.config.poison_threshold);
            record_decision(span, msg.id, msg.dequeue_count, decision.label());
            metrics::messages_processed()
                .add(1, &[KeyValue::new("decision", decision.label())]);

            match decision {
                Decision::Accept(item) => {
                    let key = item.description.dedup_key();
                    match self.store.append(item).await {
                        Ok(()) => {
                            known.insert(key);
                            report.accepted += 1;
                            accepted.push(msg);
                        }
                        Err(e) => {
                            error!(message_id = msg.id.0, error = %e, "cannot append item");
                            report.left_for_redelivery += 1;
                        }
                    }
                }
                Decision::Duplicate => {
                    debug!(message_id = msg.id.0, body = %msg.body, "already present");
                    report.duplicates += 1;
                    acknowledge.push(msg);
                }
                Decision::Poison => {
                    warn!(
                        message_id = msg.id.0,
                        dequeue_count = msg.dequeue_count,
                        "poison message dropped"
                    );
                    report.poison += 1;
                    acknowledge.push(msg);
                }
                Decision::Invalid(reason) => {
                    warn!(message_id = msg.id.0, %reason, "invalid message dropped");
                    report.invalid += 1;
                    acknowledge.push(msg);
                }
            }
        }

        match self.store.commit().await {
            Ok(summary) => {
                metrics::store_commits().add(1, &[KeyValue::new("result", "ok")]);
                for description in &summary.already_present {
                    info!(%description, "store already holds item, skipped");
                }
                for item in &summary.inserted {
                    info!(description = %item.description, id = ?item.id, "item added");
                }
                report.inserted = summary.inserted.len();
                report.already_present = summary.already_present.len();
                acknowledge.append(&mut accepted);
            }
            Err(e) => {
                metrics::store_commits().add(1, &[KeyValue::new("result", "error")]);
                error!(
                    error = %e,
                    pending = accepted.len(),
                    "store commit failed, leaving accepted messages for redelivery"
                );
                report.commit_failed = true;
                report.left_for_redelivery += accepted.len();
            }
        }

        for msg in acknowledge {
            match self.queue.delete(msg.id, &msg.receipt).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!(message_id = msg.id.0, error = %e, "cannot delete message");
                    report.delete_failures += 1;
                }
            }
        }

        report
    }
}
