//! Process-local queue with lease semantics.
//!
//! Mirrors the behavior of a managed queue closely enough to exercise the
//! worker without Postgres: leases hide messages until a deadline, each
//! receive issues a fresh receipt and bumps the dequeue count, and a delete
//! with a stale receipt fails.

use crate::error::{Error, Result};
use crate::model::{LeaseReceipt, MessageId, QueueMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use super::QueueClient;

#[derive(Debug)]
struct StoredMessage {
    id: MessageId,
    body: String,
    enqueued_at: DateTime<Utc>,
    dequeue_count: u32,
    visible_at: Instant,
    receipt: Option<Uuid>,
}

#[derive(Debug, Default)]
struct QueueState {
    exists: bool,
    next_id: i64,
    messages: VecDeque<StoredMessage>,
}

/// In-memory queue. Cloning yields another handle to the same queue.
#[derive(Debug, Clone)]
pub struct InMemoryQueue {
    name: String,
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(QueueState::default())),
        }
    }

    /// Number of messages not yet deleted, leased or not.
    pub fn len(&self) -> usize {
        self.state().map(|s| s.messages.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bodies of all messages not yet deleted, in enqueue order.
    pub fn bodies(&self) -> Vec<String> {
        self.state()
            .map(|s| s.messages.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, QueueState>> {
        self.state
            .lock()
            .map_err(|_| Error::Queue(format!("queue {} state poisoned", self.name)))
    }

    fn existing(&self) -> Result<MutexGuard<'_, QueueState>> {
        let state = self.state()?;
        if !state.exists {
            return Err(Error::Queue(format!("queue {} does not exist", self.name)));
        }
        Ok(state)
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ensure_queue_exists(&self) -> Result<()> {
        let mut state = self.state().map_err(|e| Error::Provisioning {
            queue: self.name.clone(),
            reason: e.to_string(),
        })?;
        state.exists = true;
        Ok(())
    }

    async fn receive(&self, max_count: usize, lease: Duration) -> Result<Vec<QueueMessage>> {
        let mut state = self.existing()?;
        let now = Instant::now();
        let mut leased = Vec::new();

        for msg in state.messages.iter_mut() {
            if leased.len() >= max_count {
                break;
            }
            if msg.visible_at > now {
                continue;
            }
            let receipt = Uuid::new_v4();
            msg.receipt = Some(receipt);
            msg.visible_at = now + lease;
            msg.dequeue_count += 1;
            leased.push(QueueMessage {
                id: msg.id,
                receipt: LeaseReceipt::new(receipt.to_string()),
                body: msg.body.clone(),
                dequeue_count: msg.dequeue_count,
                enqueued_at: msg.enqueued_at,
            });
        }

        Ok(leased)
    }

    async fn delete(&self, id: MessageId, receipt: &LeaseReceipt) -> Result<()> {
        let mut state = self.existing()?;
        let now = Instant::now();

        let pos = state
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::Queue(format!("message {id} not found")))?;

        let msg = &state.messages[pos];
        let current = msg.receipt.map(|r| r.to_string());
        if current.as_deref() != Some(receipt.as_str()) || msg.visible_at <= now {
            return Err(Error::LeaseExpired(id));
        }

        state.messages.remove(pos);
        Ok(())
    }

    async fn send(&self, body: &str) -> Result<MessageId> {
        let mut state = self.existing()?;
        state.next_id += 1;
        let id = MessageId(state.next_id);
        state.messages.push_back(StoredMessage {
            id,
            body: body.to_string(),
            enqueued_at: Utc::now(),
            dequeue_count: 0,
            visible_at: Instant::now(),
            receipt: None,
        });
        Ok(id)
    }
}
