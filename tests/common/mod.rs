//! Fault-injecting wrappers around the in-memory queue and store.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use todo_sync::error::{Error, Result};
use todo_sync::model::{Description, Item, LeaseReceipt, MessageId, QueueMessage};
use todo_sync::queue::{InMemoryQueue, QueueClient};
use todo_sync::store::{CommitSummary, InMemoryStore, ItemStore};
use todo_sync::worker::WorkerConfig;

/// Queue that counts calls and can be told to fail.
#[derive(Debug)]
pub struct TestQueue {
    pub inner: InMemoryQueue,
    pub receive_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_provisioning: AtomicBool,
    pub fail_receive: AtomicBool,
    pub fail_next_delete: AtomicBool,
}

impl TestQueue {
    pub fn new(inner: InMemoryQueue) -> Arc<Self> {
        Arc::new(Self {
            inner,
            receive_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_provisioning: AtomicBool::new(false),
            fail_receive: AtomicBool::new(false),
            fail_next_delete: AtomicBool::new(false),
        })
    }

    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueClient for TestQueue {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn ensure_queue_exists(&self) -> Result<()> {
        if self.fail_provisioning.load(Ordering::SeqCst) {
            return Err(Error::Queue("connection refused".to_string()));
        }
        self.inner.ensure_queue_exists().await
    }

    async fn receive(&self, max_count: usize, lease: Duration) -> Result<Vec<QueueMessage>> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_receive.load(Ordering::SeqCst) {
            return Err(Error::Queue("timed out".to_string()));
        }
        self.inner.receive(max_count, lease).await
    }

    async fn delete(&self, id: MessageId, receipt: &LeaseReceipt) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_delete.swap(false, Ordering::SeqCst) {
            return Err(Error::LeaseExpired(id));
        }
        self.inner.delete(id, receipt).await
    }

    async fn send(&self, body: &str) -> Result<MessageId> {
        self.inner.send(body).await
    }
}

/// Store that can refuse reads, appends or commits, slow down snapshots, or
/// hide its contents from snapshots to simulate a concurrent writer.
///
/// Appends are buffered here and handed to the inner store on commit, so a
/// refused commit drops them the way a rolled-back transaction would.
#[derive(Debug)]
pub struct TestStore {
    pub inner: InMemoryStore,
    pending: Mutex<Vec<Item>>,
    pub fail_list: AtomicBool,
    pub fail_append: AtomicBool,
    pub fail_commit: AtomicBool,
    pub hide_snapshot: AtomicBool,
    /// Milliseconds each `list_all` takes.
    pub list_delay_ms: AtomicU64,
}

impl TestStore {
    pub fn new(inner: InMemoryStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            pending: Mutex::new(Vec::new()),
            fail_list: AtomicBool::new(false),
            fail_append: AtomicBool::new(false),
            fail_commit: AtomicBool::new(false),
            hide_snapshot: AtomicBool::new(false),
            list_delay_ms: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl ItemStore for TestStore {
    async fn list_all(&self) -> Result<Vec<Item>> {
        let delay = self.list_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("relation \"todo\" does not exist".to_string()));
        }
        if self.hide_snapshot.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        self.inner.list_all().await
    }

    async fn append(&self, item: Item) -> Result<()> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("pool timed out".to_string()));
        }
        self.pending.lock().unwrap().push(item);
        Ok(())
    }

    async fn commit(&self) -> Result<CommitSummary> {
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("connection reset".to_string()));
        }
        for item in pending {
            self.inner.append(item).await?;
        }
        self.inner.commit().await
    }
}

/// A provisioned in-memory queue named "incoming".
pub async fn ready_queue() -> InMemoryQueue {
    let queue = InMemoryQueue::new("incoming");
    queue.ensure_queue_exists().await.unwrap();
    queue
}

pub fn test_config(max_messages: usize) -> WorkerConfig {
    WorkerConfig {
        max_messages,
        ..WorkerConfig::default()
    }
}

/// Insert and commit items directly, bypassing the worker.
pub async fn seed(store: &InMemoryStore, descriptions: &[&str]) {
    for text in descriptions {
        store
            .append(Item::new(Description::parse(*text).unwrap()))
            .await
            .unwrap();
    }
    store.commit().await.unwrap();
}

pub async fn descriptions(store: &InMemoryStore) -> Vec<String> {
    store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.description.to_string())
        .collect()
}

/// Receive the next visible message and let its lease lapse, `times` times.
/// Requires a paused clock.
pub async fn abandon_deliveries(queue: &InMemoryQueue, times: usize) {
    for _ in 0..times {
        let leased = queue.receive(1, Duration::from_secs(5)).await.unwrap();
        assert_eq!(leased.len(), 1, "expected a visible message to abandon");
        tokio::time::advance(Duration::from_secs(6)).await;
    }
}
