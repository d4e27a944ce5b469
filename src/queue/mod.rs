//! Queue client capability.
//!
//! A queue hands out messages under a time-bounded lease. A leased message
//! is invisible to other receivers until the lease expires or the holder
//! deletes it with its receipt. Every receive bumps the dequeue count.

pub mod memory;

use crate::error::Result;
use crate::model::{LeaseReceipt, MessageId, QueueMessage};
use async_trait::async_trait;
use std::time::Duration;

pub use memory::InMemoryQueue;

#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Name of the queue this client talks to.
    fn name(&self) -> &str;

    /// Create the queue if it does not exist. Idempotent.
    ///
    /// Fails with [`Error::Provisioning`](crate::error::Error::Provisioning).
    async fn ensure_queue_exists(&self) -> Result<()>;

    /// Lease up to `max_count` visible messages for `lease`.
    async fn receive(&self, max_count: usize, lease: Duration) -> Result<Vec<QueueMessage>>;

    /// Delete a leased message. Fails with
    /// [`Error::LeaseExpired`](crate::error::Error::LeaseExpired) when the
    /// receipt no longer proves the current lease.
    async fn delete(&self, id: MessageId, receipt: &LeaseReceipt) -> Result<()>;

    /// Enqueue a message body. Used by producers.
    async fn send(&self, body: &str) -> Result<MessageId>;
}
