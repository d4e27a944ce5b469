//! Queue message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queue-assigned message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque proof of the current lease on a message. Only the queue that
/// issued it can interpret it, and only until the lease expires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseReceipt(String);

impl LeaseReceipt {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// A message leased from a queue.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub id: MessageId,
    pub receipt: LeaseReceipt,
    /// Plain UTF-8 text; the description of the requested item.
    pub body: String,
    /// Number of deliveries so far, including this one. Always >= 1.
    pub dequeue_count: u32,
    pub enqueued_at: DateTime<Utc>,
}
