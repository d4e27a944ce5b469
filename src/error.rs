//! Error types for todo-sync.

use crate::model::message::MessageId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot provision queue {queue}: {reason}")]
    Provisioning { queue: String, reason: String },

    #[error("queue error: {0}")]
    Queue(String),

    #[error("lease expired for message {0}")]
    LeaseExpired(MessageId),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid description: {0}")]
    InvalidDescription(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Errors the worker loop recovers from by retrying on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Queue(_) | Error::LeaseExpired(_) | Error::StoreUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
