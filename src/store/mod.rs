//! Item store capability.
//!
//! A store is used as a unit of work: read a snapshot with `list_all`,
//! buffer new items with `append`, make them durable with `commit`.
//! Both implementations refuse a second item whose description matches an
//! existing one case-insensitively and report it as already present.

pub mod memory;
pub mod seed;

use crate::error::Result;
use crate::model::{Description, Item};
use async_trait::async_trait;

pub use memory::InMemoryStore;
pub use seed::seed_defaults;

/// What a commit did with the pending items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Newly stored items, with their assigned ids.
    pub inserted: Vec<Item>,
    /// Pending items skipped because an equal description was already stored.
    pub already_present: Vec<Description>,
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All committed items, ordered by id.
    ///
    /// Fails with [`Error::StoreUnavailable`](crate::error::Error::StoreUnavailable).
    async fn list_all(&self) -> Result<Vec<Item>>;

    /// Buffer an item for the next commit. Not durable until then.
    async fn append(&self, item: Item) -> Result<()>;

    /// Persist everything appended since the last commit.
    ///
    /// The pending buffer is cleared whether or not the commit succeeds.
    async fn commit(&self) -> Result<CommitSummary>;
}
