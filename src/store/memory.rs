//! Process-local item store. Nothing survives a restart.

use crate::error::{Error, Result};
use crate::model::{Item, ItemId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{CommitSummary, ItemStore};

#[derive(Debug, Default)]
struct StoreState {
    next_id: i64,
    items: Vec<Item>,
    pending: Vec<Item>,
}

/// In-memory store. Cloning yields another handle to the same items, so a
/// reader (e.g. an HTTP listing) can share it with the worker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| Error::StoreUnavailable("in-memory store poisoned".to_string()))
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Item>> {
        Ok(self.state()?.items.clone())
    }

    async fn append(&self, item: Item) -> Result<()> {
        self.state()?.pending.push(item);
        Ok(())
    }

    async fn commit(&self) -> Result<CommitSummary> {
        let mut state = self.state()?;
        let pending = std::mem::take(&mut state.pending);
        let mut keys: HashSet<String> = state
            .items
            .iter()
            .map(|i| i.description.dedup_key())
            .collect();

        let mut summary = CommitSummary::default();
        for mut item in pending {
            if !keys.insert(item.description.dedup_key()) {
                summary.already_present.push(item.description);
                continue;
            }
            state.next_id += 1;
            item.id = Some(ItemId(state.next_id));
            state.items.push(item.clone());
            summary.inserted.push(item);
        }
        Ok(summary)
    }
}
