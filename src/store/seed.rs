//! Default items for a fresh store.

use crate::error::Result;
use crate::model::{Description, Item};

use super::ItemStore;

pub const DEFAULT_ITEMS: [&str; 3] = ["Build the API", "Build the Frontend", "Deploy the app"];

/// Seed [`DEFAULT_ITEMS`] if the store holds no items. Returns how many
/// items were inserted; zero when the store was already populated.
pub async fn seed_defaults(store: &dyn ItemStore) -> Result<usize> {
    if !store.list_all().await?.is_empty() {
        tracing::debug!("store already populated, not seeding");
        return Ok(0);
    }

    tracing::info!("seeding todo items");
    for text in DEFAULT_ITEMS {
        store.append(Item::new(Description::parse(text)?)).await?;
    }
    let summary = store.commit().await?;
    tracing::info!(count = summary.inserted.len(), "seeded todo items");
    Ok(summary.inserted.len())
}
