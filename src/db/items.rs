//! Item store over the `todo` table.

use crate::error::{Error, Result};
use crate::model::{Description, Item, ItemId};
use crate::store::{CommitSummary, ItemStore};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Mutex, MutexGuard};

/// Durable store. Appends are buffered in-process until `commit`, which
/// inserts them in one transaction. The unique index on
/// `lower(description)` turns a concurrent duplicate into a skipped row.
#[derive(Debug)]
pub struct PgItemStore {
    pool: PgPool,
    pending: Mutex<Vec<Item>>,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            pending: Mutex::new(Vec::new()),
        }
    }

    fn pending(&self) -> Result<MutexGuard<'_, Vec<Item>>> {
        self.pending
            .lock()
            .map_err(|_| Error::StoreUnavailable("pending buffer poisoned".to_string()))
    }
}

fn unavailable(e: sqlx::Error) -> Error {
    Error::StoreUnavailable(e.to_string())
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn list_all(&self) -> Result<Vec<Item>> {
        let rows: Vec<ItemRow> =
            sqlx::query_as("SELECT id, description, is_completed FROM todo ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(unavailable)?;

        rows.into_iter().map(ItemRow::try_into_item).collect()
    }

    async fn append(&self, item: Item) -> Result<()> {
        self.pending()?.push(item);
        Ok(())
    }

    async fn commit(&self) -> Result<CommitSummary> {
        let pending = std::mem::take(&mut *self.pending()?);
        let mut summary = CommitSummary::default();
        if pending.is_empty() {
            return Ok(summary);
        }

        let mut tx = self.pool.begin().await.map_err(unavailable)?;
        for mut item in pending {
            let inserted: Option<(i64,)> = sqlx::query_as(
                "INSERT INTO todo (description, is_completed)
                 VALUES ($1, $2)
                 ON CONFLICT DO NOTHING
                 RETURNING id",
            )
            .bind(item.description.as_str())
            .bind(item.is_completed)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unavailable)?;

            match inserted {
                Some((id,)) => {
                    item.id = Some(ItemId(id));
                    summary.inserted.push(item);
                }
                None => summary.already_present.push(item.description),
            }
        }
        tx.commit().await.map_err(unavailable)?;

        Ok(summary)
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    description: String,
    is_completed: bool,
}

impl ItemRow {
    fn try_into_item(self) -> Result<Item> {
        Ok(Item {
            id: Some(ItemId(self.id)),
            description: Description::parse(self.description)?,
            is_completed: self.is_completed,
        })
    }
}
