//! Database connection pool, migrations, and health check.
//!
//! One Postgres pool backs both the pgmq queue and the `todo` table.

pub mod items;
pub mod pgmq;

use crate::error::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use items::PgItemStore;
pub use pgmq::PgmqQueue;

/// Database handle. Owns the connection pool shared across all modules.
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::Error::Other(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Simple health check — run a SELECT 1.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// A pgmq client for `queue_name`, sharing this pool.
    pub fn queue(&self, queue_name: &str) -> Result<PgmqQueue> {
        PgmqQueue::new(self.pool.clone(), queue_name)
    }

    /// An item store over the `todo` table, sharing this pool.
    pub fn item_store(&self) -> PgItemStore {
        PgItemStore::new(self.pool.clone())
    }
}
