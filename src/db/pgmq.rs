//! pgmq queue client via direct SQLx.
//!
//! Calls pgmq's SQL functions (pgmq.create, pgmq.send, pgmq.read). Delete
//! goes to the queue table directly so it can be made conditional on the
//! lease: the receipt is the visibility timestamp set by the read, and a
//! later read or an expired lease invalidates it.

use crate::config::validate_queue_name;
use crate::error::{Error, Result};
use crate::model::{LeaseReceipt, MessageId, QueueMessage};
use crate::queue::QueueClient;
use crate::telemetry::metrics;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use opentelemetry::KeyValue;
use sqlx::PgPool;
use std::time::Duration;

/// Queue client for one pgmq queue.
#[derive(Debug, Clone)]
pub struct PgmqQueue {
    pool: PgPool,
    name: String,
}

impl PgmqQueue {
    /// The name is interpolated into SQL as a table name, so it is
    /// validated here.
    pub fn new(pool: PgPool, name: &str) -> Result<Self> {
        validate_queue_name(name)?;
        Ok(Self {
            pool,
            name: name.to_string(),
        })
    }

    fn record(&self, operation: &'static str) {
        metrics::queue_operations().add(
            1,
            &[
                KeyValue::new("queue", self.name.clone()),
                KeyValue::new("operation", operation),
            ],
        );
    }
}

fn encode_receipt(vt: DateTime<Utc>) -> LeaseReceipt {
    LeaseReceipt::new(vt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn decode_receipt(receipt: &LeaseReceipt) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(receipt.as_str())
        .ok()
        .map(|vt| vt.with_timezone(&Utc))
}

/// pgmq stores JSON; producers send the description as a JSON string.
fn body_text(message: serde_json::Value) -> String {
    match message {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn queue_error(e: sqlx::Error) -> Error {
    Error::Queue(e.to_string())
}

#[async_trait]
impl QueueClient for PgmqQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ensure_queue_exists(&self) -> Result<()> {
        sqlx::query("SELECT pgmq.create($1)")
            .bind(&self.name)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Provisioning {
                queue: self.name.clone(),
                reason: e.to_string(),
            })?;
        self.record("create");
        Ok(())
    }

    async fn receive(&self, max_count: usize, lease: Duration) -> Result<Vec<QueueMessage>> {
        let vt_seconds = lease.as_secs_f64().ceil().max(1.0) as i32;
        let qty = i32::try_from(max_count).unwrap_or(i32::MAX);

        let rows = sqlx::query_as::<
            _,
            (
                i64,
                i32,
                DateTime<Utc>,
                DateTime<Utc>,
                serde_json::Value,
            ),
        >("SELECT msg_id, read_ct, enqueued_at, vt, message FROM pgmq.read($1, $2, $3)")
        .bind(&self.name)
        .bind(vt_seconds)
        .bind(qty)
        .fetch_all(&self.pool)
        .await
        .map_err(queue_error)?;

        self.record(if rows.is_empty() { "receive_empty" } else { "receive" });

        Ok(rows
            .into_iter()
            .map(|(msg_id, read_ct, enqueued_at, vt, message)| QueueMessage {
                id: MessageId(msg_id),
                receipt: encode_receipt(vt),
                body: body_text(message),
                dequeue_count: read_ct.max(1) as u32,
                enqueued_at,
            })
            .collect())
    }

    async fn delete(&self, id: MessageId, receipt: &LeaseReceipt) -> Result<()> {
        let vt = decode_receipt(receipt).ok_or(Error::LeaseExpired(id))?;

        let sql = format!(
            "DELETE FROM pgmq.q_{} WHERE msg_id = $1 AND vt = $2 AND vt > clock_timestamp()",
            self.name
        );
        let rows_affected = sqlx::query(&sql)
            .bind(id.0)
            .bind(vt)
            .execute(&self.pool)
            .await
            .map_err(queue_error)?
            .rows_affected();

        if rows_affected == 0 {
            return Err(Error::LeaseExpired(id));
        }
        self.record("delete");
        Ok(())
    }

    async fn send(&self, body: &str) -> Result<MessageId> {
        let row: (i64,) = sqlx::query_as("SELECT pgmq.send($1, $2, $3)")
            .bind(&self.name)
            .bind(serde_json::Value::String(body.to_string()))
            .bind(0i32)
            .fetch_one(&self.pool)
            .await
            .map_err(queue_error)?;
        self.record("send");
        Ok(MessageId(row.0))
    }
}
