//! # todo-sync
//!
//! Reconciliation worker for the todo application: leases messages from a
//! queue and merges them into the item store without duplicates.
//!
//! Provides the queue and store capabilities with in-memory and Postgres
//! (pgmq + sqlx) implementations, the synchronization worker, and
//! OpenTelemetry observability.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod queue;
pub mod store;
pub mod telemetry;
pub mod worker;
