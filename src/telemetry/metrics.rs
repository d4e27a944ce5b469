//! Metric instrument factories for todo-sync.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"todo-sync"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for todo-sync instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("todo-sync")
}

/// Counter: queue-level operations (create, send, receive, delete).
/// Labels: `queue`, `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("todo_sync.queue.operations")
        .with_description("Number of queue operations")
        .build()
}

/// Counter: messages processed by the worker.
/// Labels: `decision` ("accept" | "duplicate" | "poison" | "invalid").
pub fn messages_processed() -> Counter<u64> {
    meter()
        .u64_counter("todo_sync.messages.processed")
        .with_description("Number of queue messages processed")
        .build()
}

/// Counter: store commits.
/// Labels: `result` ("ok" | "error").
pub fn store_commits() -> Counter<u64> {
    meter()
        .u64_counter("todo_sync.store.commits")
        .with_description("Number of store commits")
        .build()
}

/// Histogram: worker iteration duration in milliseconds.
pub fn iteration_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("todo_sync.iteration.duration_ms")
        .with_description("Worker iteration duration in milliseconds")
        .with_unit("ms")
        .build()
}
