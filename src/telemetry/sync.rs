//! Worker iteration span helpers.

use crate::model::MessageId;
use tracing::Span;

/// Start a span covering one worker iteration.
///
/// The `sync.received` field is declared empty and filled once the
/// receive call returns.
pub fn start_iteration_span(queue: &str, iteration: u64) -> Span {
    tracing::info_span!(
        "sync.iteration",
        "sync.queue" = queue,
        "sync.iteration" = iteration,
        "sync.received" = tracing::field::Empty,
    )
}

/// Record how many messages the receive call returned.
pub fn record_received(span: &Span, count: usize) {
    span.record("sync.received", count as u64);
}

/// Emit a decision event for one message, scoped to the given span.
pub fn record_decision(span: &Span, message_id: MessageId, dequeue_count: u32, decision: &str) {
    span.in_scope(|| {
        tracing::debug!(
            message_id = message_id.0,
            dequeue_count,
            decision,
            "message_decision"
        );
    });
}
