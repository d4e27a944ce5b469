//! Per-message decision: apply, or drop without a store mutation.

use crate::model::{Description, Item, QueueMessage};
use std::collections::HashSet;

/// What the worker does with one leased message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// New description: append this item to the store batch.
    Accept(Item),
    /// Description already stored, or accepted earlier in the same batch.
    Duplicate,
    /// Delivered more often than the poison threshold allows.
    Poison,
    /// Body can never become an item (empty or too long).
    Invalid(String),
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Accept(_) => "accept",
            Decision::Duplicate => "duplicate",
            Decision::Poison => "poison",
            Decision::Invalid(_) => "invalid",
        }
    }
}

/// Decide what to do with `msg`.
///
/// `known` holds the dedup keys of every stored item plus those accepted
/// so far in this batch. The poison check runs first, so a message past
/// the threshold is dropped even if its body is new.
pub fn decide(msg: &QueueMessage, known: &HashSet<String>, poison_threshold: u32) -> Decision {
    if msg.dequeue_count > poison_threshold {
        return Decision::Poison;
    }

    let description = match Description::parse(msg.body.as_str()) {
        Ok(d) => d,
        Err(e) => return Decision::Invalid(e.to_string()),
    };

    if known.contains(&description.dedup_key()) {
        Decision::Duplicate
    } else {
        Decision::Accept(Item::new(description))
    }
}
