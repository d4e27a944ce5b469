//! Core data model.
//!
//! An item is one todo entry; a queue message is a request to create one.

pub mod item;
pub mod message;

pub use item::{Description, Item, ItemId};
pub use message::{LeaseReceipt, MessageId, QueueMessage};
