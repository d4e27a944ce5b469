//! Queue-to-store synchronization worker.

pub mod decision;
pub mod sync;

pub use decision::{Decision, decide};
pub use sync::{IterationReport, SyncWorker, WorkerConfig};
