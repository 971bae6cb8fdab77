//! Domain layer for prodcons-monitor.
//!
//! Contains the canonical types shared across all modules:
//! - `Item`: the sequential identifier moved through the pipeline
//! - `ConsumerId`: 1-based consumer identity
//! - `Snapshot`: lock-consistent view of the buffer counters
//! - `PipelineError`: top-level error type

pub mod error;
pub mod item;
pub mod snapshot;

pub use error::PipelineError;
pub use item::{ConsumerId, Item};
pub use snapshot::Snapshot;
