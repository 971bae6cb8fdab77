//! The participants of a run: one producer, the consumer pool, and the runner
//! that joins them around a shared [`BoundedBuffer`](crate::buffer::BoundedBuffer).

pub mod consumer;
pub mod pacing;
pub mod producer;
pub mod runner;

pub use consumer::{Consumer, ConsumerPool, ConsumerReport};
pub use pacing::Pacing;
pub use producer::Producer;
pub use runner::{PipelineRunner, PipelineSettings, RunSummary};
