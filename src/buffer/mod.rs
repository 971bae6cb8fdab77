pub mod error;
pub mod metrics;
pub mod ring;

pub use error::BufferError;
pub use metrics::BufferStats;
pub use ring::{BoundedBuffer, MIN_CAPACITY};
