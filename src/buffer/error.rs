// Errors raised while building a bounded buffer.
//
// Runtime misuse of a built buffer (enqueue after completion, unknown consumer)
// is a contract violation and panics instead of returning one of these.
use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    #[error("Invalid buffer capacity {capacity}: {reason}")]
    InvalidCapacity { capacity: usize, reason: &'static str },

    #[error("A buffer needs at least one consumer")]
    NoConsumers,

    #[error("Failed to allocate {requested} {what}: {source}")]
    Allocation {
        what: &'static str,
        requested: usize,
        #[source]
        source: TryReserveError,
    },
}

impl BufferError {
    /// Every construction error is fatal: no thread has been started yet, so the
    /// run is abandoned before it begins.
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, BufferError::Allocation { .. })
    }
}
